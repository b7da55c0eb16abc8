use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::date_prefix;

/// Column order used when observations are persisted as CSV.
pub const OBSERVATION_COLUMNS: [&str; 5] = ["date", "datatype", "station", "attributes", "value"];

/// One daily reading of one variable at one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(deserialize_with = "date_prefix")]
    pub date: NaiveDate,
    pub datatype: String,
    pub station: String,
    #[serde(default)]
    pub attributes: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::ymd;
    use serde_json::json;

    #[test]
    fn test_deserialize_api_record() {
        let obs: Observation = serde_json::from_value(json!({
            "date": "2004-07-01T00:00:00",
            "datatype": "PRCP",
            "station": "GHCND:USW00013876",
            "attributes": ",,W,2400",
            "value": 3
        }))
        .unwrap();

        assert_eq!(obs.date, ymd(2004, 7, 1));
        assert_eq!(obs.value, 3.0);
        assert_eq!(obs.attributes, ",,W,2400");
    }

    #[test]
    fn test_rejects_bad_date() {
        let result: Result<Observation, _> = serde_json::from_value(json!({
            "date": "yesterday",
            "datatype": "PRCP",
            "station": "S",
            "value": 1.0
        }));
        assert!(result.is_err());
    }
}

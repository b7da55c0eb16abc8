use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::lenient_date;

/// Station ids in the preferred (first-order USW) network start with this.
pub const PREFERRED_NETWORK_PREFIX: &str = "GHCND:USW";

/// A monitoring station as listed by the `stations` endpoint.
///
/// Dates are normalized to calendar days on the way in; an unparseable date
/// is treated as missing rather than as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default, rename = "elevationUnit")]
    pub elevation_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub mindate: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub maxdate: Option<NaiveDate>,
    #[serde(default)]
    pub datacoverage: Option<f64>,
}

impl Station {
    /// Days between `mindate` and `maxdate`, or `-1` when either is missing.
    pub fn span_days(&self) -> i64 {
        match (self.mindate, self.maxdate) {
            (Some(min), Some(max)) => (max - min).num_days(),
            _ => -1,
        }
    }

    pub fn is_preferred_network(&self) -> bool {
        self.id.starts_with(PREFERRED_NETWORK_PREFIX)
    }
}

/// Row of `selected_station.csv`: the station plus its ranking inputs.
#[derive(Debug, Serialize)]
pub struct SelectedStationRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    #[serde(rename = "elevationUnit")]
    pub elevation_unit: Option<&'a str>,
    pub mindate: Option<NaiveDate>,
    pub maxdate: Option<NaiveDate>,
    pub datacoverage: Option<f64>,
    pub span_days: i64,
    pub is_usw: u8,
}

impl<'a> From<&'a Station> for SelectedStationRow<'a> {
    fn from(s: &'a Station) -> Self {
        Self {
            id: &s.id,
            name: &s.name,
            latitude: s.latitude,
            longitude: s.longitude,
            elevation: s.elevation,
            elevation_unit: s.elevation_unit.as_deref(),
            mindate: s.mindate,
            maxdate: s.maxdate,
            datacoverage: s.datacoverage,
            span_days: s.span_days(),
            is_usw: s.is_preferred_network() as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::ymd;
    use serde_json::json;

    #[test]
    fn test_deserialize_api_record() {
        let raw = json!({
            "elevation": 139,
            "mindate": "1938-01-01",
            "maxdate": "2025-10-01T00:00:00",
            "latitude": 33.5655,
            "name": "BIRMINGHAM AIRPORT, AL US",
            "datacoverage": 1,
            "id": "GHCND:USW00013876",
            "elevationUnit": "METERS",
            "longitude": -86.7449
        });
        let station: Station = serde_json::from_value(raw).unwrap();

        assert_eq!(station.mindate, Some(ymd(1938, 1, 1)));
        assert_eq!(station.maxdate, Some(ymd(2025, 10, 1)));
        assert_eq!(station.datacoverage, Some(1.0));
        assert!(station.is_preferred_network());
    }

    #[test]
    fn test_missing_fields_default() {
        let station: Station = serde_json::from_value(json!({"id": "GHCND:US1AL0001"})).unwrap();
        assert_eq!(station.mindate, None);
        assert_eq!(station.datacoverage, None);
        assert_eq!(station.span_days(), -1);
        assert!(!station.is_preferred_network());
    }

    #[test]
    fn test_unparseable_date_is_missing() {
        let station: Station =
            serde_json::from_value(json!({"id": "X", "mindate": "garbage", "maxdate": "2020-01-01"}))
                .unwrap();
        assert_eq!(station.mindate, None);
        assert_eq!(station.span_days(), -1);
    }

    #[test]
    fn test_span_days() {
        let station: Station = serde_json::from_value(
            json!({"id": "X", "mindate": "2020-01-01", "maxdate": "2020-12-31"}),
        )
        .unwrap();
        assert_eq!(station.span_days(), 365);
    }
}

use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::info;

use crate::services::climate_api::ClimateApi;
use crate::station::Station;

/// Lists candidate stations for one region, deduplicated by id.
///
/// An empty list is a normal outcome, not an error.
pub async fn list_stations<A: ClimateApi + ?Sized>(
    api: &A,
    fips: &str,
    variables: &[String],
) -> Result<Vec<Station>> {
    let raw = api
        .stations(fips, variables)
        .await
        .with_context(|| format!("listing stations for FIPS:{fips}"))?;
    let listed = raw.len();

    let stations = dedupe_first_seen(raw);
    info!(fips, listed, unique = stations.len(), "Station catalog built");
    Ok(stations)
}

/// Keeps the first record seen for each station id, preserving order.
pub fn dedupe_first_seen(stations: Vec<Station>) -> Vec<Station> {
    let mut seen = HashSet::new();
    stations
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn station(id: &str, name: &str) -> Station {
        serde_json::from_value(json!({"id": id, "name": name})).unwrap()
    }

    #[test]
    fn test_dedupe_keeps_first_seen() {
        let stations = vec![
            station("A", "first"),
            station("B", "other"),
            station("A", "second"),
        ];
        let unique = dedupe_first_seen(stations);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "first");
        assert_eq!(unique[1].id, "B");
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe_first_seen(Vec::new()).is_empty());
    }
}

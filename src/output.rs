//! Persistence of per-region results.
//!
//! Every table is a header-plus-rows CSV. Period tables are written to a
//! temporary sibling first and renamed into place, so a reader never sees a
//! half-written file.

use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::aggregate::PeriodTable;
use crate::station::{SelectedStationRow, Station};

/// Writes the full station catalog of a region.
pub fn write_stations(path: &Path, stations: &[Station]) -> Result<()> {
    write_rows(path, stations).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), rows = stations.len(), "Station catalog written");
    Ok(())
}

/// Writes the one-row summary of the chosen station.
pub fn write_selected_station(path: &Path, station: &Station) -> Result<()> {
    write_rows(path, &[SelectedStationRow::from(station)])
        .with_context(|| format!("writing {}", path.display()))
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a period table with its label column (`week_start` / `month_start`)
/// first, then one column per variable. Missing values are left empty.
pub fn write_period_table(path: &Path, table: &PeriodTable) -> Result<()> {
    let tmp = tmp_sibling(path);
    {
        let mut writer = Writer::from_path(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;

        let mut header = vec![table.frequency.label_column().to_string()];
        header.extend(table.columns.iter().cloned());
        writer.write_record(&header)?;

        for row in &table.rows {
            let mut record = vec![row.start.format("%Y-%m-%d").to_string()];
            record.extend(
                row.values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }

    fs::rename(&tmp, path)
        .with_context(|| format!("moving {} into place", path.display()))?;
    debug!(path = %path.display(), rows = table.rows.len(), "Period table written");
    Ok(())
}

pub(crate) fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Serialize)]
struct VariablesFile<'a> {
    vars: &'a [String],
}

/// Records the variable list of a run as `{"vars": [...]}`.
pub fn write_variables_json(path: &Path, variables: &[String]) -> Result<()> {
    let body = serde_json::to_string_pretty(&VariablesFile { vars: variables })?;
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Frequency, PeriodRow};
    use crate::dates::ymd;

    fn table() -> PeriodTable {
        PeriodTable {
            frequency: Frequency::Weekly,
            columns: vec!["PRCP".to_string(), "TMAX".to_string()],
            rows: vec![
                PeriodRow {
                    start: ymd(2020, 1, 6),
                    values: vec![Some(1.5), None],
                },
                PeriodRow {
                    start: ymd(2020, 1, 13),
                    values: vec![Some(0.0), Some(44.25)],
                },
            ],
        }
    }

    #[test]
    fn test_write_period_table_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weekly_selected_station.csv");

        write_period_table(&path, &table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["week_start,PRCP,TMAX", "2020-01-06,1.5,", "2020-01-13,0,44.25"]);
        assert!(!tmp_sibling(&path).exists());
    }

    #[test]
    fn test_write_selected_station_adds_ranking_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selected_station.csv");
        let station: Station = serde_json::from_value(serde_json::json!({
            "id": "GHCND:USW00013876",
            "name": "BIRMINGHAM AIRPORT, AL US",
            "mindate": "2020-01-01",
            "maxdate": "2020-01-31",
            "datacoverage": 1
        }))
        .unwrap();

        write_selected_station(&path, &station).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.ends_with("span_days,is_usw"));
        assert!(content.lines().nth(1).unwrap().ends_with(",30,1"));
    }

    #[test]
    fn test_write_stations_one_row_each() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stations_meta.csv");
        let stations: Vec<Station> = ["A", "B"]
            .iter()
            .map(|id| serde_json::from_value(serde_json::json!({"id": id})).unwrap())
            .collect();

        write_stations(&path, &stations).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.starts_with("id,name,latitude"));
    }

    #[test]
    fn test_write_variables_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variables_selected.json");

        write_variables_json(&path, &["PRCP".to_string()]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["vars"][0], "PRCP");
    }
}

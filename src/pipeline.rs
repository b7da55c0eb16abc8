//! Per-region driver: catalog → select → fetch by year → aggregate → persist.
//!
//! Regions are processed one after another and share nothing but the API
//! client. A region that yields no data is skipped; its period table is only
//! written once every earlier step has succeeded.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::cache::{FsSliceCache, SliceCache};
use crate::catalog::list_stations;
use crate::config::RunConfig;
use crate::daily::fetch_station_daily;
use crate::output::{write_period_table, write_selected_station, write_stations, write_variables_json};
use crate::regions::region_dir_name;
use crate::select::pick_representative;
use crate::services::climate_api::ClimateApi;

pub const STATIONS_META_FILE: &str = "stations_meta.csv";
pub const SELECTED_STATION_FILE: &str = "selected_station.csv";
pub const VARIABLES_FILE: &str = "variables_selected.json";
pub const PARTS_DIR: &str = "parts";

/// How processing of one region ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionOutcome {
    NoStations,
    NoRepresentative,
    NoDailyData { station_id: String },
    EmptyAggregate { station_id: String },
    Written {
        station_id: String,
        path: PathBuf,
        periods: usize,
    },
}

impl RegionOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, RegionOutcome::Written { .. })
    }
}

impl fmt::Display for RegionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionOutcome::NoStations => write!(f, "no stations with the selected datatypes"),
            RegionOutcome::NoRepresentative => write!(f, "no representative station selected"),
            RegionOutcome::NoDailyData { station_id } => {
                write!(f, "no daily data for {station_id}")
            }
            RegionOutcome::EmptyAggregate { station_id } => {
                write!(f, "aggregation empty for {station_id}")
            }
            RegionOutcome::Written { path, periods, .. } => {
                write!(f, "{periods} periods -> {}", path.display())
            }
        }
    }
}

/// Runs every configured region. Failures inside a region are logged and the
/// run moves on; only output-root I/O errors abort.
pub async fn run<A: ClimateApi + ?Sized>(
    api: &A,
    cfg: &RunConfig,
) -> Result<Vec<(String, RegionOutcome)>> {
    fs::create_dir_all(&cfg.outdir)
        .with_context(|| format!("creating {}", cfg.outdir.display()))?;
    write_variables_json(&cfg.outdir.join(VARIABLES_FILE), &cfg.variables)?;

    let mut outcomes = Vec::new();
    for fips in &cfg.states {
        let region_dir = cfg.outdir.join(region_dir_name(fips));
        let mut cache = match FsSliceCache::open(region_dir.join(PARTS_DIR)) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(fips = %fips, error = %e, "Cannot prepare region directory, skipping");
                continue;
            }
        };

        match process_region(api, &mut cache, cfg, fips, &region_dir).await {
            Ok(outcome) => {
                if outcome.is_written() {
                    info!(fips = %fips, %outcome, "Region done");
                } else {
                    info!(fips = %fips, %outcome, "Region skipped");
                }
                outcomes.push((fips.clone(), outcome));
            }
            Err(e) => warn!(fips = %fips, error = ?e, "Region failed, skipping"),
        }
    }

    let written = outcomes.iter().filter(|(_, o)| o.is_written()).count();
    info!(regions = cfg.states.len(), written, "Representative-station aggregation complete");
    Ok(outcomes)
}

/// Processes a single region into `region_dir`.
#[tracing::instrument(skip(api, cache, cfg, region_dir), fields(fips = %fips))]
pub async fn process_region<A, S>(
    api: &A,
    cache: &mut S,
    cfg: &RunConfig,
    fips: &str,
    region_dir: &Path,
) -> Result<RegionOutcome>
where
    A: ClimateApi + ?Sized,
    S: SliceCache + ?Sized,
{
    fs::create_dir_all(region_dir)
        .with_context(|| format!("creating {}", region_dir.display()))?;

    let stations = list_stations(api, fips, &cfg.variables).await?;
    if stations.is_empty() {
        return Ok(RegionOutcome::NoStations);
    }
    write_stations(&region_dir.join(STATIONS_META_FILE), &stations)?;

    let Some(selected) = pick_representative(&stations, cfg.prefer_usw) else {
        return Ok(RegionOutcome::NoRepresentative);
    };
    write_selected_station(&region_dir.join(SELECTED_STATION_FILE), selected)?;
    info!(
        station = %selected.id,
        name = %selected.name,
        span_days = selected.span_days(),
        "Representative station selected"
    );

    let daily = fetch_station_daily(api, cache, selected, &cfg.variables, &cfg.fetch).await;
    if daily.is_empty() {
        return Ok(RegionOutcome::NoDailyData {
            station_id: selected.id.clone(),
        });
    }

    let table = aggregate(&daily, &cfg.variables, cfg.frequency);
    if table.is_empty() {
        return Ok(RegionOutcome::EmptyAggregate {
            station_id: selected.id.clone(),
        });
    }

    let path = region_dir.join(cfg.frequency.table_file_name());
    write_period_table(&path, &table)?;

    Ok(RegionOutcome::Written {
        station_id: selected.id.clone(),
        path,
        periods: table.rows.len(),
    })
}

//! Representative-station selection.
//!
//! Candidates are narrowed by coverage (near-complete first, otherwise the
//! best available) and the survivors are ranked by preferred network, span,
//! earliest start and finally id, so the winner is always unique.

use std::cmp::Ordering;
use tracing::debug;

use crate::dates::cmp_missing_last;
use crate::station::Station;

/// Coverage values this close to each other (or to 1.0) count as equal.
pub const COVERAGE_TOLERANCE: f64 = 1e-6;

/// Picks the single station that stands in for a whole region.
///
/// With `prefer_network` set, the pool is restricted to preferred-network
/// stations whenever at least one exists. Returns `None` for an empty pool.
pub fn pick_representative(stations: &[Station], prefer_network: bool) -> Option<&Station> {
    let mut pool: Vec<&Station> = stations.iter().collect();

    if prefer_network && pool.iter().any(|s| s.is_preferred_network()) {
        pool.retain(|s| s.is_preferred_network());
    }

    let complete: Vec<&Station> = pool
        .iter()
        .copied()
        .filter(|s| coverage(s).is_some_and(|c| c >= 1.0 - COVERAGE_TOLERANCE))
        .collect();
    if !complete.is_empty() {
        debug!(candidates = complete.len(), "Selecting among near-complete coverage");
        return best_ranked(complete);
    }

    let Some(max_cov) = pool.iter().filter_map(|s| coverage(s)).reduce(f64::max) else {
        debug!(candidates = pool.len(), "No coverage reported, ranking full pool");
        return best_ranked(pool);
    };

    let best: Vec<&Station> = pool
        .into_iter()
        .filter(|s| coverage(s).is_some_and(|c| (c - max_cov).abs() <= COVERAGE_TOLERANCE))
        .collect();
    debug!(max_cov, candidates = best.len(), "Selecting among best coverage");
    best_ranked(best)
}

fn coverage(station: &Station) -> Option<f64> {
    station.datacoverage.filter(|c| !c.is_nan())
}

fn best_ranked(candidates: Vec<&Station>) -> Option<&Station> {
    candidates.into_iter().min_by(|a, b| rank_order(a, b))
}

/// Preferred network first, then longest span, earliest start, smallest id.
pub fn rank_order(a: &Station, b: &Station) -> Ordering {
    b.is_preferred_network()
        .cmp(&a.is_preferred_network())
        .then_with(|| b.span_days().cmp(&a.span_days()))
        .then_with(|| cmp_missing_last(a.mindate, b.mindate))
        .then_with(|| a.id.cmp(&b.id))
}

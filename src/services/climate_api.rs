//! Trait for the upstream daily-climate data service.

use async_trait::async_trait;

use crate::config::Units;
use crate::fetch::FetchError;
use crate::observation::Observation;
use crate::slices::YearSlice;
use crate::station::Station;

/// Abstraction over a daily-climate provider (e.g. the NCEI CDO web service).
///
/// Implementations return every page of a listing; paging and retries are
/// their concern, not the caller's.
#[async_trait]
pub trait ClimateApi: Send + Sync {
    /// Stations in region `fips` reporting at least one of `datatypes`.
    async fn stations(&self, fips: &str, datatypes: &[String]) -> Result<Vec<Station>, FetchError>;

    /// Daily observations of `datatypes` at `station_id` within `slice`.
    async fn daily(
        &self,
        station_id: &str,
        slice: &YearSlice,
        datatypes: &[String],
        units: Units,
    ) -> Result<Vec<Observation>, FetchError>;
}

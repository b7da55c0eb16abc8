use tracing::{debug, info, warn};

use crate::cache::{SliceCache, SliceKey};
use crate::config::FetchOptions;
use crate::observation::Observation;
use crate::services::climate_api::ClimateApi;
use crate::slices::year_slices;
use crate::station::Station;

/// Fetches a station's daily data one calendar year at a time.
///
/// A slice that still fails after the client's retries is logged and
/// skipped. With `resume`, slices already in `cache` are not refetched; with
/// `save_raw`, every fetched slice is written to `cache`. Results are
/// concatenated in year order.
#[tracing::instrument(skip_all, fields(station = %station.id))]
pub async fn fetch_station_daily<A, S>(
    api: &A,
    cache: &mut S,
    station: &Station,
    variables: &[String],
    opts: &FetchOptions,
) -> Vec<Observation>
where
    A: ClimateApi + ?Sized,
    S: SliceCache + ?Sized,
{
    let slices = year_slices(station.mindate, station.maxdate, &opts.bound);
    info!(slices = slices.len(), "Fetching daily data by year");

    let mut daily = Vec::new();
    for slice in &slices {
        let key = SliceKey::new(&station.id, slice.year);

        if opts.resume && cache.contains(&key) {
            match cache.load(&key) {
                Ok(rows) => {
                    debug!(year = slice.year, rows = rows.len(), "Using cached slice");
                    daily.extend(rows);
                    continue;
                }
                Err(e) => {
                    warn!(year = slice.year, error = %e, "Cached slice unreadable, refetching");
                }
            }
        }

        let rows = match api.daily(&station.id, slice, variables, opts.units).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(year = slice.year, error = %e, "Slice fetch failed, skipping");
                continue;
            }
        };

        if opts.save_raw {
            if let Err(e) = cache.store(&key, &rows) {
                warn!(year = slice.year, error = %e, "Failed to persist slice");
            }
        }

        debug!(year = slice.year, rows = rows.len(), "Slice fetched");
        daily.extend(rows);
    }

    daily
}

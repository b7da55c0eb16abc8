use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Units;
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, FetchError, HttpClient, RetryPolicy, request_json};
use crate::observation::Observation;
use crate::services::climate_api::ClimateApi;
use crate::slices::YearSlice;
use crate::station::Station;

pub const CDO_BASE_URL: &str = "https://www.ncei.noaa.gov/cdo-web/api/v2";
pub const DATASET_ID: &str = "GHCND";

const PAGE_LIMIT: usize = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);
const PAGE_PAUSE: Duration = Duration::from_millis(200);

/// Client for the NCEI Climate Data Online v2 web service.
///
/// Requests are issued one at a time with a short pause between pages.
pub struct NceiClient<C = ApiKey<BasicClient>> {
    http: C,
    base_url: String,
    policy: RetryPolicy,
    page_limit: usize,
    page_pause: Duration,
}

impl NceiClient {
    /// Production client: token header, 40 s timeout, default retry policy.
    pub fn new(token: &str) -> Result<Self> {
        let http = ApiKey::cdo_token(BasicClient::with_timeout(REQUEST_TIMEOUT)?, token)?;
        Ok(Self::with_client(http, CDO_BASE_URL))
    }
}

impl<C: HttpClient> NceiClient<C> {
    pub fn with_client(http: C, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy: RetryPolicy::default(),
            page_limit: PAGE_LIMIT,
            page_pause: PAGE_PAUSE,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    pub fn with_page_pause(mut self, page_pause: Duration) -> Self {
        self.page_pause = page_pause;
        self
    }

    /// Requests successive 1-based offset pages until one comes back without
    /// results, and returns every record seen.
    async fn paginate(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<Value>, FetchError> {
        let mut rows = Vec::new();
        let mut offset = 1usize;

        loop {
            let mut url = Url::parse(&format!("{}/{}", self.base_url, endpoint))
                .map_err(|e| FetchError::Url(e.to_string()))?;
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
                .append_pair("limit", &self.page_limit.to_string())
                .append_pair("offset", &offset.to_string());

            let page = request_json(&self.http, &self.policy, &url).await?;
            let results = page_results(page);
            if results.is_empty() {
                break;
            }

            debug!(endpoint, offset, records = results.len(), "Page received");
            rows.extend(results);
            offset += self.page_limit;
            tokio::time::sleep(self.page_pause).await;
        }

        Ok(rows)
    }
}

fn page_results(page: Option<Value>) -> Vec<Value> {
    match page.and_then(|mut body| body.get_mut("results").map(Value::take)) {
        Some(Value::Array(results)) => results,
        _ => Vec::new(),
    }
}

/// Decodes records one by one, dropping (and logging) any that do not fit.
fn decode_records<T: DeserializeOwned>(rows: Vec<Value>, kind: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind, error = %e, "Dropping malformed record");
                None
            }
        })
        .collect()
}

fn datatype_params(datatypes: &[String]) -> impl Iterator<Item = (&'static str, String)> + '_ {
    datatypes.iter().map(|d| ("datatypeid", d.clone()))
}

#[async_trait]
impl<C: HttpClient> ClimateApi for NceiClient<C> {
    #[tracing::instrument(skip(self, datatypes), fields(fips = %fips))]
    async fn stations(&self, fips: &str, datatypes: &[String]) -> Result<Vec<Station>, FetchError> {
        let mut params = vec![
            ("datasetid", DATASET_ID.to_string()),
            ("locationid", format!("FIPS:{fips}")),
        ];
        params.extend(datatype_params(datatypes));

        let rows = self.paginate("stations", &params).await?;
        Ok(decode_records(rows, "station"))
    }

    #[tracing::instrument(skip(self, datatypes), fields(station = %station_id, year = slice.year))]
    async fn daily(
        &self,
        station_id: &str,
        slice: &YearSlice,
        datatypes: &[String],
        units: Units,
    ) -> Result<Vec<Observation>, FetchError> {
        let mut params = vec![
            ("datasetid", DATASET_ID.to_string()),
            ("stationid", station_id.to_string()),
            ("startdate", slice.start.format("%Y-%m-%d").to_string()),
            ("enddate", slice.end.format("%Y-%m-%d").to_string()),
            ("units", units.as_str().to_string()),
        ];
        params.extend(datatype_params(datatypes));

        let rows = self.paginate("data", &params).await?;
        Ok(decode_records(rows, "observation"))
    }
}

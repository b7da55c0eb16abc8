//! Run configuration shared by the CLI and the pipeline.

use anyhow::{Result, bail};
use clap::ValueEnum;
use std::path::PathBuf;

use crate::aggregate::Frequency;
use crate::slices::HistoricalBound;

/// Unit system requested from the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Units {
    #[default]
    Standard,
    Metric,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
        }
    }
}

/// How daily slices are fetched and cached.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub units: Units,
    /// Reuse slices persisted by an earlier run instead of refetching them.
    pub resume: bool,
    /// Persist every fetched slice, empty ones included.
    pub save_raw: bool,
    pub bound: HistoricalBound,
}

/// Everything one `fetch` run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub outdir: PathBuf,
    pub variables: Vec<String>,
    pub states: Vec<String>,
    pub frequency: Frequency,
    pub prefer_usw: bool,
    pub fetch: FetchOptions,
}

/// Splits a comma-separated option value, trimming blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Environment variable holding the CDO access token.
pub const TOKEN_ENV: &str = "NOAA_TOKEN";

/// Validates a raw token value; a missing or blank token is an error.
pub fn resolve_token(raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => bail!("{TOKEN_ENV} is required"),
    }
}

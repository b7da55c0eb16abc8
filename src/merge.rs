//! Merge of per-region period tables into one national table.
//!
//! For each region the monthly table is preferred over the weekly one. The
//! period column is renamed to `period_start`, every row is tagged with
//! frequency, FIPS code and state name, and variable columns are unioned
//! across regions. Values pass through as written.

use chrono::NaiveDate;
use csv::Writer;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::aggregate::Frequency;
use crate::dates::{cmp_missing_last, parse_date_prefix};
use crate::regions::{region_dir_name, state_name};

pub const DEFAULT_OUTFILE: &str = "GHCND_US_period_summary.csv";
const KEY_COLUMNS: [&str; 4] = ["period_start", "frequency", "fips", "state"];

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("missing state files for FIPS: {}", .0.join(", "))]
    MissingRegions(Vec<String>),

    #[error("no inputs found, nothing to merge")]
    NoInputs,

    #[error("mixed frequencies found: {}; use weekly OR monthly only, or omit --strict-same-freq", frequency_list(.0))]
    MixedFrequencies(Vec<Frequency>),

    #[error("failed writing {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl MergeError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            MergeError::NoInputs | MergeError::Write { .. } => 1,
            MergeError::MissingRegions(_) => 2,
            MergeError::MixedFrequencies(_) => 3,
        }
    }
}

fn frequency_list(freqs: &[Frequency]) -> String {
    freqs.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub indir: PathBuf,
    pub outfile: PathBuf,
    pub states: Vec<String>,
    /// Also write a long (one row per period × variable) table.
    pub long: bool,
    /// Fail when any region has no usable table.
    pub require_all: bool,
    pub sort: bool,
    /// Fail when regions disagree on frequency.
    pub strict_same_freq: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub period_start: Option<NaiveDate>,
    pub frequency: Frequency,
    pub fips: String,
    pub state: String,
    pub values: HashMap<String, String>,
}

/// One region's table after normalization.
#[derive(Debug, Clone)]
pub struct RegionInput {
    pub fips: String,
    pub frequency: Frequency,
    pub variables: Vec<String>,
    pub rows: Vec<MergedRow>,
}

#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub out_path: PathBuf,
    pub long_path: Option<PathBuf>,
    pub regions: usize,
    pub rows: usize,
    pub variables: Vec<String>,
    pub frequencies: Vec<Frequency>,
    pub missing: Vec<String>,
}

/// Finds the table for a region, monthly first.
pub fn locate_region_file(indir: &Path, fips: &str) -> Option<(PathBuf, Frequency)> {
    let base = indir.join(region_dir_name(fips));
    [Frequency::Monthly, Frequency::Weekly]
        .into_iter()
        .map(|f| (base.join(f.table_file_name()), f))
        .find(|(path, _)| path.exists())
}

/// Reads and normalizes one region. Unreadable, empty or mis-shaped tables
/// are logged and reported as `None`.
pub fn read_region(indir: &Path, fips: &str) -> Option<RegionInput> {
    let (path, frequency) = locate_region_file(indir, fips)?;

    let mut rdr = match csv::Reader::from_path(&path) {
        Ok(rdr) => rdr,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read region table");
            return None;
        }
    };
    let headers = match rdr.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read region table header");
            return None;
        }
    };

    let label = frequency.label_column();
    let Some(label_idx) = headers.iter().position(|h| h == label) else {
        warn!(path = %path.display(), column = label, "Period column missing, skipping");
        return None;
    };
    let variables: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != label_idx && !KEY_COLUMNS.contains(h))
        .map(|(_, h)| h.to_string())
        .collect();

    let state = state_name(fips).unwrap_or(fips).to_string();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read region table");
                return None;
            }
        };
        let values = headers
            .iter()
            .zip(record.iter())
            .filter(|(h, _)| variables.iter().any(|v| v.as_str() == *h))
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(MergedRow {
            period_start: record.get(label_idx).and_then(parse_date_prefix),
            frequency,
            fips: fips.to_string(),
            state: state.clone(),
            values,
        });
    }

    if rows.is_empty() {
        return None;
    }

    Some(RegionInput {
        fips: fips.to_string(),
        frequency,
        variables,
        rows,
    })
}

/// Merges every configured region and writes the national table(s).
pub fn merge(opts: &MergeOptions) -> Result<MergeSummary, MergeError> {
    let mut inputs = Vec::new();
    let mut missing = Vec::new();
    for fips in &opts.states {
        match read_region(&opts.indir, fips) {
            Some(input) => inputs.push(input),
            None => missing.push(fips.clone()),
        }
    }

    if !missing.is_empty() {
        if opts.require_all {
            return Err(MergeError::MissingRegions(missing));
        }
        info!(missing = %missing.join(", "), "Missing state files");
    }

    if inputs.is_empty() {
        return Err(MergeError::NoInputs);
    }

    let mut frequencies: Vec<Frequency> = inputs.iter().map(|i| i.frequency).collect();
    frequencies.sort_by_key(|f| f.as_str());
    frequencies.dedup();
    let mixed = frequencies.len() > 1;

    if opts.strict_same_freq && mixed {
        return Err(MergeError::MixedFrequencies(frequencies));
    }

    let variables: Vec<String> = inputs
        .iter()
        .flat_map(|i| i.variables.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let regions = inputs.len();
    let mut rows: Vec<MergedRow> = inputs.into_iter().flat_map(|i| i.rows).collect();
    if opts.sort {
        rows.sort_by(|a, b| {
            cmp_missing_last(a.period_start, b.period_start)
                .then_with(|| cmp_frequency(a, b, mixed))
                .then_with(|| a.fips.cmp(&b.fips))
        });
    }

    let out_path = resolve_out_path(&opts.indir, &opts.outfile, &frequencies);
    write_wide(&out_path, &rows, &variables).map_err(|source| MergeError::Write {
        path: out_path.clone(),
        source,
    })?;
    info!(path = %out_path.display(), rows = rows.len(), "US-wide merged (wide)");

    let long_path = if opts.long {
        let path = long_path_for(&out_path);
        write_long(&path, &rows, &variables, opts.sort, mixed).map_err(|source| {
            MergeError::Write {
                path: path.clone(),
                source,
            }
        })?;
        info!(path = %path.display(), "US-wide merged (long)");
        Some(path)
    } else {
        None
    };

    Ok(MergeSummary {
        out_path,
        long_path,
        regions,
        rows: rows.len(),
        variables,
        frequencies,
        missing,
    })
}

fn cmp_frequency(a: &MergedRow, b: &MergedRow, mixed: bool) -> Ordering {
    if mixed {
        a.frequency.as_str().cmp(b.frequency.as_str())
    } else {
        Ordering::Equal
    }
}

/// Relative outfiles land in `indir`. The default name is specialized to
/// `GHCND_US_<freq>_summary.csv` when every region shares one frequency.
pub fn resolve_out_path(indir: &Path, outfile: &Path, frequencies: &[Frequency]) -> PathBuf {
    if outfile.is_absolute() {
        return outfile.to_path_buf();
    }
    if outfile.file_name() == Some(OsStr::new(DEFAULT_OUTFILE)) {
        if let [only] = frequencies {
            return indir.join(format!("GHCND_US_{}_summary.csv", only.as_str()));
        }
    }
    indir.join(outfile)
}

/// `x.csv` → `x_long.csv`
pub fn long_path_for(path: &Path) -> PathBuf {
    let name = path.file_name().and_then(OsStr::to_str).unwrap_or_default();
    let long_name = match name.strip_suffix(".csv") {
        Some(stem) => format!("{stem}_long.csv"),
        None => format!("{name}_long"),
    };
    path.with_file_name(long_name)
}

fn format_period(period: Option<NaiveDate>) -> String {
    period
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn write_wide(path: &Path, rows: &[MergedRow], variables: &[String]) -> Result<(), csv::Error> {
    let mut writer = Writer::from_path(path)?;

    let mut header: Vec<&str> = KEY_COLUMNS.to_vec();
    header.extend(variables.iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in rows {
        let period = format_period(row.period_start);
        let mut record = vec![
            period.as_str(),
            row.frequency.as_str(),
            row.fips.as_str(),
            row.state.as_str(),
        ];
        record.extend(
            variables
                .iter()
                .map(|v| row.values.get(v).map(String::as_str).unwrap_or("")),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_long(
    path: &Path,
    rows: &[MergedRow],
    variables: &[String],
    sort: bool,
    mixed: bool,
) -> Result<(), csv::Error> {
    let mut long: Vec<(&MergedRow, &str)> = variables
        .iter()
        .flat_map(|v| rows.iter().map(move |r| (r, v.as_str())))
        .collect();

    if sort {
        long.sort_by(|(a, va), (b, vb)| {
            cmp_missing_last(a.period_start, b.period_start)
                .then_with(|| va.cmp(vb))
                .then_with(|| cmp_frequency(a, b, mixed))
                .then_with(|| a.fips.cmp(&b.fips))
        });
    }

    let mut writer = Writer::from_path(path)?;
    writer.write_record(KEY_COLUMNS.iter().chain(&["variable", "value"]))?;
    for (row, variable) in long {
        let period = format_period(row.period_start);
        let value = row.values.get(variable).map(String::as_str).unwrap_or("");
        writer.write_record([
            period.as_str(),
            row.frequency.as_str(),
            row.fips.as_str(),
            row.state.as_str(),
            variable,
            value,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        assert_eq!(MergeError::NoInputs.exit_code(), 1);
        assert_eq!(MergeError::MissingRegions(vec!["01".into()]).exit_code(), 2);
        assert_eq!(
            MergeError::MixedFrequencies(vec![Frequency::Monthly, Frequency::Weekly]).exit_code(),
            3
        );
    }

    #[test]
    fn test_mixed_frequency_message() {
        let err = MergeError::MixedFrequencies(vec![Frequency::Monthly, Frequency::Weekly]);
        assert!(err.to_string().starts_with("mixed frequencies found: monthly, weekly"));
    }

    #[test]
    fn test_default_outfile_specialized_for_uniform_frequency() {
        let indir = Path::new("out");
        let outfile = Path::new(DEFAULT_OUTFILE);
        assert_eq!(
            resolve_out_path(indir, outfile, &[Frequency::Weekly]),
            indir.join("GHCND_US_weekly_summary.csv")
        );
        assert_eq!(
            resolve_out_path(indir, outfile, &[Frequency::Monthly, Frequency::Weekly]),
            indir.join(DEFAULT_OUTFILE)
        );
    }

    #[test]
    fn test_custom_and_absolute_outfiles() {
        let indir = Path::new("out");
        assert_eq!(
            resolve_out_path(indir, Path::new("us.csv"), &[Frequency::Weekly]),
            indir.join("us.csv")
        );
        let abs = std::env::temp_dir().join(DEFAULT_OUTFILE);
        assert_eq!(resolve_out_path(indir, &abs, &[Frequency::Weekly]), abs);
    }

    #[test]
    fn test_long_path_for() {
        assert_eq!(long_path_for(Path::new("a/us.csv")), Path::new("a/us_long.csv"));
        assert_eq!(long_path_for(Path::new("a/us")), Path::new("a/us_long"));
    }
}

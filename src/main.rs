//! CLI entry point for the GHCND representative-station rollup.
//!
//! Provides subcommands for fetching and aggregating one representative
//! station per state, inspecting a state's station catalog, and merging the
//! per-state tables into a single US-wide table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ghcnd_rollup::{
    aggregate::Frequency,
    catalog::list_stations,
    config::{FetchOptions, RunConfig, TOKEN_ENV, Units, parse_list, resolve_token},
    infra::ncei::NceiClient,
    merge::{DEFAULT_OUTFILE, MergeOptions, merge},
    pipeline,
    regions::{default_states_arg, default_vars_arg},
    select::pick_representative,
    slices::HistoricalBound,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ghcnd_rollup")]
#[command(about = "Per-state representative GHCND station -> daily -> weekly/monthly", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick one station per state, fetch its daily data and aggregate it
    Fetch {
        /// Output directory
        #[arg(long, default_value = "ghcnd_out_rep")]
        outdir: PathBuf,

        /// Comma-separated GHCND datatype IDs to fetch
        #[arg(long, default_value_t = default_vars_arg())]
        vars: String,

        /// Comma-separated 2-digit FIPS codes (50 states by default)
        #[arg(long, default_value_t = default_states_arg())]
        states: String,

        /// Unit system requested from the API
        #[arg(long, value_enum, default_value_t = Units::Standard)]
        units: Units,

        /// Aggregation frequency: Monday-anchored weeks or calendar months
        #[arg(long, value_enum, default_value_t = Frequency::Weekly)]
        freq: Frequency,

        /// Prefer USW stations when choosing the representative
        #[arg(long, default_value_t = false)]
        prefer_usw: bool,

        /// Save per-year raw CSVs under parts/
        #[arg(long, default_value_t = false)]
        save_raw: bool,

        /// Skip fetching a year whose file already exists under parts/
        #[arg(long, default_value_t = false)]
        resume: bool,

        /// Earliest day fetched for any station
        #[arg(long, default_value = "2002-01-01")]
        bound_start: NaiveDate,

        /// Latest day fetched for any station
        #[arg(long, default_value = "2025-12-31")]
        bound_end: NaiveDate,
    },
    /// List a state's candidate stations and the one that would be selected
    ListStations {
        /// 2-digit FIPS code
        #[arg(long)]
        state: String,

        /// Comma-separated GHCND datatype IDs
        #[arg(long, default_value_t = default_vars_arg())]
        vars: String,

        /// Prefer USW stations when choosing the representative
        #[arg(long, default_value_t = false)]
        prefer_usw: bool,
    },
    /// Merge per-state weekly/monthly tables into one US-wide table
    Merge {
        /// Base directory containing FIPS_XX subfolders
        #[arg(long, default_value = "ghcnd_out_rep")]
        indir: PathBuf,

        /// Output CSV (relative paths resolve under --indir)
        #[arg(long, default_value = DEFAULT_OUTFILE)]
        outfile: PathBuf,

        /// Comma-separated 2-digit FIPS codes (50 states by default)
        #[arg(long, default_value_t = default_states_arg())]
        states: String,

        /// Also write a long/tidy version as *_long.csv
        #[arg(long, default_value_t = false)]
        long: bool,

        /// Error out if any state's file is missing
        #[arg(long, default_value_t = false)]
        require_all: bool,

        /// Sort rows by period and FIPS
        #[arg(long, default_value_t = false)]
        sort: bool,

        /// Require all inputs to share one frequency
        #[arg(long, default_value_t = false)]
        strict_same_freq: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ghcnd_rollup.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ghcnd_rollup.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            outdir,
            vars,
            states,
            units,
            freq,
            prefer_usw,
            save_raw,
            resume,
            bound_start,
            bound_end,
        } => {
            let client = NceiClient::new(&require_token()?)?;
            let cfg = RunConfig {
                outdir,
                variables: parse_list(&vars),
                states: parse_list(&states),
                frequency: freq,
                prefer_usw,
                fetch: FetchOptions {
                    units,
                    resume,
                    save_raw,
                    bound: HistoricalBound {
                        start: bound_start,
                        end: bound_end,
                    },
                },
            };

            info!(
                outdir = %cfg.outdir.display(),
                states = cfg.states.len(),
                vars = ?cfg.variables,
                freq = %cfg.frequency,
                "Starting representative-station run"
            );
            pipeline::run(&client, &cfg).await?;
        }
        Commands::ListStations {
            state,
            vars,
            prefer_usw,
        } => {
            let client = NceiClient::new(&require_token()?)?;
            let variables = parse_list(&vars);
            let stations = list_stations(&client, &state, &variables)
                .await
                .context("station listing failed")?;

            for station in &stations {
                info!(
                    id = %station.id,
                    name = %station.name,
                    coverage = ?station.datacoverage,
                    mindate = ?station.mindate,
                    maxdate = ?station.maxdate,
                    span_days = station.span_days(),
                    "Station"
                );
            }

            match pick_representative(&stations, prefer_usw) {
                Some(selected) => info!(
                    id = %selected.id,
                    name = %selected.name,
                    span_days = selected.span_days(),
                    "Would select"
                ),
                None => info!(fips = %state, "No representative station selectable"),
            }
        }
        Commands::Merge {
            indir,
            outfile,
            states,
            long,
            require_all,
            sort,
            strict_same_freq,
        } => {
            let opts = MergeOptions {
                indir,
                outfile,
                states: parse_list(&states),
                long,
                require_all,
                sort,
                strict_same_freq,
            };

            match merge(&opts) {
                Ok(summary) => info!(
                    path = %summary.out_path.display(),
                    regions = summary.regions,
                    rows = summary.rows,
                    "Merge complete"
                ),
                Err(e) => {
                    error!(error = %e, "Merge failed");
                    drop(file_guard);
                    std::process::exit(e.exit_code());
                }
            }
        }
    }

    Ok(())
}

/// Reads the CDO access token. A missing token ends the run with status 1
/// once `main` returns and the log writers have flushed.
fn require_token() -> Result<String> {
    let raw = std::env::var(TOKEN_ENV).ok();
    resolve_token(raw.as_deref()).inspect_err(|_| {
        error!(var = TOKEN_ENV, "Token is required. Exiting.");
    })
}

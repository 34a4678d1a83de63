use anyhow::{Context, Result};
use clap::Parser;
use finscraper::{
    batch::run_batch,
    config::{resolve, FileConfig, Overrides},
    dataset::{self, open_store, MergeOutcome},
    fetch::HttpTableSource,
    mode::ScrapeMode,
};
use std::{fs, path::PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Scrape financial results tables and append them to a dataset"
)]
struct Args {
    /// Page family to scrape
    #[arg(short, long, value_enum)]
    mode: Option<ScrapeMode>,

    /// Security codes, symbols or URLs, comma or newline separated
    #[arg(short, long)]
    codes: Option<String>,

    /// File with one code or URL per line
    #[arg(long)]
    codes_file: Option<PathBuf>,

    /// Extra metrics to extract, comma separated
    #[arg(long)]
    metrics: Option<String>,

    /// Replace the default metric selection, comma separated
    #[arg(long)]
    only_metrics: Option<String>,

    /// Extra periods appended after the selection, comma separated
    #[arg(long)]
    periods: Option<String>,

    /// Replace the default period selection, comma separated, in output order
    #[arg(long)]
    only_periods: Option<String>,

    /// Match metric names case-sensitively
    #[arg(long, conflicts_with = "case_insensitive")]
    case_sensitive: bool,

    /// Match metric names ignoring case
    #[arg(long)]
    case_insensitive: bool,

    /// Dataset file (.csv or .parquet)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML job file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause after each page load, in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,

    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long)]
    retries: Option<u32>,
}

impl Args {
    fn overrides(self) -> Result<Overrides> {
        let mut codes = self.codes.unwrap_or_default();
        if let Some(path) = &self.codes_file {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading codes file {}", path.display()))?;
            codes.push('\n');
            codes.push_str(&text);
        }
        let case_sensitive = match (self.case_sensitive, self.case_insensitive) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Ok(Overrides {
            mode: self.mode,
            codes: Some(codes),
            only_metrics: self.only_metrics,
            extra_metrics: self.metrics,
            only_periods: self.only_periods,
            extra_periods: self.periods,
            case_sensitive,
            output: self.output,
            settle_ms: self.settle_ms,
            timeout_secs: self.timeout_secs,
            retries: self.retries,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) resolve job ──────────────────────────────────────────────
    let args = Args::parse();
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let job = resolve(file, args.overrides()?)?;
    info!(
        mode = %job.mode,
        sources = job.identifiers.len(),
        metrics = job.metrics.len(),
        periods = job.periods.len(),
        output = %job.output.display(),
        "startup"
    );
    let store = open_store(&job.output)?;

    // ─── 3) scrape every source, one at a time ───────────────────────
    let report = {
        let http = HttpTableSource::for_mode(job.fetch.clone(), job.mode)?;
        let report = run_batch(&http, &job).await;
        drop(http);
        debug!("http session released");
        report
    };
    for failure in &report.failures {
        warn!("{} → {}", failure.identifier, failure.error);
    }

    // ─── 4) merge into the dataset ───────────────────────────────────
    match dataset::commit(store.as_ref(), &report.records) {
        Ok(MergeOutcome::Skipped) => warn!("No new data to save!"),
        Ok(MergeOutcome::Saved {
            new_rows,
            total_rows,
        }) => info!(
            "Saved {} new entries ({} total) to {}",
            new_rows,
            total_rows,
            store.path().display()
        ),
        Err(e) => {
            error!("save failed: {}", e);
            return Err(e).context("saving dataset");
        }
    }

    info!("all done");
    Ok(())
}

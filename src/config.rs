// src/config.rs

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::fetch::FetchConfig;
use crate::mode::ScrapeMode;
use crate::selection::{parse_identifiers, split_tokens, MetricSpec, PeriodSpec, DEFAULT_METRICS};
use crate::table::MatchMode;

/// Contents of an optional YAML job file.
///
/// ```yaml
/// mode: annual
/// codes: ["500325", "532540"]
/// extra_metrics: ["EPS"]
/// extra_periods: ["2019"]
/// output: data/Annual_Data_Filled.csv
/// fetch:
///   timeout_secs: 20
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub mode: Option<ScrapeMode>,
    pub codes: Vec<String>,
    /// Metric keys to extract; all defaults when absent.
    pub metrics: Option<Vec<String>>,
    pub extra_metrics: Vec<String>,
    /// Periods in output order; the mode's defaults when absent.
    pub periods: Option<Vec<String>>,
    pub extra_periods: Vec<String>,
    pub case_sensitive: Option<bool>,
    pub output: Option<PathBuf>,
    pub fetch: FetchConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ScrapeError::Config(format!("reading {:?}: {}", path, e)))?;
        let cfg: FileConfig = serde_yaml::from_str(&text)
            .map_err(|e| ScrapeError::Config(format!("parsing {:?}: {}", path, e)))?;
        debug!(?path, "loaded job file");
        Ok(cfg)
    }
}

/// Command-line values. Free-text fields use the comma/newline rules of
/// [`crate::selection`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mode: Option<ScrapeMode>,
    pub codes: Option<String>,
    pub only_metrics: Option<String>,
    pub extra_metrics: Option<String>,
    pub only_periods: Option<String>,
    pub extra_periods: Option<String>,
    pub case_sensitive: Option<bool>,
    pub output: Option<PathBuf>,
    pub settle_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
}

/// Everything one batch run needs.
#[derive(Debug, Clone)]
pub struct Job {
    pub mode: ScrapeMode,
    pub identifiers: Vec<String>,
    pub metrics: MetricSpec,
    pub periods: PeriodSpec,
    pub match_mode: MatchMode,
    pub output: PathBuf,
    pub fetch: FetchConfig,
}

/// Layer command-line values over the job file over the mode defaults.
pub fn resolve(file: FileConfig, cli: Overrides) -> Result<Job> {
    let mode = cli.mode.or(file.mode).unwrap_or_default();

    let identifiers = match cli.codes.as_deref().map(parse_identifiers) {
        Some(ids) if !ids.is_empty() => ids,
        _ => file
            .codes
            .iter()
            .flat_map(|c| parse_identifiers(c))
            .collect(),
    };
    if identifiers.is_empty() {
        return Err(ScrapeError::Config("no company codes or URLs given".into()));
    }

    let selected: Vec<String> = match (cli.only_metrics.as_deref(), file.metrics) {
        (Some(only), _) => split_tokens(only),
        (None, Some(list)) => list,
        (None, None) => DEFAULT_METRICS.iter().map(|(k, _)| k.to_string()).collect(),
    };
    let mut extra = file.extra_metrics.join(",");
    if let Some(more) = cli.extra_metrics.as_deref() {
        extra.push(',');
        extra.push_str(more);
    }
    let metrics = MetricSpec::from_selection(&selected, &extra);
    if metrics.is_empty() {
        return Err(ScrapeError::Config("no metrics selected".into()));
    }

    let mut periods = match (cli.only_periods.as_deref(), file.periods) {
        (Some(only), _) => PeriodSpec::new(split_tokens(only)),
        (None, Some(list)) => PeriodSpec::new(list),
        (None, None) => PeriodSpec::new(mode.default_periods()),
    };
    periods.extend(file.extra_periods);
    if let Some(more) = cli.extra_periods.as_deref() {
        periods.extend(split_tokens(more));
    }
    if periods.is_empty() {
        return Err(ScrapeError::Config("no periods selected".into()));
    }

    let match_mode = cli
        .case_sensitive
        .or(file.case_sensitive)
        .map(MatchMode::from_flag)
        .unwrap_or_default();

    let output = cli
        .output
        .or(file.output)
        .unwrap_or_else(|| PathBuf::from(format!("{}.csv", mode.dataset_stem())));

    let mut fetch = file.fetch;
    if let Some(ms) = cli.settle_ms {
        fetch.settle_ms = ms;
    }
    if let Some(secs) = cli.timeout_secs {
        fetch.timeout_secs = secs;
    }
    if let Some(n) = cli.retries {
        fetch.max_retries = n;
    }

    Ok(Job {
        mode,
        identifiers,
        metrics,
        periods,
        match_mode,
        output,
        fetch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(s: &str) -> Overrides {
        Overrides {
            codes: Some(s.into()),
            ..Overrides::default()
        }
    }

    #[test]
    fn defaults_follow_mode() {
        let job = resolve(
            FileConfig::default(),
            Overrides {
                mode: Some(ScrapeMode::Annual),
                ..codes("500325")
            },
        )
        .unwrap();
        assert_eq!(job.metrics.len(), 11);
        assert_eq!(job.periods.iter().next(), Some("2025"));
        assert_eq!(job.match_mode, MatchMode::CaseInsensitive);
        assert_eq!(job.output, PathBuf::from("Annual_Data_Filled.csv"));
    }

    #[test]
    fn default_job_matches_metrics_ignoring_case() {
        let job = resolve(FileConfig::default(), codes("500325")).unwrap();
        assert_eq!(job.mode, ScrapeMode::Quarterly);
        assert_eq!(job.match_mode, MatchMode::CaseInsensitive);

        let table = crate::table::RawTable::new(
            None,
            vec![
                vec!["".into(), "Dec-24".into()],
                vec!["  total income  ".into(), "100".into()],
            ],
        )
        .normalize()
        .unwrap();
        let rec = crate::project::project(
            &table,
            &job.metrics,
            &job.periods,
            job.match_mode,
            "Acme",
        );
        assert_eq!(rec.get("Total Income (Dec-24)"), Some("100"));
    }

    #[test]
    fn case_sensitive_is_opt_in() {
        let job = resolve(
            FileConfig::default(),
            Overrides {
                case_sensitive: Some(true),
                ..codes("500325")
            },
        )
        .unwrap();
        assert_eq!(job.match_mode, MatchMode::CaseSensitive);
    }

    #[test]
    fn missing_codes_is_config_error() {
        let err = resolve(FileConfig::default(), Overrides::default()).unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn cli_overrides_file() {
        let file: FileConfig = serde_yaml::from_str(
            "mode: screener\ncodes: [TCS]\nperiods: [Mar 2024]\ncase_sensitive: true\nfetch:\n  settle_ms: 100\n",
        )
        .unwrap();
        let job = resolve(
            file,
            Overrides {
                only_metrics: Some("Sales +, Net Profit +".into()),
                extra_periods: Some("Dec 2023".into()),
                case_sensitive: Some(false),
                settle_ms: Some(5),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(job.mode, ScrapeMode::Screener);
        assert_eq!(job.identifiers, vec!["TCS"]);
        assert_eq!(job.metrics.len(), 2);
        let periods: Vec<_> = job.periods.iter().collect();
        assert_eq!(periods, vec!["Mar 2024", "Dec 2023"]);
        assert_eq!(job.match_mode, MatchMode::CaseInsensitive);
        assert_eq!(job.fetch.settle_ms, 5);
        assert_eq!(job.fetch.timeout_secs, FetchConfig::default().timeout_secs);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<FileConfig>("sheet: x.xlsx\n").is_err());
    }
}

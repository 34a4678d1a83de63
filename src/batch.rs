// src/batch.rs

use tracing::{info, instrument, warn};

use crate::config::Job;
use crate::error::{Result, ScrapeError};
use crate::fetch::{Source, TableSource};
use crate::project::{company_name, project, CompanyRecord};

/// A source that produced no record, and why.
#[derive(Debug)]
pub struct SourceFailure {
    pub identifier: String,
    pub error: ScrapeError,
}

/// Outcome of visiting every source of a job.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub attempted: usize,
    pub records: Vec<CompanyRecord>,
    pub failures: Vec<SourceFailure>,
}

impl BatchReport {
    pub fn summary(&self) -> String {
        format!(
            "{} of {} sources produced a record, {} failed",
            self.records.len(),
            self.attempted,
            self.failures.len()
        )
    }
}

/// Fetch, normalize and project a single source.
pub async fn scrape_one<T: TableSource>(
    tables: &T,
    source: &Source,
    job: &Job,
) -> Result<CompanyRecord> {
    let raw = tables.fetch(source).await?;
    let title = raw.title.clone();
    let table = raw.normalize()?;
    let name = company_name(title.as_deref(), source.fallback_name.as_deref());
    Ok(project(
        &table,
        &job.metrics,
        &job.periods,
        job.match_mode,
        name,
    ))
}

/// Visit every identifier of `job` in order, one at a time.
///
/// A failing source is logged and recorded in the report; it never stops the
/// batch.
#[instrument(level = "info", skip_all, fields(mode = %job.mode, sources = job.identifiers.len()))]
pub async fn run_batch<T: TableSource>(tables: &T, job: &Job) -> BatchReport {
    let total = job.identifiers.len();
    let mut report = BatchReport {
        attempted: total,
        ..BatchReport::default()
    };

    for (idx, id) in job.identifiers.iter().enumerate() {
        let outcome = match Source::resolve(id, job.mode) {
            Ok(source) => {
                info!("({}/{}) processing {}", idx + 1, total, source.url);
                scrape_one(tables, &source, job).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => {
                info!(company = record.company_name(), "record extracted");
                report.records.push(record);
            }
            Err(error) => {
                warn!(id = %id, error = %error, "skipping source");
                report.failures.push(SourceFailure {
                    identifier: id.clone(),
                    error,
                });
            }
        }
    }

    info!("{}", report.summary());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, FileConfig, Overrides};
    use crate::table::RawTable;
    use std::cell::RefCell;

    /// Serves canned tables by identifier and remembers the visiting order.
    struct FakeSource {
        visited: RefCell<Vec<String>>,
    }

    impl TableSource for FakeSource {
        async fn fetch(&self, source: &Source) -> Result<RawTable> {
            self.visited.borrow_mut().push(source.identifier.clone());
            let row = |c: &[&str]| c.iter().map(|s| s.to_string()).collect::<Vec<_>>();
            match source.identifier.as_str() {
                "down" => Err(ScrapeError::fetch(source.url.as_str(), "connection reset")),
                "blank" => Ok(RawTable::new(Some("Blank | BSE".into()), vec![row(&["", " "])])),
                "untitled" => Ok(RawTable::new(
                    None,
                    vec![row(&["", "2024"]), row(&["Tax", "4"])],
                )),
                _ => Ok(RawTable::new(
                    Some(format!("{} Ltd | BSE", source.identifier)),
                    vec![row(&["", "2024"]), row(&["tax", "9"])],
                )),
            }
        }
    }

    fn job(codes: &str) -> Job {
        resolve(
            FileConfig::default(),
            Overrides {
                codes: Some(codes.into()),
                only_metrics: Some("Tax".into()),
                only_periods: Some("2024".into()),
                case_sensitive: Some(false),
                ..Overrides::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn failures_are_isolated_and_order_kept() {
        let fake = FakeSource {
            visited: RefCell::new(Vec::new()),
        };
        let report = run_batch(&fake, &job("AAA, down, blank, untitled, BBB")).await;

        assert_eq!(
            *fake.visited.borrow(),
            vec!["AAA", "down", "blank", "untitled", "BBB"]
        );
        let names: Vec<_> = report.records.iter().map(|r| r.company_name()).collect();
        assert_eq!(names, vec!["AAA Ltd", "untitled", "BBB Ltd"]);
        assert_eq!(report.records[0].get("Tax (2024)"), Some("9"));

        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0].error, ScrapeError::Fetch { .. }));
        assert!(matches!(report.failures[1].error, ScrapeError::EmptyTable));
        assert_eq!(report.attempted, 5);
    }

    #[tokio::test]
    async fn bad_url_is_a_per_source_failure() {
        let fake = FakeSource {
            visited: RefCell::new(Vec::new()),
        };
        let report = run_batch(&fake, &job("https://exa mple.com/x\nCCC")).await;
        assert_eq!(report.records.len(), 1);
        assert!(matches!(report.failures[0].error, ScrapeError::Config(_)));
        assert_eq!(*fake.visited.borrow(), vec!["CCC"]);
    }

    #[tokio::test]
    async fn report_outlives_the_source() {
        let report = {
            let fake = FakeSource {
                visited: RefCell::new(Vec::new()),
            };
            run_batch(&fake, &job("AAA")).await
        };
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].company_name(), "AAA Ltd");
    }
}

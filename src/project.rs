// src/project.rs

use tracing::debug;

use crate::selection::{MetricSpec, PeriodSpec};
use crate::table::{MatchMode, Table};

pub const COMPANY_NAME: &str = "Company Name";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// One flattened output row for one company, columns in output order.
///
/// Always starts with [`COMPANY_NAME`]. Its column set depends only on the
/// metric and period specs used to build it, never on what was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    cells: Vec<(String, String)>,
}

impl CompanyRecord {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            cells: vec![(COMPANY_NAME.to_string(), company_name.into())],
        }
    }

    pub fn company_name(&self) -> &str {
        &self.cells[0].1
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn push(&mut self, column: String, value: String) {
        self.cells.push((column, value));
    }
}

/// Output column name for a metric label and period.
pub fn column_name(label: &str, period: &str) -> String {
    format!("{} ({})", label, period)
}

/// Resolve every (metric, period) pair against `table`.
///
/// Missing metric rows and missing period columns both produce `""`; values
/// are passed through verbatim.
pub fn project(
    table: &Table,
    metrics: &MetricSpec,
    periods: &PeriodSpec,
    mode: MatchMode,
    company_name: impl Into<String>,
) -> CompanyRecord {
    let mut record = CompanyRecord::new(company_name);
    let mut missing_metrics = 0usize;

    for (metric, label) in metrics.iter() {
        let row = table.find_row(metric, mode);
        if row.is_none() {
            missing_metrics += 1;
        }
        for period in periods.iter() {
            let value = row
                .and_then(|r| table.value(r, period))
                .unwrap_or_default()
                .to_string();
            record.push(column_name(label, period), value);
        }
    }

    debug!(
        company = record.company_name(),
        columns = record.len(),
        missing_metrics,
        "projected record"
    );
    record
}

/// Company name from a page title: text before the first `|`, trimmed.
/// Falls back to `fallback` (usually the security code), then to
/// [`UNKNOWN_COMPANY`].
pub fn company_name(title: Option<&str>, fallback: Option<&str>) -> String {
    let from_title = title
        .map(|t| t.split('|').next().unwrap_or_default().trim())
        .filter(|t| !t.is_empty());
    let from_fallback = fallback.map(str::trim).filter(|f| !f.is_empty());
    from_title
        .or(from_fallback)
        .unwrap_or(UNKNOWN_COMPANY)
        .to_string()
}

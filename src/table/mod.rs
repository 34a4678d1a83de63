// src/table/mod.rs

pub mod clean;

pub use clean::clean_cell;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Result, ScrapeError};
use clean::{fold_key, is_blank_row};

/// A grid of text cells exactly as scraped, plus the page title when the
/// source could provide one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// `<title>` of the page the table came from.
    pub title: Option<String>,
    /// Each `<tr>`, as a Vec of cell texts. The first non-blank row is the header.
    pub rows: Vec<Vec<String>>,
}

/// How metric names in the table's first column are compared to requested keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Trimmed, lower-cased comparison.
    #[default]
    CaseInsensitive,
    /// Trimmed, exact comparison.
    CaseSensitive,
}

impl MatchMode {
    pub fn from_flag(case_sensitive: bool) -> Self {
        if case_sensitive {
            MatchMode::CaseSensitive
        } else {
            MatchMode::CaseInsensitive
        }
    }
}

/// A header row plus data rows. Rows may be shorter or longer than the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(title: Option<String>, rows: Vec<Vec<String>>) -> Self {
        Self { title, rows }
    }

    /// Drop blank rows and split off the header.
    ///
    /// Fails with [`ScrapeError::EmptyTable`] when nothing survives, which is
    /// also what a not-yet-rendered page produces.
    pub fn normalize(self) -> Result<Table> {
        let total = self.rows.len();
        let mut rows = self.rows.into_iter().filter(|r| !is_blank_row(r));
        let header = rows.next().ok_or(ScrapeError::EmptyTable)?;
        let rows: Vec<Vec<String>> = rows.collect();
        debug!(
            total,
            kept = rows.len() + 1,
            columns = header.len(),
            "normalized table"
        );
        Ok(Table { header, rows })
    }
}

impl Table {
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// First data row whose leading cell names `metric`, scanning top to bottom.
    pub fn find_row(&self, metric: &str, mode: MatchMode) -> Option<&[String]> {
        let found = match mode {
            MatchMode::CaseInsensitive => {
                let want = fold_key(metric);
                self.rows
                    .iter()
                    .find(|r| r.first().is_some_and(|c| fold_key(c) == want))
            }
            MatchMode::CaseSensitive => {
                let want = metric.trim();
                self.rows
                    .iter()
                    .find(|r| r.first().is_some_and(|c| c.trim() == want))
            }
        };
        if found.is_none() {
            trace!(metric, "metric row not found");
        }
        found.map(Vec::as_slice)
    }

    /// Index of the first header cell equal to `period`. Case-sensitive.
    pub fn column_index(&self, period: &str) -> Option<usize> {
        self.header.iter().position(|h| h == period)
    }

    /// Cell of `row` under the `period` column, if both exist.
    pub fn value<'a>(&self, row: &'a [String], period: &str) -> Option<&'a str> {
        let idx = self.column_index(period)?;
        row.get(idx).map(String::as_str)
    }
}

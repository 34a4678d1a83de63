// src/dataset/mod.rs

pub mod csv_store;
pub mod parquet_store;
pub mod store;

pub use store::{export_recovery, open_store, DatasetStore};

use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

use crate::error::Result;
use crate::project::CompanyRecord;

/// Wide-format table persisted between runs.
///
/// `columns` is the ordered union of every column any row has defined; each
/// row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored columns and rows. Short rows are padded, long rows
    /// are truncated to the column count.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Self { columns, rows }
    }

    pub fn from_records(records: &[CompanyRecord]) -> Self {
        let mut ds = Self::new();
        ds.append(records);
        ds
    }

    /// Prior rows first, then `records`, in order. Never deduplicates.
    pub fn merge(prior: Option<Dataset>, records: &[CompanyRecord]) -> Self {
        let mut ds = prior.unwrap_or_default();
        ds.append(records);
        ds
    }

    /// Append `records`, widening the column set as new columns appear.
    /// Earlier rows gain `""` for every added column.
    pub fn append(&mut self, records: &[CompanyRecord]) {
        let mut index: HashMap<String, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();

        for rec in records {
            for col in rec.columns() {
                if !index.contains_key(col) {
                    index.insert(col.to_string(), self.columns.len());
                    self.columns.push(col.to_string());
                }
            }
        }

        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        for rec in records {
            let mut row = vec![String::new(); width];
            for (col, value) in rec.iter() {
                row[index[col]] = value.to_string();
            }
            self.rows.push(row);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell under `column` in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }
}

/// What happened when a batch was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No new records, nothing was read or written.
    Skipped,
    Saved { new_rows: usize, total_rows: usize },
}

/// Read the prior dataset, append `records`, write everything back.
///
/// When the save fails the new records are exported to a sibling recovery
/// file before the error is returned.
#[instrument(level = "info", skip_all, fields(path = %store.path().display(), new = records.len()))]
pub fn commit<S: DatasetStore + ?Sized>(
    store: &S,
    records: &[CompanyRecord],
) -> Result<MergeOutcome> {
    if records.is_empty() {
        warn!("no new records; skipping save");
        return Ok(MergeOutcome::Skipped);
    }

    let saved = store
        .load()
        .map(|prior| Dataset::merge(prior, records))
        .and_then(|merged| store.save(&merged).map(|_| merged.len()));

    match saved {
        Ok(total_rows) => {
            info!(total_rows, "dataset saved");
            Ok(MergeOutcome::Saved {
                new_rows: records.len(),
                total_rows,
            })
        }
        Err(e) => {
            error!(error = %e, "saving dataset failed");
            match export_recovery(store.path(), records) {
                Ok(path) => warn!(path = %path.display(), "new records exported for recovery"),
                Err(re) => error!(error = %re, "recovery export failed too"),
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, cells: &[(&str, &str)]) -> CompanyRecord {
        let mut metrics = crate::selection::MetricSpec::new();
        for (k, _) in cells {
            metrics.insert(*k, *k);
        }
        let mut rows = vec![vec!["".to_string(), "P".to_string()]];
        for (k, v) in cells {
            rows.push(vec![k.to_string(), v.to_string()]);
        }
        let table = crate::table::RawTable::new(None, rows).normalize().unwrap();
        crate::project::project(
            &table,
            &metrics,
            &crate::selection::PeriodSpec::new(["P"]),
            crate::table::MatchMode::default(),
            name,
        )
    }

    #[test]
    fn merge_is_pure_append() {
        let e1 = rec("Acme", &[("Tax", "1")]);
        let r1 = rec("Beta", &[("Tax", "2")]);
        let r2 = rec("Acme", &[("Tax", "1")]);
        let prior = Dataset::from_records(&[e1.clone()]);

        let merged = Dataset::merge(Some(prior), &[r1, r2]);
        let names: Vec<_> = (0..merged.len())
            .map(|i| merged.get(i, "Company Name").unwrap())
            .collect();
        assert_eq!(names, vec!["Acme", "Beta", "Acme"]);
    }

    #[test]
    fn merge_without_prior_is_records() {
        let r = rec("Acme", &[("Tax", "1")]);
        let merged = Dataset::merge(None, &[r]);
        assert_eq!(merged.columns(), &["Company Name", "Tax (P)"]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn new_columns_pad_earlier_rows() {
        let prior = Dataset::from_records(&[rec("Acme", &[("Tax", "1")])]);
        let merged = Dataset::merge(Some(prior), &[rec("Beta", &[("PBT", "7")])]);

        assert_eq!(merged.columns(), &["Company Name", "Tax (P)", "PBT (P)"]);
        assert_eq!(merged.get(0, "PBT (P)"), Some(""));
        assert_eq!(merged.get(1, "Tax (P)"), Some(""));
        assert_eq!(merged.get(1, "PBT (P)"), Some("7"));
        assert!(merged.rows().iter().all(|r| r.len() == 3));
    }

    struct ReadOnlyStore(std::path::PathBuf);

    impl DatasetStore for ReadOnlyStore {
        fn path(&self) -> &std::path::Path {
            &self.0
        }
        fn load(&self) -> Result<Option<Dataset>> {
            Ok(None)
        }
        fn save(&self, _: &Dataset) -> Result<()> {
            Err(crate::ScrapeError::persistence(&self.0, "read-only"))
        }
    }

    #[test]
    fn commit_skips_when_nothing_new() {
        let tmp = tempfile::tempdir().unwrap();
        let store = csv_store::CsvStore::new(tmp.path().join("d.csv"));
        assert_eq!(commit(&store, &[]).unwrap(), MergeOutcome::Skipped);
        assert!(!store.path().exists());
    }

    #[test]
    fn failed_save_exports_new_records() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ReadOnlyStore(tmp.path().join("Financials_Data_Filled.csv"));
        let err = commit(&store, &[rec("Acme", &[("Tax", "1")])]).unwrap_err();
        assert!(matches!(err, crate::ScrapeError::Persistence { .. }));

        let exported: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(exported.len(), 1);
        assert!(exported[0].starts_with("Financials_Data_Filled_unsaved_"));
    }

    #[test]
    fn from_parts_pads_short_rows() {
        let ds = Dataset::from_parts(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()], vec!["1".into(), "2".into(), "3".into()]],
        );
        assert_eq!(ds.get(0, "b"), Some(""));
        assert_eq!(ds.rows()[1].len(), 2);
    }
}

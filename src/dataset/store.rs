// src/dataset/store.rs

use chrono::Utc;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::debug;

use super::csv_store::CsvStore;
use super::parquet_store::ParquetStore;
use super::Dataset;
use crate::error::{Result, ScrapeError};
use crate::project::CompanyRecord;

/// A tabular file read whole at merge start and rewritten whole at merge end.
pub trait DatasetStore {
    fn path(&self) -> &Path;

    /// `Ok(None)` when the file does not exist yet.
    fn load(&self) -> Result<Option<Dataset>>;

    /// Replace the stored dataset with `dataset`.
    fn save(&self, dataset: &Dataset) -> Result<()>;
}

/// Pick a store implementation from the file extension.
pub fn open_store(path: impl Into<PathBuf>) -> Result<Box<dyn DatasetStore>> {
    let path = path.into();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(Box::new(CsvStore::new(path))),
        Some("parquet") => Ok(Box::new(ParquetStore::new(path))),
        _ => Err(ScrapeError::Config(format!(
            "unsupported dataset file {:?}: expected .csv or .parquet",
            path
        ))),
    }
}

/// Write through a temp file in the target directory, then rename over
/// `path`, so a failed write never truncates the existing dataset.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| ScrapeError::persistence(&dir, e))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| ScrapeError::persistence(path, e))?;
    write(tmp.as_file_mut())?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| ScrapeError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| ScrapeError::persistence(path, e.error))?;
    debug!(path = %path.display(), "dataset written");
    Ok(())
}

/// Export `records` alone to `<stem>_unsaved_<timestamp>.csv` next to `path`.
pub fn export_recovery(path: &Path, records: &[CompanyRecord]) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    let name = format!("{}_unsaved_{}.csv", stem, Utc::now().format("%Y%m%dT%H%M%S"));
    let target = path.with_file_name(name);
    CsvStore::new(&target).save(&Dataset::from_records(records))?;
    Ok(target)
}

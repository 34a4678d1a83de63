// src/dataset/csv_store.rs

use csv::{ReaderBuilder, WriterBuilder};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::debug;

use super::store::{write_atomic, DatasetStore};
use super::Dataset;
use crate::error::{Result, ScrapeError};

/// Dataset kept as a CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatasetStore for CsvStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<Dataset>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path).map_err(|e| ScrapeError::persistence(&self.path, e))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // rows written by older runs may be narrower
            .from_reader(file);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| ScrapeError::persistence(&self.path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| {
                ScrapeError::persistence(&self.path, format!("record {}: {}", idx, e))
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        debug!(path = %self.path.display(), rows = rows.len(), "loaded csv dataset");
        Ok(Some(Dataset::from_parts(columns, rows)))
    }

    fn save(&self, dataset: &Dataset) -> Result<()> {
        write_atomic(&self.path, |file| {
            let mut wtr = WriterBuilder::new().from_writer(file);
            let err = |e: csv::Error| ScrapeError::persistence(&self.path, e);
            wtr.write_record(dataset.columns()).map_err(err)?;
            for row in dataset.rows() {
                wtr.write_record(row).map_err(err)?;
            }
            wtr.flush()
                .map_err(|e| ScrapeError::persistence(&self.path, e))
        })
    }
}

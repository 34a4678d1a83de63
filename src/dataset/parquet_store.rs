// src/dataset/parquet_store.rs

use arrow::{
    array::{Array, ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

use super::store::{write_atomic, DatasetStore};
use super::Dataset;
use crate::error::{Result, ScrapeError};

/// Dataset kept as a single Snappy-compressed Parquet file, every column Utf8.
#[derive(Debug, Clone)]
pub struct ParquetStore {
    path: PathBuf,
}

impl ParquetStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn err(&self, e: impl ToString) -> ScrapeError {
        ScrapeError::persistence(&self.path, e)
    }
}

fn build_schema(columns: &[String]) -> Arc<Schema> {
    Arc::new(Schema::new(
        columns
            .iter()
            .map(|c| Field::new(c, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ))
}

impl DatasetStore for ParquetStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<Dataset>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path).map_err(|e| self.err(e))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| self.err(e))?;
        let columns: Vec<String> = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        let reader = builder
            .with_batch_size(1024)
            .build()
            .map_err(|e| self.err(e))?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| self.err(e))?;
            let arrays = (0..batch.num_columns())
                .map(|i| {
                    batch
                        .column(i)
                        .as_any()
                        .downcast_ref::<StringArray>()
                        .ok_or_else(|| self.err(format!("column {} is not Utf8", columns[i])))
                })
                .collect::<Result<Vec<_>>>()?;
            for r in 0..batch.num_rows() {
                rows.push(
                    arrays
                        .iter()
                        .map(|a| {
                            if a.is_null(r) {
                                String::new()
                            } else {
                                a.value(r).to_string()
                            }
                        })
                        .collect(),
                );
            }
        }
        debug!(path = %self.path.display(), rows = rows.len(), "loaded parquet dataset");
        Ok(Some(Dataset::from_parts(columns, rows)))
    }

    fn save(&self, dataset: &Dataset) -> Result<()> {
        let schema = build_schema(dataset.columns());
        let arrays: Vec<ArrayRef> = (0..dataset.columns().len())
            .map(|i| {
                let values: Vec<&str> = dataset.rows().iter().map(|r| r[i].as_str()).collect();
                Arc::new(StringArray::from(values)) as ArrayRef
            })
            .collect();
        let batch = RecordBatch::try_new(schema.clone(), arrays).map_err(|e| self.err(e))?;

        write_atomic(&self.path, |file| {
            let props = WriterProperties::builder()
                .set_compression(Compression::SNAPPY)
                .build();
            let mut writer =
                ArrowWriter::try_new(file, schema, Some(props)).map_err(|e| self.err(e))?;
            writer.write(&batch).map_err(|e| self.err(e))?;
            writer.close().map_err(|e| self.err(e))?;
            Ok(())
        })
    }
}

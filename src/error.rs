// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures the scrape pipeline can surface.
///
/// A metric row or period column that cannot be found is not an error: the
/// projector fills those cells with an empty string instead.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Network or navigation failure for a single source.
    #[error("fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    /// The expected table was missing or had no usable rows after cleanup.
    #[error("no usable table rows found")]
    EmptyTable,

    /// Reading or writing the dataset store failed.
    #[error("dataset store {path:?}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl ScrapeError {
    pub(crate) fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        ScrapeError::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ScrapeError::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

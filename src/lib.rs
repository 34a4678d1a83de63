//! Scrape financial-results tables from exchange and screener pages, project
//! a chosen set of metrics × periods into one wide row per company, and
//! append those rows to a dataset kept on disk between runs.

pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod mode;
pub mod project;
pub mod selection;
pub mod table;

pub use error::{Result, ScrapeError};

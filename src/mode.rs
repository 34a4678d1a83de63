// src/mode.rs

use serde::{Deserialize, Serialize};
use std::fmt;

static QUARTERLY_PERIODS: &[&str] = &["Dec-24", "Sep-24", "Jun-24", "Mar-24", "Dec-23", "FY 23-24"];
static ANNUAL_PERIODS: &[&str] = &["2025", "2024", "2023", "2022", "2021", "2020"];
static SCREENER_PERIODS: &[&str] = &["Dec 2024", "Sep 2024", "Jun 2024", "Mar 2024", "Dec 2023"];

const BSE_RESULTS_URL: &str =
    "https://www.bseindia.com/stock-share-price/{code}/{code}/{code}/financials-results/";
const SCREENER_URL: &str = "https://www.screener.in/company/{code}/consolidated/";

/// Which page family is scraped, and the defaults that come with it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMode {
    /// BSE quarterly results table (figures in crores).
    #[default]
    Quarterly,
    /// BSE annual trends table.
    Annual,
    /// Screener.in quarterly results section.
    Screener,
}

impl ScrapeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeMode::Quarterly => "quarterly",
            ScrapeMode::Annual => "annual",
            ScrapeMode::Screener => "screener",
        }
    }

    pub fn default_periods(&self) -> &'static [&'static str] {
        match self {
            ScrapeMode::Quarterly => QUARTERLY_PERIODS,
            ScrapeMode::Annual => ANNUAL_PERIODS,
            ScrapeMode::Screener => SCREENER_PERIODS,
        }
    }

    /// File stem of the dataset each mode accumulates into.
    pub fn dataset_stem(&self) -> &'static str {
        match self {
            ScrapeMode::Quarterly => "Financials_Data_Filled",
            ScrapeMode::Annual => "Annual_Data_Filled",
            ScrapeMode::Screener => "Screener_Financials",
        }
    }

    /// CSS selector for the financials table on a page of this mode.
    pub fn table_selector(&self) -> &'static str {
        match self {
            ScrapeMode::Quarterly => r#"table[ng-bind-html*="reportData.QtlyinCr"]"#,
            ScrapeMode::Annual => r#"table[ng-bind-html*="reportData.AnninCr"]"#,
            ScrapeMode::Screener => "#quarters table",
        }
    }

    /// Page URL for a security code or screener symbol.
    pub fn url_for(&self, code: &str) -> String {
        let template = match self {
            ScrapeMode::Quarterly | ScrapeMode::Annual => BSE_RESULTS_URL,
            ScrapeMode::Screener => SCREENER_URL,
        };
        template.replace("{code}", code)
    }
}

impl fmt::Display for ScrapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

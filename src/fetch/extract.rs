// src/fetch/extract.rs

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::error::{Result, ScrapeError};
use crate::table::{clean_cell, RawTable};

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{}': {:?}", selector, e)))
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_cell(&el.text().collect::<String>())
}

/// Pull the first table matching `table_sel` out of `html`, one Vec per `<tr>`
/// with the cleaned text of its `th`/`td` cells, plus the page `<title>`.
///
/// A page without the table gives a `RawTable` with no rows; normalizing it
/// reports [`ScrapeError::EmptyTable`].
pub fn extract_table(html: &str, table_sel: &Selector) -> RawTable {
    // constant selectors
    let title_sel = Selector::parse("title").expect("title selector should parse");
    let row_sel = Selector::parse("tr").expect("row selector should parse");
    let cell_sel = Selector::parse("th, td").expect("cell selector should parse");

    let doc = Html::parse_document(html);
    let title = doc
        .select(&title_sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty());

    let Some(table) = doc.select(table_sel).next() else {
        debug!(?title, "table element not present");
        return RawTable::new(title, Vec::new());
    };

    let rows: Vec<Vec<String>> = table
        .select(&row_sel)
        .map(|tr| tr.select(&cell_sel).map(element_text).collect())
        .collect();
    trace!(rows = rows.len(), "extracted table rows");
    RawTable::new(title, rows)
}

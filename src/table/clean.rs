/// Trim a scraped cell and collapse any inner whitespace run (tabs, newlines,
/// non-breaking spaces) into a single ASCII space.
pub fn clean_cell(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// True when every cell of `row` is empty or whitespace-only.
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Key used for case-insensitive metric comparison.
pub fn fold_key(s: &str) -> String {
    s.trim().to_lowercase()
}

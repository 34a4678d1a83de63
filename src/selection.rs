// src/selection.rs

/// Metrics extracted when the user does not narrow the selection, with the
/// label each one gets in output column names.
pub static DEFAULT_METRICS: &[(&str, &str)] = &[
    ("Total Income", "Total Income"),
    ("Expenditure", "Expenditure"),
    ("Interest", "Interest"),
    ("PBDT", "PBDT"),
    ("Depreciation", "Depreciation"),
    ("PBT", "PBT"),
    ("Tax", "Tax"),
    ("Net Profit", "Net Profit"),
    ("Equity", "Equity"),
    ("OPM %", "OPM (%)"),
    ("NPM %", "NPM (%)"),
];

/// Split comma-separated free text into trimmed, non-empty tokens.
pub fn split_tokens(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Company codes or URLs, one per line or comma-separated.
pub fn parse_identifiers(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered metric key → output label pairs. Keys and labels are both unique;
/// the first insertion wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricSpec {
    entries: Vec<(String, String)>,
}

impl MetricSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry of [`DEFAULT_METRICS`], in order.
    pub fn defaults() -> Self {
        let mut spec = Self::new();
        for (key, label) in DEFAULT_METRICS {
            spec.insert(*key, *label);
        }
        spec
    }

    /// Build from selected keys plus free-text additions. Keys with a
    /// default label use it, anything else is labelled with the key itself.
    pub fn from_selection<S: AsRef<str>>(selected: &[S], extra: &str) -> Self {
        let mut spec = Self::new();
        let keys = selected
            .iter()
            .map(|s| s.as_ref().trim().to_string())
            .chain(split_tokens(extra));
        for key in keys.filter(|k| !k.is_empty()) {
            let label = DEFAULT_METRICS
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, l)| l.to_string())
                .unwrap_or_else(|| key.clone());
            spec.insert(key, label);
        }
        spec
    }

    /// Returns false when `key` or `label` was already present. A repeated
    /// label would name the same output column twice.
    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) -> bool {
        let (key, label) = (key.into(), label.into());
        if self.entries.iter().any(|(k, l)| *k == key || *l == label) {
            return false;
        }
        self.entries.push((key, label));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, l)| (k.as_str(), l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered, de-duplicated period labels. Order decides output column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSpec {
    periods: Vec<String>,
}

impl PeriodSpec {
    pub fn new<I, S>(periods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut spec = Self::default();
        spec.extend(periods);
        spec
    }

    /// `base` followed by any comma-separated additions not already present.
    pub fn with_extra<S: AsRef<str>>(base: &[S], extra: &str) -> Self {
        let mut spec = Self::new(base);
        spec.extend(split_tokens(extra));
        spec
    }

    pub fn extend<I, S>(&mut self, periods: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for p in periods {
            let p = p.as_ref().trim();
            if !p.is_empty() && !self.periods.iter().any(|q| q == p) {
                self.periods.push(p.to_string());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.periods.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

//! Driver open options, in the spirit of GDAL's `-oo KEY=VALUE`.

use std::collections::BTreeMap;

/// Case-insensitive `KEY=VALUE` options handed to a driver when opening.
///
/// Keys are stored uppercased; values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    entries: BTreeMap<String, String>,
}

impl OpenOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries
            .insert(key.trim().to_ascii_uppercase(), value.into());
    }

    /// Builder-style variant of [`OpenOptions::set`].
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Splits `KEY=VALUE` into its parts. Returns `None` when there is no
    /// `=` or the key is empty.
    #[must_use]
    pub fn parse_pair(input: &str) -> Option<(String, String)> {
        let (key, value) = input.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_ascii_uppercase(), value.to_string()))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys not listed in `accepted`, in sorted order.
    #[must_use]
    pub fn unknown_keys(&self, accepted: &[&str]) -> Vec<&str> {
        self.entries
            .keys()
            .filter(|k| !accepted.iter().any(|a| a.eq_ignore_ascii_case(k)))
            .map(String::as_str)
            .collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for OpenOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut options = OpenOptions::new();
        for (key, value) in iter {
            options.set(key.as_ref(), value);
        }
        options
    }
}

//! Options controlling a probe run.

use geoprobe_core_common::OpenOptions;

use crate::error::ConfigError;

/// How a dataset is opened and what is reported about it.
#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    /// Driver short name forcing the format instead of identification.
    pub driver: Option<String>,
    /// Driver-specific `KEY=VALUE` open options.
    pub open_options: OpenOptions,
    /// Whether to compute a SHA-256 checksum of the dataset file.
    pub checksum: bool,
}

impl ProbeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    #[must_use]
    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    /// Adds `KEY=VALUE` open options as given on the command line.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for an entry without `=` or
    /// with an empty key.
    pub fn with_open_option_pairs<I, S>(mut self, pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) =
                OpenOptions::parse_pair(pair).ok_or_else(|| ConfigError::InvalidOption {
                    option: "open".to_string(),
                    message: format!("expected KEY=VALUE, got '{pair}'"),
                })?;
            self.open_options.set(&key, value);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_option_pairs() {
        let options = ProbeOptions::new()
            .with_open_option_pairs(["geometry_column=shape", "X_COLUMN=lon"])
            .unwrap();
        assert_eq!(options.open_options.get("GEOMETRY_COLUMN"), Some("shape"));
        assert_eq!(options.open_options.get("x_column"), Some("lon"));
    }

    #[test]
    fn test_malformed_open_option() {
        let err = ProbeOptions::new()
            .with_open_option_pairs(["GEOMETRY_COLUMN"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid open option: expected KEY=VALUE, got 'GEOMETRY_COLUMN'"
        );
    }
}

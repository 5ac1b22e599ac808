//! Error types for probe operations.
//!
//! Every failure of the probe maps to one [`ErrorKind`], and every kind to
//! one process exit code. Format-level failures arrive as
//! [`FormatReadError`] and are wrapped here with the dataset they concern.

use std::path::PathBuf;

use geoprobe_core_common::FormatReadError;
use thiserror::Error;

/// Main error type for probe operations.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The dataset does not exist or its driver could not parse it.
    #[error("Failed to open dataset '{}': {source}", path.display())]
    DatasetOpen {
        /// The dataset path
        path: PathBuf,
        /// The underlying format error
        #[source]
        source: FormatReadError,
    },

    /// The dataset has no layer at the requested index.
    #[error("Dataset '{}' has no layer {index}", path.display())]
    LayerNotFound {
        /// The dataset path
        path: PathBuf,
        /// The layer index that was requested
        index: usize,
    },

    /// The layer does not declare a usable spatial reference.
    #[error("Layer '{layer}' of '{}' has no spatial reference", path.display())]
    SpatialReferenceUnavailable {
        /// The dataset path
        path: PathBuf,
        /// The layer name
        layer: String,
    },

    /// No registered driver recognises the dataset.
    #[error("No driver recognises the format of '{}'", path.display())]
    UnsupportedFormat {
        /// The dataset path
        path: PathBuf,
    },

    /// The layer extent could not be computed.
    #[error("Cannot compute the extent of layer '{layer}' of '{}': {reason}", path.display())]
    ExtentUnavailable {
        /// The dataset path
        path: PathBuf,
        /// The layer name
        layer: String,
        /// Why the extent is unavailable
        reason: String,
    },

    /// Driver selection errors (unknown or unimplemented `--driver`)
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Driver-related errors.
///
/// These errors occur when a driver is requested by name, e.g. with
/// `--driver`, and cannot be used.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Driver was not found in the catalogue
    #[error("Driver '{name}' not found. Available drivers: {available}")]
    NotFound {
        /// The requested driver name
        name: String,
        /// Comma-separated list of known drivers
        available: String,
    },

    /// Driver is known but cannot probe datasets yet
    #[error("Driver '{driver}' does not support {operation}")]
    OperationNotSupported {
        /// The driver name
        driver: String,
        /// The operation that's not supported
        operation: String,
    },

    /// Driver is not registered in the driver registry
    #[error("Driver '{driver}' is not registered in the registry")]
    NotRegistered {
        /// The driver name
        driver: String,
    },
}

/// Configuration errors.
///
/// These errors occur when options or configuration are invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },
}

/// Type alias for Results using `ProbeError`.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Category of a [`ProbeError`], each with a fixed exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DatasetOpen,
    LayerNotFound,
    SpatialReferenceUnavailable,
    UnsupportedFormat,
    ExtentUnavailable,
    Config,
}

impl ErrorKind {
    /// Process exit code reported for this kind. Code 2 is left to the
    /// argument parser.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::DatasetOpen => 1,
            Self::LayerNotFound => 3,
            Self::SpatialReferenceUnavailable => 4,
            Self::UnsupportedFormat => 5,
            Self::ExtentUnavailable => 6,
            Self::Config => 7,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DatasetOpen => "DatasetOpenFailure",
            Self::LayerNotFound => "LayerNotFound",
            Self::SpatialReferenceUnavailable => "SpatialReferenceUnavailable",
            Self::UnsupportedFormat => "UnsupportedFormat",
            Self::ExtentUnavailable => "ExtentUnavailable",
            Self::Config => "InvalidConfiguration",
        }
    }
}

impl ProbeError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatasetOpen { .. } => ErrorKind::DatasetOpen,
            Self::LayerNotFound { .. } => ErrorKind::LayerNotFound,
            Self::SpatialReferenceUnavailable { .. } => ErrorKind::SpatialReferenceUnavailable,
            Self::UnsupportedFormat { .. } | Self::Driver(_) => ErrorKind::UnsupportedFormat,
            Self::ExtentUnavailable { .. } => ErrorKind::ExtentUnavailable,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }

    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::DatasetOpen { path, source } => {
                if source.is_io() {
                    format!("Could not read dataset {}: {source}", path.display())
                } else {
                    format!("Dataset {} is not valid: {source}", path.display())
                }
            },
            Self::Driver(e) => e.user_message(),
            Self::Config(e) => format!("Configuration error: {e}"),
            _ => self.to_string(),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::DatasetOpen { source, .. } if source.is_io() => {
                Some("Check that the path is correct and readable.".to_string())
            },
            Self::DatasetOpen { .. } => {
                Some("Check the file format, or force a driver with --driver.".to_string())
            },
            Self::LayerNotFound { .. } => {
                Some("Make sure the dataset contains at least one layer.".to_string())
            },
            Self::SpatialReferenceUnavailable { .. } => Some(
                "Add a spatial reference to the dataset, e.g. a .prj sidecar with WKT."
                    .to_string(),
            ),
            Self::UnsupportedFormat { .. } => Some(
                "Run 'geoprobe --list-drivers' to see the supported formats, or force one with --driver."
                    .to_string(),
            ),
            Self::ExtentUnavailable { .. } => {
                Some("Make sure the layer holds valid, non-empty geometries.".to_string())
            },
            Self::Driver(e) => e.recovery_suggestion(),
            Self::Config(_) => Some("Open options take the form KEY=VALUE.".to_string()),
        }
    }
}

impl DriverError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { name, available } => {
                format!(
                    "Driver '{name}' not found.\n\nAvailable drivers:\n{}",
                    available
                        .split(", ")
                        .map(|d| format!("  - {d}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            Self::OperationNotSupported { driver, operation } => {
                format!("The '{driver}' driver does not support {operation} yet.")
            },
            Self::NotRegistered { .. } => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => {
                Some("Run 'geoprobe --list-drivers' to see all available drivers.".to_string())
            },
            Self::OperationNotSupported { .. } => {
                Some("Try a driver whose status is Supported.".to_string())
            },
            Self::NotRegistered { .. } => None,
        }
    }
}

/// Helper to create `DriverError::NotFound` with the known driver names.
#[must_use]
pub fn driver_not_found(name: &str) -> DriverError {
    use crate::drivers::get_driver_names;

    let available = get_driver_names().join(", ");
    DriverError::NotFound {
        name: name.to_string(),
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error() -> FormatReadError {
        FormatReadError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            "missing.shp",
        )
    }

    #[test]
    fn test_exit_codes() {
        let path = PathBuf::from("data.shp");
        let cases = [
            (
                ProbeError::DatasetOpen {
                    path: path.clone(),
                    source: io_error(),
                },
                1,
            ),
            (
                ProbeError::LayerNotFound {
                    path: path.clone(),
                    index: 0,
                },
                3,
            ),
            (
                ProbeError::SpatialReferenceUnavailable {
                    path: path.clone(),
                    layer: "data".to_string(),
                },
                4,
            ),
            (ProbeError::UnsupportedFormat { path: path.clone() }, 5),
            (driver_not_found("Nope").into(), 5),
            (
                ProbeError::ExtentUnavailable {
                    path,
                    layer: "data".to_string(),
                    reason: "layer has no geometry".to_string(),
                },
                6,
            ),
            (
                ConfigError::InvalidOption {
                    option: "open".to_string(),
                    message: "expected KEY=VALUE".to_string(),
                }
                .into(),
                7,
            ),
        ];
        for (error, code) in cases {
            assert_eq!(error.exit_code(), code, "{error}");
        }
    }

    #[test]
    fn test_display() {
        let error = ProbeError::LayerNotFound {
            path: PathBuf::from("/data/empty"),
            index: 0,
        };
        assert_eq!(error.to_string(), "Dataset '/data/empty' has no layer 0");
        assert_eq!(error.kind().as_str(), "LayerNotFound");

        let error = ProbeError::DatasetOpen {
            path: PathBuf::from("missing.shp"),
            source: io_error(),
        };
        assert!(error.user_message().starts_with("Could not read dataset missing.shp"));
        assert_eq!(
            error.recovery_suggestion().as_deref(),
            Some("Check that the path is correct and readable.")
        );
    }

    #[test]
    fn test_driver_not_found_lists_catalogue() {
        let error = ProbeError::from(driver_not_found("Foo"));
        let message = error.user_message();
        assert!(message.contains("Driver 'Foo' not found."));
        assert!(message.contains("  - GeoJSON"));
        assert!(message.contains("  - ESRI Shapefile"));
        assert!(error.recovery_suggestion().is_some());
    }
}

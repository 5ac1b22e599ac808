//! Driver descriptors for geospatial data format support and capabilities.
//!
//! A descriptor only states what a format driver can do; the code that reads
//! the format lives behind the [`FormatDriver`](crate::io::FormatDriver) trait.
//! The model follows GDAL's driver metadata, trimmed to what a probe needs.

/// Support status for a specific driver operation.
///
/// Indicates whether a driver operation (open, extent or spatial reference)
/// is currently supported, planned for future implementation, or not
/// supported at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// The feature is fully supported and implemented.
    Supported,
    /// The feature is not supported by the driver.
    NotSupported,
    /// The feature is planned for future implementation.
    Planned,
}

impl SupportStatus {
    /// Returns `true` if the operation is fully supported and implemented.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    /// Returns the string representation of this support status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::NotSupported => "Not Supported",
            SupportStatus::Planned => "Planned",
        }
    }
}

/// Capabilities of a format driver as seen by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverCapabilities {
    /// Opening a dataset and enumerating its layers.
    pub open: SupportStatus,
    /// Computing a layer's bounding envelope.
    pub extent: SupportStatus,
    /// Reporting a layer's spatial reference.
    pub spatial_ref: SupportStatus,
}

/// Geospatial data format driver descriptor.
///
/// A driver has a short name (used with `--driver`), a descriptive long name,
/// and a set of capabilities indicating what operations are supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    /// Short name used in the CLI and for driver identification (e.g., `"GeoJSON"`).
    pub short_name: &'static str,
    /// Long descriptive name for display purposes (e.g., `"ESRI Shapefile / DBF"`).
    pub long_name: &'static str,
    /// Operations supported by this driver.
    pub capabilities: DriverCapabilities,
}

impl Driver {
    /// Creates a new driver descriptor with specified capabilities.
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        open: SupportStatus,
        extent: SupportStatus,
        spatial_ref: SupportStatus,
    ) -> Self {
        Self {
            short_name,
            long_name,
            capabilities: DriverCapabilities {
                open,
                extent,
                spatial_ref,
            },
        }
    }

    /// Creates a descriptor for a driver whose every operation is implemented.
    #[must_use]
    pub const fn supported(short_name: &'static str, long_name: &'static str) -> Self {
        use SupportStatus::Supported;
        Self::new(short_name, long_name, Supported, Supported, Supported)
    }

    /// Returns `true` if the probe can run end to end with this driver.
    #[must_use]
    pub fn can_probe(&self) -> bool {
        self.capabilities.open.is_supported() && self.capabilities.extent.is_supported()
    }
}

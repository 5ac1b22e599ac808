//! Data types describing the result of a probe.

use geoprobe_core_common::{Envelope, SpatialReference};
use serde::Serialize;

/// Information gathered about a dataset and its first layer.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// Path to the dataset
    pub dataset: String,
    /// Driver short name
    pub driver: String,
    /// Driver long name
    pub driver_long_name: String,
    /// Number of layers in the dataset
    pub layer_count: usize,
    /// The probed layer
    pub layer: LayerInfo,
    /// SHA-256 of the dataset file, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_sha256: Option<String>,
}

/// Information about the probed layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerInfo {
    /// Layer name
    pub name: String,
    /// Number of features, if they could be counted
    pub feature_count: Option<u64>,
    /// Bounding envelope of all geometries
    pub extent: Envelope,
    /// The envelope as a closed WKT polygon
    pub extent_wkt: String,
    /// Spatial reference of the layer
    pub spatial_reference: SrsInfo,
}

/// Spatial reference details.
#[derive(Debug, Clone, Serialize)]
pub struct SrsInfo {
    /// Name, e.g. "WGS 84"
    pub name: Option<String>,
    /// Authority and code, e.g. "EPSG:4326"
    pub authority: Option<String>,
    /// Full well-known text
    pub wkt: String,
}

impl From<&SpatialReference> for SrsInfo {
    fn from(srs: &SpatialReference) -> Self {
        Self {
            name: srs.name().map(str::to_string),
            authority: srs
                .authority()
                .map(|(authority, code)| format!("{authority}:{code}")),
            wkt: srs.to_wkt().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srs_info_from_wgs84() {
        let info = SrsInfo::from(&SpatialReference::wgs84());
        assert_eq!(info.name.as_deref(), Some("WGS 84"));
        assert_eq!(info.authority.as_deref(), Some("EPSG:4326"));
        assert!(info.wkt.starts_with("GEOGCS[\"WGS 84\""));
    }
}

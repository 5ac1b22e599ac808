//! Display utilities for formatting CLI output.
//!
//! Tables are rendered to strings so the caller decides where they go.

use tabled::{Table, Tabled};

use geoprobe_core::ProbeReport;
use geoprobe_core::drivers::Driver;

/// Table row representation for displaying driver information.
#[derive(Tabled)]
pub struct DriverRow {
    /// Short identifier for the driver (e.g., `GeoJSON`, `CSV`).
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    /// Full descriptive name of the driver format.
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    /// Support status for opening datasets.
    #[tabled(rename = "Open")]
    pub open: String,
    /// Support status for computing layer extents.
    #[tabled(rename = "Extent")]
    pub extent: String,
    /// Support status for reporting spatial references.
    #[tabled(rename = "SRS")]
    pub spatial_ref: String,
}

impl From<&Driver> for DriverRow {
    fn from(driver: &Driver) -> Self {
        Self {
            short_name: driver.short_name.to_string(),
            long_name: driver.long_name.to_string(),
            open: driver.capabilities.open.as_str().to_string(),
            extent: driver.capabilities.extent.as_str().to_string(),
            spatial_ref: driver.capabilities.spatial_ref.as_str().to_string(),
        }
    }
}

/// One property of a probe report.
#[derive(Tabled)]
pub struct ReportRow {
    #[tabled(rename = "Property")]
    pub property: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Renders the driver catalogue as a table.
#[must_use]
pub fn render_drivers(drivers: &[Driver]) -> String {
    Table::new(drivers.iter().map(DriverRow::from)).to_string()
}

/// Renders a probe report as a two-column table.
#[must_use]
pub fn render_report(report: &ProbeReport) -> String {
    const NOT_AVAILABLE: &str = "N/A";

    let layer = &report.layer;
    let srs = &layer.spatial_reference;
    let rows = vec![
        ReportRow {
            property: "Dataset",
            value: report.dataset.clone(),
        },
        ReportRow {
            property: "Driver",
            value: format!("{} ({})", report.driver, report.driver_long_name),
        },
        ReportRow {
            property: "Layers",
            value: report.layer_count.to_string(),
        },
        ReportRow {
            property: "Layer",
            value: layer.name.clone(),
        },
        ReportRow {
            property: "Features",
            value: layer
                .feature_count
                .map_or_else(|| NOT_AVAILABLE.to_string(), |count| count.to_string()),
        },
        ReportRow {
            property: "Extent",
            value: layer.extent.to_string(),
        },
        ReportRow {
            property: "SRS",
            value: srs.name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        },
        ReportRow {
            property: "Authority",
            value: srs
                .authority
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        },
        ReportRow {
            property: "SHA-256",
            value: report
                .checksum_sha256
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        },
    ];
    Table::new(rows).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoprobe_core::drivers::{find_driver, get_drivers};
    use geoprobe_core::{Envelope, LayerInfo, SrsInfo};

    fn report(checksum_sha256: Option<String>) -> ProbeReport {
        let extent = Envelope::from_corners(0.0, 0.0, 10.0, 5.0);
        ProbeReport {
            dataset: "parcels.shp".to_string(),
            driver: "ESRI Shapefile".to_string(),
            driver_long_name: "ESRI Shapefile / DBF".to_string(),
            layer_count: 1,
            layer: LayerInfo {
                name: "parcels".to_string(),
                feature_count: None,
                extent,
                extent_wkt: extent.to_wkt(),
                spatial_reference: SrsInfo {
                    name: Some("WGS 84".to_string()),
                    authority: None,
                    wkt: "GEOGCS[\"WGS 84\"]".to_string(),
                },
            },
            checksum_sha256,
        }
    }

    #[test]
    fn test_driver_row_from_descriptor() {
        let row = DriverRow::from(&find_driver("GPKG").unwrap());
        assert_eq!(row.short_name, "GPKG");
        assert_eq!(row.open, "Planned");
        assert_eq!(row.spatial_ref, "Planned");
    }

    #[test]
    fn test_render_drivers_lists_catalogue() {
        let table = render_drivers(&get_drivers());
        assert!(table.contains("Short Name"));
        assert!(table.contains("ESRI Shapefile / DBF"));
        assert!(table.contains("Not Supported"));
    }

    #[test]
    fn test_render_report() {
        let table = render_report(&report(Some("abc123".to_string())));
        assert!(table.contains("ESRI Shapefile (ESRI Shapefile / DBF)"));
        assert!(table.contains("0 0 10 5"));
        assert!(table.contains("WGS 84"));
        assert!(table.contains("abc123"));
    }

    #[test]
    fn test_render_report_missing_values() {
        let table = render_report(&report(None));
        assert_eq!(table.matches("N/A").count(), 3);
    }
}

//! Driver catalogue and registration.
//!
//! The catalogue is a static list of formats known to `geoprobe`, including
//! ones that are only planned, with the support status of each probe
//! operation. The registry holds the drivers that are actually linked and is
//! filled exactly once per process by [`register_all_drivers`].
//!
//! # Examples
//!
//! ```
//! use geoprobe_core::drivers::{find_driver, get_drivers, register_all_drivers};
//!
//! let shapefile = find_driver("esri shapefile").expect("Shapefile driver should exist");
//! assert!(shapefile.capabilities.extent.is_supported());
//!
//! let registry = register_all_drivers();
//! let usable = get_drivers().iter().filter(|d| d.can_probe()).count();
//! assert_eq!(registry.len(), usable);
//! ```

use std::sync::{Arc, OnceLock};

use geoprobe_core_common::DriverRegistry;
use log::debug;
use probe_cityjson::{CITYJSON_DRIVER, CITYJSONSEQ_DRIVER, CityJsonDriver, CityJsonSeqDriver};
use probe_csv::{CSV_DRIVER, CsvDriver};
use probe_geojson::{GEOJSON_DRIVER, GEOJSONSEQ_DRIVER, GeoJsonDriver, GeoJsonSeqDriver};
use probe_shapefile::{SHAPEFILE_DRIVER, ShapefileDriver};

pub use geoprobe_core_common::{Driver, DriverCapabilities, SupportStatus};

static REGISTRY: OnceLock<DriverRegistry> = OnceLock::new();

/// Returns the process-wide driver registry, registering every linked
/// driver on first use. Later calls return the same registry.
///
/// Registration order is identification order: sequence formats before
/// their single-document counterparts, and `CityJSON` before `GeoJSON`.
pub fn register_all_drivers() -> &'static DriverRegistry {
    REGISTRY.get_or_init(|| {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(CityJsonSeqDriver));
        registry.register(Arc::new(CityJsonDriver));
        registry.register(Arc::new(GeoJsonSeqDriver));
        registry.register(Arc::new(GeoJsonDriver));
        registry.register(Arc::new(CsvDriver));
        registry.register(Arc::new(ShapefileDriver));
        debug!("Registered {} format drivers: {registry:?}", registry.len());
        registry
    })
}

/// Returns the full catalogue of drivers known to `geoprobe`.
///
/// The list includes every driver regardless of its support status.
/// [`Driver::can_probe`] tells the ones that can be used today.
#[must_use]
pub fn get_drivers() -> Vec<Driver> {
    use SupportStatus::{NotSupported, Planned};

    vec![
        // Linked drivers
        CITYJSON_DRIVER.clone(),
        CITYJSONSEQ_DRIVER.clone(),
        CSV_DRIVER.clone(),
        SHAPEFILE_DRIVER.clone(),
        GEOJSON_DRIVER.clone(),
        GEOJSONSEQ_DRIVER.clone(),
        // Vector formats on the roadmap
        Driver::new("GPKG", "GeoPackage vector", Planned, Planned, Planned),
        Driver::new("FlatGeobuf", "FlatGeobuf", Planned, Planned, Planned),
        Driver::new("Parquet", "(Geo)Parquet", Planned, Planned, Planned),
        Driver::new(
            "GML",
            "Geography Markup Language",
            Planned,
            Planned,
            NotSupported,
        ),
        Driver::new(
            "KML",
            "Keyhole Markup Language",
            Planned,
            Planned,
            NotSupported,
        ),
        // Rasters and point clouds
        Driver::new("GTiff", "GeoTIFF", Planned, Planned, Planned),
        Driver::new(
            "LAS",
            "ASPRS LAS point cloud",
            NotSupported,
            NotSupported,
            NotSupported,
        ),
    ]
}

/// Finds a driver by its short name (case-insensitive).
///
/// Returns `None` if no driver with the given name exists in the catalogue.
#[must_use]
pub fn find_driver(name: &str) -> Option<Driver> {
    get_drivers()
        .into_iter()
        .find(|d| d.short_name.eq_ignore_ascii_case(name))
}

/// Returns all driver short names in alphabetically sorted order.
#[must_use]
pub fn get_driver_names() -> Vec<&'static str> {
    let mut names: Vec<_> = get_drivers().iter().map(|d| d.short_name).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_find_driver_case_insensitive() {
        let driver = find_driver("geojson");
        assert!(driver.is_some());
        assert_eq!(driver.unwrap().short_name, "GeoJSON");
        assert!(find_driver("InvalidDriver").is_none());
    }

    #[test]
    fn test_available_drivers_are_registered() {
        let registry = register_all_drivers();
        let available: Vec<_> = get_drivers().into_iter().filter(Driver::can_probe).collect();
        assert_eq!(available.len(), 6);
        for driver in &available {
            assert!(
                registry.find(driver.short_name).is_some(),
                "{} is not registered",
                driver.short_name
            );
        }
    }

    #[test]
    fn test_registration_is_one_time() {
        let first = register_all_drivers();
        let second = register_all_drivers();
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.len(), 6);
    }

    #[test]
    fn test_registration_order() {
        let names: Vec<_> = register_all_drivers()
            .descriptors()
            .iter()
            .map(|d| d.short_name)
            .collect();
        let position = |name| names.iter().position(|n| *n == name).unwrap();
        assert!(position("CityJSON") < position("GeoJSON"));
        assert!(position("CityJSONSeq") < position("CityJSON"));
        assert!(position("GeoJSONSeq") < position("GeoJSON"));
    }

    #[test]
    fn test_driver_names_sorted() {
        let names = get_driver_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"ESRI Shapefile"));
    }

    #[test]
    fn test_nothing_identifies_unknown_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(register_all_drivers().identify(Path::new(&path)).is_none());
    }
}

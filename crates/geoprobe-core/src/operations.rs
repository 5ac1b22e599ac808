//! The probe operation: open a dataset, read the extent and spatial
//! reference of its first layer, and log both.

use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use geoprobe_core_common::{
    DriverRegistry, Envelope, FormatDriver, FormatReadError, VectorDataset, VectorLayer,
};
use log::{debug, info, warn};

use crate::drivers::find_driver;
use crate::error::{DriverError, ProbeError, Result, driver_not_found};
use crate::options::ProbeOptions;
use crate::types::{LayerInfo, ProbeReport, SrsInfo};
use crate::utils::file_checksum;

/// An open dataset. Only exists when opening succeeded; dropping it
/// releases the dataset.
#[derive(Debug)]
pub struct DatasetHandle {
    dataset: Box<dyn VectorDataset>,
}

impl Deref for DatasetHandle {
    type Target = dyn VectorDataset;

    fn deref(&self) -> &Self::Target {
        self.dataset.as_ref()
    }
}

impl Drop for DatasetHandle {
    fn drop(&mut self) {
        debug!(
            "Released dataset {} ({})",
            self.dataset.path().display(),
            self.dataset.driver().short_name
        );
    }
}

/// Opens `path` read-only.
///
/// The driver is the one named by `options.driver`, or else the first
/// registered driver that identifies the path.
///
/// # Errors
///
/// - [`ProbeError::DatasetOpen`] if the path does not exist or the driver
///   cannot parse it.
/// - [`ProbeError::UnsupportedFormat`] if no driver identifies the path.
/// - [`ProbeError::Driver`] if the named driver is unknown or cannot probe.
pub fn open_dataset(
    registry: &DriverRegistry,
    path: &Path,
    options: &ProbeOptions,
) -> Result<DatasetHandle> {
    if let Err(err) = std::fs::metadata(path) {
        return Err(ProbeError::DatasetOpen {
            path: path.to_path_buf(),
            source: FormatReadError::io(err, path.display().to_string()),
        });
    }

    let driver = select_driver(registry, path, options.driver.as_deref())?;
    debug!(
        "Opening {} with the {} driver",
        path.display(),
        driver.descriptor().short_name
    );
    let dataset = driver
        .open(path, &options.open_options)
        .map_err(|source| ProbeError::DatasetOpen {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Dataset {} has {} layer(s)", path.display(), dataset.layer_count());
    Ok(DatasetHandle { dataset })
}

fn select_driver<'r>(
    registry: &'r DriverRegistry,
    path: &Path,
    name: Option<&str>,
) -> Result<&'r Arc<dyn FormatDriver>> {
    let Some(name) = name else {
        return registry
            .identify(path)
            .ok_or_else(|| ProbeError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
    };

    let descriptor = find_driver(name).ok_or_else(|| driver_not_found(name))?;
    if !descriptor.can_probe() {
        return Err(DriverError::OperationNotSupported {
            driver: descriptor.short_name.to_string(),
            operation: "probing".to_string(),
        }
        .into());
    }
    registry.find(descriptor.short_name).ok_or_else(|| {
        DriverError::NotRegistered {
            driver: descriptor.short_name.to_string(),
        }
        .into()
    })
}

/// Probes the first layer of the dataset at `path`.
///
/// Logs `Layer extent: minx miny maxx maxy` and then
/// `Layer spatial reference: <wkt>` at info level. The dataset is released
/// before returning, on success and on every error after a successful open.
///
/// # Errors
///
/// Returns the [`ProbeError`] of the first step that fails: opening,
/// layer lookup, extent, spatial reference, or the optional checksum.
pub fn probe(registry: &DriverRegistry, path: &Path, options: &ProbeOptions) -> Result<ProbeReport> {
    let dataset = open_dataset(registry, path, options)?;
    let layer = dataset.layer(0).ok_or_else(|| ProbeError::LayerNotFound {
        path: path.to_path_buf(),
        index: 0,
    })?;

    let extent = layer_extent(layer, path)?;
    info!(
        "Layer extent: {} {} {} {}",
        extent.min_x, extent.min_y, extent.max_x, extent.max_y
    );

    let srs = layer
        .spatial_ref()
        .ok_or_else(|| ProbeError::SpatialReferenceUnavailable {
            path: path.to_path_buf(),
            layer: layer.name().to_string(),
        })?;
    info!("Layer spatial reference: {}", srs.to_wkt());

    let feature_count = match layer.feature_count() {
        Ok(count) => Some(count),
        Err(err) => {
            warn!("Could not count features of {}: {err}", layer.name());
            None
        },
    };

    let checksum_sha256 = if options.checksum {
        dataset_checksum(path)?
    } else {
        None
    };

    Ok(ProbeReport {
        dataset: path.display().to_string(),
        driver: dataset.driver().short_name.to_string(),
        driver_long_name: dataset.driver().long_name.to_string(),
        layer_count: dataset.layer_count(),
        layer: LayerInfo {
            name: layer.name().to_string(),
            feature_count,
            extent,
            extent_wkt: extent.to_wkt(),
            spatial_reference: SrsInfo::from(srs),
        },
        checksum_sha256,
    })
}

fn layer_extent(layer: &dyn VectorLayer, path: &Path) -> Result<Envelope> {
    let unavailable = |reason: String| ProbeError::ExtentUnavailable {
        path: path.to_path_buf(),
        layer: layer.name().to_string(),
        reason,
    };
    layer
        .extent()
        .map_err(|err| unavailable(err.to_string()))?
        .ok_or_else(|| unavailable("layer has no geometry".to_string()))
}

/// Checksum of a dataset file. Directories have none.
fn dataset_checksum(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        debug!("Skipping checksum of {}: not a file", path.display());
        return Ok(None);
    }
    file_checksum(path)
        .map(Some)
        .map_err(|err| ProbeError::DatasetOpen {
            path: path.to_path_buf(),
            source: FormatReadError::io(err, path.display().to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::register_all_drivers;
    use crate::error::ErrorKind;
    use probe_shapefile::test_utils::write_point_shapefile;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const WGS84_PRJ: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;

    fn shapefile(dir: &TempDir, prj: Option<&str>) -> PathBuf {
        let path = dir.path().join("parcels.shp");
        write_point_shapefile(&path, &[(0.0, 0.0), (10.0, 5.0)], prj).unwrap();
        path
    }

    #[test]
    fn test_probe_shapefile() {
        let dir = TempDir::new().unwrap();
        let path = shapefile(&dir, Some(WGS84_PRJ));

        let report = probe(register_all_drivers(), &path, &ProbeOptions::new()).unwrap();
        assert_eq!(report.driver, "ESRI Shapefile");
        assert_eq!(report.layer_count, 1);
        assert_eq!(report.layer.name, "parcels");
        assert_eq!(report.layer.feature_count, Some(2));
        assert_eq!(report.layer.extent, Envelope::from_corners(0.0, 0.0, 10.0, 5.0));
        assert_eq!(report.layer.extent_wkt, "POLYGON ((0 0,10 0,10 5,0 5,0 0))");
        assert_eq!(report.layer.spatial_reference.name.as_deref(), Some("WGS 84"));
        assert!(report.checksum_sha256.is_none());
    }

    #[test]
    fn test_missing_path_is_open_failure() {
        let dir = TempDir::new().unwrap();
        let err = probe(
            register_all_drivers(),
            &dir.path().join("nope.xyz"),
            &ProbeOptions::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DatasetOpen);
    }

    #[test]
    fn test_missing_prj_is_srs_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = shapefile(&dir, None);
        let err = probe(register_all_drivers(), &path, &ProbeOptions::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SpatialReferenceUnavailable);
    }

    #[test]
    fn test_empty_directory_has_no_layer() {
        let dir = TempDir::new().unwrap();
        let err = probe(register_all_drivers(), dir.path(), &ProbeOptions::new()).unwrap_err();
        assert!(matches!(err, ProbeError::LayerNotFound { index: 0, .. }));
    }

    #[test]
    fn test_forced_driver() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("points.dat");
        write_point_shapefile(&path, &[(1.0, 2.0)], None).unwrap();
        std::fs::write(dir.path().join("points.prj"), WGS84_PRJ).unwrap();

        let options = ProbeOptions::new().with_driver("esri shapefile");
        let report = probe(register_all_drivers(), &path, &options).unwrap();
        assert_eq!(report.driver, "ESRI Shapefile");

        let err = probe(
            register_all_drivers(),
            &path,
            &ProbeOptions::new().with_driver("GeoJSON"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DatasetOpen);

        for name in ["GPKG", "NoSuchDriver"] {
            let err = probe(
                register_all_drivers(),
                &path,
                &ProbeOptions::new().with_driver(name),
            )
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedFormat, "{name}");
        }
    }

    #[test]
    fn test_checksum_of_file() {
        let dir = TempDir::new().unwrap();
        let path = shapefile(&dir, Some(WGS84_PRJ));
        let options = ProbeOptions::new().with_checksum(true);
        let report = probe(register_all_drivers(), &path, &options).unwrap();
        assert_eq!(report.checksum_sha256, Some(file_checksum(&path).unwrap()));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checksum_sha256"].as_str().map(str::len), Some(64));
        assert!(json.get("checksum").is_none());
    }

    #[test]
    fn test_handle_derefs_to_dataset() {
        let dir = TempDir::new().unwrap();
        let path = shapefile(&dir, None);
        let handle = open_dataset(register_all_drivers(), &path, &ProbeOptions::new()).unwrap();
        assert_eq!(handle.layer_count(), 1);
        assert_eq!(handle.path(), path.as_path());
    }
}

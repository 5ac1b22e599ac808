//! ESRI Shapefile driver.
//!
//! Opens either a single `.shp` file or a directory, in which case every
//! `.shp` file in it becomes a layer (sorted by file name). The layer extent
//! comes straight from the main file header; the spatial reference from the
//! `.prj` sidecar.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use geoprobe_core_common::io::LayeredDataset;
use geoprobe_core_common::{
    Driver, Envelope, FormatDriver, OpenOptions, SpatialReference, VectorDataset, VectorLayer,
};
use log::{debug, warn};
use probe_shared::sniff::{has_extension, layer_name, read_prefix, read_sidecar_text};
use probe_shared::{FormatReadError, FormatResult};

pub mod header;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use header::{ShapeType, ShapefileHeader};

/// Descriptor of the shapefile driver.
pub static SHAPEFILE_DRIVER: Driver = Driver::supported("ESRI Shapefile", "ESRI Shapefile / DBF");

/// Opens `.shp` files and directories of them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapefileDriver;

impl FormatDriver for ShapefileDriver {
    fn descriptor(&self) -> &'static Driver {
        &SHAPEFILE_DRIVER
    }

    fn identify(&self, path: &Path) -> bool {
        if path.is_dir() || has_extension(path, &["shp"]) {
            return true;
        }
        read_prefix(path, 4).is_ok_and(|bytes| {
            bytes.len() == 4 && header::be_i32(&bytes, 0) == header::FILE_CODE
        })
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> FormatResult<Box<dyn VectorDataset>> {
        for key in options.unknown_keys(self.accepted_options()) {
            warn!("ESRI Shapefile driver ignores open option {key}");
        }

        let layers = if path.is_dir() {
            open_directory(path)?
        } else {
            vec![ShapefileLayer::open(path)?]
        };
        Ok(Box::new(LayeredDataset::new(&SHAPEFILE_DRIVER, path, layers)))
    }
}

fn open_directory(dir: &Path) -> FormatResult<Vec<ShapefileLayer>> {
    let context = dir.display().to_string();
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|err| FormatReadError::io(err, &context))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_extension(p, &["shp"]))
        .collect();
    files.sort();

    let mut layers = Vec::with_capacity(files.len());
    for file in files {
        match ShapefileLayer::open(&file) {
            Ok(layer) => layers.push(layer),
            Err(err) => warn!("Skipping {}: {err}", file.display()),
        }
    }
    debug!("Directory {context} holds {} shapefile layer(s)", layers.len());
    Ok(layers)
}

/// One `.shp` file and its sidecars.
#[derive(Debug)]
pub struct ShapefileLayer {
    name: String,
    path: PathBuf,
    header: ShapefileHeader,
    srs: Option<SpatialReference>,
}

impl ShapefileLayer {
    /// Reads the header and `.prj` sidecar of the shapefile at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be read or is invalid.
    pub fn open(path: &Path) -> FormatResult<Self> {
        let header = ShapefileHeader::read_from(path)?;
        debug!(
            "Opened {} ({}, {} bytes declared)",
            path.display(),
            header.shape_type,
            header.file_length
        );
        let srs = match read_sidecar_text(path, "prj")? {
            Some(wkt) => match SpatialReference::from_wkt(&wkt) {
                Ok(srs) => Some(srs),
                Err(err) => {
                    warn!("Ignoring .prj of {}: {err}", path.display());
                    None
                },
            },
            None => None,
        };
        Ok(Self {
            name: layer_name(path),
            path: path.to_path_buf(),
            header,
            srs,
        })
    }

    /// Counts records by walking the 8-byte record headers.
    fn count_records(&self) -> FormatResult<u64> {
        let context = self.path.display().to_string();
        let file = File::open(&self.path).map_err(|err| FormatReadError::io(err, &context))?;
        let actual_len = file
            .metadata()
            .map_err(|err| FormatReadError::io(err, &context))?
            .len();
        let end = self.header.file_length.min(actual_len);
        if self.header.file_length > actual_len {
            warn!(
                "{context} is shorter ({actual_len} bytes) than its header declares ({})",
                self.header.file_length
            );
        }

        let mut reader = BufReader::new(file);
        let mut offset = header::HEADER_LEN as u64;
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|err| FormatReadError::io(err, &context))?;

        let mut count = 0;
        let mut record_header = [0u8; 8];
        while offset + 8 <= end {
            reader
                .read_exact(&mut record_header)
                .map_err(|err| FormatReadError::io(err, &context))?;
            let content_words = header::be_i32(&record_header, 4);
            let content_len = u64::try_from(content_words).map_err(|_| {
                FormatReadError::parse(
                    format!("record {} has negative length {content_words}", count + 1),
                    &context,
                )
            })? * 2;
            count += 1;
            offset += 8 + content_len;
            let skip = i64::try_from(content_len).unwrap_or(i64::MAX);
            reader
                .seek_relative(skip)
                .map_err(|err| FormatReadError::io(err, &context))?;
        }
        Ok(count)
    }
}

impl VectorLayer for ShapefileLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> FormatResult<u64> {
        self.count_records()
    }

    fn extent(&self) -> FormatResult<Option<Envelope>> {
        if self.header.has_records() {
            Ok(Some(self.header.bbox))
        } else {
            Ok(None)
        }
    }

    fn spatial_ref(&self) -> Option<&SpatialReference> {
        self.srs.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_point_shapefile;
    use tempfile::TempDir;

    const WGS84_PRJ: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;

    #[test]
    fn test_open_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("points.shp");
        write_point_shapefile(&path, &[(0.0, 0.0), (10.0, 5.0), (3.0, 2.0)], Some(WGS84_PRJ))
            .unwrap();

        assert!(ShapefileDriver.identify(&path));
        let dataset = ShapefileDriver.open(&path, &OpenOptions::new()).unwrap();
        assert_eq!(dataset.layer_count(), 1);
        let layer = dataset.layer(0).unwrap();
        assert_eq!(layer.name(), "points");
        assert_eq!(layer.feature_count().unwrap(), 3);
        assert_eq!(
            layer.extent().unwrap(),
            Some(Envelope::from_corners(0.0, 0.0, 10.0, 5.0))
        );
        assert_eq!(layer.spatial_ref().and_then(SpatialReference::name), Some("WGS 84"));
    }

    #[test]
    fn test_missing_prj_leaves_srs_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.shp");
        write_point_shapefile(&path, &[(1.0, 1.0)], None).unwrap();

        let dataset = ShapefileDriver.open(&path, &OpenOptions::new()).unwrap();
        assert!(dataset.layer(0).unwrap().spatial_ref().is_none());
    }

    #[test]
    fn test_empty_shapefile_has_no_extent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.shp");
        write_point_shapefile(&path, &[], Some(WGS84_PRJ)).unwrap();

        let dataset = ShapefileDriver.open(&path, &OpenOptions::new()).unwrap();
        let layer = dataset.layer(0).unwrap();
        assert_eq!(layer.feature_count().unwrap(), 0);
        assert_eq!(layer.extent().unwrap(), None);
    }

    #[test]
    fn test_directory_layers_are_sorted() {
        let dir = TempDir::new().unwrap();
        write_point_shapefile(&dir.path().join("b.shp"), &[(5.0, 5.0)], None).unwrap();
        write_point_shapefile(&dir.path().join("a.shp"), &[(1.0, 1.0)], None).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a shapefile").unwrap();

        assert!(ShapefileDriver.identify(dir.path()));
        let dataset = ShapefileDriver.open(dir.path(), &OpenOptions::new()).unwrap();
        assert_eq!(dataset.layer_count(), 2);
        assert_eq!(dataset.layer(0).unwrap().name(), "a");
        assert_eq!(dataset.layer(1).unwrap().name(), "b");
    }

    #[test]
    fn test_directory_without_shapefiles_has_zero_layers() {
        let dir = TempDir::new().unwrap();
        let dataset = ShapefileDriver.open(dir.path(), &OpenOptions::new()).unwrap();
        assert_eq!(dataset.layer_count(), 0);
        assert!(dataset.layer(0).is_none());
    }

    #[test]
    fn test_invalid_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.shp");
        std::fs::write(&path, b"definitely not a shapefile").unwrap();

        let err = ShapefileDriver.open(&path, &OpenOptions::new()).unwrap_err();
        assert!(err.is_io(), "short file should fail while reading: {err}");
    }

    #[test]
    fn test_identify_by_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("renamed.bin");
        write_point_shapefile(&path, &[(1.0, 2.0)], None).unwrap();
        assert!(ShapefileDriver.identify(&path));

        let other = dir.path().join("other.bin");
        std::fs::write(&other, b"{}").unwrap();
        assert!(!ShapefileDriver.identify(&other));
    }
}

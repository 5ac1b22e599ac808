//! `GeoJSON` and `GeoJSONSeq` drivers.
//!
//! Both expose a single layer named after the file. Extents are computed by
//! converting each geometry to `geo-types` and streaming its coordinates
//! through an [`EnvelopeBuilder`]. Without a legacy `crs` member the layer is
//! in WGS 84, as RFC 7946 mandates.

use std::path::{Path, PathBuf};

use geoprobe_core_common::io::LayeredDataset;
use geoprobe_core_common::{
    Driver, Envelope, EnvelopeBuilder, FormatDriver, OpenOptions, SpatialReference, VectorDataset,
    VectorLayer,
};
use geozero::GeozeroGeometry;
use log::{debug, warn};
use probe_shared::sniff::{
    first_significant_byte, has_compound_suffix, has_extension, layer_name, sniff_prefix,
};
use probe_shared::{FormatReadError, FormatResult};

pub mod parser;

use parser::{ParsedDocument, parse_geojson_sequence, parse_geojson_str, srs_from_crs_member};

/// Descriptor of the `GeoJSON` driver.
pub static GEOJSON_DRIVER: Driver = Driver::supported("GeoJSON", "GeoJSON");

/// Descriptor of the `GeoJSONSeq` driver.
pub static GEOJSONSEQ_DRIVER: Driver =
    Driver::supported("GeoJSONSeq", "GeoJSONSeq: sequence of GeoJSON features");

/// Reads `.geojson` files and `.json` files whose content looks like `GeoJSON`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonDriver;

impl FormatDriver for GeoJsonDriver {
    fn descriptor(&self) -> &'static Driver {
        &GEOJSON_DRIVER
    }

    fn identify(&self, path: &Path) -> bool {
        if has_extension(path, &["geojson"]) {
            return true;
        }
        if has_compound_suffix(path, &[".city", ".json"])
            || has_extension(path, &["geojsonl", "geojsons", "geojsonseq"])
        {
            return false;
        }
        sniff_prefix(path).is_some_and(|bytes| looks_like_geojson(&bytes))
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> FormatResult<Box<dyn VectorDataset>> {
        warn_unknown_options(&GEOJSON_DRIVER, options, self.accepted_options());
        let context = path.display().to_string();
        let text = read_text(path, &context)?;
        let document = parse_geojson_str(&text, &context)?;
        let layer = GeoJsonLayer::from_document(path, document);
        Ok(Box::new(LayeredDataset::single(&GEOJSON_DRIVER, path, layer)))
    }
}

/// Reads newline-delimited (`.geojsonl`) and RS-delimited (`.geojsons`)
/// `GeoJSON` feature sequences.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonSeqDriver;

impl FormatDriver for GeoJsonSeqDriver {
    fn descriptor(&self) -> &'static Driver {
        &GEOJSONSEQ_DRIVER
    }

    fn identify(&self, path: &Path) -> bool {
        if has_extension(path, &["geojsonl", "geojsons", "geojsonseq"]) {
            return true;
        }
        sniff_prefix(path).is_some_and(|bytes| first_significant_byte(&bytes) == Some(0x1e))
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> FormatResult<Box<dyn VectorDataset>> {
        warn_unknown_options(&GEOJSONSEQ_DRIVER, options, self.accepted_options());
        let context = path.display().to_string();
        let text = read_text(path, &context)?;
        let document = parse_geojson_sequence(&text, &context)?;
        let layer = GeoJsonLayer::from_document(path, document);
        Ok(Box::new(LayeredDataset::single(&GEOJSONSEQ_DRIVER, path, layer)))
    }
}

fn warn_unknown_options(driver: &Driver, options: &OpenOptions, accepted: &[&str]) {
    for key in options.unknown_keys(accepted) {
        warn!("{} driver ignores open option {key}", driver.short_name);
    }
}

fn read_text(path: &Path, context: &str) -> FormatResult<String> {
    let text = std::fs::read_to_string(path).map_err(|err| FormatReadError::io(err, context))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Cheap content check: a JSON object mentioning a `GeoJSON` type, and not
/// a `CityJSON` document.
fn looks_like_geojson(prefix: &[u8]) -> bool {
    if first_significant_byte(prefix) != Some(b'{') {
        return false;
    }
    let text = String::from_utf8_lossy(prefix);
    if text.contains("\"CityJSON") {
        return false;
    }
    [
        "\"FeatureCollection\"",
        "\"Feature\"",
        "\"Point\"",
        "\"LineString\"",
        "\"Polygon\"",
        "\"MultiPoint\"",
        "\"MultiLineString\"",
        "\"MultiPolygon\"",
        "\"GeometryCollection\"",
    ]
    .iter()
    .any(|marker| text.contains(marker))
}

/// The single layer of a `GeoJSON` or `GeoJSONSeq` dataset.
#[derive(Debug)]
pub struct GeoJsonLayer {
    name: String,
    path: PathBuf,
    geometries: Vec<Option<geojson::Geometry>>,
    srs: Option<SpatialReference>,
}

impl GeoJsonLayer {
    fn from_document(path: &Path, document: ParsedDocument) -> Self {
        let srs = match &document.crs {
            None => Some(SpatialReference::wgs84()),
            Some(crs) => match srs_from_crs_member(crs) {
                Ok(srs) => Some(srs),
                Err(reason) => {
                    warn!("Unusable 'crs' member in {}: {reason}", path.display());
                    None
                },
            },
        };
        debug!(
            "Parsed {} feature(s) from {}",
            document.geometries.len(),
            path.display()
        );
        Self {
            name: layer_name(path),
            path: path.to_path_buf(),
            geometries: document.geometries,
            srs,
        }
    }
}

impl VectorLayer for GeoJsonLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> FormatResult<u64> {
        Ok(self.geometries.len() as u64)
    }

    fn extent(&self) -> FormatResult<Option<Envelope>> {
        let context = self.path.display().to_string();
        let mut builder = EnvelopeBuilder::new();
        for (index, geometry) in self.geometries.iter().enumerate() {
            let Some(geometry) = geometry else {
                continue;
            };
            let converted = geo_types::Geometry::<f64>::try_from(geometry.value.clone())
                .map_err(|err| {
                    FormatReadError::parse(
                        format!("Failed to convert geometry of feature {index}: {err}"),
                        &context,
                    )
                })?;
            converted.process_geom(&mut builder).map_err(|err| {
                FormatReadError::parse(
                    format!("Failed to read coordinates of feature {index}: {err}"),
                    &context,
                )
            })?;
        }
        Ok(builder.finish())
    }

    fn spatial_ref(&self) -> Option<&SpatialReference> {
        self.srs.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create test `GeoJSON` data
    fn create_test_geojson(path: &Path) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        writeln!(
            file,
            r#"{{
  "type": "FeatureCollection",
  "features": [
    {{
      "type": "Feature",
      "geometry": {{
        "type": "Point",
        "coordinates": [-74.0060, 40.7128]
      }},
      "properties": {{
        "name": "New York",
        "population": 8336817
      }}
    }},
    {{
      "type": "Feature",
      "geometry": {{
        "type": "Point",
        "coordinates": [-118.2437, 34.0522]
      }},
      "properties": {{
        "name": "Los Angeles",
        "population": 3979576
      }}
    }}
  ]
}}"#
        )?;
        Ok(())
    }

    #[test]
    fn test_open_feature_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cities.geojson");
        create_test_geojson(&path).unwrap();

        assert!(GeoJsonDriver.identify(&path));
        let dataset = GeoJsonDriver.open(&path, &OpenOptions::new()).unwrap();
        let layer = dataset.layer(0).unwrap();
        assert_eq!(layer.name(), "cities");
        assert_eq!(layer.feature_count().unwrap(), 2);
        assert_eq!(
            layer.extent().unwrap(),
            Some(Envelope::from_corners(-118.2437, 34.0522, -74.006, 40.7128))
        );
        let srs = layer.spatial_ref().unwrap();
        assert_eq!(srs.name(), Some("WGS 84"));
    }

    #[test]
    fn test_polygon_with_declared_crs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parcel.json");
        std::fs::write(
            &path,
            r#"{"type": "Feature",
                "crs": {"type": "name", "properties": {"name": "EPSG:28992"}},
                "geometry": {"type": "Polygon", "coordinates": [[[85000, 445000], [86000, 445000], [86000, 447500], [85000, 445000]]]},
                "properties": null}"#,
        )
        .unwrap();

        assert!(GeoJsonDriver.identify(&path));
        let dataset = GeoJsonDriver.open(&path, &OpenOptions::new()).unwrap();
        let layer = dataset.layer(0).unwrap();
        assert_eq!(
            layer.extent().unwrap(),
            Some(Envelope::from_corners(85000.0, 445000.0, 86000.0, 447500.0))
        );
        assert_eq!(layer.spatial_ref().unwrap().epsg_code(), Some(28992));
    }

    #[test]
    fn test_unknown_crs_leaves_srs_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unknown.geojson");
        std::fs::write(
            &path,
            r#"{"type": "FeatureCollection",
                "crs": {"type": "name", "properties": {"name": "EPSG:99999"}},
                "features": [{"type": "Feature", "geometry": {"type": "Point", "coordinates": [2600000, 1200000]}, "properties": {}}]}"#,
        )
        .unwrap();

        let dataset = GeoJsonDriver.open(&path, &OpenOptions::new()).unwrap();
        assert!(dataset.layer(0).unwrap().spatial_ref().is_none());
    }

    #[test]
    fn test_named_crs_outside_common_codes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("swiss.geojson");
        std::fs::write(
            &path,
            r#"{"type": "FeatureCollection",
                "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::2056"}},
                "features": [{"type": "Feature", "geometry": {"type": "Point", "coordinates": [2600000, 1200000]}, "properties": {}}]}"#,
        )
        .unwrap();

        let dataset = GeoJsonDriver.open(&path, &OpenOptions::new()).unwrap();
        let srs = dataset.layer(0).unwrap().spatial_ref().unwrap();
        assert_eq!(srs.epsg_code(), Some(2056));
        assert!(srs.to_wkt().contains("CH1903+"));
    }

    #[test]
    fn test_empty_collection_has_no_extent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.geojson");
        std::fs::write(&path, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();

        let dataset = GeoJsonDriver.open(&path, &OpenOptions::new()).unwrap();
        let layer = dataset.layer(0).unwrap();
        assert_eq!(layer.feature_count().unwrap(), 0);
        assert_eq!(layer.extent().unwrap(), None);
    }

    #[test]
    fn test_invalid_json_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.geojson");
        std::fs::write(&path, "{\"type\": \"FeatureCollection\", \"features\": [").unwrap();

        let err = GeoJsonDriver.open(&path, &OpenOptions::new()).unwrap_err();
        assert!(!err.is_io());
    }

    #[test]
    fn test_identify_rejects_cityjson_and_other_json() {
        let dir = TempDir::new().unwrap();
        let city = dir.path().join("model.json");
        std::fs::write(&city, r#"{"type": "CityJSON", "version": "2.0", "CityObjects": {}}"#)
            .unwrap();
        assert!(!GeoJsonDriver.identify(&city));

        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"name": "not spatial"}"#).unwrap();
        assert!(!GeoJsonDriver.identify(&config));

        assert!(!GeoJsonDriver.identify(&dir.path().join("missing.json")));
    }

    #[test]
    fn test_geojson_sequence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracks.geojsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [2, 3]]}, "properties": {}}"#,
                "\n",
                r#"{"type": "Feature", "geometry": {"type": "Point", "coordinates": [-1, 1]}, "properties": {}}"#,
                "\n"
            ),
        )
        .unwrap();

        assert!(GeoJsonSeqDriver.identify(&path));
        assert!(!GeoJsonDriver.identify(&path));
        let dataset = GeoJsonSeqDriver.open(&path, &OpenOptions::new()).unwrap();
        assert_eq!(dataset.driver().short_name, "GeoJSONSeq");
        let layer = dataset.layer(0).unwrap();
        assert_eq!(layer.feature_count().unwrap(), 2);
        assert_eq!(
            layer.extent().unwrap(),
            Some(Envelope::from_corners(-1.0, 0.0, 2.0, 3.0))
        );
    }

    #[test]
    fn test_sequence_identified_by_record_separator() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stream.txt");
        std::fs::write(&path, "\u{1e}{\"type\":\"Point\",\"coordinates\":[1,2]}\n").unwrap();
        assert!(GeoJsonSeqDriver.identify(&path));
    }
}

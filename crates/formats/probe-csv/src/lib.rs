//! CSV driver.
//!
//! A CSV file is a single layer. Geometry comes from a WKT column or an X/Y
//! column pair (see [`geospatial`]); the spatial reference from an optional
//! `.prj` sidecar.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord};
use geoprobe_core_common::io::LayeredDataset;
use geoprobe_core_common::{
    Driver, Envelope, EnvelopeBuilder, FormatDriver, OpenOptions, SpatialReference, VectorDataset,
    VectorLayer,
};
use log::{debug, warn};
use probe_shared::sniff::{has_extension, layer_name, read_prefix, read_sidecar_text, SNIFF_LEN};
use probe_shared::{FormatReadError, FormatResult, SourcePosition};

pub mod geospatial;

pub use geospatial::{GEOMETRY_COLUMN, GeometrySource, X_COLUMN, Y_COLUMN};

/// Descriptor of the CSV driver.
pub static CSV_DRIVER: Driver = Driver::supported("CSV", "Comma Separated Value (.csv)");

const ACCEPTED_OPTIONS: &[&str] = &[GEOMETRY_COLUMN, X_COLUMN, Y_COLUMN];

/// Delimiters considered when sniffing the header line.
const DELIMITER_CANDIDATES: &[u8] = b",;\t|";

/// Reader configuration for one CSV file.
#[derive(Debug, Clone, Copy)]
pub struct CsvFormatOptions {
    pub delimiter: u8,
    pub has_header: bool,
}

impl Default for CsvFormatOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
        }
    }
}

impl CsvFormatOptions {
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn reader(self, path: &Path) -> FormatResult<Reader<File>> {
        let file =
            File::open(path).map_err(|err| FormatReadError::io(err, path.display().to_string()))?;
        Ok(ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(file))
    }
}

/// Picks the candidate delimiter occurring most often on the first line.
/// Falls back to a comma.
#[must_use]
pub fn sniff_delimiter(prefix: &[u8]) -> u8 {
    let first_line = prefix.split(|b| *b == b'\n').next().unwrap_or_default();
    DELIMITER_CANDIDATES
        .iter()
        .map(|d| (*d, first_line.iter().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map_or(b',', |(d, _)| d)
}

/// Opens `.csv` and `.tsv` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvDriver;

impl FormatDriver for CsvDriver {
    fn descriptor(&self) -> &'static Driver {
        &CSV_DRIVER
    }

    fn identify(&self, path: &Path) -> bool {
        path.is_file() && has_extension(path, &["csv", "tsv"])
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> FormatResult<Box<dyn VectorDataset>> {
        for key in options.unknown_keys(ACCEPTED_OPTIONS) {
            warn!("CSV driver ignores open option {key}");
        }
        let layer = CsvLayer::open(path, options)?;
        Ok(Box::new(LayeredDataset::single(&CSV_DRIVER, path, layer)))
    }

    fn accepted_options(&self) -> &'static [&'static str] {
        ACCEPTED_OPTIONS
    }
}

/// A CSV file opened as a layer.
#[derive(Debug)]
pub struct CsvLayer {
    name: String,
    path: PathBuf,
    format: CsvFormatOptions,
    headers: StringRecord,
    geometry: Option<GeometrySource>,
    srs: Option<SpatialReference>,
}

impl CsvLayer {
    /// Reads the header, resolves the geometry columns and loads the `.prj`
    /// sidecar.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has no header, or an
    /// open option names a missing column.
    pub fn open(path: &Path, options: &OpenOptions) -> FormatResult<Self> {
        let context = path.display().to_string();
        let prefix = read_prefix(path, SNIFF_LEN).map_err(|err| FormatReadError::io(err, &context))?;
        let format = CsvFormatOptions::default().with_delimiter(sniff_delimiter(&prefix));

        let headers = format
            .reader(path)?
            .headers()
            .map_err(|err| csv_error(err, &context))?
            .clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(FormatReadError::InvalidHeader {
                message: "CSV file has no header row".to_string(),
                context: Some(context),
            });
        }

        let geometry = GeometrySource::resolve(&headers, options, &context)?;
        match &geometry {
            Some(source) => debug!("{context}: geometry from {source:?}"),
            None => debug!("{context}: no geometry column among {headers:?}"),
        }

        let srs = match read_sidecar_text(path, "prj")? {
            Some(wkt) => match SpatialReference::from_wkt(&wkt) {
                Ok(srs) => Some(srs),
                Err(err) => {
                    warn!("Ignoring .prj of {context}: {err}");
                    None
                },
            },
            None => None,
        };

        Ok(Self {
            name: layer_name(path),
            path: path.to_path_buf(),
            format,
            headers,
            geometry,
            srs,
        })
    }

    /// Column names of the header row.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    #[must_use]
    pub fn geometry_source(&self) -> Option<&GeometrySource> {
        self.geometry.as_ref()
    }

    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.format.delimiter
    }

    fn context(&self) -> String {
        self.path.display().to_string()
    }
}

impl VectorLayer for CsvLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> FormatResult<u64> {
        let context = self.context();
        let mut reader = self.format.reader(&self.path)?;
        let mut record = StringRecord::new();
        let mut count = 0;
        while reader
            .read_record(&mut record)
            .map_err(|err| csv_error(err, &context))?
        {
            count += 1;
        }
        Ok(count)
    }

    fn extent(&self) -> FormatResult<Option<Envelope>> {
        let Some(source) = &self.geometry else {
            return Ok(None);
        };
        let context = self.context();
        let mut reader = self.format.reader(&self.path)?;
        let mut record = StringRecord::new();
        let mut builder = EnvelopeBuilder::new();
        while reader
            .read_record(&mut record)
            .map_err(|err| csv_error(err, &context))?
        {
            source.accumulate(&record, &mut builder, &context)?;
        }
        Ok(builder.finish())
    }

    fn spatial_ref(&self) -> Option<&SpatialReference> {
        self.srs.as_ref()
    }
}

fn csv_error(err: csv::Error, context: &str) -> FormatReadError {
    let message = err.to_string();
    let position = err.position().map(|p| SourcePosition {
        line: Some(p.line()),
        record: Some(p.record()),
        byte_offset: Some(p.byte()),
        ..SourcePosition::default()
    });
    match (err.into_kind(), position) {
        (csv::ErrorKind::Io(io), _) => FormatReadError::io(io, context),
        (_, Some(position)) => FormatReadError::parse_at(message, position, context),
        (_, None) => FormatReadError::parse(message, context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_delimiter(b"a;b;c\n1,5;2,5;3"), b';');
        assert_eq!(sniff_delimiter(b"a\tb\n"), b'\t');
        assert_eq!(sniff_delimiter(b"single\n"), b',');
        assert_eq!(sniff_delimiter(b""), b',');
    }

    #[test]
    fn test_wkt_layer() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "roads.csv",
            "id,WKT\n1,\"LINESTRING (0 0, 4 2)\"\n2,\"POINT (10 5)\"\n3,\n",
        );
        assert!(CsvDriver.identify(&path));

        let dataset = CsvDriver.open(&path, &OpenOptions::new()).unwrap();
        let layer = dataset.layer(0).unwrap();
        assert_eq!(layer.name(), "roads");
        assert_eq!(layer.feature_count().unwrap(), 3);
        assert_eq!(
            layer.extent().unwrap(),
            Some(Envelope::from_corners(0.0, 0.0, 10.0, 5.0))
        );
        assert!(layer.spatial_ref().is_none());
    }

    #[test]
    fn test_xy_layer_with_semicolons_and_prj() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "wells.csv", "name;lon;lat\na;4.5;52.1\nb;5.25;51.9\n");
        std::fs::write(
            dir.path().join("wells.prj"),
            SpatialReference::wgs84().to_wkt(),
        )
        .unwrap();

        let layer = CsvLayer::open(&path, &OpenOptions::new()).unwrap();
        assert_eq!(layer.delimiter(), b';');
        assert_eq!(
            layer.extent().unwrap(),
            Some(Envelope::from_corners(4.5, 51.9, 5.25, 52.1))
        );
        assert_eq!(layer.spatial_ref().and_then(SpatialReference::epsg_code), Some(4326));
    }

    #[test]
    fn test_layer_without_geometry() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "plain.csv", "id,name\n1,a\n");
        let layer = CsvLayer::open(&path, &OpenOptions::new()).unwrap();
        assert!(layer.geometry_source().is_none());
        assert_eq!(layer.extent().unwrap(), None);
        assert_eq!(layer.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_open_options_select_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "grid.csv", "e,n\n100,200\n300,50\n");

        let options = OpenOptions::new().with("x_column", "e").with("y_column", "n");
        let layer = CsvLayer::open(&path, &options).unwrap();
        assert_eq!(
            layer.extent().unwrap(),
            Some(Envelope::from_corners(100.0, 50.0, 300.0, 200.0))
        );

        let options = OpenOptions::new().with(GEOMETRY_COLUMN, "shape");
        assert!(CsvDriver.open(&path, &options).is_err());
    }

    #[test]
    fn test_bad_wkt_reports_position() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.csv", "wkt\nPOINT (1 1)\nPOINT (oops)\n");
        let layer = CsvLayer::open(&path, &OpenOptions::new()).unwrap();
        let err = layer.extent().unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn test_identify_requires_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "data.txt", "x,y\n1,2\n");
        assert!(!CsvDriver.identify(&path));
        assert!(!CsvDriver.identify(dir.path()));
    }
}

//! `CityJSON` and `CityJSONSeq` drivers.
//!
//! A document is one layer. Its extent is the planar bounding box of all
//! vertices after the `transform` is applied; its spatial reference comes
//! from `metadata.referenceSystem`.

use std::path::Path;

use geoprobe_core_common::io::LayeredDataset;
use geoprobe_core_common::{
    Driver, Envelope, EnvelopeBuilder, FormatDriver, OpenOptions, SpatialReference, VectorDataset,
    VectorLayer,
};
use log::{debug, warn};
use probe_shared::sniff::{
    first_significant_byte, has_compound_suffix, has_extension, layer_name, sniff_prefix,
};
use probe_shared::{FormatReadError, FormatResult, SourcePosition};

pub mod model;

use model::{CityJsonDocument, CityJsonFeature, Metadata, accumulate_vertices};

/// Descriptor of the `CityJSON` driver.
pub static CITYJSON_DRIVER: Driver = Driver::supported("CityJSON", "CityJSON");

/// Descriptor of the `CityJSONSeq` driver.
pub static CITYJSONSEQ_DRIVER: Driver =
    Driver::supported("CityJSONSeq", "CityJSON Text Sequences (CityJSONL)");

/// Reads `.city.json` and `.cityjson` files, or JSON documents of type
/// `CityJSON`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CityJsonDriver;

impl FormatDriver for CityJsonDriver {
    fn descriptor(&self) -> &'static Driver {
        &CITYJSON_DRIVER
    }

    fn identify(&self, path: &Path) -> bool {
        if has_compound_suffix(path, &[".city", ".json"]) || has_extension(path, &["cityjson"]) {
            return true;
        }
        if is_sequence_path(path) {
            return false;
        }
        sniff_prefix(path).is_some_and(|bytes| {
            let text = String::from_utf8_lossy(&bytes);
            first_significant_byte(&bytes) == Some(b'{')
                && text.contains("\"CityJSON\"")
                && !text.contains("\"CityJSONFeature\"")
        })
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> FormatResult<Box<dyn VectorDataset>> {
        warn_unknown_options(&CITYJSON_DRIVER, options);
        let context = path.display().to_string();
        let text = read_text(path, &context)?;
        let document: CityJsonDocument =
            serde_json::from_str(&text).map_err(|err| json_error(&err, 0, &context))?;
        check_kind(&document.kind, "CityJSON", 1, &context)?;
        debug!(
            "{context}: CityJSON {} with {} city objects",
            document.version.as_deref().unwrap_or("(no version)"),
            document.city_objects.len()
        );

        let transform = document.transform.unwrap_or_default();
        let mut builder = EnvelopeBuilder::new();
        match &document.vertices {
            Some(vertices) => accumulate_vertices(vertices, &transform, &mut builder),
            None => warn!("{context} has no 'vertices' member"),
        }

        let layer = CityJsonLayer {
            name: layer_name(path),
            feature_count: document.city_objects.len() as u64,
            extent: builder.finish(),
            srs: reference_system(document.metadata.as_ref(), &context),
        };
        Ok(Box::new(LayeredDataset::single(&CITYJSON_DRIVER, path, layer)))
    }
}

/// Reads `.city.jsonl` and `.cityjsonl` streams: a `CityJSON` header line
/// followed by one `CityJSONFeature` per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct CityJsonSeqDriver;

impl FormatDriver for CityJsonSeqDriver {
    fn descriptor(&self) -> &'static Driver {
        &CITYJSONSEQ_DRIVER
    }

    fn identify(&self, path: &Path) -> bool {
        if is_sequence_path(path) {
            return true;
        }
        sniff_prefix(path).is_some_and(|bytes| {
            let text = String::from_utf8_lossy(&bytes);
            first_significant_byte(&bytes) == Some(b'{')
                && text.contains("\"CityJSON\"")
                && text.contains("\"CityJSONFeature\"")
        })
    }

    fn open(&self, path: &Path, options: &OpenOptions) -> FormatResult<Box<dyn VectorDataset>> {
        warn_unknown_options(&CITYJSONSEQ_DRIVER, options);
        let context = path.display().to_string();
        let text = read_text(path, &context)?;

        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx as u64 + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let Some((header_line, header_text)) = lines.next() else {
            return Err(FormatReadError::InvalidHeader {
                message: "stream is empty, expected a CityJSON header line".to_string(),
                context: Some(context),
            });
        };
        let header: CityJsonDocument = serde_json::from_str(header_text)
            .map_err(|err| json_error(&err, header_line, &context))?;
        check_kind(&header.kind, "CityJSON", header_line, &context)?;
        let transform = header.transform.unwrap_or_default();

        let mut builder = EnvelopeBuilder::new();
        let mut feature_count = 0;
        for (line_number, line) in lines {
            let feature: CityJsonFeature = serde_json::from_str(line)
                .map_err(|err| json_error(&err, line_number, &context))?;
            check_kind(&feature.kind, "CityJSONFeature", line_number, &context)?;
            if feature.vertices.is_empty() {
                debug!(
                    "{context}: feature {} has no vertices",
                    feature.id.as_deref().unwrap_or("?")
                );
            }
            accumulate_vertices(&feature.vertices, &transform, &mut builder);
            feature_count += 1;
        }

        let layer = CityJsonLayer {
            name: layer_name(path),
            feature_count,
            extent: builder.finish(),
            srs: reference_system(header.metadata.as_ref(), &context),
        };
        Ok(Box::new(LayeredDataset::single(&CITYJSONSEQ_DRIVER, path, layer)))
    }
}

fn is_sequence_path(path: &Path) -> bool {
    has_compound_suffix(path, &[".city", ".jsonl"]) || has_extension(path, &["cityjsonl"])
}

fn warn_unknown_options(driver: &Driver, options: &OpenOptions) {
    for key in options.unknown_keys(&[]) {
        warn!("{} driver ignores open option {key}", driver.short_name);
    }
}

fn read_text(path: &Path, context: &str) -> FormatResult<String> {
    let text = std::fs::read_to_string(path).map_err(|err| FormatReadError::io(err, context))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Maps a `serde_json` error to a parse error. `line` is the line the text
/// started on in the file, or 0 when the text is the whole file.
fn json_error(err: &serde_json::Error, line: u64, context: &str) -> FormatReadError {
    let position = SourcePosition {
        line: Some(if line == 0 { err.line() as u64 } else { line }),
        column: Some(err.column() as u64),
        ..SourcePosition::default()
    };
    FormatReadError::parse_at(format!("Invalid CityJSON: {err}"), position, context)
}

fn check_kind(kind: &str, expected: &str, line: u64, context: &str) -> FormatResult<()> {
    if kind == expected {
        Ok(())
    } else {
        Err(FormatReadError::parse_at(
            format!("expected type '{expected}', found '{kind}'"),
            SourcePosition::line(line),
            context,
        ))
    }
}

/// Resolves `metadata.referenceSystem`, e.g.
/// `https://www.opengis.net/def/crs/EPSG/0/28992`.
fn reference_system(metadata: Option<&Metadata>, context: &str) -> Option<SpatialReference> {
    let Some(identifier) = metadata.and_then(|m| m.reference_system.as_deref()) else {
        debug!("{context} declares no referenceSystem");
        return None;
    };
    match SpatialReference::from_user_input(identifier) {
        Ok(srs) => Some(srs),
        Err(err) => {
            warn!("Cannot use referenceSystem of {context}: {err}");
            None
        },
    }
}

/// The single layer of a `CityJSON` dataset. The extent is computed while
/// opening, since the whole document is parsed anyway.
#[derive(Debug)]
pub struct CityJsonLayer {
    name: String,
    feature_count: u64,
    extent: Option<Envelope>,
    srs: Option<SpatialReference>,
}

impl VectorLayer for CityJsonLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_count(&self) -> FormatResult<u64> {
        Ok(self.feature_count)
    }

    fn extent(&self) -> FormatResult<Option<Envelope>> {
        Ok(self.extent)
    }

    fn spatial_ref(&self) -> Option<&SpatialReference> {
        self.srs.as_ref()
    }
}

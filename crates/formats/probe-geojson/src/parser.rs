//! `GeoJSON` parsing helpers shared by the `GeoJSON` and `GeoJSONSeq` drivers.

use geojson::{Feature, GeoJson, Geometry, JsonObject, JsonValue};
use geoprobe_core_common::SpatialReference;
use probe_shared::{FormatReadError, FormatResult, SourcePosition};

/// Record separator that prefixes each text of an RFC 8142 sequence.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Geometries of a parsed document, one entry per feature (`None` for
/// features with a null geometry), plus the legacy `crs` member if present.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub geometries: Vec<Option<Geometry>>,
    pub crs: Option<JsonValue>,
}

/// Parses a complete `GeoJSON` text (`FeatureCollection`, `Feature` or bare
/// geometry).
///
/// # Errors
///
/// Returns a parse error when the text is not valid `GeoJSON`.
pub fn parse_geojson_str(text: &str, context: &str) -> FormatResult<ParsedDocument> {
    let geojson = text
        .parse::<GeoJson>()
        .map_err(|err| FormatReadError::parse(format!("Invalid GeoJSON: {err}"), context))?;
    Ok(document_from_geojson(geojson))
}

/// Parses newline-delimited or RS-delimited `GeoJSON` texts.
///
/// # Errors
///
/// Returns a parse error pointing at the offending line.
pub fn parse_geojson_sequence(text: &str, context: &str) -> FormatResult<ParsedDocument> {
    let mut document = ParsedDocument::default();
    for (line_idx, raw_line) in text.lines().enumerate() {
        let line_number = (line_idx + 1) as u64;
        for record in raw_line.split(RECORD_SEPARATOR) {
            let record = record.trim();
            if record.is_empty() {
                continue;
            }
            let geojson = record.parse::<GeoJson>().map_err(|err| {
                FormatReadError::parse_at(
                    format!("Failed to parse GeoJSON feature: {err}"),
                    SourcePosition::line(line_number),
                    context,
                )
            })?;
            let parsed = document_from_geojson(geojson);
            document.geometries.extend(parsed.geometries);
        }
    }
    Ok(document)
}

fn document_from_geojson(geojson: GeoJson) -> ParsedDocument {
    match geojson {
        GeoJson::FeatureCollection(collection) => ParsedDocument {
            crs: crs_member(collection.foreign_members.as_ref()),
            geometries: collection
                .features
                .into_iter()
                .map(|feature: Feature| feature.geometry)
                .collect(),
        },
        GeoJson::Feature(feature) => ParsedDocument {
            crs: crs_member(feature.foreign_members.as_ref()),
            geometries: vec![feature.geometry],
        },
        GeoJson::Geometry(geometry) => ParsedDocument {
            crs: crs_member(geometry.foreign_members.as_ref()),
            geometries: vec![Some(geometry)],
        },
    }
}

fn crs_member(members: Option<&JsonObject>) -> Option<JsonValue> {
    members
        .and_then(|m| m.get("crs"))
        .filter(|v| !v.is_null())
        .cloned()
}

/// Interprets the pre-RFC 7946 `crs` member:
/// `{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::28992"}}`
/// or `{"type": "EPSG", "properties": {"code": 28992}}`.
///
/// # Errors
///
/// Returns a description of the problem when the member cannot be mapped to
/// a spatial reference.
pub fn srs_from_crs_member(crs: &JsonValue) -> Result<SpatialReference, String> {
    let JsonValue::Object(object) = crs else {
        return Err(format!(
            "'crs' member is {}, expected object",
            describe_value(crs)
        ));
    };
    let properties = object
        .get("properties")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| "'crs' member has no 'properties' object".to_string())?;
    let kind = object.get("type").and_then(JsonValue::as_str).unwrap_or("name");

    let identifier = if kind.eq_ignore_ascii_case("EPSG") {
        match properties.get("code") {
            Some(JsonValue::Number(code)) => format!("EPSG:{code}"),
            Some(JsonValue::String(code)) => format!("EPSG:{code}"),
            Some(other) => {
                return Err(format!(
                    "'crs' code is {}, expected number",
                    describe_value(other)
                ));
            },
            None => return Err("'crs' member has no 'code'".to_string()),
        }
    } else {
        properties
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| "'crs' member has no 'name' string".to_string())?
            .to_string()
    };

    SpatialReference::from_user_input(&identifier).map_err(|err| err.to_string())
}

/// Helper to describe JSON value kinds for error messages.
pub(crate) fn describe_value(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

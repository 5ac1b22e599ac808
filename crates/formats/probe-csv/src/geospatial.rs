//! Geometry columns of CSV files.
//!
//! A CSV layer carries geometry either as Well-Known Text in one column or
//! as a pair of numeric coordinate columns. The column is taken from the
//! open options when given, otherwise guessed from the header names.

use csv::StringRecord;
use geoprobe_core_common::{EnvelopeBuilder, OpenOptions};
use geozero::GeozeroGeometry;
use geozero::wkt::Wkt;
use probe_shared::{FormatReadError, FormatResult, SourcePosition};

/// Open option naming the WKT geometry column.
pub const GEOMETRY_COLUMN: &str = "GEOMETRY_COLUMN";
/// Open option naming the X (easting/longitude) column.
pub const X_COLUMN: &str = "X_COLUMN";
/// Open option naming the Y (northing/latitude) column.
pub const Y_COLUMN: &str = "Y_COLUMN";

/// Header names recognised as WKT columns, compared case-insensitively.
const WKT_NAMES: &[&str] = &["wkt", "geometry", "geom", "the_geom", "wkt_geom"];

/// Header name pairs recognised as coordinate columns.
const XY_NAMES: &[(&str, &str)] = &[
    ("x", "y"),
    ("lon", "lat"),
    ("lng", "lat"),
    ("longitude", "latitude"),
    ("easting", "northing"),
];

/// Where the geometry of each record comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    /// Well-Known Text in one column.
    Wkt { column: usize },
    /// Numeric X and Y columns.
    XY { x: usize, y: usize },
}

impl GeometrySource {
    /// Resolves the geometry columns against the header.
    ///
    /// Returns `Ok(None)` when no column is configured and none can be
    /// guessed, i.e. the layer has no geometry.
    ///
    /// # Errors
    ///
    /// Returns an error when an option names a column that is not in the
    /// header, or only one of `X_COLUMN`/`Y_COLUMN` is given.
    pub fn resolve(
        headers: &StringRecord,
        options: &OpenOptions,
        context: &str,
    ) -> FormatResult<Option<Self>> {
        let lookup = |name: &str| -> FormatResult<usize> {
            find_column(headers, name).ok_or_else(|| FormatReadError::Other {
                message: format!("Column '{name}' not found in header of {context}"),
            })
        };

        if let Some(name) = options.get(GEOMETRY_COLUMN) {
            return Ok(Some(Self::Wkt {
                column: lookup(name)?,
            }));
        }
        match (options.get(X_COLUMN), options.get(Y_COLUMN)) {
            (Some(x), Some(y)) => {
                return Ok(Some(Self::XY {
                    x: lookup(x)?,
                    y: lookup(y)?,
                }));
            },
            (Some(_), None) | (None, Some(_)) => {
                return Err(FormatReadError::Other {
                    message: format!("{X_COLUMN} and {Y_COLUMN} must be given together"),
                });
            },
            (None, None) => {},
        }

        if let Some(column) = WKT_NAMES.iter().find_map(|n| find_column(headers, n)) {
            return Ok(Some(Self::Wkt { column }));
        }
        Ok(XY_NAMES.iter().find_map(|(x, y)| {
            Some(Self::XY {
                x: find_column(headers, x)?,
                y: find_column(headers, y)?,
            })
        }))
    }

    /// Adds the geometry of `record` to `builder`. Empty cells are skipped.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the WKT or a coordinate cannot be decoded.
    pub fn accumulate(
        &self,
        record: &StringRecord,
        builder: &mut EnvelopeBuilder,
        context: &str,
    ) -> FormatResult<()> {
        let position = || {
            record.position().map_or_else(SourcePosition::default, |p| SourcePosition {
                line: Some(p.line()),
                record: Some(p.record()),
                byte_offset: Some(p.byte()),
                ..SourcePosition::default()
            })
        };

        match self {
            Self::Wkt { column } => {
                let cell = record.get(*column).unwrap_or("").trim();
                if cell.is_empty() {
                    return Ok(());
                }
                Wkt(cell).process_geom(builder).map_err(|err| {
                    FormatReadError::parse_at(format!("Invalid WKT: {err}"), position(), context)
                })
            },
            Self::XY { x, y } => {
                let x_cell = record.get(*x).unwrap_or("").trim();
                let y_cell = record.get(*y).unwrap_or("").trim();
                if x_cell.is_empty() || y_cell.is_empty() {
                    return Ok(());
                }
                let parse = |cell: &str| {
                    cell.parse::<f64>().map_err(|err| {
                        FormatReadError::parse_at(
                            format!("Invalid coordinate '{cell}': {err}"),
                            position(),
                            context,
                        )
                    })
                };
                builder.add_point(parse(x_cell)?, parse(y_cell)?);
                Ok(())
            },
        }
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
}

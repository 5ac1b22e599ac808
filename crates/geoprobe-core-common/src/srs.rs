//! Spatial reference systems as well-known text.
//!
//! A [`SpatialReference`] carries WKT and exposes the few facts a probe
//! reports about it (name, authority code). WKT comes either from a sidecar
//! such as a shapefile `.prj`, or from the `crs-definitions` EPSG database
//! when a format only names its CRS by code.

use std::fmt;

use thiserror::Error;

/// Errors raised while building a [`SpatialReference`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SrsError {
    /// The text does not look like WKT.
    #[error("Malformed WKT: {reason}")]
    MalformedWkt {
        /// What is wrong with the text
        reason: String,
    },

    /// The EPSG code is not in the EPSG database.
    #[error("EPSG:{code} is not in the crs-definitions database")]
    UnknownEpsg {
        /// The requested code
        code: u32,
    },

    /// The CRS identifier could not be interpreted.
    #[error("Cannot interpret CRS identifier '{input}'")]
    UnrecognizedIdentifier {
        /// The identifier as written in the dataset
        input: String,
    },
}

/// WKT root keywords accepted by [`SpatialReference::from_wkt`], covering
/// WKT1 (OGC 01-009, ESRI) and WKT2 (ISO 19162).
const WKT_ROOT_KEYWORDS: &[&str] = &[
    "GEOGCS",
    "PROJCS",
    "GEOCCS",
    "COMPD_CS",
    "VERT_CS",
    "LOCAL_CS",
    "GEOGCRS",
    "GEODCRS",
    "PROJCRS",
    "COMPOUNDCRS",
    "VERTCRS",
    "ENGCRS",
    "BOUNDCRS",
];

/// A coordinate reference system, stored as well-known text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialReference {
    wkt: String,
    /// Code the reference was looked up by, if any.
    epsg: Option<u32>,
}

impl SpatialReference {
    /// Wraps WKT after a structural check: a known root keyword and balanced
    /// brackets outside quoted strings.
    ///
    /// # Errors
    ///
    /// Returns [`SrsError::MalformedWkt`] when the check fails.
    pub fn from_wkt(wkt: &str) -> Result<Self, SrsError> {
        let wkt = wkt.trim();
        let keyword: String = wkt
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if keyword.is_empty() {
            return Err(SrsError::MalformedWkt {
                reason: "no root keyword".to_string(),
            });
        }
        if !WKT_ROOT_KEYWORDS
            .iter()
            .any(|k| k.eq_ignore_ascii_case(&keyword))
        {
            return Err(SrsError::MalformedWkt {
                reason: format!("unexpected root keyword '{keyword}'"),
            });
        }
        check_brackets(wkt)?;
        Ok(Self {
            wkt: wkt.to_string(),
            epsg: None,
        })
    }

    /// Looks up an EPSG code in the `crs-definitions` database.
    ///
    /// # Errors
    ///
    /// Returns [`SrsError::UnknownEpsg`] for codes the database does not
    /// define.
    pub fn from_epsg(code: u32) -> Result<Self, SrsError> {
        let def = u16::try_from(code)
            .ok()
            .and_then(crs_definitions::from_code)
            .ok_or(SrsError::UnknownEpsg { code })?;
        Ok(Self {
            wkt: def.wkt.to_string(),
            epsg: Some(code),
        })
    }

    /// WGS 84 geographic coordinates, the default CRS of `GeoJSON`.
    #[must_use]
    pub fn wgs84() -> Self {
        Self {
            wkt: WGS84_WKT.to_string(),
            epsg: Some(4326),
        }
    }

    /// Interprets a CRS identifier as written inside datasets: `EPSG:n`,
    /// `urn:ogc:def:crs:EPSG::n`, `http(s)://www.opengis.net/def/crs/EPSG/0/n`,
    /// the OGC `CRS84` spellings, or inline WKT.
    ///
    /// # Errors
    ///
    /// Returns an error when the identifier is not understood or names an
    /// unknown EPSG code.
    pub fn from_user_input(input: &str) -> Result<Self, SrsError> {
        let trimmed = input.trim();
        if is_crs84(trimmed) {
            return Ok(Self::wgs84());
        }
        if let Some(code) = parse_epsg_identifier(trimmed) {
            return Self::from_epsg(code);
        }
        if trimmed.contains('[') {
            return Self::from_wkt(trimmed);
        }
        Err(SrsError::UnrecognizedIdentifier {
            input: trimmed.to_string(),
        })
    }

    /// The well-known text of this reference system.
    #[must_use]
    pub fn to_wkt(&self) -> &str {
        &self.wkt
    }

    /// Name of the reference system: the first quoted string of the WKT.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        let start = self.wkt.find('"')? + 1;
        let len = self.wkt[start..].find('"')?;
        Some(&self.wkt[start..start + len])
    }

    /// Top-level `AUTHORITY["name","code"]` (WKT1) or `ID["name",code]`
    /// (WKT2) of the reference system. Falls back to the EPSG code the
    /// reference was looked up by.
    #[must_use]
    pub fn authority(&self) -> Option<(String, String)> {
        top_level_authority(&self.wkt)
            .or_else(|| self.epsg.map(|code| ("EPSG".to_string(), code.to_string())))
    }

    /// The EPSG code, when the top-level authority is EPSG.
    #[must_use]
    pub fn epsg_code(&self) -> Option<u32> {
        self.epsg.or_else(|| {
            top_level_authority(&self.wkt)
                .filter(|(name, _)| name.eq_ignore_ascii_case("EPSG"))
                .and_then(|(_, code)| code.parse().ok())
        })
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wkt)
    }
}

fn is_crs84(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower == "crs84"
        || lower == "ogc:crs84"
        || (lower.starts_with("urn:ogc:def:crs:ogc:") && lower.ends_with(":crs84"))
        || lower.ends_with("opengis.net/def/crs/ogc/1.3/crs84")
}

/// Extracts the EPSG code from the identifier spellings found in `GeoJSON`
/// and `CityJSON` files.
fn parse_epsg_identifier(input: &str) -> Option<u32> {
    let lower = input.to_ascii_lowercase();
    let tail = if let Some(rest) = lower.strip_prefix("epsg:") {
        rest
    } else if lower.starts_with("urn:ogc:def:crs:epsg:") {
        lower.rsplit(':').next()?
    } else if lower.contains("opengis.net/def/crs/epsg/") {
        lower.trim_end_matches('/').rsplit('/').next()?
    } else {
        return None;
    };
    tail.trim().parse().ok()
}

fn check_brackets(wkt: &str) -> Result<(), SrsError> {
    let mut depth: i32 = 0;
    let mut in_quotes = false;
    for c in wkt.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' | '(' if !in_quotes => depth += 1,
            ']' | ')' if !in_quotes => {
                depth -= 1;
                if depth < 0 {
                    return Err(SrsError::MalformedWkt {
                        reason: "unbalanced closing bracket".to_string(),
                    });
                }
            },
            _ => {},
        }
    }
    if in_quotes {
        return Err(SrsError::MalformedWkt {
            reason: "unterminated quoted string".to_string(),
        });
    }
    if depth != 0 {
        return Err(SrsError::MalformedWkt {
            reason: "unbalanced brackets".to_string(),
        });
    }
    Ok(())
}

/// Finds the last `AUTHORITY[...]`/`ID[...]` node sitting directly under the
/// root node, which is where WKT places the identifier of the whole CRS.
fn top_level_authority(wkt: &str) -> Option<(String, String)> {
    let bytes = wkt.as_bytes();
    let mut depth = 0;
    let mut in_quotes = false;
    let mut found = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'[' | b'(' if !in_quotes => {
                if depth == 1 {
                    let keyword_start = wkt[..i]
                        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                        .map_or(0, |p| p + 1);
                    let keyword = &wkt[keyword_start..i];
                    if keyword.eq_ignore_ascii_case("AUTHORITY") || keyword.eq_ignore_ascii_case("ID")
                    {
                        found = Some(i + 1);
                    }
                }
                depth += 1;
            },
            b']' | b')' if !in_quotes => depth -= 1,
            _ => {},
        }
    }
    let start = found?;
    let end = start + wkt[start..].find([']', ')'])?;
    let mut parts = wkt[start..end]
        .split(',')
        .map(|p| p.trim().trim_matches('"').to_string());
    let name = parts.next().filter(|n| !n.is_empty())?;
    let code = parts.next().filter(|c| !c.is_empty())?;
    Some((name, code))
}

/// RFC 7946 default, available without a database lookup.
const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#;

//! The fixed 100-byte main file header shared by `.shp` and `.shx` files.
//!
//! Layout (ESRI Shapefile Technical Description, 1998): big-endian file code
//! and length, then little-endian version, shape type and bounding box.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use geoprobe_core_common::Envelope;
use probe_shared::{FormatReadError, FormatResult};

/// Size of the main file header in bytes.
pub const HEADER_LEN: usize = 100;

/// Value of the first header word in every shapefile.
pub const FILE_CODE: i32 = 9994;

/// Only version ever published.
pub const VERSION: i32 = 1000;

/// Geometry type shared by all records of a shapefile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        let shape_type = match code {
            0 => Self::Null,
            1 => Self::Point,
            3 => Self::PolyLine,
            5 => Self::Polygon,
            8 => Self::MultiPoint,
            11 => Self::PointZ,
            13 => Self::PolyLineZ,
            15 => Self::PolygonZ,
            18 => Self::MultiPointZ,
            21 => Self::PointM,
            23 => Self::PolyLineM,
            25 => Self::PolygonM,
            28 => Self::MultiPointM,
            31 => Self::MultiPatch,
            _ => return None,
        };
        Some(shape_type)
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Parsed main file header.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapefileHeader {
    /// Total file length in bytes, as declared by the header.
    pub file_length: u64,
    pub shape_type: ShapeType,
    /// XY bounding box of all records.
    pub bbox: Envelope,
}

impl ShapefileHeader {
    /// Parses the first [`HEADER_LEN`] bytes of a shapefile.
    ///
    /// # Errors
    ///
    /// Returns [`FormatReadError::InvalidHeader`] when the file code, version
    /// or shape type is not valid.
    pub fn parse(buf: &[u8; HEADER_LEN], context: &str) -> FormatResult<Self> {
        let invalid = |message: String| FormatReadError::InvalidHeader {
            message,
            context: Some(context.to_string()),
        };

        let file_code = be_i32(buf, 0);
        if file_code != FILE_CODE {
            return Err(invalid(format!(
                "file code is {file_code}, expected {FILE_CODE}"
            )));
        }
        let version = le_i32(buf, 28);
        if version != VERSION {
            return Err(invalid(format!("unsupported version {version}")));
        }
        let shape_code = le_i32(buf, 32);
        let shape_type = ShapeType::from_code(shape_code)
            .ok_or_else(|| invalid(format!("unknown shape type {shape_code}")))?;
        let length_words = be_i32(buf, 24);
        let file_length = u64::try_from(length_words)
            .map_err(|_| invalid(format!("negative file length {length_words}")))?
            * 2;

        Ok(Self {
            file_length,
            shape_type,
            bbox: Envelope::from_corners(
                le_f64(buf, 36),
                le_f64(buf, 44),
                le_f64(buf, 52),
                le_f64(buf, 60),
            ),
        })
    }

    /// Reads and parses the header of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file is shorter than a header, or a header
    /// error if its content is not valid.
    pub fn read_from(path: &Path) -> FormatResult<Self> {
        let context = path.display().to_string();
        let mut file = File::open(path).map_err(|err| FormatReadError::io(err, &context))?;
        let mut buf = [0u8; HEADER_LEN];
        file.read_exact(&mut buf)
            .map_err(|err| FormatReadError::io(err, &context))?;
        Self::parse(&buf, &context)
    }

    /// Whether the header declares at least one record after itself.
    #[must_use]
    pub fn has_records(&self) -> bool {
        self.file_length > HEADER_LEN as u64
    }
}

pub(crate) fn be_i32(buf: &[u8], offset: usize) -> i32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    i32::from_be_bytes(word)
}

fn le_i32(buf: &[u8], offset: usize) -> i32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&buf[offset..offset + 4]);
    i32::from_le_bytes(word)
}

fn le_f64(buf: &[u8], offset: usize) -> f64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[offset..offset + 8]);
    f64::from_le_bytes(word)
}

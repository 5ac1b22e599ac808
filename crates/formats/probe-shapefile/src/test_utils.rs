//! Writes small point shapefiles for tests.

use std::io;
use std::path::Path;

use crate::header::{FILE_CODE, HEADER_LEN, VERSION};

/// Point record: 4-byte shape type plus two doubles.
const POINT_CONTENT_LEN: usize = 20;

/// Writes `points` as a `Point` shapefile at `path`, plus a `.prj` sidecar
/// when `prj` is given. The header bounding box covers all points (all
/// zeros when there are none).
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn write_point_shapefile(path: &Path, points: &[(f64, f64)], prj: Option<&str>) -> io::Result<()> {
    let record_len = 8 + POINT_CONTENT_LEN;
    let total_len = HEADER_LEN + points.len() * record_len;
    let mut buf = Vec::with_capacity(total_len);

    let (min_x, min_y, max_x, max_y) = if points.is_empty() {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        points.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(ax, ay, bx, by), (x, y)| (ax.min(*x), ay.min(*y), bx.max(*x), by.max(*y)),
        )
    };

    let words = |bytes: usize| i32::try_from(bytes / 2).unwrap_or(i32::MAX);

    buf.extend_from_slice(&FILE_CODE.to_be_bytes());
    buf.extend_from_slice(&[0u8; 20]);
    buf.extend_from_slice(&words(total_len).to_be_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&1_i32.to_le_bytes());
    for value in [min_x, min_y, max_x, max_y, 0.0, 0.0, 0.0, 0.0] {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    for (number, (x, y)) in points.iter().enumerate() {
        let number = i32::try_from(number + 1).unwrap_or(i32::MAX);
        buf.extend_from_slice(&number.to_be_bytes());
        buf.extend_from_slice(&words(POINT_CONTENT_LEN).to_be_bytes());
        buf.extend_from_slice(&1_i32.to_le_bytes());
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
    }

    std::fs::write(path, buf)?;
    if let Some(prj) = prj {
        std::fs::write(path.with_extension("prj"), prj)?;
    }
    Ok(())
}

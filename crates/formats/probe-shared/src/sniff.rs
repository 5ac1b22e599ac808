//! Cheap checks used by drivers to identify a dataset before opening it.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;

use crate::{FormatReadError, FormatResult};

/// Number of leading bytes drivers look at when sniffing content.
pub const SNIFF_LEN: usize = 4096;

/// Returns the lowercased extension of `path`, if any.
#[must_use]
pub fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Returns true when the extension of `path` is one of `extensions`
/// (compared case-insensitively, without the leading dot).
#[must_use]
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    extension_lowercase(path).is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}

/// Returns true when the file name ends with the concatenation of `suffixes`,
/// e.g. `[".city", ".json"]` matches `Delft.CITY.json`.
#[must_use]
pub fn has_compound_suffix(path: &Path, suffixes: &[&str]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let wanted: String = suffixes.concat().to_ascii_lowercase();
    let name = name.to_ascii_lowercase();
    name.len() > wanted.len() && name.ends_with(&wanted)
}

/// Reads at most `max` bytes from the start of the file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn read_prefix(path: &Path, max: usize) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(max);
    file.take(max as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Reads the sniffing prefix of a regular file, or `None` for anything that
/// cannot be read (directories, missing files, permission problems).
#[must_use]
pub fn sniff_prefix(path: &Path) -> Option<Vec<u8>> {
    if !path.is_file() {
        return None;
    }
    match read_prefix(path, SNIFF_LEN) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            debug!("Could not sniff {}: {err}", path.display());
            None
        },
    }
}

/// Returns the first non-whitespace byte of `bytes`, skipping a UTF-8 BOM.
#[must_use]
pub fn first_significant_byte(bytes: &[u8]) -> Option<u8> {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    bytes.iter().copied().find(|b| !b.is_ascii_whitespace())
}

/// Locates a sidecar file next to `path` with extension `ext`, trying the
/// lowercase and uppercase spellings.
#[must_use]
pub fn find_sidecar(path: &Path, ext: &str) -> Option<PathBuf> {
    [ext.to_ascii_lowercase(), ext.to_ascii_uppercase()]
        .into_iter()
        .map(|candidate| path.with_extension(candidate))
        .find(|candidate| candidate.is_file())
}

/// Reads a text sidecar (e.g. `.prj`) next to `path`, trimmed.
///
/// Returns `Ok(None)` when no sidecar exists or it is blank.
///
/// # Errors
///
/// Returns an I/O error if the sidecar exists but cannot be read.
pub fn read_sidecar_text(path: &Path, ext: &str) -> FormatResult<Option<String>> {
    let Some(sidecar) = find_sidecar(path, ext) else {
        return Ok(None);
    };
    let text = std::fs::read_to_string(&sidecar)
        .map_err(|err| FormatReadError::io(err, sidecar.display().to_string()))?;
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

/// Layer name derived from a path: the file name up to its first dot.
#[must_use]
pub fn layer_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.split('.').next().unwrap_or(name))
        .filter(|name| !name.is_empty())
        .unwrap_or("layer")
        .to_string()
}

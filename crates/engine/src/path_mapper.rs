//! Mapping between the three path spaces of a migration: logical server
//! paths (`/A/B/C`), staged local files (`<staging>/A/B/C.rdl`) and archive
//! container paths (`Export\A\B`).

use crate::checksum::CheckSumGenerator;
use ssrsmigrate_bundle_schema::{BundleSummaryEntry, CONTAINER_SEPARATOR, EXPORT_PREFIX};
use ssrsmigrate_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Extension of staged report definitions.
pub const REPORT_EXTENSION: &str = "rdl";

/// Extension of staged data source documents.
pub const DATA_SOURCE_EXTENSION: &str = "json";

fn local_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).collect()
}

fn server_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// `Name.ext` -> `Name`; `None` when there is no extension to strip.
fn file_stem(leaf: &str) -> Option<&str> {
    match leaf.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(stem),
        _ => None,
    }
}

/// Derive the container directory for a staged item, telling folders from
/// files by the staged path itself.
///
/// A local leaf that differs from the logical leaf only by an extension is a
/// file. An equal leaf is a folder unless a regular file exists at
/// `local_file_path`. Callers that know the item kind should use
/// [`container_path`].
pub fn derive_container_path(local_file_path: &str, logical_path: &str) -> Result<String> {
    let is_folder = match (
        local_segments(local_file_path).last(),
        server_segments(logical_path).last(),
    ) {
        (Some(local_leaf), Some(logical_leaf)) => {
            local_leaf == logical_leaf && !Path::new(local_file_path).is_file()
        }
        _ => false,
    };
    container_path(local_file_path, logical_path, is_folder)
}

/// Container directory for a staged item of known kind.
///
/// The staged layout must mirror the logical hierarchy: the trailing
/// segments of `local_file_path` have to equal the segments of
/// `logical_path`. A folder's last local segment is the item name; a file's
/// is the item name, with or without an extension. Files map to their
/// parent directory, folders to themselves.
pub fn container_path(
    local_file_path: &str,
    logical_path: &str,
    is_folder: bool,
) -> Result<String> {
    if local_file_path.is_empty() {
        return Err(Error::invalid_argument("itemFileName"));
    }
    if logical_path.is_empty() {
        return Err(Error::invalid_argument("itemPath"));
    }

    let logical = server_segments(logical_path);
    let local = local_segments(local_file_path);

    let (Some(logical_leaf), Some(local_leaf)) = (logical.last(), local.last()) else {
        return Err(Error::invalid_item_path(logical_path));
    };

    let leaf_matches = local_leaf == logical_leaf
        || (!is_folder && file_stem(local_leaf) == Some(*logical_leaf));
    if !leaf_matches {
        return Err(Error::invalid_item_path(logical_path));
    }

    let n = logical.len();
    if local.len() < n || local[local.len() - n..local.len() - 1] != logical[..n - 1] {
        return Err(Error::invalid_item_path(logical_path));
    }

    let kept = if is_folder { &logical[..] } else { &logical[..n - 1] };
    let mut segments = Vec::with_capacity(kept.len() + 1);
    segments.push(EXPORT_PREFIX);
    segments.extend_from_slice(kept);

    Ok(segments.join(&CONTAINER_SEPARATOR.to_string()))
}

/// Build the manifest entry for a staged file: leaf name plus digest.
pub fn create_entry_summary(
    local_file_path: &str,
    container_path: &str,
    generator: &dyn CheckSumGenerator,
) -> Result<BundleSummaryEntry> {
    if local_file_path.is_empty() {
        return Err(Error::invalid_argument("itemFileName"));
    }
    if container_path.is_empty() {
        return Err(Error::invalid_argument("zipPath"));
    }

    let path = Path::new(local_file_path);
    if !path.is_file() {
        return Err(Error::FileNotFound(local_file_path.to_string()));
    }

    let file_name = local_segments(local_file_path)
        .last()
        .map(|s| s.to_string())
        .ok_or_else(|| Error::FileNotFound(local_file_path.to_string()))?;
    let check_sum = generator.compute(path)?;

    Ok(BundleSummaryEntry::file(container_path, file_name, check_sum))
}

/// Staging location for a logical path: `/A/B/C` -> `<root>/A/B/C[.ext]`.
pub fn server_path_to_physical_path(root: &Path, logical_path: &str, extension: Option<&str>) -> PathBuf {
    let mut path = root.to_path_buf();
    let segments = server_segments(logical_path);
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        match extension {
            Some(ext) if i == last => path.push(format!("{}.{}", segment, ext)),
            _ => path.push(segment),
        }
    }
    path
}

/// Logical path recorded by a manifest entry.
///
/// Inverse of [`derive_container_path`]: `Export\A\B` + `C.rdl` -> `/A/B/C`,
/// folder `Export\A\B` -> `/A/B`.
pub fn container_path_to_server_path(entry: &BundleSummaryEntry) -> String {
    let mut segments: Vec<&str> = entry.segments().skip(1).collect();
    if !entry.is_folder() {
        segments.push(file_stem(&entry.file_name).unwrap_or(&entry.file_name));
    }
    format!("/{}", segments.join("/"))
}

/// Where an entry lands after unpacking into `unpack_dir`.
pub fn resolve_local_path(unpack_dir: &Path, entry: &BundleSummaryEntry) -> PathBuf {
    let mut path = unpack_dir.to_path_buf();
    for segment in entry.segments() {
        path.push(segment);
    }
    if !entry.is_folder() {
        path.push(&entry.file_name);
    }
    path
}

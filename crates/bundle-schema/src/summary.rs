//! The bundle summary (manifest) describing every entry packed into an
//! export archive.

use serde::{Deserialize, Serialize};
use ssrsmigrate_common::{Error, SsrsVersion};
use std::fmt;
use std::str::FromStr;

/// Leading segment of every container path.
pub const EXPORT_PREFIX: &str = "Export";

/// Directory separator used by container paths recorded in the manifest.
pub const CONTAINER_SEPARATOR: char = '\\';

/// Location of the manifest document inside the archive.
pub const SUMMARY_FILE_NAME: &str = "ExportSummary.json";

/// Manifest category an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryCategory {
    DataSources,
    Reports,
    Folders,
}

impl EntryCategory {
    pub const ALL: [EntryCategory; 3] = [
        EntryCategory::DataSources,
        EntryCategory::Reports,
        EntryCategory::Folders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryCategory::DataSources => "DataSources",
            EntryCategory::Reports => "Reports",
            EntryCategory::Folders => "Folders",
        }
    }
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DataSources" => Ok(EntryCategory::DataSources),
            "Reports" => Ok(EntryCategory::Reports),
            "Folders" => Ok(EntryCategory::Folders),
            _ => Err(Error::invalid_argument("category")),
        }
    }
}

/// One packed item. Folders carry an empty file name and checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BundleSummaryEntry {
    pub path: String,
    pub file_name: String,
    pub check_sum: String,
}

impl BundleSummaryEntry {
    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_name: String::new(),
            check_sum: String::new(),
        }
    }

    pub fn file(
        path: impl Into<String>,
        file_name: impl Into<String>,
        check_sum: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
            check_sum: check_sum.into(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.file_name.is_empty()
    }

    /// Segments of the container path, `Export` first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path
            .split(CONTAINER_SEPARATOR)
            .filter(|s| !s.is_empty())
    }

    /// Entry name inside the tar stream: container path with `/`
    /// separators, plus the file name for file entries.
    pub fn archive_name(&self) -> String {
        let mut parts: Vec<&str> = self.segments().collect();
        if !self.is_folder() {
            parts.push(&self.file_name);
        }
        parts.join("/")
    }
}

/// Per-category entry lists, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BundleEntries {
    pub data_sources: Vec<BundleSummaryEntry>,
    pub reports: Vec<BundleSummaryEntry>,
    pub folders: Vec<BundleSummaryEntry>,
}

impl BundleEntries {
    pub fn get(&self, category: EntryCategory) -> &[BundleSummaryEntry] {
        match category {
            EntryCategory::DataSources => &self.data_sources,
            EntryCategory::Reports => &self.reports,
            EntryCategory::Folders => &self.folders,
        }
    }

    pub fn get_mut(&mut self, category: EntryCategory) -> &mut Vec<BundleSummaryEntry> {
        match category {
            EntryCategory::DataSources => &mut self.data_sources,
            EntryCategory::Reports => &mut self.reports,
            EntryCategory::Folders => &mut self.folders,
        }
    }

    pub fn len(&self) -> usize {
        self.data_sources.len() + self.reports.len() + self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries paired with their category.
    pub fn iter(&self) -> impl Iterator<Item = (EntryCategory, &BundleSummaryEntry)> {
        EntryCategory::ALL
            .into_iter()
            .flat_map(move |c| self.get(c).iter().map(move |e| (c, e)))
    }
}

/// The manifest written alongside the packed items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BundleSummary {
    pub source_root_path: String,
    pub source_version: SsrsVersion,
    pub entries: BundleEntries,
}

impl BundleSummary {
    pub fn new(source_root_path: impl Into<String>, source_version: SsrsVersion) -> Self {
        Self {
            source_root_path: source_root_path.into(),
            source_version,
            entries: BundleEntries::default(),
        }
    }

    /// Serialize with two-space indentation and fixed field order.
    pub fn to_manifest_text(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_manifest_text(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }
}

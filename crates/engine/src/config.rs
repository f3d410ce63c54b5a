//! Migration configuration.
//!
//! Settings are loaded once at startup and handed explicitly to the
//! collaborator factories; nothing in the engine reads global state.

use serde::{Deserialize, Serialize};
use ssrsmigrate_common::{Error, Result, SsrsVersion};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top level configuration for one migration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub source: ConnectionConfig,
    pub destination: ConnectionConfig,
    pub paths: PathRules,
    pub bundle: BundleConfig,
    pub import: ImportConfig,
}

/// Where a report server lives and which namespace subtree to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: String,
    pub version: SsrsVersion,
    pub path: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            version: SsrsVersion::default(),
            path: "/".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Server URL normalized to the edition's service endpoint.
    pub fn service_url(&self) -> String {
        let endpoint = self.version.api().endpoint();
        if self.url.ends_with(endpoint) {
            return self.url.clone();
        }
        format!("{}/{}", self.url.trim_end_matches('/'), endpoint)
    }
}

/// Character and length limits for server paths and item names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathRules {
    pub invalid_path_chars: String,
    pub invalid_name_chars: String,
    pub max_length: usize,
}

impl Default for PathRules {
    fn default() -> Self {
        Self {
            invalid_path_chars: ":?;@&=+$,\\*><|\"".to_string(),
            invalid_name_chars: ":?;@&=+$,\\*><|.\"/".to_string(),
            max_length: 260,
        }
    }
}

/// Digest used for manifest checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Md5,
    Sha256,
}

/// Archive and staging locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    pub checksum: ChecksumAlgorithm,
    pub staging_dir: PathBuf,
    pub archive_file: PathBuf,
    pub unpack_dir: PathBuf,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            checksum: ChecksumAlgorithm::default(),
            staging_dir: PathBuf::from("staging"),
            archive_file: PathBuf::from("export.tar.gz"),
            unpack_dir: PathBuf::from("unpack"),
        }
    }
}

/// What an import does when the destination already holds an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Abort,
    Skip,
    Overwrite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub on_conflict: ConflictPolicy,
}

impl MigrationConfig {
    /// Load from a YAML or JSON file, picked by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
        };

        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

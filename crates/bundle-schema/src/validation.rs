//! Bundle summary validation utilities.

use crate::schema;
use crate::summary::{BundleSummary, EntryCategory, CONTAINER_SEPARATOR, EXPORT_PREFIX};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Validation error type.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("{category} entry '{path}' is not rooted at '{prefix}'")]
    UnrootedPath {
        category: EntryCategory,
        path: String,
        prefix: &'static str,
    },

    #[error("{category} entry '{path}\\{file_name}' does not stay inside the archive")]
    UnsafePath {
        category: EntryCategory,
        path: String,
        file_name: String,
    },

    #[error("Duplicate {category} entry: {path}\\{file_name}")]
    DuplicateEntry {
        category: EntryCategory,
        path: String,
        file_name: String,
    },

    #[error("Folder entry '{0}' must not carry a file name or checksum")]
    FolderWithContent(String),

    #[error("{category} entry '{path}' is missing its file name or checksum")]
    FileWithoutContent { category: EntryCategory, path: String },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result of summary validation.
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// All error messages joined on one line, for logs and error payloads.
    pub fn describe(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a raw summary document against the JSON schema.
pub fn validate_summary_document(document: &Value) -> Result<ValidationResult, ValidationError> {
    let mut result = ValidationResult::new();

    let schema_value = schema::summary_schema();
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|e| ValidationError::SchemaError(e.to_string()))?;

    let validation = compiled.validate(document);
    if let Err(errors) = validation {
        for error in errors {
            result.add_error(ValidationError::SchemaError(format!(
                "{} at {}",
                error, error.instance_path
            )));
        }
    }

    Ok(result)
}

/// A path segment or file name that can be joined under the unpack directory
/// without leaving it.
fn is_plain_component(component: &str) -> bool {
    !component.is_empty()
        && component != "."
        && component != ".."
        && !component.contains(['/', '\\', ':'])
}

/// Validate a parsed summary: schema plus entry invariants.
pub fn validate_summary(summary: &BundleSummary) -> Result<ValidationResult, ValidationError> {
    let document = serde_json::to_value(summary)?;
    let mut result = validate_summary_document(&document)?;

    let root = format!("{}{}", EXPORT_PREFIX, CONTAINER_SEPARATOR);

    for category in EntryCategory::ALL {
        let mut seen = HashSet::new();

        for entry in summary.entries.get(category) {
            if entry.path != EXPORT_PREFIX && !entry.path.starts_with(&root) {
                result.add_error(ValidationError::UnrootedPath {
                    category,
                    path: entry.path.clone(),
                    prefix: EXPORT_PREFIX,
                });
            }

            let segments_ok = entry
                .path
                .split(CONTAINER_SEPARATOR)
                .all(is_plain_component);
            let name_ok = entry.file_name.is_empty() || is_plain_component(&entry.file_name);
            if !segments_ok || !name_ok {
                result.add_error(ValidationError::UnsafePath {
                    category,
                    path: entry.path.clone(),
                    file_name: entry.file_name.clone(),
                });
            }

            if !seen.insert((entry.path.as_str(), entry.file_name.as_str())) {
                result.add_error(ValidationError::DuplicateEntry {
                    category,
                    path: entry.path.clone(),
                    file_name: entry.file_name.clone(),
                });
            }

            match category {
                EntryCategory::Folders => {
                    if !entry.file_name.is_empty() || !entry.check_sum.is_empty() {
                        result.add_error(ValidationError::FolderWithContent(entry.path.clone()));
                    }
                }
                _ => {
                    if entry.file_name.is_empty() || entry.check_sum.is_empty() {
                        result.add_error(ValidationError::FileWithoutContent {
                            category,
                            path: entry.path.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(result)
}

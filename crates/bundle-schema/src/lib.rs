//! Bundle schema definitions for ssrsmigrate.
//!
//! This crate defines the report server items that move through a
//! migration and the manifest (`BundleSummary`) describing an export
//! archive.

pub mod item;
pub mod schema;
pub mod summary;
pub mod validation;

pub use item::{
    split_server_path, DataSourceItem, FolderItem, ItemInfo, ItemKind, ReportItem, ReportServerItem,
};
pub use summary::{
    BundleEntries, BundleSummary, BundleSummaryEntry, EntryCategory, CONTAINER_SEPARATOR,
    EXPORT_PREFIX, SUMMARY_FILE_NAME,
};
pub use validation::{
    validate_summary, validate_summary_document, ValidationError, ValidationResult,
};

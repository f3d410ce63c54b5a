//! Staging exporters: write report server items to the local filesystem in
//! the layout the bundle builder expects.

use serde::Serialize;
use ssrsmigrate_bundle_schema::{DataSourceItem, FolderItem, ReportItem};
use ssrsmigrate_common::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Sink for staged files and folders.
pub trait ExportWriter: Send + Sync {
    /// Write `data` to `path`, creating parent directories.
    fn save_file(&self, path: &Path, data: &[u8], overwrite: bool) -> Result<()>;

    /// Create the directory `path`.
    fn save_folder(&self, path: &Path, overwrite: bool) -> Result<()>;
}

/// [`ExportWriter`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExportWriter;

impl ExportWriter for FileExportWriter {
    fn save_file(&self, path: &Path, data: &[u8], overwrite: bool) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("fileName"));
        }
        if !overwrite && path.exists() {
            return Err(Error::AlreadyExists(format!(
                "File '{}' already exists.",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)?;
        debug!("Saved file {:?} ({} bytes)", path, data.len());
        Ok(())
    }

    fn save_folder(&self, path: &Path, overwrite: bool) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("path"));
        }
        if !overwrite && path.exists() {
            return Err(Error::AlreadyExists(format!(
                "Directory '{}' already exists.",
                path.display()
            )));
        }
        std::fs::create_dir_all(path)?;
        debug!("Saved folder {:?}", path);
        Ok(())
    }
}

/// Outcome of staging one item. Writer failures are captured here rather
/// than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStatus {
    pub from_path: String,
    pub to_path: String,
    pub errors: Vec<String>,
    pub success: bool,
}

impl ExportStatus {
    fn completed(from_path: &str, to_path: &Path) -> Self {
        Self {
            from_path: from_path.to_string(),
            to_path: to_path.display().to_string(),
            errors: Vec::new(),
            success: true,
        }
    }

    fn failed(from_path: &str, to_path: &Path, error: Error) -> Self {
        Self {
            from_path: from_path.to_string(),
            to_path: to_path.display().to_string(),
            errors: vec![error.to_string()],
            success: false,
        }
    }

    fn from_result(from_path: &str, to_path: &Path, result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::completed(from_path, to_path),
            Err(e) => Self::failed(from_path, to_path, e),
        }
    }
}

/// Stages one kind of item at a local path.
pub trait ItemExporter<T>: Send + Sync {
    fn save_item(&self, item: &T, file_name: &Path, overwrite: bool) -> Result<ExportStatus>;
}

fn require_target(file_name: &Path) -> Result<()> {
    if file_name.as_os_str().is_empty() {
        return Err(Error::invalid_argument("fileName"));
    }
    Ok(())
}

pub struct FolderItemExporter {
    writer: Box<dyn ExportWriter>,
}

impl FolderItemExporter {
    pub fn new(writer: Box<dyn ExportWriter>) -> Self {
        Self { writer }
    }
}

impl Default for FolderItemExporter {
    fn default() -> Self {
        Self::new(Box::new(FileExportWriter))
    }
}

impl ItemExporter<FolderItem> for FolderItemExporter {
    fn save_item(&self, item: &FolderItem, file_name: &Path, overwrite: bool) -> Result<ExportStatus> {
        require_target(file_name)?;
        let result = self.writer.save_folder(file_name, overwrite);
        Ok(ExportStatus::from_result(&item.path, file_name, result))
    }
}

/// Writes the report definition verbatim (`.rdl`).
pub struct ReportItemExporter {
    writer: Box<dyn ExportWriter>,
}

impl ReportItemExporter {
    pub fn new(writer: Box<dyn ExportWriter>) -> Self {
        Self { writer }
    }
}

impl Default for ReportItemExporter {
    fn default() -> Self {
        Self::new(Box::new(FileExportWriter))
    }
}

impl ItemExporter<ReportItem> for ReportItemExporter {
    fn save_item(&self, item: &ReportItem, file_name: &Path, overwrite: bool) -> Result<ExportStatus> {
        require_target(file_name)?;
        if item.definition.is_empty() {
            return Ok(ExportStatus::failed(
                &item.path,
                file_name,
                Error::Other(format!("Report '{}' has no definition.", item.path)),
            ));
        }
        let result = self.writer.save_file(file_name, &item.definition, overwrite);
        Ok(ExportStatus::from_result(&item.path, file_name, result))
    }
}

/// Writes the data source as indented JSON (`.json`).
pub struct DataSourceItemExporter {
    writer: Box<dyn ExportWriter>,
}

impl DataSourceItemExporter {
    pub fn new(writer: Box<dyn ExportWriter>) -> Self {
        Self { writer }
    }
}

impl Default for DataSourceItemExporter {
    fn default() -> Self {
        Self::new(Box::new(FileExportWriter))
    }
}

impl ItemExporter<DataSourceItem> for DataSourceItemExporter {
    fn save_item(
        &self,
        item: &DataSourceItem,
        file_name: &Path,
        overwrite: bool,
    ) -> Result<ExportStatus> {
        require_target(file_name)?;
        let result = serde_json::to_vec_pretty(item)
            .map_err(Error::from)
            .and_then(|json| self.writer.save_file(file_name, &json, overwrite));
        Ok(ExportStatus::from_result(&item.path, file_name, result))
    }
}

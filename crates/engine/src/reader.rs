//! Source-side reads with argument and path validation.

use crate::path_validator::PathValidator;
use crate::repository::ReportServerRepository;
use ssrsmigrate_bundle_schema::{DataSourceItem, FolderItem, ReportItem};
use ssrsmigrate_common::{Error, Result};

pub struct ReportServerReader {
    repository: Box<dyn ReportServerRepository>,
    validator: Box<dyn PathValidator>,
}

impl ReportServerReader {
    pub fn new(
        repository: Box<dyn ReportServerRepository>,
        validator: Box<dyn PathValidator>,
    ) -> Self {
        Self {
            repository,
            validator,
        }
    }

    fn check(&self, path: &str, arg: &str) -> Result<()> {
        if path.is_empty() {
            return Err(Error::invalid_argument(arg));
        }
        if !self.validator.validate(path) {
            return Err(Error::invalid_path(path));
        }
        Ok(())
    }

    pub fn get_folder(&self, folder_path: &str) -> Result<Option<FolderItem>> {
        self.check(folder_path, "folderPath")?;
        self.repository.get_folder(folder_path)
    }

    pub fn get_folders(&self, path: &str) -> Result<Vec<FolderItem>> {
        self.check(path, "path")?;
        self.repository.get_folders(path)
    }

    /// Invoke `progress` once per folder below `path`.
    pub fn get_folders_with<F>(&self, path: &str, mut progress: F) -> Result<()>
    where
        F: FnMut(&FolderItem),
    {
        for folder in self.get_folders(path)? {
            progress(&folder);
        }
        Ok(())
    }

    pub fn get_report(&self, report_path: &str) -> Result<Option<ReportItem>> {
        self.check(report_path, "reportPath")?;
        self.repository.get_report(report_path)
    }

    pub fn get_reports(&self, path: &str) -> Result<Vec<ReportItem>> {
        self.check(path, "path")?;
        self.repository.get_reports(path)
    }

    pub fn get_reports_with<F>(&self, path: &str, mut progress: F) -> Result<()>
    where
        F: FnMut(&ReportItem),
    {
        for report in self.get_reports(path)? {
            progress(&report);
        }
        Ok(())
    }

    pub fn get_data_source(&self, data_source_path: &str) -> Result<Option<DataSourceItem>> {
        self.check(data_source_path, "dataSourcePath")?;
        self.repository.get_data_source(data_source_path)
    }

    pub fn get_data_sources(&self, path: &str) -> Result<Vec<DataSourceItem>> {
        self.check(path, "path")?;
        self.repository.get_data_sources(path)
    }

    pub fn get_data_sources_with<F>(&self, path: &str, mut progress: F) -> Result<()>
    where
        F: FnMut(&DataSourceItem),
    {
        for data_source in self.get_data_sources(path)? {
            progress(&data_source);
        }
        Ok(())
    }
}

//! Destination-side writes with item validation.

use crate::path_validator::PathValidator;
use crate::repository::ReportServerRepository;
use ssrsmigrate_bundle_schema::{DataSourceItem, FolderItem, ReportItem};
use ssrsmigrate_common::{Error, Result};
use tracing::warn;

pub struct ReportServerWriter {
    repository: Box<dyn ReportServerRepository>,
    validator: Box<dyn PathValidator>,
}

impl ReportServerWriter {
    pub fn new(
        repository: Box<dyn ReportServerRepository>,
        validator: Box<dyn PathValidator>,
    ) -> Self {
        Self {
            repository,
            validator,
        }
    }

    fn check(&self, name: &str, path: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_argument("item.Name"));
        }
        if !self.validator.validate(path) {
            return Err(Error::invalid_path(path));
        }
        Ok(())
    }

    pub fn write_folder(&self, item: &FolderItem, overwrite: bool) -> Result<()> {
        self.check(&item.name, &item.path)?;
        self.repository.write_folder(item, overwrite)
    }

    /// Fail-fast: stops at the first item that cannot be written.
    pub fn write_folders(&self, items: &[FolderItem], overwrite: bool) -> Result<()> {
        for item in items {
            self.write_folder(item, overwrite)?;
        }
        Ok(())
    }

    /// Returns warnings raised while publishing the definition.
    pub fn write_report(&self, item: &ReportItem, overwrite: bool) -> Result<Vec<String>> {
        self.check(&item.name, &item.path)?;
        let warnings = self.repository.write_report(item, overwrite)?;
        for warning in &warnings {
            warn!("{}: {}", item.path, warning);
        }
        Ok(warnings)
    }

    pub fn write_reports(&self, items: &[ReportItem], overwrite: bool) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        for item in items {
            warnings.extend(self.write_report(item, overwrite)?);
        }
        Ok(warnings)
    }

    pub fn write_data_source(&self, item: &DataSourceItem, overwrite: bool) -> Result<()> {
        self.check(&item.name, &item.path)?;
        self.repository.write_data_source(item, overwrite)
    }

    pub fn write_data_sources(&self, items: &[DataSourceItem], overwrite: bool) -> Result<()> {
        for item in items {
            self.write_data_source(item, overwrite)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_validator::ReportServerPathValidator;
    use crate::repository::DiskRepository;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;

    fn writer(temp: &TempDir) -> ReportServerWriter {
        ReportServerWriter::new(
            Box::new(DiskRepository::new(temp.path())),
            Box::new(ReportServerPathValidator::default()),
        )
    }

    fn data_source(name: &str, path: &str) -> DataSourceItem {
        DataSourceItem {
            name: name.to_string(),
            path: path.to_string(),
            extension: Some("SQL".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_write_data_source() {
        let temp = TempDir::new().unwrap();
        writer(&temp)
            .write_data_source(&data_source("AW", "/Dest/Data Sources/AW"), false)
            .unwrap();
        temp.child("Dest/Data Sources/AW.json")
            .assert(predicate::path::is_file());
    }

    #[test]
    fn test_already_exists() {
        let temp = TempDir::new().unwrap();
        let writer = writer(&temp);
        let item = data_source("AW", "/Dest/AW");
        writer.write_data_source(&item, false).unwrap();

        let err = writer.write_data_source(&item, false).unwrap_err();
        assert_eq!(err.to_string(), "The data source '/Dest/AW' already exists.");
    }

    #[test]
    fn test_empty_name() {
        let temp = TempDir::new().unwrap();
        let err = writer(&temp)
            .write_data_source(&data_source("", "/Dest/AW"), false)
            .unwrap_err();
        assert_eq!(err.to_string(), "item.Name");
    }

    #[test]
    fn test_invalid_or_empty_path() {
        let temp = TempDir::new().unwrap();
        let writer = writer(&temp);

        let err = writer
            .write_data_source(&data_source("AW", "/Dest?/AW"), false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid path '/Dest?/AW'.");

        let err = writer
            .write_data_source(&data_source("AW", ""), false)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid path"));
    }

    #[test]
    fn test_batch_is_fail_fast() {
        let temp = TempDir::new().unwrap();
        let writer = writer(&temp);
        let items = vec![
            data_source("A", "/Dest/A"),
            data_source("B", "/Dest/B?"),
            data_source("C", "/Dest/C"),
        ];

        let err = writer.write_data_sources(&items, false).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        temp.child("Dest/A.json").assert(predicate::path::is_file());
        temp.child("Dest/C.json").assert(predicate::path::missing());
    }

    #[test]
    fn test_write_reports_collects_warnings() {
        let temp = TempDir::new().unwrap();
        let reports = vec![
            ReportItem {
                name: "Full".to_string(),
                path: "/Dest/Full".to_string(),
                definition: b"<Report/>".to_vec(),
                ..Default::default()
            },
            ReportItem {
                name: "Empty".to_string(),
                path: "/Dest/Empty".to_string(),
                ..Default::default()
            },
        ];

        let warnings = writer(&temp).write_reports(&reports, false).unwrap();
        assert_eq!(warnings, vec!["The report '/Dest/Empty' has an empty definition."]);
    }

    #[test]
    fn test_write_folders() {
        let temp = TempDir::new().unwrap();
        let folders = vec![
            FolderItem {
                name: "Dest".to_string(),
                path: "/Dest".to_string(),
                ..Default::default()
            },
            FolderItem {
                name: "Reports".to_string(),
                path: "/Dest/Reports".to_string(),
                ..Default::default()
            },
        ];
        writer(&temp).write_folders(&folders, false).unwrap();
        temp.child("Dest/Reports").assert(predicate::path::is_dir());
    }
}

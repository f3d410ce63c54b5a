//! Report server repositories: the storage behind readers and writers.

use crate::path_mapper::{server_path_to_physical_path, DATA_SOURCE_EXTENSION, REPORT_EXTENSION};
use ssrsmigrate_bundle_schema::{split_server_path, DataSourceItem, FolderItem, ItemInfo, ReportItem};
use ssrsmigrate_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Access to one report server namespace.
///
/// Listings are recursive below `path` and exclude `path` itself. Writes
/// fail with [`Error::AlreadyExists`] when the item exists and `overwrite`
/// is false.
pub trait ReportServerRepository: Send + Sync {
    fn get_folder(&self, path: &str) -> Result<Option<FolderItem>>;

    fn get_folders(&self, path: &str) -> Result<Vec<FolderItem>>;

    fn get_report(&self, path: &str) -> Result<Option<ReportItem>>;

    fn get_reports(&self, path: &str) -> Result<Vec<ReportItem>>;

    fn get_data_source(&self, path: &str) -> Result<Option<DataSourceItem>>;

    fn get_data_sources(&self, path: &str) -> Result<Vec<DataSourceItem>>;

    fn write_folder(&self, item: &FolderItem, overwrite: bool) -> Result<()>;

    /// Returns server warnings for the published definition.
    fn write_report(&self, item: &ReportItem, overwrite: bool) -> Result<Vec<String>>;

    fn write_data_source(&self, item: &DataSourceItem, overwrite: bool) -> Result<()>;
}

/// Namespace mirrored on a local directory: folders are directories,
/// reports `<name>.rdl`, data sources `<name>.json`.
#[derive(Debug, Clone)]
pub struct DiskRepository {
    root: PathBuf,
}

impl DiskRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn physical(&self, path: &str, extension: Option<&str>) -> PathBuf {
        server_path_to_physical_path(&self.root, path, extension)
    }

    /// Logical path of a file or directory below the root.
    fn logical(&self, physical: &Path) -> String {
        let relative = physical.strip_prefix(&self.root).unwrap_or(physical);
        let mut segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if physical.is_file() {
            if let (Some(last), Some(stem)) = (segments.last_mut(), physical.file_stem()) {
                *last = stem.to_string_lossy().to_string();
            }
        }
        format!("/{}", segments.join("/"))
    }

    fn folder_item(&self, path: &str) -> FolderItem {
        let (_, name) = split_server_path(path);
        FolderItem {
            name,
            path: path.to_string(),
            ..Default::default()
        }
    }

    fn load_report(&self, file: &Path) -> Result<ReportItem> {
        let path = self.logical(file);
        let (_, name) = split_server_path(&path);
        let definition = std::fs::read(file)?;
        Ok(ReportItem {
            name,
            path,
            info: ItemInfo {
                size: Some(definition.len() as u64),
                ..Default::default()
            },
            definition,
            sub_reports: Vec::new(),
        })
    }

    fn load_data_source(&self, file: &Path) -> Result<DataSourceItem> {
        let text = std::fs::read_to_string(file)?;
        let mut item: DataSourceItem = serde_json::from_str(&text)?;
        item.path = self.logical(file);
        item.name = split_server_path(&item.path).1;
        Ok(item)
    }

    fn exists_error(kind: &str, path: &str) -> Error {
        Error::AlreadyExists(format!("The {} '{}' already exists.", kind, path))
    }
}

/// Sorted recursive walk below `dir`; directories before their contents.
fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let mut children: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    children.sort();
    for child in children {
        let is_dir = child.is_dir();
        out.push(child.clone());
        if is_dir {
            walk(&child, out)?;
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.is_file() && path.extension().map_or(false, |e| e == extension)
}

impl ReportServerRepository for DiskRepository {
    fn get_folder(&self, path: &str) -> Result<Option<FolderItem>> {
        let physical = self.physical(path, None);
        if path == "/" || !physical.is_dir() {
            return Ok(None);
        }
        Ok(Some(self.folder_item(path)))
    }

    fn get_folders(&self, path: &str) -> Result<Vec<FolderItem>> {
        let mut found = Vec::new();
        walk(&self.physical(path, None), &mut found)?;
        let folders: Vec<FolderItem> = found
            .iter()
            .filter(|p| p.is_dir())
            .map(|p| self.folder_item(&self.logical(p)))
            .collect();
        debug!("Found {} folders under {}", folders.len(), path);
        Ok(folders)
    }

    fn get_report(&self, path: &str) -> Result<Option<ReportItem>> {
        let file = self.physical(path, Some(REPORT_EXTENSION));
        if !file.is_file() {
            return Ok(None);
        }
        self.load_report(&file).map(Some)
    }

    fn get_reports(&self, path: &str) -> Result<Vec<ReportItem>> {
        let mut found = Vec::new();
        walk(&self.physical(path, None), &mut found)?;
        let reports = found
            .iter()
            .filter(|p| has_extension(p, REPORT_EXTENSION))
            .map(|p| self.load_report(p))
            .collect::<Result<Vec<_>>>()?;
        debug!("Found {} reports under {}", reports.len(), path);
        Ok(reports)
    }

    fn get_data_source(&self, path: &str) -> Result<Option<DataSourceItem>> {
        let file = self.physical(path, Some(DATA_SOURCE_EXTENSION));
        if !file.is_file() {
            return Ok(None);
        }
        self.load_data_source(&file).map(Some)
    }

    fn get_data_sources(&self, path: &str) -> Result<Vec<DataSourceItem>> {
        let mut found = Vec::new();
        walk(&self.physical(path, None), &mut found)?;
        let data_sources = found
            .iter()
            .filter(|p| has_extension(p, DATA_SOURCE_EXTENSION))
            .map(|p| self.load_data_source(p))
            .collect::<Result<Vec<_>>>()?;
        debug!("Found {} data sources under {}", data_sources.len(), path);
        Ok(data_sources)
    }

    fn write_folder(&self, item: &FolderItem, overwrite: bool) -> Result<()> {
        let physical = self.physical(&item.path, None);
        if physical.is_dir() && !overwrite {
            return Err(Self::exists_error("folder", &item.path));
        }
        std::fs::create_dir_all(&physical)?;
        debug!("Wrote folder {}", item.path);
        Ok(())
    }

    fn write_report(&self, item: &ReportItem, overwrite: bool) -> Result<Vec<String>> {
        let file = self.physical(&item.path, Some(REPORT_EXTENSION));
        if file.exists() && !overwrite {
            return Err(Self::exists_error("report", &item.path));
        }
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, &item.definition)?;
        debug!("Wrote report {}", item.path);

        let mut warnings = Vec::new();
        if item.definition.is_empty() {
            warnings.push(format!("The report '{}' has an empty definition.", item.path));
        }
        Ok(warnings)
    }

    fn write_data_source(&self, item: &DataSourceItem, overwrite: bool) -> Result<()> {
        let file = self.physical(&item.path, Some(DATA_SOURCE_EXTENSION));
        if file.exists() && !overwrite {
            return Err(Self::exists_error("data source", &item.path));
        }
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, serde_json::to_vec_pretty(item)?)?;
        debug!("Wrote data source {}", item.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        temp.child("Root/Reports/Company Sales.rdl")
            .write_str("<Report>Company Sales</Report>")
            .unwrap();
        temp.child("Root/Reports/Sub Reports/Sales Detail.rdl")
            .write_str("<Report>Sales Detail</Report>")
            .unwrap();
        temp.child("Root/Data Sources/AWDataSource.json")
            .write_str(r#"{ "Name": "ignored", "Path": "/ignored", "Extension": "SQL", "Enabled": true }"#)
            .unwrap();
        temp
    }

    #[test]
    fn test_get_folders_recursive() {
        let temp = fixture();
        let repo = DiskRepository::new(temp.path());

        let paths: Vec<String> = repo
            .get_folders("/Root")
            .unwrap()
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(
            paths,
            vec!["/Root/Data Sources", "/Root/Reports", "/Root/Reports/Sub Reports"]
        );

        let folder = repo.get_folder("/Root/Reports").unwrap().unwrap();
        assert_eq!(folder.name, "Reports");
        assert!(repo.get_folder("/Root/Missing").unwrap().is_none());
    }

    #[test]
    fn test_get_reports() {
        let temp = fixture();
        let repo = DiskRepository::new(temp.path());

        let reports = repo.get_reports("/Root").unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].path, "/Root/Reports/Company Sales");
        assert_eq!(reports[0].name, "Company Sales");
        assert_eq!(reports[0].definition, b"<Report>Company Sales</Report>");

        let single = repo.get_report("/Root/Reports/Sub Reports/Sales Detail").unwrap();
        assert_eq!(single.unwrap().name, "Sales Detail");
        assert!(repo.get_report("/Root/Reports/Nope").unwrap().is_none());
    }

    #[test]
    fn test_data_source_location_wins_over_content() {
        let temp = fixture();
        let repo = DiskRepository::new(temp.path());

        let ds = repo
            .get_data_source("/Root/Data Sources/AWDataSource")
            .unwrap()
            .unwrap();
        assert_eq!(ds.name, "AWDataSource");
        assert_eq!(ds.path, "/Root/Data Sources/AWDataSource");
        assert_eq!(ds.extension.as_deref(), Some("SQL"));

        assert_eq!(repo.get_data_sources("/").unwrap().len(), 1);
    }

    #[test]
    fn test_write_conflicts() {
        let temp = fixture();
        let repo = DiskRepository::new(temp.path());

        let report = ReportItem {
            name: "Company Sales".to_string(),
            path: "/Root/Reports/Company Sales".to_string(),
            definition: b"<Report>v2</Report>".to_vec(),
            ..Default::default()
        };
        let err = repo.write_report(&report, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The report '/Root/Reports/Company Sales' already exists."
        );
        assert!(repo.write_report(&report, true).unwrap().is_empty());
        temp.child("Root/Reports/Company Sales.rdl")
            .assert("<Report>v2</Report>");

        let folder = FolderItem {
            name: "Reports".to_string(),
            path: "/Root/Reports".to_string(),
            ..Default::default()
        };
        assert!(repo.write_folder(&folder, false).unwrap_err().is_already_exists());
        repo.write_folder(&folder, true).unwrap();
    }

    #[test]
    fn test_write_creates_parents() {
        let temp = TempDir::new().unwrap();
        let repo = DiskRepository::new(temp.path());

        let ds = DataSourceItem {
            name: "AW".to_string(),
            path: "/Dest/Data Sources/AW".to_string(),
            ..Default::default()
        };
        repo.write_data_source(&ds, false).unwrap();
        temp.child("Dest/Data Sources/AW.json")
            .assert(predicate::path::is_file());
        assert_eq!(repo.get_data_source("/Dest/Data Sources/AW").unwrap().unwrap(), ds);
    }
}

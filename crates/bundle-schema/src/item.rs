//! Report server items: folders, reports and data sources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog metadata shared by every item kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemInfo {
    #[serde(rename = "ID")]
    pub id: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub modified_by: Option<String>,
    pub modified_date: Option<DateTime<Utc>>,
    pub size: Option<u64>,
    pub virtual_path: Option<String>,
}

impl ItemInfo {
    /// Metadata with a fresh identifier, for items created locally.
    pub fn with_new_id() -> Self {
        Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            ..Default::default()
        }
    }
}

/// A folder in the server namespace. Carries no content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FolderItem {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub info: ItemInfo,
}

/// A report and its definition document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReportItem {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub info: ItemInfo,
    /// Raw RDL bytes. Staged verbatim as the `.rdl` file.
    #[serde(skip)]
    pub definition: Vec<u8>,
    pub sub_reports: Vec<String>,
}

/// A shared data source definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DataSourceItem {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub info: ItemInfo,
    pub connect_string: Option<String>,
    pub credentials_retrieval: Option<String>,
    pub enabled: bool,
    pub enabled_specified: bool,
    pub extension: Option<String>,
    pub impersonate_user: bool,
    pub impersonate_user_specified: bool,
    pub original_connect_string_expression_based: bool,
    pub password: Option<String>,
    pub prompt: Option<String>,
    pub use_original_connect_string: bool,
    pub user_name: Option<String>,
    pub windows_credentials: bool,
}

/// Item kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Folder,
    Report,
    DataSource,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Folder => write!(f, "folder"),
            ItemKind::Report => write!(f, "report"),
            ItemKind::DataSource => write!(f, "data source"),
        }
    }
}

/// Any item the source reader can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportServerItem {
    Folder(FolderItem),
    Report(ReportItem),
    DataSource(DataSourceItem),
}

impl ReportServerItem {
    pub fn name(&self) -> &str {
        match self {
            ReportServerItem::Folder(f) => &f.name,
            ReportServerItem::Report(r) => &r.name,
            ReportServerItem::DataSource(d) => &d.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ReportServerItem::Folder(f) => &f.path,
            ReportServerItem::Report(r) => &r.path,
            ReportServerItem::DataSource(d) => &d.path,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ReportServerItem::Folder(_) => ItemKind::Folder,
            ReportServerItem::Report(_) => ItemKind::Report,
            ReportServerItem::DataSource(_) => ItemKind::DataSource,
        }
    }
}

impl From<FolderItem> for ReportServerItem {
    fn from(item: FolderItem) -> Self {
        ReportServerItem::Folder(item)
    }
}

impl From<ReportItem> for ReportServerItem {
    fn from(item: ReportItem) -> Self {
        ReportServerItem::Report(item)
    }
}

impl From<DataSourceItem> for ReportServerItem {
    fn from(item: DataSourceItem) -> Self {
        ReportServerItem::DataSource(item)
    }
}

/// Split a logical path into its parent path and leaf name.
///
/// `/A/B/C` yields `("/A/B", "C")`; a top level item yields `("/", "A")`.
pub fn split_server_path(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => ("/".to_string(), trimmed[1..].to_string()),
        Some(idx) => (trimmed[..idx].to_string(), trimmed[idx + 1..].to_string()),
        None => ("/".to_string(), trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_json_uses_pascal_case() {
        let item = DataSourceItem {
            name: "AWDataSource".to_string(),
            path: "/SSRSMigrate_AW_Tests/Data Sources/AWDataSource".to_string(),
            connect_string: Some("Data Source=(local);Initial Catalog=AdventureWorks".to_string()),
            extension: Some("SQL".to_string()),
            enabled: true,
            ..Default::default()
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["Name"], "AWDataSource");
        assert_eq!(value["Extension"], "SQL");
        assert!(value.get("ID").is_some());

        let parsed: DataSourceItem = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_report_definition_not_serialized() {
        let item = ReportItem {
            name: "Company Sales".to_string(),
            path: "/Root/Reports/Company Sales".to_string(),
            definition: b"<Report/>".to_vec(),
            ..Default::default()
        };
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("Definition").is_none());
    }

    #[test]
    fn test_split_server_path() {
        assert_eq!(
            split_server_path("/Root/Data Sources/AW"),
            ("/Root/Data Sources".to_string(), "AW".to_string())
        );
        assert_eq!(split_server_path("/Root"), ("/".to_string(), "Root".to_string()));
    }

    #[test]
    fn test_item_accessors() {
        let item: ReportServerItem = FolderItem {
            name: "Reports".into(),
            path: "/Root/Reports".into(),
            info: ItemInfo::with_new_id(),
        }
        .into();
        assert_eq!(item.name(), "Reports");
        assert_eq!(item.path(), "/Root/Reports");
        assert_eq!(item.kind(), ItemKind::Folder);
    }
}

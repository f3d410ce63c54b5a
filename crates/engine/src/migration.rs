//! Export and import runs.
//!
//! Both runs are iterators yielding one status per item and stopping after
//! the first error, so callers drive progress reporting themselves.

use crate::bundle_reader::BundleReader;
use crate::bundler::BundleBuilder;
use crate::checksum::CheckSumGenerator;
use crate::config::{ConflictPolicy, ConnectionConfig};
use crate::exporter::{
    DataSourceItemExporter, ExportStatus, FolderItemExporter, ItemExporter, ReportItemExporter,
};
use crate::path_mapper::{
    container_path_to_server_path, server_path_to_physical_path, DATA_SOURCE_EXTENSION,
    REPORT_EXTENSION,
};
use crate::reader::ReportServerReader;
use crate::writer::ReportServerWriter;
use serde::Serialize;
use ssrsmigrate_bundle_schema::{
    split_server_path, BundleSummaryEntry, DataSourceItem, EntryCategory, FolderItem, ItemInfo,
    ItemKind, ReportItem, ReportServerItem,
};
use ssrsmigrate_common::{Error, Result, SsrsVersion};
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Source namespace -> staged files -> bundle.
pub struct ExportRun {
    root: String,
    version: SsrsVersion,
    staging: PathBuf,
    pending: VecDeque<ReportServerItem>,
    builder: BundleBuilder,
    folders: FolderItemExporter,
    reports: ReportItemExporter,
    data_sources: DataSourceItemExporter,
    done: bool,
}

impl ExportRun {
    /// Collect every folder, data source and report below the source root.
    pub fn new(
        reader: &ReportServerReader,
        source: &ConnectionConfig,
        staging_dir: &Path,
        generator: Box<dyn CheckSumGenerator>,
    ) -> Result<Self> {
        let root = source.path.as_str();
        let mut pending: VecDeque<ReportServerItem> = VecDeque::new();
        pending.extend(reader.get_folders(root)?.into_iter().map(Into::into));
        pending.extend(reader.get_data_sources(root)?.into_iter().map(Into::into));
        pending.extend(reader.get_reports(root)?.into_iter().map(Into::into));

        info!("Exporting {} items from {}", pending.len(), root);

        Ok(Self {
            root: root.to_string(),
            version: source.version,
            staging: staging_dir.to_path_buf(),
            pending,
            builder: BundleBuilder::new(generator),
            folders: FolderItemExporter::default(),
            reports: ReportItemExporter::default(),
            data_sources: DataSourceItemExporter::default(),
            done: false,
        })
    }

    /// Items not yet staged.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn stage(&mut self, item: &ReportServerItem) -> Result<ExportStatus> {
        let (category, local, status) = match item {
            ReportServerItem::Folder(folder) => {
                let local = server_path_to_physical_path(&self.staging, &folder.path, None);
                let status = self.folders.save_item(folder, &local, true)?;
                (EntryCategory::Folders, local, status)
            }
            ReportServerItem::DataSource(ds) => {
                let local =
                    server_path_to_physical_path(&self.staging, &ds.path, Some(DATA_SOURCE_EXTENSION));
                let status = self.data_sources.save_item(ds, &local, true)?;
                (EntryCategory::DataSources, local, status)
            }
            ReportServerItem::Report(report) => {
                let local =
                    server_path_to_physical_path(&self.staging, &report.path, Some(REPORT_EXTENSION));
                let status = self.reports.save_item(report, &local, true)?;
                (EntryCategory::Reports, local, status)
            }
        };

        if !status.success {
            warn!("Failed to stage {} {}: {:?}", item.kind(), item.path(), status.errors);
            return Ok(status);
        }

        let local_name = local
            .to_str()
            .ok_or_else(|| Error::invalid_path(&local.display().to_string()))?;
        self.builder
            .add(category, local_name, item.path(), item.kind() == ItemKind::Folder)?;
        debug!("Staged {} {} at {:?}", item.kind(), item.path(), local);
        Ok(status)
    }

    /// Write the manifest and the archive.
    pub fn finish(mut self, archive: &Path) -> Result<()> {
        let archive_name = archive
            .to_str()
            .ok_or_else(|| Error::invalid_argument("fileName"))?;
        self.builder.create_summary(&self.root, self.version)?;
        self.builder.save(archive_name)
    }
}

impl Iterator for ExportRun {
    type Item = Result<ExportStatus>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.pending.pop_front()?;
        let result = self.stage(&item);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl FusedIterator for ExportRun {}

/// Outcome of importing one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStatus {
    pub kind: ItemKind,
    pub from_path: String,
    pub to_path: String,
    pub skipped: bool,
    pub warnings: Vec<String>,
}

/// Bundle -> destination namespace.
pub struct ImportRun<'a> {
    bundle: &'a BundleReader,
    writer: &'a ReportServerWriter,
    source_root: String,
    destination_root: String,
    policy: ConflictPolicy,
    pending: VecDeque<(EntryCategory, BundleSummaryEntry)>,
    done: bool,
}

impl<'a> ImportRun<'a> {
    /// Queue the entries of an opened bundle: folders shallowest first, then
    /// data sources, then reports.
    pub fn new(
        bundle: &'a BundleReader,
        writer: &'a ReportServerWriter,
        destination_root: &str,
        policy: ConflictPolicy,
    ) -> Result<Self> {
        let summary = bundle
            .entries()
            .ok_or_else(|| Error::Other("Bundle has not been opened.".to_string()))?;

        let mut folders: Vec<BundleSummaryEntry> = summary.entries.folders.clone();
        folders.sort_by_key(|entry| entry.segments().count());

        let mut pending = VecDeque::new();
        pending.extend(folders.into_iter().map(|e| (EntryCategory::Folders, e)));
        pending.extend(
            summary
                .entries
                .data_sources
                .iter()
                .cloned()
                .map(|e| (EntryCategory::DataSources, e)),
        );
        pending.extend(
            summary
                .entries
                .reports
                .iter()
                .cloned()
                .map(|e| (EntryCategory::Reports, e)),
        );

        info!(
            "Importing {} items from {} into {}",
            pending.len(),
            summary.source_root_path,
            destination_root
        );

        Ok(Self {
            bundle,
            writer,
            source_root: summary.source_root_path.clone(),
            destination_root: destination_root.to_string(),
            policy,
            pending,
            done: false,
        })
    }

    /// Rebuild an item from its manifest entry. Every item gets a fresh ID;
    /// source IDs do not carry over to the destination.
    fn decode(&self, category: EntryCategory, entry: &BundleSummaryEntry) -> Result<ReportServerItem> {
        let logical = container_path_to_server_path(entry);
        let path = rebase(&logical, &self.source_root, &self.destination_root)?;
        let (_, name) = split_server_path(&path);
        let local = self.bundle.resolve_local_path(entry);

        let item: ReportServerItem = match category {
            EntryCategory::Folders => FolderItem {
                name,
                path,
                info: ItemInfo::with_new_id(),
            }
            .into(),
            EntryCategory::DataSources => {
                let text = std::fs::read_to_string(&local)?;
                let mut ds: DataSourceItem = serde_json::from_str(&text)?;
                ds.name = name;
                ds.path = path;
                ds.info.id = ItemInfo::with_new_id().id;
                ds.into()
            }
            EntryCategory::Reports => ReportItem {
                name,
                path,
                info: ItemInfo::with_new_id(),
                definition: std::fs::read(&local)?,
                ..Default::default()
            }
            .into(),
        };
        Ok(item)
    }

    fn write(&self, item: &ReportServerItem, overwrite: bool) -> Result<Vec<String>> {
        match item {
            ReportServerItem::Folder(f) => self.writer.write_folder(f, overwrite).map(|_| Vec::new()),
            ReportServerItem::DataSource(d) => {
                self.writer.write_data_source(d, overwrite).map(|_| Vec::new())
            }
            ReportServerItem::Report(r) => self.writer.write_report(r, overwrite),
        }
    }

    fn import(&self, category: EntryCategory, entry: &BundleSummaryEntry) -> Result<ImportStatus> {
        let item = self.decode(category, entry)?;
        let mut status = ImportStatus {
            kind: item.kind(),
            from_path: container_path_to_server_path(entry),
            to_path: item.path().to_string(),
            skipped: false,
            warnings: Vec::new(),
        };

        match self.write(&item, self.policy == ConflictPolicy::Overwrite) {
            Ok(warnings) => status.warnings = warnings,
            Err(e) if e.is_already_exists() && self.policy == ConflictPolicy::Skip => {
                warn!("Skipping {}: {}", status.to_path, e);
                status.skipped = true;
            }
            Err(e) => return Err(e),
        }
        debug!("Imported {} {} -> {}", status.kind, status.from_path, status.to_path);
        Ok(status)
    }
}

impl Iterator for ImportRun<'_> {
    type Item = Result<ImportStatus>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (category, entry) = self.pending.pop_front()?;
        let result = self.import(category, &entry);
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl FusedIterator for ImportRun<'_> {}

/// Move `path` from below `source_root` to below `destination_root`.
pub fn rebase(path: &str, source_root: &str, destination_root: &str) -> Result<String> {
    let source_root = source_root.trim_end_matches('/');
    let rest = match path.strip_prefix(source_root) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return Err(Error::invalid_path(path)),
    };

    let destination_root = destination_root.trim_end_matches('/');
    let rebased = format!("{}{}", destination_root, rest);
    Ok(if rebased.is_empty() {
        "/".to_string()
    } else {
        rebased
    })
}

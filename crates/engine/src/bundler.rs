//! Bundle builder: accumulates staged items and their manifest entries,
//! then writes everything into one compressed tarball.

use crate::checksum::{CheckSumGenerator, Md5CheckSumGenerator};
use crate::path_mapper;
use flate2::write::GzEncoder;
use flate2::Compression;
use ssrsmigrate_bundle_schema::{
    BundleEntries, BundleSummary, BundleSummaryEntry, EntryCategory, SUMMARY_FILE_NAME,
};
use ssrsmigrate_common::{Error, Result, SsrsVersion};
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tar::{Builder, EntryType, Header};
use tracing::{debug, info};

/// File content waiting to be flushed into the archive.
struct PackedFile {
    archive_name: String,
    content: Vec<u8>,
}

/// Builds one export archive. Consumed by [`BundleBuilder::save`].
pub struct BundleBuilder {
    generator: Box<dyn CheckSumGenerator>,
    entries: BundleEntries,
    keys: HashSet<(EntryCategory, String, String)>,
    directories: BTreeSet<String>,
    files: Vec<PackedFile>,
    summary_text: Option<String>,
}

impl Default for BundleBuilder {
    fn default() -> Self {
        Self::new(Box::new(Md5CheckSumGenerator))
    }
}

impl BundleBuilder {
    pub fn new(generator: Box<dyn CheckSumGenerator>) -> Self {
        Self {
            generator,
            entries: BundleEntries::default(),
            keys: HashSet::new(),
            directories: BTreeSet::new(),
            files: Vec::new(),
            summary_text: None,
        }
    }

    /// Entries added so far.
    pub fn entries(&self) -> &BundleEntries {
        &self.entries
    }

    /// Container directory for a staged item. See
    /// [`path_mapper::derive_container_path`].
    pub fn get_zip_path(&self, item_file_name: &str, item_path: &str) -> Result<String> {
        path_mapper::derive_container_path(item_file_name, item_path)
    }

    pub fn create_entry_summary(
        &self,
        item_file_name: &str,
        zip_path: &str,
    ) -> Result<BundleSummaryEntry> {
        path_mapper::create_entry_summary(item_file_name, zip_path, self.generator.as_ref())
    }

    /// Add a staged item under its category name (`DataSources`, `Reports`
    /// or `Folders`).
    pub fn add_item(
        &mut self,
        category: &str,
        item_file_name: &str,
        item_path: &str,
        is_folder: bool,
    ) -> Result<()> {
        if item_file_name.is_empty() {
            return Err(Error::invalid_argument("itemFileName"));
        }
        if item_path.is_empty() {
            return Err(Error::invalid_argument("itemPath"));
        }
        let category: EntryCategory = category.parse()?;
        self.add(category, item_file_name, item_path, is_folder)
    }

    /// Typed form of [`BundleBuilder::add_item`].
    ///
    /// Folders always land in `Folders` and re-adding one is a no-op. Files
    /// must target `DataSources` or `Reports`; re-adding one is an error.
    /// Nothing is recorded when any check fails.
    pub fn add(
        &mut self,
        category: EntryCategory,
        item_file_name: &str,
        item_path: &str,
        is_folder: bool,
    ) -> Result<()> {
        if is_folder {
            if !Path::new(item_file_name).is_dir() {
                return Err(Error::DirectoryNotFound(item_file_name.to_string()));
            }
            let zip_path = path_mapper::container_path(item_file_name, item_path, true)?;
            self.add_folder_entry(zip_path);
            return Ok(());
        }
        let zip_path = path_mapper::container_path(item_file_name, item_path, false)?;

        if category == EntryCategory::Folders {
            return Err(Error::invalid_argument("category"));
        }

        let entry = self.create_entry_summary(item_file_name, &zip_path)?;
        let key = (category, entry.path.clone(), entry.file_name.clone());
        if self.keys.contains(&key) {
            return Err(Error::DuplicateEntry {
                category: category.to_string(),
                path: entry.path,
                file_name: entry.file_name,
            });
        }

        let content = std::fs::read(item_file_name)?;
        let archive_name = entry.archive_name();
        debug!("Adding {} entry {} ({})", category, archive_name, entry.check_sum);

        self.add_directories(&entry);
        self.files.push(PackedFile {
            archive_name,
            content,
        });
        self.keys.insert(key);
        self.entries.get_mut(category).push(entry);
        Ok(())
    }

    fn add_folder_entry(&mut self, zip_path: String) {
        let key = (EntryCategory::Folders, zip_path, String::new());
        if self.keys.contains(&key) {
            debug!("Folder {} already present", key.1);
            return;
        }

        let entry = BundleSummaryEntry::folder(key.1.clone());
        debug!("Adding folder entry {}", entry.path);
        self.add_directories(&entry);
        self.keys.insert(key);
        self.entries.folders.push(entry);
    }

    /// Record the entry's container directory and all of its ancestors.
    fn add_directories(&mut self, entry: &BundleSummaryEntry) {
        let mut current = String::new();
        for segment in entry.segments() {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            self.directories.insert(current.clone());
        }
    }

    /// Freeze the current entries into a manifest and return its text.
    ///
    /// May be called repeatedly; the most recent text is what
    /// [`BundleBuilder::save`] writes.
    pub fn create_summary(
        &mut self,
        source_root_path: &str,
        source_version: SsrsVersion,
    ) -> Result<String> {
        let summary = BundleSummary {
            source_root_path: source_root_path.to_string(),
            source_version,
            entries: self.entries.clone(),
        };
        let text = summary.to_manifest_text()?;
        self.summary_text = Some(text.clone());
        Ok(text)
    }

    /// Write the archive to `file_name`, replacing any existing file.
    pub fn save(self, file_name: &str) -> Result<()> {
        if file_name.is_empty() {
            return Err(Error::invalid_argument("fileName"));
        }

        let summary_text = match self.summary_text {
            Some(text) => text,
            None => BundleSummary::new("", SsrsVersion::default()).to_manifest_text()?,
        };

        let file = File::create(file_name)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut archive = Builder::new(encoder);

        for dir in &self.directories {
            add_directory_to_archive(&mut archive, dir)?;
        }
        for packed in &self.files {
            add_file_to_archive(&mut archive, &packed.archive_name, &packed.content)?;
        }
        add_file_to_archive(&mut archive, SUMMARY_FILE_NAME, summary_text.as_bytes())?;

        let encoder = archive.into_inner()?;
        encoder.finish()?.flush()?;

        info!(
            "Bundle written to {} ({} directories, {} files)",
            file_name,
            self.directories.len(),
            self.files.len()
        );
        Ok(())
    }
}

fn add_directory_to_archive<W: Write>(archive: &mut Builder<W>, path: &str) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    header.set_mtime(0);
    header.set_cksum();

    archive.append_data(&mut header, format!("{}/", path), std::io::empty())?;
    Ok(())
}

fn add_file_to_archive<W: Write>(archive: &mut Builder<W>, path: &str, content: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();

    archive.append_data(&mut header, path, content)?;
    Ok(())
}

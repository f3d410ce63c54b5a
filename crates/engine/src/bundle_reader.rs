//! Bundle reader: unpacks an export archive, validates its manifest and
//! verifies every packed file against its recorded checksum.

use crate::checksum::{CheckSumGenerator, Md5CheckSumGenerator};
use crate::path_mapper;
use flate2::read::GzDecoder;
use ssrsmigrate_bundle_schema::{
    validation, BundleSummary, BundleSummaryEntry, SUMMARY_FILE_NAME,
};
use ssrsmigrate_common::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, info};

pub struct BundleReader {
    generator: Box<dyn CheckSumGenerator>,
    unpack_dir: PathBuf,
    summary: Option<BundleSummary>,
}

impl Default for BundleReader {
    fn default() -> Self {
        Self::new(Box::new(Md5CheckSumGenerator))
    }
}

impl BundleReader {
    pub fn new(generator: Box<dyn CheckSumGenerator>) -> Self {
        Self {
            generator,
            unpack_dir: PathBuf::new(),
            summary: None,
        }
    }

    /// Extract `archive_file` into `unpack_dir` (created if absent), then
    /// parse and verify the manifest.
    ///
    /// `unpack_dir` must be absent or empty so that only this archive's
    /// content is ever verified. On failure no manifest is exposed through
    /// [`BundleReader::entries`].
    pub fn open(&mut self, archive_file: &Path, unpack_dir: &Path) -> Result<()> {
        self.summary = None;

        if archive_file.as_os_str().is_empty() {
            return Err(Error::invalid_argument("fileName"));
        }
        if unpack_dir.as_os_str().is_empty() {
            return Err(Error::invalid_argument("unpackDirectory"));
        }
        if !archive_file.is_file() {
            return Err(Error::ArchiveNotFound(archive_file.display().to_string()));
        }

        if unpack_dir.is_dir() && std::fs::read_dir(unpack_dir)?.next().is_some() {
            return Err(Error::AlreadyExists(format!(
                "Directory '{}' is not empty.",
                unpack_dir.display()
            )));
        }
        std::fs::create_dir_all(unpack_dir)?;
        unpack(archive_file, unpack_dir)?;

        let summary = read_summary(&unpack_dir.join(SUMMARY_FILE_NAME))?;
        self.verify(&summary, unpack_dir)?;

        info!(
            "Opened bundle {:?}: {} data sources, {} reports, {} folders",
            archive_file,
            summary.entries.data_sources.len(),
            summary.entries.reports.len(),
            summary.entries.folders.len()
        );

        self.unpack_dir = unpack_dir.to_path_buf();
        self.summary = Some(summary);
        Ok(())
    }

    fn verify(&self, summary: &BundleSummary, unpack_dir: &Path) -> Result<()> {
        for (category, entry) in summary.entries.iter() {
            let local = path_mapper::resolve_local_path(unpack_dir, entry);

            if entry.is_folder() {
                if !local.is_dir() {
                    return Err(Error::Corrupt(format!(
                        "missing folder '{}'",
                        entry.archive_name()
                    )));
                }
                continue;
            }

            if !local.is_file() {
                return Err(Error::Corrupt(format!(
                    "missing {} file '{}'",
                    category,
                    entry.archive_name()
                )));
            }

            let actual = self.generator.compute(&local)?;
            if actual != entry.check_sum {
                return Err(Error::ChecksumMismatch {
                    file: entry.archive_name(),
                    expected: entry.check_sum.clone(),
                    actual,
                });
            }
            debug!("Verified {} ({})", entry.archive_name(), actual);
        }
        Ok(())
    }

    /// Manifest of the opened archive.
    pub fn entries(&self) -> Option<&BundleSummary> {
        self.summary.as_ref()
    }

    pub fn unpack_directory(&self) -> &Path {
        &self.unpack_dir
    }

    /// Extracted location of a manifest entry.
    pub fn resolve_local_path(&self, entry: &BundleSummaryEntry) -> PathBuf {
        path_mapper::resolve_local_path(&self.unpack_dir, entry)
    }
}

fn unpack(archive_file: &Path, unpack_dir: &Path) -> Result<()> {
    let file = File::open(archive_file)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(unpack_dir)
        .map_err(|e| Error::Corrupt(format!("{}: {}", archive_file.display(), e)))
}

fn read_summary(path: &Path) -> Result<BundleSummary> {
    if !path.is_file() {
        return Err(Error::Corrupt(format!("missing {}", SUMMARY_FILE_NAME)));
    }
    let text = std::fs::read_to_string(path)?;

    let document: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| Error::Corrupt(format!("{}: {}", SUMMARY_FILE_NAME, e)))?;
    let result = validation::validate_summary_document(&document)
        .map_err(|e| Error::Corrupt(e.to_string()))?;
    if !result.valid {
        return Err(Error::Corrupt(result.describe()));
    }

    let summary: BundleSummary = serde_json::from_value(document)
        .map_err(|e| Error::Corrupt(format!("{}: {}", SUMMARY_FILE_NAME, e)))?;
    let result =
        validation::validate_summary(&summary).map_err(|e| Error::Corrupt(e.to_string()))?;
    if !result.valid {
        return Err(Error::Corrupt(result.describe()));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::BundleBuilder;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use ssrsmigrate_common::{ErrorKind, SsrsVersion};

    const ROOT: &str = "/SSRSMigrate_AW_Tests";

    fn build_bundle(staging: &TempDir, out: &Path) -> String {
        staging
            .child("SSRSMigrate_AW_Tests/Data Sources/AWDataSource.json")
            .write_str(r#"{ "Name": "AWDataSource" }"#)
            .unwrap();
        staging
            .child("SSRSMigrate_AW_Tests/Reports/Company Sales.rdl")
            .write_str("<Report/>")
            .unwrap();

        let local = |rel: &str| staging.child(rel).path().to_str().unwrap().to_string();
        let mut builder = BundleBuilder::default();
        builder
            .add_item(
                "DataSources",
                &local("SSRSMigrate_AW_Tests/Data Sources/AWDataSource.json"),
                "/SSRSMigrate_AW_Tests/Data Sources/AWDataSource",
                false,
            )
            .unwrap();
        builder
            .add_item(
                "Reports",
                &local("SSRSMigrate_AW_Tests/Reports/Company Sales.rdl"),
                "/SSRSMigrate_AW_Tests/Reports/Company Sales",
                false,
            )
            .unwrap();
        builder
            .add_item("Folders", &local("SSRSMigrate_AW_Tests"), ROOT, true)
            .unwrap();
        builder
            .add_item(
                "Folders",
                &local("SSRSMigrate_AW_Tests/Reports"),
                "/SSRSMigrate_AW_Tests/Reports",
                true,
            )
            .unwrap();

        let text = builder
            .create_summary(ROOT, SsrsVersion::SqlServer2008R2)
            .unwrap();
        builder.save(out.to_str().unwrap()).unwrap();
        text
    }

    /// Hand-rolled archive holding exactly the given files.
    fn write_raw_archive(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut archive = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            archive.append_data(&mut header, name, *content).unwrap();
        }
        archive.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_round_trip() {
        let staging = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        let text = build_bundle(&staging, archive.path());

        let mut reader = BundleReader::default();
        reader.open(archive.path(), &out.path().join("unpack")).unwrap();

        let summary = reader.entries().unwrap();
        assert_eq!(summary, &BundleSummary::from_manifest_text(&text).unwrap());

        for (_, entry) in summary.entries.iter() {
            let local = reader.resolve_local_path(entry);
            if entry.is_folder() {
                assert!(local.is_dir());
            } else {
                let actual = Md5CheckSumGenerator.compute(&local).unwrap();
                assert_eq!(actual, entry.check_sum);
            }
        }
    }

    #[test]
    fn test_reused_unpack_directory_is_refused() {
        let staging = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let good = out.child("bundle.tar.gz");
        build_bundle(&staging, good.path());
        let unpack = out.path().join("unpack");

        let mut reader = BundleReader::default();
        reader.open(good.path(), &unpack).unwrap();
        assert!(reader.entries().is_some());

        let stripped = out.child("stripped.tar.gz");
        write_raw_archive(stripped.path(), &[("Export/Other/b.rdl", b"<Report/>")]);

        let err = reader.open(stripped.path(), &unpack).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(reader.entries().is_none());
        assert!(!unpack.join("Export/Other/b.rdl").exists());
    }

    #[test]
    fn test_existing_empty_unpack_directory() {
        let staging = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        build_bundle(&staging, archive.path());
        let unpack = out.child("unpack");
        unpack.create_dir_all().unwrap();

        let mut reader = BundleReader::default();
        reader.open(archive.path(), unpack.path()).unwrap();
        assert_eq!(reader.unpack_directory(), unpack.path());
    }

    #[test]
    fn test_missing_archive() {
        let out = TempDir::new().unwrap();
        let mut reader = BundleReader::default();
        let err = reader
            .open(&out.path().join("missing.tar.gz"), &out.path().join("unpack"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_truncated_archive_is_corrupt() {
        let staging = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        build_bundle(&staging, archive.path());

        let bytes = std::fs::read(archive.path()).unwrap();
        let truncated = out.child("truncated.tar.gz");
        std::fs::write(truncated.path(), &bytes[..bytes.len() / 2]).unwrap();

        let mut reader = BundleReader::default();
        let err = reader
            .open(truncated.path(), &out.path().join("unpack"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert!(reader.entries().is_none());
    }

    #[test]
    fn test_garbage_archive_is_corrupt() {
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        archive.write_str("definitely not gzip").unwrap();

        let mut reader = BundleReader::default();
        let err = reader
            .open(archive.path(), &out.path().join("unpack"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn test_missing_manifest_is_corrupt() {
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        write_raw_archive(archive.path(), &[("Export/Root/a.rdl", b"<Report/>")]);

        let mut reader = BundleReader::default();
        let err = reader
            .open(archive.path(), &out.path().join("unpack"))
            .unwrap_err();
        assert!(matches!(err, Error::Corrupt(ref m) if m.contains(SUMMARY_FILE_NAME)));
    }

    #[test]
    fn test_unparseable_manifest_is_corrupt() {
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        write_raw_archive(archive.path(), &[(SUMMARY_FILE_NAME, b"{ \"SourceRootPath\": ")]);

        let mut reader = BundleReader::default();
        let err = reader
            .open(archive.path(), &out.path().join("unpack"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert!(reader.entries().is_none());
    }

    #[test]
    fn test_checksum_mismatch() {
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        let manifest = r#"{
  "SourceRootPath": "/Root",
  "SourceVersion": "SqlServer2008R2",
  "Entries": {
    "DataSources": [],
    "Reports": [
      {
        "Path": "Export\\Root\\Reports",
        "FileName": "a.rdl",
        "CheckSum": "00000000000000000000000000000000"
      }
    ],
    "Folders": []
  }
}"#;
        write_raw_archive(
            archive.path(),
            &[
                ("Export/Root/Reports/a.rdl", b"<Report/>"),
                (SUMMARY_FILE_NAME, manifest.as_bytes()),
            ],
        );

        let mut reader = BundleReader::default();
        let err = reader
            .open(archive.path(), &out.path().join("unpack"))
            .unwrap_err();
        match err {
            Error::ChecksumMismatch { file, expected, .. } => {
                assert_eq!(file, "Export/Root/Reports/a.rdl");
                assert_eq!(expected, "00000000000000000000000000000000");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_escaping_manifest_path_is_corrupt() {
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        let manifest = r#"{
  "SourceRootPath": "/Root",
  "SourceVersion": "SqlServer2008R2",
  "Entries": {
    "DataSources": [],
    "Reports": [
      {
        "Path": "Export\\..\\..",
        "FileName": "outside.rdl",
        "CheckSum": "d41d8cd98f00b204e9800998ecf8427e"
      }
    ],
    "Folders": []
  }
}"#;
        write_raw_archive(archive.path(), &[(SUMMARY_FILE_NAME, manifest.as_bytes())]);
        out.child("work").create_dir_all().unwrap();
        out.child("work/outside.rdl").write_str("").unwrap();

        let mut reader = BundleReader::default();
        let err = reader
            .open(archive.path(), &out.path().join("work/unpack"))
            .unwrap_err();
        assert!(matches!(err, Error::Corrupt(ref m) if m.contains("outside.rdl")));
        assert!(reader.entries().is_none());
    }

    #[test]
    fn test_missing_packed_file_is_corrupt() {
        let out = TempDir::new().unwrap();
        let archive = out.child("bundle.tar.gz");
        let manifest = r#"{
  "SourceRootPath": "/Root",
  "SourceVersion": "SqlServer2008R2",
  "Entries": {
    "DataSources": [
      { "Path": "Export\\Root", "FileName": "gone.json", "CheckSum": "abc" }
    ],
    "Reports": [],
    "Folders": []
  }
}"#;
        write_raw_archive(archive.path(), &[(SUMMARY_FILE_NAME, manifest.as_bytes())]);

        let mut reader = BundleReader::default();
        let err = reader
            .open(archive.path(), &out.path().join("unpack"))
            .unwrap_err();
        assert!(matches!(err, Error::Corrupt(ref m) if m.contains("gone.json")));
    }
}

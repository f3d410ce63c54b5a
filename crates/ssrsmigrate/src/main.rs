//! SSRSMigrate - move report server folders, data sources and reports
//! between servers through a portable bundle.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ssrsmigrate_bundle_schema::EntryCategory;
use ssrsmigrate_engine::checksum::generator_for;
use ssrsmigrate_engine::migration::{ExportRun, ImportRun};
use ssrsmigrate_engine::registry::{RepositoryRegistry, Role};
use ssrsmigrate_engine::{BundleReader, MigrationConfig, PathValidator, ReportServerPathValidator};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ssrsmigrate")]
#[command(
    author,
    version,
    about = "Export report server content to a bundle and import it elsewhere"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the source namespace into a bundle
    Export {
        /// Output bundle file path (defaults to bundle.archive_file)
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Staging directory (defaults to bundle.staging_dir)
        #[arg(long)]
        staging: Option<PathBuf>,
    },

    /// Import a bundle into the destination namespace
    Import {
        /// Input bundle file path
        #[arg(long)]
        bundle: PathBuf,

        /// Empty extraction directory (defaults to a fresh directory under bundle.unpack_dir)
        #[arg(long)]
        unpack: Option<PathBuf>,
    },

    /// Open a bundle and verify every checksum
    Verify {
        /// Input bundle file path
        #[arg(long)]
        bundle: PathBuf,

        /// Empty extraction directory (defaults to a fresh directory under bundle.unpack_dir)
        #[arg(long)]
        unpack: Option<PathBuf>,
    },

    /// Check a server path (or item name) against the path rules
    CheckPath {
        path: String,

        /// Validate as an item name instead of a full path
        #[arg(long)]
        name: bool,
    },
}

/// Explicit extraction directory, or a fresh one under `base` removed on drop.
fn unpack_target(
    explicit: Option<PathBuf>,
    base: &Path,
) -> anyhow::Result<(PathBuf, Option<TempDir>)> {
    if let Some(dir) = explicit {
        return Ok((dir, None));
    }
    std::fs::create_dir_all(base).with_context(|| format!("Failed to create {:?}", base))?;
    let dir = tempfile::Builder::new()
        .prefix("bundle-")
        .tempdir_in(base)
        .with_context(|| format!("Failed to create extraction directory in {:?}", base))?;
    Ok((dir.path().to_path_buf(), Some(dir)))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = match &cli.config {
        Some(path) => MigrationConfig::load(path)
            .with_context(|| format!("Failed to load configuration {:?}", path))?,
        None => MigrationConfig::default(),
    };
    let registry = RepositoryRegistry::with_disk_repositories(config.paths.clone());

    match cli.command {
        Commands::Export { out, staging } => {
            if config.source.url.is_empty() {
                bail!("source.url is not configured");
            }
            let out = out.unwrap_or_else(|| config.bundle.archive_file.clone());
            let staging = staging.unwrap_or_else(|| config.bundle.staging_dir.clone());
            info!(
                "Exporting {} from {} ({})",
                config.source.path,
                config.source.service_url(),
                config.source.version
            );

            let reader = registry.reader(Role::Source, &config.source)?;
            let mut run = ExportRun::new(
                &reader,
                &config.source,
                &staging,
                generator_for(config.bundle.checksum),
            )?;

            let mut failed = 0;
            for status in run.by_ref() {
                let status = status.context("Export failed")?;
                if status.success {
                    info!("Staged {} -> {}", status.from_path, status.to_path);
                } else {
                    warn!("Failed {}: {}", status.from_path, status.errors.join("; "));
                    failed += 1;
                }
            }
            if failed > 0 {
                bail!("{} items could not be staged; bundle not written", failed);
            }

            run.finish(&out)
                .with_context(|| format!("Failed to write bundle {:?}", out))?;
            info!("Bundle written to {:?}", out);
        }

        Commands::Import { bundle, unpack } => {
            if config.destination.url.is_empty() {
                bail!("destination.url is not configured");
            }
            let (unpack, _scratch) = unpack_target(unpack, &config.bundle.unpack_dir)?;

            let mut reader = BundleReader::new(generator_for(config.bundle.checksum));
            reader
                .open(&bundle, &unpack)
                .with_context(|| format!("Failed to open bundle {:?}", bundle))?;

            let writer = registry.writer(Role::Destination, &config.destination)?;
            let run = ImportRun::new(
                &reader,
                &writer,
                &config.destination.path,
                config.import.on_conflict,
            )?;

            let (mut written, mut skipped) = (0, 0);
            for status in run {
                let status = status.context("Import failed")?;
                if status.skipped {
                    skipped += 1;
                } else {
                    info!("Imported {} {}", status.kind, status.to_path);
                    written += 1;
                }
                for warning in &status.warnings {
                    warn!("{}: {}", status.to_path, warning);
                }
            }
            info!("Import complete: {} written, {} skipped", written, skipped);
        }

        Commands::Verify { bundle, unpack } => {
            let (unpack, _scratch) = unpack_target(unpack, &config.bundle.unpack_dir)?;

            let mut reader = BundleReader::new(generator_for(config.bundle.checksum));
            reader
                .open(&bundle, &unpack)
                .with_context(|| format!("Failed to verify bundle {:?}", bundle))?;

            let Some(summary) = reader.entries() else {
                bail!("Bundle {:?} has no manifest", bundle);
            };
            let mut counts = serde_json::Map::new();
            for category in EntryCategory::ALL {
                counts.insert(
                    category.to_string(),
                    summary.entries.get(category).len().into(),
                );
            }
            let report = serde_json::json!({
                "SourceRootPath": summary.source_root_path,
                "SourceVersion": summary.source_version,
                "Entries": counts,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::CheckPath { path, name } => {
            let validator = ReportServerPathValidator::new(config.paths.clone());
            let valid = if name {
                validator.validate_name(&path)
            } else {
                validator.validate(&path)
            };
            if !valid {
                bail!("'{}' is not a valid {}", path, if name { "name" } else { "path" });
            }
            println!("'{}' is valid", path);
        }
    }

    Ok(())
}

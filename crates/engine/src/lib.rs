//! SSRSMigrate engine - export/import bundles for report server content.

pub mod bundle_reader;
pub mod bundler;
pub mod checksum;
pub mod config;
pub mod exporter;
pub mod migration;
pub mod path_mapper;
pub mod path_validator;
pub mod reader;
pub mod registry;
pub mod repository;
pub mod writer;

pub use bundle_reader::BundleReader;
pub use bundler::BundleBuilder;
pub use checksum::{CheckSumGenerator, Md5CheckSumGenerator, Sha256CheckSumGenerator};
pub use config::MigrationConfig;
pub use migration::{ExportRun, ImportRun};
pub use path_validator::{PathValidator, ReportServerPathValidator};
pub use registry::{RepositoryRegistry, Role};

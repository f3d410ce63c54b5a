//! Construction of readers and writers per migration side and service API.

use crate::config::{ConnectionConfig, PathRules};
use crate::path_validator::ReportServerPathValidator;
use crate::reader::ReportServerReader;
use crate::repository::{DiskRepository, ReportServerRepository};
use crate::writer::ReportServerWriter;
use ssrsmigrate_common::{Error, Result, ServiceApi};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Source,
    Destination,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => write!(f, "source"),
            Role::Destination => write!(f, "destination"),
        }
    }
}

pub type RepositoryFactory =
    Box<dyn Fn(&ConnectionConfig) -> Result<Box<dyn ReportServerRepository>> + Send + Sync>;

/// Repository factories keyed by side and service API.
pub struct RepositoryRegistry {
    factories: HashMap<(Role, ServiceApi), RepositoryFactory>,
    rules: PathRules,
}

impl RepositoryRegistry {
    pub fn new(rules: PathRules) -> Self {
        Self {
            factories: HashMap::new(),
            rules,
        }
    }

    /// Registry serving every side and API from [`DiskRepository`] rooted
    /// at the connection URL.
    pub fn with_disk_repositories(rules: PathRules) -> Self {
        let mut registry = Self::new(rules);
        for role in [Role::Source, Role::Destination] {
            for api in [ServiceApi::ReportService2005, ServiceApi::ReportService2010] {
                registry.register(role, api, |cfg: &ConnectionConfig| {
                    let repo: Box<dyn ReportServerRepository> = Box::new(DiskRepository::new(&cfg.url));
                    Ok(repo)
                });
            }
        }
        registry
    }

    pub fn register<F>(&mut self, role: Role, api: ServiceApi, factory: F)
    where
        F: Fn(&ConnectionConfig) -> Result<Box<dyn ReportServerRepository>> + Send + Sync + 'static,
    {
        self.factories.insert((role, api), Box::new(factory));
    }

    pub fn repository(
        &self,
        role: Role,
        cfg: &ConnectionConfig,
    ) -> Result<Box<dyn ReportServerRepository>> {
        let api = cfg.version.api();
        let factory = self.factories.get(&(role, api)).ok_or_else(|| {
            Error::Config(format!(
                "no {} repository registered for {} ({:?})",
                role, cfg.version, api
            ))
        })?;
        debug!("Building {} repository for {} at {}", role, cfg.version, cfg.url);
        factory(cfg)
    }

    pub fn reader(&self, role: Role, cfg: &ConnectionConfig) -> Result<ReportServerReader> {
        Ok(ReportServerReader::new(
            self.repository(role, cfg)?,
            Box::new(ReportServerPathValidator::new(self.rules.clone())),
        ))
    }

    pub fn writer(&self, role: Role, cfg: &ConnectionConfig) -> Result<ReportServerWriter> {
        Ok(ReportServerWriter::new(
            self.repository(role, cfg)?,
            Box::new(ReportServerPathValidator::new(self.rules.clone())),
        ))
    }
}

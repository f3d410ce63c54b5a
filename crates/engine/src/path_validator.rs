//! Validation of report server paths and item names.

use crate::config::PathRules;
use tracing::{debug, trace};

/// Predicate over logical server paths and leaf names.
pub trait PathValidator: Send + Sync {
    fn validate(&self, path: &str) -> bool;

    fn validate_name(&self, name: &str) -> bool;
}

/// Validator driven by the configured forbidden characters and length limit.
#[derive(Debug, Clone, Default)]
pub struct ReportServerPathValidator {
    rules: PathRules,
}

impl ReportServerPathValidator {
    pub fn new(rules: PathRules) -> Self {
        Self { rules }
    }

    fn check(&self, value: &str, forbidden: &str) -> bool {
        if value.is_empty() {
            false
        } else if value.chars().any(|c| forbidden.contains(c)) {
            false
        } else {
            value.chars().count() <= self.rules.max_length
        }
    }
}

impl PathValidator for ReportServerPathValidator {
    fn validate(&self, path: &str) -> bool {
        trace!("validate - invalid_path_chars = {}", self.rules.invalid_path_chars);
        let valid = self.check(path, &self.rules.invalid_path_chars);
        debug!("validate - path = {}, valid = {}", path, valid);
        valid
    }

    fn validate_name(&self, name: &str) -> bool {
        trace!("validate_name - invalid_name_chars = {}", self.rules.invalid_name_chars);
        let valid = self.check(name, &self.rules.invalid_name_chars);
        debug!("validate_name - name = {}, valid = {}", name, valid);
        valid
    }
}

//! Content digests for packed bundle entries.

use crate::config::ChecksumAlgorithm;
use ssrsmigrate_common::{hash, Error, Result};
use std::fs::File;
use std::path::Path;

/// Computes a lowercase hex digest of file content.
///
/// Guards against accidental corruption between pack and unpack, so speed
/// matters more than collision resistance. Not defined for directories.
pub trait CheckSumGenerator: Send + Sync {
    fn compute_bytes(&self, data: &[u8]) -> String;

    fn compute(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read(path)?;
        Ok(self.compute_bytes(&content))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Md5CheckSumGenerator;

impl CheckSumGenerator for Md5CheckSumGenerator {
    fn compute_bytes(&self, data: &[u8]) -> String {
        hash::md5_bytes(data)
    }

    fn compute(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        Ok(hash::md5_reader(File::open(path)?)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256CheckSumGenerator;

impl CheckSumGenerator for Sha256CheckSumGenerator {
    fn compute_bytes(&self, data: &[u8]) -> String {
        hash::sha256_bytes(data)
    }

    fn compute(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        Ok(hash::sha256_reader(File::open(path)?)?)
    }
}

/// Generator for the configured algorithm.
pub fn generator_for(algorithm: ChecksumAlgorithm) -> Box<dyn CheckSumGenerator> {
    match algorithm {
        ChecksumAlgorithm::Md5 => Box::new(Md5CheckSumGenerator),
        ChecksumAlgorithm::Sha256 => Box::new(Sha256CheckSumGenerator),
    }
}

//! Common utilities and types shared across ssrsmigrate crates.

pub mod error;
pub mod hash;
pub mod version;

pub use error::{Error, ErrorKind, Result};
pub use version::{ServiceApi, SsrsVersion};

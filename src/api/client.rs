//! Purpose: Define the public API client surface for local catalog access.
//! Exports: `LocalClient` and catalog lifecycle operations.
//! Role: Stable boundary for callers; mirrors CLI data-dir resolution rules.
//! Invariants: The catalog reloads from disk on every operation; the client
//! holds no record state.
#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use crate::core::catalog::Catalog;
use crate::core::error::Error;
use crate::data_paths::default_data_dir;

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug)]
pub struct LocalClient {
    data_dir: PathBuf,
}

impl LocalClient {
    pub fn new() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::open(&self.data_dir)
    }

    /// Creates the data directory and the three collection documents.
    pub fn init(&self) -> ApiResult<Catalog> {
        let catalog = self.catalog();
        catalog.init()?;
        Ok(catalog)
    }
}

impl Default for LocalClient {
    fn default() -> Self {
        Self::new()
    }
}

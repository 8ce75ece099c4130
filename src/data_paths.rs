//! Purpose: Shared local data-directory resolution helpers.
//! Exports: `default_data_dir`.
//! Role: Keep CLI and API-client path semantics aligned from one source.
//! Invariants: Default data directory remains `~/.folio/data`.

use std::path::PathBuf;

pub(crate) fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".folio").join("data")
}

// Durable load/save of one collection document with atomic replace and locking.
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;

/// One collection persisted as `{ "<key>": [ ...records ] }` in a single
/// JSON document. The store keeps no state between calls; the file is the
/// sole source of truth and is re-read on every operation.
#[derive(Clone, Debug)]
pub struct JsonStore {
    path: PathBuf,
    key: &'static str,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>, key: &'static str) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Creates the document with an empty collection if absent. Idempotent;
    /// an existing document is never touched.
    pub fn ensure(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to create data directory")
                    .with_path(parent)
                    .with_source(err)
            })?;
        }
        if self.path.exists() {
            return Ok(());
        }
        self.save(&[])
    }

    /// Returns the records under the document key, in stored order. A
    /// missing file or missing key yields an empty collection; a document
    /// that exists but cannot be parsed is corrupt, not empty.
    pub fn load(&self) -> Result<Vec<Record>, Error> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("failed to read collection document")
                    .with_path(&self.path)
                    .with_source(err));
            }
        };

        let document: Value = serde_json::from_str(&raw).map_err(|err| {
            Error::new(ErrorKind::Corrupt)
                .with_message("collection document is not valid JSON")
                .with_path(&self.path)
                .with_source(err)
        })?;

        let records = match document.get(self.key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(map) => records.push(Record::from_map(map.clone())),
                        _ => {
                            return Err(Error::new(ErrorKind::Corrupt)
                                .with_message(format!(
                                    "collection {} contains a non-object record",
                                    self.key
                                ))
                                .with_path(&self.path));
                        }
                    }
                }
                records
            }
            Some(_) => {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message(format!("key {} does not hold an array", self.key))
                    .with_path(&self.path));
            }
        };

        tracing::debug!(key = self.key, count = records.len(), "loaded collection");
        Ok(records)
    }

    /// Overwrites the document with `{ key: records }`. The new content is
    /// written to a sibling temp file and renamed into place, so readers
    /// never observe a partial write.
    pub fn save(&self, records: &[Record]) -> Result<(), Error> {
        let items = records
            .iter()
            .map(|record| Value::Object(record.as_map().clone()))
            .collect();
        let mut document = Map::new();
        document.insert(self.key.to_string(), Value::Array(items));
        let mut body =
            serde_json::to_string_pretty(&Value::Object(document)).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode collection document")
                    .with_source(err)
            })?;
        body.push('\n');

        let tmp_path = self.tmp_path();
        std::fs::write(&tmp_path, body).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write collection document")
                .with_path(&tmp_path)
                .with_source(err)
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|err| {
            let _ = std::fs::remove_file(&tmp_path);
            Error::new(ErrorKind::Io)
                .with_message("failed to replace collection document")
                .with_path(&self.path)
                .with_source(err)
        })?;

        tracing::debug!(key = self.key, count = records.len(), "saved collection");
        Ok(())
    }

    /// Exclusive advisory lock serializing mutations of this collection.
    /// Held across a load/mutate/save window; released on drop. The lock
    /// lives in a sidecar file because `save` renames over the document.
    pub fn lock(&self) -> Result<StoreLock, Error> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to create data directory")
                    .with_path(parent)
                    .with_source(err)
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to open collection lock")
                    .with_path(&lock_path)
                    .with_source(err)
            })?;
        file.lock_exclusive().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to lock collection")
                .with_path(&lock_path)
                .with_source(err)
        })?;
        Ok(StoreLock { file })
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }
}

pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

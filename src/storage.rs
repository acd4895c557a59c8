use std::path::PathBuf;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

pub mod json;
#[cfg(test)]
pub mod memory;
pub mod migrations;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize document '{key}' to JSON: {source}")]
    SerializeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create backup at '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cleanup old backups in '{dir}': {source}")]
    CleanupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Flat string-keyed document storage. Every write replaces the whole value.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError>;
}

impl<T: Storage + ?Sized> Storage for &T {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        (**self).write(key, contents)
    }
}

/// Reads a document as raw JSON. Content that does not parse counts as absent.
pub fn load_value(storage: &impl Storage, key: &str) -> Result<Option<Value>, StorageError> {
    let Some(content) = storage.read(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored document is not valid JSON, ignoring it");
            Ok(None)
        }
    }
}

/// Reads a typed document; malformed or mistyped content counts as absent.
pub fn load_document<T: DeserializeOwned>(
    storage: &impl Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(value) = load_value(storage, key)? else {
        return Ok(None);
    };

    match serde_json::from_value(value) {
        Ok(document) => Ok(Some(document)),
        Err(e) => {
            tracing::warn!(key, error = %e, "stored document does not match its schema, ignoring it");
            Ok(None)
        }
    }
}

pub fn save_document<T: Serialize + ?Sized>(
    storage: &impl Storage,
    key: &str,
    document: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(document).map_err(|e| {
        StorageError::SerializeFailed {
            key: key.to_string(),
            source: e,
        }
    })?;
    storage.write(key, &json)
}

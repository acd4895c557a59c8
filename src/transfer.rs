//! Whole-workspace backup: every known document in one versioned JSON bundle.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    models::streak::StreakRecord,
    services::{
        hackathons::{HACKATHONS_KEY, decode_hackathons},
        streak::STREAK_KEY,
    },
    storage::{Storage, StorageError, load_value, save_document},
};

/// Current bundle format version
pub const BUNDLE_VERSION: u32 = 1;

/// Bookmark folders, carried through as-is
pub const BOOKMARKS_KEY: &str = "solomon_hub_v2";
/// Study courses, carried through as-is
pub const STUDY_KEY: &str = "solomon_study";

pub const DOCUMENT_KEYS: [&str; 4] = [HACKATHONS_KEY, BOOKMARKS_KEY, STUDY_KEY, STREAK_KEY];

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Import file is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Import file is not a backup bundle: {0}")]
    NotABundle(String),

    #[error(
        "Backup bundle was created by a newer version of hacktrack (version {0}). Please upgrade hacktrack to import it."
    )]
    FutureVersion(u32),

    #[error("Document '{key}' in the bundle is invalid: {reason}")]
    InvalidDocument { key: String, reason: String },

    #[error("Failed to serialize bundle to JSON: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub version: u32,
    pub exported_at: Timestamp,
    pub documents: BTreeMap<String, Value>,
}

/// Collects every stored document. Documents that don't parse are left out,
/// and hackathons are exported as the validated collection so the bundle
/// always imports again.
pub fn export(storage: &impl Storage, exported_at: Timestamp) -> Result<Bundle, TransferError> {
    let mut documents = BTreeMap::new();
    for key in DOCUMENT_KEYS {
        let Some(value) = load_value(storage, key)? else {
            continue;
        };
        let value = if key == HACKATHONS_KEY {
            match decode_hackathons(value) {
                Ok(hackathons) => {
                    serde_json::to_value(&hackathons).map_err(TransferError::SerializeFailed)?
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "stored hackathons are invalid, leaving them out of the export");
                    continue;
                }
            }
        } else {
            value
        };
        documents.insert(key.to_string(), value);
    }

    tracing::info!(documents = documents.len(), "workspace exported");
    Ok(Bundle {
        version: BUNDLE_VERSION,
        exported_at,
        documents,
    })
}

pub fn to_json(bundle: &Bundle) -> Result<String, TransferError> {
    serde_json::to_string_pretty(bundle).map_err(TransferError::SerializeFailed)
}

/// Parses and validates a bundle without touching storage
pub fn parse_bundle(content: &str) -> Result<Bundle, TransferError> {
    let value: Value = serde_json::from_str(content).map_err(TransferError::Malformed)?;

    let Some(obj) = value.as_object() else {
        return Err(TransferError::NotABundle(
            "expected a JSON object".to_string(),
        ));
    };
    let version = obj
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| TransferError::NotABundle("missing version".to_string()))?;
    if version > u64::from(BUNDLE_VERSION) {
        return Err(TransferError::FutureVersion(
            u32::try_from(version).unwrap_or(u32::MAX),
        ));
    }

    let mut bundle: Bundle =
        serde_json::from_value(value).map_err(|e| TransferError::NotABundle(e.to_string()))?;

    bundle.documents.retain(|key, _| {
        let known = DOCUMENT_KEYS.contains(&key.as_str());
        if !known {
            tracing::warn!(key, "ignoring unknown document in bundle");
        }
        known
    });

    validate(&bundle)?;
    Ok(bundle)
}

fn validate(bundle: &Bundle) -> Result<(), TransferError> {
    for (key, document) in &bundle.documents {
        let invalid = |reason: String| TransferError::InvalidDocument {
            key: key.clone(),
            reason,
        };

        match key.as_str() {
            HACKATHONS_KEY => {
                decode_hackathons(document.clone()).map_err(|e| invalid(e.to_string()))?;
            }
            STREAK_KEY => {
                serde_json::from_value::<StreakRecord>(document.clone())
                    .map_err(|e| invalid(e.to_string()))?;
            }
            BOOKMARKS_KEY | STUDY_KEY if !document.is_array() => {
                return Err(invalid("expected an array".to_string()));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Overwrites every document present in the bundle.
///
/// The whole bundle is validated before the first write. If a write fails,
/// documents already overwritten get their previous contents back; ones that
/// did not exist before the import are left in place.
pub fn import(storage: &impl Storage, bundle: &Bundle) -> Result<usize, TransferError> {
    validate(bundle)?;

    let documents: Vec<_> = bundle
        .documents
        .iter()
        .filter(|(key, _)| DOCUMENT_KEYS.contains(&key.as_str()))
        .collect();
    let previous = documents
        .iter()
        .map(|(key, _)| Ok((key.as_str(), storage.read(key)?)))
        .collect::<Result<Vec<_>, StorageError>>()?;

    for (written, (key, document)) in documents.iter().enumerate() {
        if let Err(e) = save_document(storage, key, document) {
            restore(storage, &previous[..written]);
            return Err(e.into());
        }
    }

    tracing::info!(documents = documents.len(), "workspace imported");
    Ok(documents.len())
}

fn restore(storage: &impl Storage, previous: &[(&str, Option<String>)]) {
    for (key, content) in previous {
        let Some(content) = content else {
            continue;
        };
        if let Err(e) = storage.write(key, content) {
            tracing::warn!(key, error = %e, "could not restore document after failed import");
        }
    }
}

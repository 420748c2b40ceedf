//! Durable storage for the store snapshot.
//!
//! The snapshot is kept under a single key as versioned JSON:
//! `{"state": {"city": ..., "favorites": [...]}, "version": 1}`.
//! Backends only move strings; encoding, versioning and migration live here.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{normalize, Snapshot};

/// Name of the single storage slot
pub const STORAGE_KEY: &str = "city-store";

/// Version written with every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Snapshot version {0} is newer than this build supports")]
    UnsupportedVersion(u32),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Io(_) => "Could not save your cities. Check disk permissions.",
            Self::Encoding(_) => "Saved cities could not be read and were reset.",
            Self::UnsupportedVersion(_) => "Saved cities come from a newer version and were ignored.",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    state: Snapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
}

/// Parse a stored envelope, migrating older versions forward.
///
/// An envelope without a version is used as-is. Favorite keys are always
/// rebuilt from the names, whatever the version.
pub fn decode_snapshot(raw: &str) -> Result<Snapshot, StorageError> {
    let envelope: Envelope = serde_json::from_str(raw)?;

    let snapshot = match envelope.version {
        None => envelope.state,
        Some(v) if v == SNAPSHOT_VERSION => envelope.state,
        Some(v) if v > SNAPSHOT_VERSION => return Err(StorageError::UnsupportedVersion(v)),
        Some(v) => {
            tracing::info!("Migrating city snapshot from version {} to {}", v, SNAPSHOT_VERSION);
            migrate(envelope.state, v)
        }
    };
    Ok(rekey_favorites(snapshot))
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, StorageError> {
    let envelope = Envelope {
        state: snapshot.clone(),
        version: Some(SNAPSHOT_VERSION),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Bring a snapshot written by `from_version` up to the current layout.
fn migrate(mut snapshot: Snapshot, from_version: u32) -> Snapshot {
    if from_version < 1 {
        // v0 stored the city untrimmed.
        snapshot.city = snapshot.city.trim().to_string();
    }
    snapshot
}

/// Recompute every key from its name, dropping blank names and keeping the
/// first entry per key.
fn rekey_favorites(mut snapshot: Snapshot) -> Snapshot {
    let mut seen = HashSet::new();
    let before = snapshot.favorites.len();

    snapshot.favorites = snapshot
        .favorites
        .into_iter()
        .filter_map(|mut fav| {
            fav.name = fav.name.trim().to_string();
            fav.key = normalize(&fav.name);
            (!fav.key.is_empty() && seen.insert(fav.key.clone())).then_some(fav)
        })
        .collect();

    let dropped = before - snapshot.favorites.len();
    if dropped > 0 {
        tracing::warn!("Dropped {} blank or duplicate favorites from snapshot", dropped);
    }
    snapshot
}

/// Key-value slot holding the encoded snapshot.
///
/// Implementations provide raw `read`/`write`; `load`/`save` handle the
/// envelope.
pub trait StateStorage: Send + Sync {
    /// Stored contents, `None` if nothing was ever saved.
    fn read(&self) -> Result<Option<String>, StorageError>;

    fn write(&self, contents: &str) -> Result<(), StorageError>;

    /// Previously saved snapshot, or `None` when absent or unreadable.
    fn load(&self) -> Option<Snapshot> {
        let raw = match self.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read city snapshot: {}", e);
                return None;
            }
        };

        match decode_snapshot(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Ignoring stored city snapshot: {}", e);
                None
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let contents = encode_snapshot(snapshot)?;
        self.write(&contents)
    }
}

/// JSON file at `<dir>/city-store.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Store under `dir`, using [`STORAGE_KEY`] as the file stem.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // The previous snapshot stays intact until the rename.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!("Saved city snapshot to {:?}", self.path);
        Ok(())
    }
}

/// In-process slot, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw contents already stored.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(contents.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl StateStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.lock().clone())
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        *self.slot.lock() = Some(contents.to_string());
        Ok(())
    }
}

//! Versioned snapshot of a chamber and its fetch bookkeeping.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, StoreError};
use crate::source::{ChamberId, SourceStatus};
use crate::state::{ChamberState, Provenance};

/// Bumped whenever the blob layout changes incompatibly.
pub const BLOB_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBlob {
    pub version: u32,
    pub chamber: ChamberId,
    pub state: ChamberState,
    pub decided_by: Option<Provenance>,
    /// Bookkeeping keyed by source name.
    pub sources: BTreeMap<String, SourceStatus>,
    pub written_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

impl PersistedBlob {
    /// # Errors
    /// Returns [`ConfigurationError::MalformedBlob`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigurationError> {
        serde_json::to_vec_pretty(self).map_err(|e| ConfigurationError::MalformedBlob(e.to_string()))
    }

    /// Decode a blob, checking the version before anything else.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UnsupportedBlobVersion`] for any version
    /// other than [`BLOB_VERSION`], and [`ConfigurationError::MalformedBlob`]
    /// for undecodable input.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ConfigurationError> {
        let header: Header =
            serde_json::from_slice(raw).map_err(|e| ConfigurationError::MalformedBlob(e.to_string()))?;
        if header.version != BLOB_VERSION {
            return Err(ConfigurationError::UnsupportedBlobVersion {
                found: header.version,
                expected: BLOB_VERSION,
            });
        }
        serde_json::from_slice(raw).map_err(|e| ConfigurationError::MalformedBlob(e.to_string()))
    }
}

/// A blob kept in a single file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = OsString::from(self.path.as_os_str());
        staging.push(".new");
        PathBuf::from(staging)
    }

    /// Write to `<path>.new`, then rename over `<path>`.
    ///
    /// # Errors
    /// Returns [`StoreError`] when encoding or any file operation fails.
    pub fn save(&self, blob: &PersistedBlob) -> Result<(), StoreError> {
        let bytes = blob.to_bytes()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.staging_path();
        std::fs::write(&staging, bytes)?;
        std::fs::rename(&staging, &self.path)?;
        tracing::debug!(path = %self.path.display(), chamber = %blob.chamber, "saved snapshot");
        Ok(())
    }

    /// `Ok(None)` when no snapshot has been written yet.
    ///
    /// # Errors
    /// Returns [`StoreError`] for unreadable files and incompatible blobs.
    pub fn load(&self) -> Result<Option<PersistedBlob>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(raw) => Ok(Some(PersistedBlob::from_bytes(&raw)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

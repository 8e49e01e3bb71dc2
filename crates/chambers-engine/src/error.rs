//! Error taxonomy for the engine.
//!
//! Only [`ConfigurationError`] ever reaches a caller of the chamber API.
//! [`ParseError`] and [`FetchError`] are absorbed at the chamber boundary and
//! degrade a single source to "no new data this cycle".

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::event::FeedKind;

const EXCERPT_LEN: usize = 160;

/// An upstream document could not be turned into events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed {feed} document: {reason} (excerpt: {excerpt:?})")]
pub struct ParseError {
    pub feed: FeedKind,
    pub reason: String,
    /// Leading slice of the raw payload, lossily decoded.
    pub excerpt: String,
}

impl ParseError {
    pub fn new(feed: FeedKind, reason: impl Into<String>, raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let excerpt: String = text.trim_start().chars().take(EXCERPT_LEN).collect();
        Self {
            feed,
            reason: reason.into(),
            excerpt,
        }
    }
}

/// Failure reported by a [`crate::transport::FeedTransport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The document does not exist (yet). Dated journals fall back to an
    /// earlier day on this error.
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("fetch did not complete within {0:?}")]
    Timeout(Duration),
}

/// The journal and the floor schedule disagree about the current status.
///
/// Resolved by the snapshot-wins-when-newer rule and reported, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "journal says convened={journal_convened} as of {journal_as_of:?}, \
     floor schedule says convened={snapshot_convened} as of {snapshot_as_of}"
)]
pub struct ReconciliationConflict {
    pub journal_convened: bool,
    pub journal_as_of: Option<DateTime<Utc>>,
    pub snapshot_convened: bool,
    pub snapshot_as_of: DateTime<Utc>,
}

/// Programming or configuration mistakes. These propagate to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown time zone identifier '{0}'")]
    InvalidTimezone(String),

    #[error("invalid source configuration: {0}")]
    InvalidSources(String),

    #[error("invalid endpoint template '{0}'")]
    InvalidEndpoint(String),

    #[error("unsupported persisted blob version {found} (expected {expected})")]
    UnsupportedBlobVersion { found: u32, expected: u32 },

    #[error("persisted blob belongs to chamber '{found}', not '{expected}'")]
    ChamberMismatch { expected: String, found: String },

    #[error("persisted blob is malformed: {0}")]
    MalformedBlob(String),
}

/// Failure in the file-backed snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Blob(#[from] ConfigurationError),
}

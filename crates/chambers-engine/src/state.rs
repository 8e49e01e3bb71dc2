//! Externally visible chamber status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reduced convened/adjourned status plus the relevant instants.
///
/// Instants are stored in UTC and converted to a display zone only when read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChamberState {
    pub convened: bool,
    pub convened_at: Option<DateTime<Utc>>,
    /// Next scheduled convening; always `None` while convened.
    pub convenes_at: Option<DateTime<Utc>>,
    pub adjourned_at: Option<DateTime<Utc>>,
}

impl ChamberState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Which source decided the `convened` flag of a merged state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Journal,
    Snapshot,
}

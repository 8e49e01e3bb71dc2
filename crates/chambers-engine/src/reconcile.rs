//! Merging the Senate's lagging journal with its same-day schedule snapshot.
//!
//! The newer source decides `convened`. Timestamps the winning source cannot
//! vouch for are left empty rather than guessed.

use chrono::{DateTime, Utc};

use crate::error::ReconciliationConflict;
use crate::event::Event;
use crate::state::{ChamberState, Provenance};

/// One source's derived state and the instant it speaks for.
#[derive(Debug, Clone, Copy)]
pub struct SourceView<'a> {
    pub state: &'a ChamberState,
    /// For a journal, its most recent processed event. For a snapshot, the
    /// fetch time.
    pub as_of: Option<DateTime<Utc>>,
}

/// Result of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub state: ChamberState,
    pub decided_by: Provenance,
    /// Set when the two sources disagreed on `convened`.
    pub conflict: Option<ReconciliationConflict>,
}

/// Merge journal and snapshot views. `None` when neither source has data.
#[must_use]
pub fn reconcile(journal: Option<SourceView<'_>>, snapshot: Option<SourceView<'_>>) -> Option<Reconciled> {
    let (journal, snapshot) = match (journal, snapshot) {
        (None, None) => return None,
        (Some(journal), None) => return Some(sole(journal.state, Provenance::Journal)),
        (None, Some(snapshot)) => return Some(sole(snapshot.state, Provenance::Snapshot)),
        (Some(journal), Some(snapshot)) => (journal, snapshot),
    };

    let conflict = (journal.state.convened != snapshot.state.convened).then(|| ReconciliationConflict {
        journal_convened: journal.state.convened,
        journal_as_of: journal.as_of,
        snapshot_convened: snapshot.state.convened,
        snapshot_as_of: snapshot.as_of.unwrap_or(DateTime::<Utc>::MIN_UTC),
    });
    if let Some(conflict) = &conflict {
        tracing::warn!(%conflict, "journal and floor schedule disagree");
    }

    let snapshot_newer = match (journal.as_of, snapshot.as_of) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(j), Some(s)) => s > j,
    };
    if !snapshot_newer {
        return Some(Reconciled {
            state: journal.state.clone(),
            decided_by: Provenance::Journal,
            conflict,
        });
    }

    let state = match (journal.state.convened, snapshot.state.convened) {
        (true, true) => ChamberState {
            convened: true,
            convened_at: journal.state.convened_at,
            convenes_at: None,
            adjourned_at: None,
        },
        (false, false) => ChamberState {
            convened: false,
            convened_at: None,
            convenes_at: snapshot.state.convenes_at,
            adjourned_at: journal.state.adjourned_at,
        },
        (false, true) => ChamberState {
            convened: true,
            ..ChamberState::default()
        },
        (true, false) => ChamberState {
            convened: false,
            convenes_at: snapshot.state.convenes_at,
            ..ChamberState::default()
        },
    };
    Some(Reconciled {
        state,
        decided_by: Provenance::Snapshot,
        conflict,
    })
}

fn sole(state: &ChamberState, decided_by: Provenance) -> Reconciled {
    Reconciled {
        state: state.clone(),
        decided_by,
        conflict: None,
    }
}

/// Interpret the schedule's single event as of `as_of`.
///
/// A convening at or before `as_of` means the chamber is in session; when it
/// began exactly is not known from the snapshot. A later one is the next
/// scheduled convening.
#[must_use]
pub fn snapshot_state(event: Option<&Event>, as_of: DateTime<Utc>) -> Option<ChamberState> {
    let at = event?.instant();
    Some(if at <= as_of {
        ChamberState {
            convened: true,
            ..ChamberState::default()
        }
    } else {
        ChamberState {
            convenes_at: Some(at),
            ..ChamberState::default()
        }
    })
}

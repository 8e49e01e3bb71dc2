//! Folding ordered events into a [`ChamberState`].
//!
//! Shared by both chambers. The only transitions are CONVENE and ADJOURN;
//! any event may additionally announce the next convening.

use crate::event::{ordered, Event, EventKind, EventMarker};
use crate::state::ChamberState;

/// Reduce `events` onto `prior`.
///
/// Events are stably sorted by timestamp first, so callers may pass them in
/// document order.
#[must_use]
pub fn reduce(prior: &ChamberState, events: &[Event]) -> ChamberState {
    ordered(events).iter().fold(prior.clone(), apply)
}

fn apply(mut state: ChamberState, event: &Event) -> ChamberState {
    let at = event.instant();
    match event.kind {
        EventKind::Convene => {
            state.convened = true;
            state.convened_at = Some(at);
            state.convenes_at = None;
            state.adjourned_at = None;
        }
        EventKind::Adjourn => {
            state.convened = false;
            state.adjourned_at = Some(at);
            state.convened_at = None;
        }
        EventKind::NewDay | EventKind::Recess | EventKind::Other => {}
    }
    if let Some(next) = event.next_convene {
        if !state.convened {
            state.convenes_at = Some(next.to_utc());
        }
    }
    state
}

/// Outcome of offering a parsed journal document to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Same final event as last time, or an empty document.
    Unchanged,
    /// The document ends before the last processed event (an older day).
    Stale,
    /// New events were consumed.
    Applied {
        state: ChamberState,
        marker: EventMarker,
    },
}

/// Consume the part of a journal document not yet processed.
///
/// `last` is the marker of the previously processed document. Re-delivery of
/// an unchanged document is detected by marker equality before reducing.
/// Otherwise only events at or after the marker's timestamp are applied.
#[must_use]
pub fn advance(prior: &ChamberState, events: &[Event], last: Option<&EventMarker>) -> Advance {
    let sorted = ordered(events);
    let Some(marker) = EventMarker::of(&sorted) else {
        return Advance::Unchanged;
    };

    let fresh: Vec<Event> = match last {
        Some(last) if *last == marker => return Advance::Unchanged,
        Some(last) if marker.timestamp < last.timestamp => return Advance::Stale,
        Some(last) => sorted
            .into_iter()
            .filter(|e| e.instant() >= last.timestamp)
            .collect(),
        None => sorted,
    };
    tracing::debug!(consumed = fresh.len(), last = ?marker.code, "advancing journal");

    Advance::Applied {
        state: fresh.iter().fold(prior.clone(), apply),
        marker,
    }
}

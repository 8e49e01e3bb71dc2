//! Typed floor events extracted from upstream feeds.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// The kind of upstream document a source serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedKind {
    /// House clerk floor-proceedings XML, one document per legislative day.
    HouseJournal,
    /// Senate floor-activity XML, published roughly a day late.
    SenateJournal,
    /// Senate floor-schedule JSON snapshot with no history.
    FloorSchedule,
}

impl FeedKind {
    /// Journals carry history; the schedule snapshot only a present view.
    #[must_use]
    pub const fn is_journal(self) -> bool {
        matches!(self, Self::HouseJournal | Self::SenateJournal)
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HouseJournal => "house-journal",
            Self::SenateJournal => "senate-journal",
            Self::FloorSchedule => "floor-schedule",
        };
        f.write_str(name)
    }
}

/// What a floor action means for chamber status. The reducer dispatches on
/// this alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Convene,
    Adjourn,
    NewDay,
    Recess,
    Other,
}

/// One discrete floor action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Upstream identifier (House act-id, Senate section type, ...).
    pub code: String,
    pub kind: EventKind,
    pub timestamp: DateTime<FixedOffset>,
    /// Upstream unique id, when the feed has one.
    pub id: Option<String>,
    pub description: Option<String>,
    /// Next scheduled convening announced by this action.
    pub next_convene: Option<DateTime<FixedOffset>>,
}

impl Event {
    pub fn new(code: impl Into<String>, kind: EventKind, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            code: code.into(),
            kind,
            timestamp,
            id: None,
            description: None,
            next_convene: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_next_convene(mut self, next: DateTime<FixedOffset>) -> Self {
        self.next_convene = Some(next);
        self
    }

    #[must_use]
    pub fn instant(&self) -> DateTime<Utc> {
        self.timestamp.with_timezone(&Utc)
    }
}

/// Sort events by timestamp. The sort is stable, so document order breaks ties.
#[must_use]
pub fn ordered(events: &[Event]) -> Vec<Event> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(Event::instant);
    sorted
}

/// Identifies the final event of a processed document.
///
/// Two fetches of an unchanged document produce equal markers, which is how
/// re-delivery is detected before any reduction happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMarker {
    pub timestamp: DateTime<Utc>,
    pub code: String,
    pub id: Option<String>,
    /// Number of events in the document the marker was taken from.
    pub count: usize,
}

impl EventMarker {
    /// Marker for an already ordered event sequence; `None` when empty.
    #[must_use]
    pub fn of(ordered: &[Event]) -> Option<Self> {
        let last = ordered.last()?;
        Some(Self {
            timestamp: last.instant(),
            code: last.code.clone(),
            id: last.id.clone(),
            count: ordered.len(),
        })
    }
}

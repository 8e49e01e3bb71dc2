//! Upstream source descriptors and their fetch bookkeeping.

use std::fmt::{self, Write as _};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::event::{EventMarker, FeedKind};
use crate::state::ChamberState;

/// The two chambers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChamberId {
    House,
    Senate,
}

impl fmt::Display for ChamberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::House => "house",
            Self::Senate => "senate",
        })
    }
}

/// Where a source's document lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Endpoint {
    /// A single URL that always serves the current document.
    Fixed { url: String },
    /// One document per day. `template` is a strftime pattern over the date.
    ///
    /// The newest candidate is `skip_days` before today; up to
    /// `lookback_days` consecutive earlier days are tried after it.
    Dated {
        template: String,
        skip_days: u64,
        lookback_days: u64,
    },
}

impl Endpoint {
    pub fn fixed(url: impl Into<String>) -> Self {
        Self::Fixed { url: url.into() }
    }

    pub fn dated(template: impl Into<String>, skip_days: u64, lookback_days: u64) -> Self {
        Self::Dated {
            template: template.into(),
            skip_days,
            lookback_days,
        }
    }

    /// # Errors
    /// Returns [`ConfigurationError::InvalidEndpoint`] for an empty URL, a
    /// template with an invalid strftime specifier, or a zero look-back.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            Self::Fixed { url } if url.trim().is_empty() => Err(ConfigurationError::InvalidEndpoint(url.clone())),
            Self::Fixed { .. } => Ok(()),
            Self::Dated {
                template,
                lookback_days,
                ..
            } => {
                if template.trim().is_empty()
                    || *lookback_days == 0
                    || StrftimeItems::new(template).any(|item| matches!(item, Item::Error))
                {
                    return Err(ConfigurationError::InvalidEndpoint(template.clone()));
                }
                Ok(())
            }
        }
    }

    /// Candidate URLs, newest first, for a chamber whose local date is `today`.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidEndpoint`] if the template cannot
    /// be rendered.
    pub fn candidates(&self, today: NaiveDate) -> Result<Vec<String>, ConfigurationError> {
        match self {
            Self::Fixed { url } => Ok(vec![url.clone()]),
            Self::Dated {
                template,
                skip_days,
                lookback_days,
            } => (*skip_days..skip_days.saturating_add(*lookback_days))
                .filter_map(|back| today.checked_sub_days(Days::new(back)))
                .map(|date| render(template, date))
                .collect(),
        }
    }
}

fn render(template: &str, date: NaiveDate) -> Result<String, ConfigurationError> {
    let mut url = String::with_capacity(template.len() + 8);
    write!(url, "{}", date.format_with_items(StrftimeItems::new(template)))
        .map_err(|_| ConfigurationError::InvalidEndpoint(template.to_string()))?;
    Ok(url)
}

/// Static description of one upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique within a chamber; keys the persisted bookkeeping.
    pub name: String,
    pub kind: FeedKind,
    pub endpoint: Endpoint,
    /// Never fetch more often than this, whatever the chamber state.
    pub min_interval: Option<Duration>,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, kind: FeedKind, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            kind,
            endpoint,
            min_interval: None,
        }
    }

    #[must_use]
    pub const fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }
}

/// Per-source bookkeeping, persisted across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    /// Last attempt, successful or not.
    pub last_fetch_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    /// Final event of the last processed journal document.
    pub last_event: Option<EventMarker>,
    /// State derived from this source alone.
    pub derived: Option<ChamberState>,
    /// The instant `derived` speaks for.
    pub as_of: Option<DateTime<Utc>>,
}

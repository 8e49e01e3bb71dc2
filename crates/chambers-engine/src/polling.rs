//! When a source may be fetched again.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::state::ChamberState;

/// Polling intervals for one chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingPolicy {
    /// While in session.
    pub convened: Duration,
    /// While adjourned without a nearer scheduled convening.
    pub adjourned: Duration,
    /// How long before a scheduled convening to start polling again.
    pub pre_convene_lead: Duration,
    /// Retry interval once the pre-convene moment has passed.
    pub overdue: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            convened: Duration::from_secs(2 * 60),
            adjourned: Duration::from_secs(10 * 60),
            pre_convene_lead: Duration::from_secs(10 * 60),
            overdue: Duration::from_secs(60),
        }
    }
}

fn delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or_else(|_| TimeDelta::MAX)
}

impl PollingPolicy {
    /// Earliest instant a source last fetched at `last_fetch` may be fetched
    /// again, given the chamber's current `state`.
    ///
    /// `floor` is a per-source minimum interval that applies on top of the
    /// state-driven one.
    #[must_use]
    pub fn next_eligible(
        &self,
        last_fetch: DateTime<Utc>,
        state: &ChamberState,
        floor: Option<Duration>,
    ) -> DateTime<Utc> {
        let after = |d: Duration| last_fetch.checked_add_signed(delta(d)).unwrap_or(DateTime::<Utc>::MAX_UTC);

        let due = if state.convened {
            after(self.convened)
        } else if let Some(convenes_at) = state.convenes_at {
            let target = convenes_at
                .checked_sub_signed(delta(self.pre_convene_lead))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            if target <= last_fetch {
                after(self.overdue)
            } else {
                target.min(after(self.adjourned))
            }
        } else {
            after(self.adjourned)
        };

        floor.map_or(due, |floor| due.max(after(floor)))
    }
}

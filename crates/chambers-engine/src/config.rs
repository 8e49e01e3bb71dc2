//! Chamber configuration and the public upstream presets.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::event::FeedKind;
use crate::polling::PollingPolicy;
use crate::source::{ChamberId, Endpoint, SourceDescriptor};

/// Zone both chambers publish their local times in.
pub const CAPITOL_TIMEZONE: &str = "America/New_York";

pub const HOUSE_FLOOR_URL: &str = "https://clerk.house.gov/floor/%Y%m%d.xml";
pub const SENATE_FLOOR_URL: &str = "https://www.senate.gov/legislative/LIS/floor_activity/%m_%d_%Y_Senate_Floor.xml";
pub const SENATE_SCHEDULE_URL: &str = "https://www.senate.gov/legislative/schedule/floor_schedule.json";

/// Days of journals tried before giving up for the cycle.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 14;
/// The Senate journal lags a day and changes rarely.
pub const SENATE_JOURNAL_MIN_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Everything needed to construct a [`crate::Chamber`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChamberConfig {
    pub id: ChamberId,
    /// IANA zone the chamber's feeds publish naive times in.
    pub timezone: String,
    /// Default zone for reads; the chamber zone when unset.
    pub display_timezone: Option<String>,
    pub polling: PollingPolicy,
    pub fetch_timeout: Duration,
    pub sources: Vec<SourceDescriptor>,
}

impl ChamberConfig {
    /// House clerk floor proceedings, one journal source.
    #[must_use]
    pub fn house() -> Self {
        Self {
            id: ChamberId::House,
            timezone: CAPITOL_TIMEZONE.to_string(),
            display_timezone: None,
            polling: PollingPolicy::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            sources: vec![SourceDescriptor::new(
                "floor",
                FeedKind::HouseJournal,
                Endpoint::dated(HOUSE_FLOOR_URL, 0, DEFAULT_LOOKBACK_DAYS),
            )],
        }
    }

    /// Senate floor activity journal (from yesterday back) plus the floor
    /// schedule snapshot.
    #[must_use]
    pub fn senate() -> Self {
        Self {
            id: ChamberId::Senate,
            timezone: CAPITOL_TIMEZONE.to_string(),
            display_timezone: None,
            polling: PollingPolicy::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            sources: vec![
                SourceDescriptor::new(
                    "floor-activity",
                    FeedKind::SenateJournal,
                    Endpoint::dated(SENATE_FLOOR_URL, 1, DEFAULT_LOOKBACK_DAYS),
                )
                .with_min_interval(SENATE_JOURNAL_MIN_INTERVAL),
                SourceDescriptor::new(
                    "floor-schedule",
                    FeedKind::FloorSchedule,
                    Endpoint::fixed(SENATE_SCHEDULE_URL),
                ),
            ],
        }
    }

    #[must_use]
    pub fn with_display_timezone(mut self, zone: impl Into<String>) -> Self {
        self.display_timezone = Some(zone.into());
        self
    }

    #[must_use]
    pub const fn with_polling(mut self, polling: PollingPolicy) -> Self {
        self.polling = polling;
        self
    }

    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Source named `name`, for overriding its endpoint or interval.
    pub fn source_mut(&mut self, name: &str) -> Option<&mut SourceDescriptor> {
        self.sources.iter_mut().find(|s| s.name == name)
    }
}

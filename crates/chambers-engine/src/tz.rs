//! Time zone helpers.
//!
//! Upstream feeds publish naive chamber-local times. They are anchored to
//! the chamber's configured zone here and nowhere else.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::ConfigurationError;

/// Parse an IANA zone identifier such as `America/New_York`.
///
/// # Errors
/// Returns [`ConfigurationError::InvalidTimezone`] for unknown identifiers.
pub fn parse_zone(name: &str) -> Result<Tz, ConfigurationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigurationError::InvalidTimezone(name.to_string()))
}

/// Anchor a naive local time to `zone`.
///
/// Ambiguous wall-clock times (the repeated hour when DST ends) resolve to
/// the earlier instant. Times inside the spring-forward gap do not exist and
/// yield `None`.
#[must_use]
pub fn localize(zone: Tz, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

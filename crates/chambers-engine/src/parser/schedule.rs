//! Senate floor schedule snapshot.
//!
//! The JSON has no history. Its first `floorProceedings` record names the
//! current (or next) convening, with each date part as a string.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_aux::prelude::deserialize_number_from_string;

use crate::error::ParseError;
use crate::event::{Event, EventKind, FeedKind};
use crate::tz::localize;

const FEED: FeedKind = FeedKind::FloorSchedule;

pub const SCHEDULE_CODE: &str = "floor-schedule";

#[derive(Debug, Deserialize)]
struct FloorSchedule {
    #[serde(rename = "floorProceedings")]
    floor_proceedings: Vec<FloorProceeding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FloorProceeding {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    convene_year: i32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    convene_month: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    convene_day: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    convene_hour: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    convene_minutes: u32,
    #[serde(default)]
    convene_text: Option<String>,
}

/// Parse the schedule snapshot into at most one CONVENE event stamped with
/// the scheduled convening time.
///
/// Whether that convening has already happened depends on when the snapshot
/// was taken; see [`crate::reconcile::snapshot_state`].
///
/// # Errors
/// Returns [`ParseError`] when the JSON is invalid, lacks
/// `floorProceedings`, or names an impossible date or time.
pub fn parse(raw: &[u8], zone: Tz) -> Result<Option<Event>, ParseError> {
    let schedule: FloorSchedule =
        serde_json::from_slice(raw).map_err(|e| ParseError::new(FEED, format!("JSON: {e}"), raw))?;

    let Some(current) = schedule.floor_proceedings.into_iter().next() else {
        return Ok(None);
    };

    let naive = NaiveDate::from_ymd_opt(current.convene_year, current.convene_month, current.convene_day)
        .and_then(|d| d.and_hms_opt(current.convene_hour, current.convene_minutes, 0))
        .ok_or_else(|| ParseError::new(FEED, "scheduled convening is not a valid date/time", raw))?;
    let at = localize(zone, naive)
        .ok_or_else(|| ParseError::new(FEED, "scheduled convening does not exist locally", raw))?;

    let event = Event::new(SCHEDULE_CODE, EventKind::Convene, at);
    Ok(Some(match current.convene_text {
        Some(text) => event.with_description(text),
        None => event,
    }))
}

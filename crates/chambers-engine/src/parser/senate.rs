//! Senate floor activity journal.
//!
//! Published per day, usually the day after. The only machine-usable status
//! is the prose of the `<section type="recess">` block, e.g.
//! "The Senate stands adjourned at 6:35 p.m. until 10:00 a.m. tomorrow".

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use regex::{Captures, Regex};
use roxmltree::Document;

use super::{first, normalize_meridiem, text_of, utf8};
use crate::error::ParseError;
use crate::event::{Event, EventKind, FeedKind};
use crate::tz::localize;

const FEED: FeedKind = FeedKind::SenateJournal;

/// Section type whose content reports the adjournment.
pub const RECESS_SECTION: &str = "recess";

#[allow(clippy::expect_used)]
static ADJOURNED_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bat\s+(\d{1,2})(?::(\d{2}))?\s+([ap])m\b").expect("adjournment pattern is valid")
});

#[allow(clippy::expect_used)]
static UNTIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\buntil\s+(?:(\d{1,2})(?::(\d{2}))?\s+([ap])m\b|(?:12(?::00)?\s+)?(noon)\b)")
        .expect("convening pattern is valid")
});

#[allow(clippy::expect_used)]
static CALENDAR_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+) (\d{1,2})(?:, (\d{4}))?\b").expect("date pattern is valid")
});

/// Parse a Senate floor-activity document.
///
/// Yields one ADJOURN event per recess section, carrying the announced next
/// convening when the text names one. A section without an adjournment time
/// becomes an OTHER event at the start of the journal day.
///
/// # Errors
/// Returns [`ParseError`] for invalid XML or a missing or malformed
/// `<date_iso_8601>`.
pub fn parse(raw: &[u8], zone: Tz) -> Result<Vec<Event>, ParseError> {
    let text = utf8(raw, FEED)?;
    let doc = Document::parse(text).map_err(|e| ParseError::new(FEED, format!("XML: {e}"), raw))?;
    let root = doc.root_element();

    let date_text = first(root, "date_iso_8601")
        .and_then(|n| n.text())
        .ok_or_else(|| ParseError::new(FEED, "missing <date_iso_8601>", raw))?;
    let base = NaiveDate::parse_from_str(date_text.trim(), "%Y-%m-%d")
        .map_err(|e| ParseError::new(FEED, format!("bad journal date '{date_text}': {e}"), raw))?;

    root.descendants()
        .filter(|n| n.has_tag_name("section") && n.attribute("type") == Some(RECESS_SECTION))
        .map(|section| {
            let content = first(section, "content").map(text_of).unwrap_or_default();
            recess_section(&content, base, zone, raw)
        })
        .collect()
}

fn recess_section(content: &str, base: NaiveDate, zone: Tz, raw: &[u8]) -> Result<Event, ParseError> {
    let text = normalize_meridiem(content);
    let until = UNTIL.captures(&text);
    let before_until = until
        .as_ref()
        .and_then(|caps| caps.get(0))
        .map_or(text.as_str(), |m| &text[..m.start()]);

    let Some(adjourned_time) = ADJOURNED_AT.captures(before_until).and_then(|caps| clock(&caps, 1)) else {
        tracing::debug!(feed = %FEED, text = %text, "recess section has no adjournment time");
        let start = localize(zone, base.and_time(NaiveTime::MIN))
            .ok_or_else(|| ParseError::new(FEED, "journal day does not start locally", raw))?;
        return Ok(Event::new(RECESS_SECTION, EventKind::Other, start).with_description(text.clone()));
    };
    let adjourned_at = localize(zone, base.and_time(adjourned_time))
        .ok_or_else(|| ParseError::new(FEED, "adjournment time does not exist locally", raw))?;

    let event = Event::new(RECESS_SECTION, EventKind::Adjourn, adjourned_at).with_description(text.clone());

    let Some(caps) = until else {
        return Ok(event);
    };
    let Some(convene_time) = clock(&caps, 1) else {
        return Ok(event);
    };
    let rest = caps.get(0).map_or("", |m| &text[m.end()..]);
    let day = convening_day(rest, base, adjourned_time, convene_time);
    match day.and_then(|day| localize(zone, day.and_time(convene_time))) {
        Some(next) => Ok(event.with_next_convene(next)),
        None => Ok(event),
    }
}

/// Which day the announced convening falls on.
fn convening_day(rest: &str, base: NaiveDate, adjourned: NaiveTime, convene: NaiveTime) -> Option<NaiveDate> {
    let tomorrow = base.checked_add_days(Days::new(1));
    if rest.to_ascii_lowercase().contains("tomorrow") {
        return tomorrow;
    }
    if let Some(date) = CALENDAR_DATE
        .captures_iter(rest)
        .find_map(|caps| calendar_date(&caps, base))
    {
        return Some(date);
    }
    if convene > adjourned {
        Some(base)
    } else {
        tomorrow
    }
}

/// `Month D[, YYYY]`. Without a year the date is the next one on or after
/// `base`.
fn calendar_date(caps: &Captures<'_>, base: NaiveDate) -> Option<NaiveDate> {
    let on = |year: i32| NaiveDate::parse_from_str(&format!("{} {} {year}", &caps[1], &caps[2]), "%B %d %Y").ok();
    if let Some(year) = caps.get(3) {
        return on(year.as_str().parse().ok()?);
    }
    match on(base.year())? {
        date if date >= base => Some(date),
        _ => on(base.year() + 1),
    }
}

/// Build a time from `hour[:minute] am|pm` captures starting at `group`, or
/// from a trailing `noon` group.
fn clock(caps: &Captures<'_>, group: usize) -> Option<NaiveTime> {
    if caps.get(group + 3).is_some() {
        return NaiveTime::from_hms_opt(12, 0, 0);
    }
    let hour: u32 = caps.get(group)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(group + 1).map_or(Some(0), |m| m.as_str().parse().ok())?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = caps.get(group + 2)?.as_str().eq_ignore_ascii_case("p");
    let hour = hour % 12 + if pm { 12 } else { 0 };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

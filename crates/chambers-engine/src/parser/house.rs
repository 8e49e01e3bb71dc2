//! House clerk floor proceedings.
//!
//! One XML document per legislative day. Every `<floor_action>` carries an
//! `act-id`, a `unique-id`, an `<action_time for-search="YYYYMMDDTHH:MM:SS">`
//! and a free-text `<action_description>`. A closing
//! `<legislative_day_finished>` announces when the next day convenes.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use chrono_tz::Tz;
use roxmltree::{Document, Node};

use super::{first, normalize_whitespace, text_of, utf8};
use crate::error::ParseError;
use crate::event::{Event, EventKind, FeedKind};
use crate::tz::localize;

const FEED: FeedKind = FeedKind::HouseJournal;

/// "The House convened ..." in its several forms.
pub const CONVENE_ACT: &str = "H20100";
/// Adjournments and recesses share one act-id; the description tells them apart.
pub const ADJOURN_ACT: &str = "H61000";
pub const DAY_FINISHED: &str = "legislative_day_finished";

/// Parse a House floor-proceedings document.
///
/// # Errors
/// Returns [`ParseError`] for invalid XML, a missing `<floor_actions>`
/// element, or a floor action without a usable time.
pub fn parse(raw: &[u8], zone: Tz) -> Result<Vec<Event>, ParseError> {
    let text = utf8(raw, FEED)?;
    let doc = Document::parse(text).map_err(|e| ParseError::new(FEED, format!("XML: {e}"), raw))?;
    let root = doc.root_element();

    let published = first(root, "pubDate")
        .and_then(|n| n.text())
        .and_then(|t| parse_pub_date(t, zone));

    let actions = first(root, "floor_actions")
        .ok_or_else(|| ParseError::new(FEED, "missing <floor_actions>", raw))?;

    let mut events: Vec<Event> = Vec::new();
    for node in actions.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "floor_action" => events.extend(floor_action(node, zone, raw)?),
            DAY_FINISHED => {
                let latest = events.iter().map(|e| e.timestamp).max();
                events.push(day_finished(node, zone, published, latest, raw)?);
            }
            other => tracing::debug!(tag = other, "ignoring non-action element"),
        }
    }
    Ok(events)
}

/// Map an act-id and its description to event kinds.
///
/// A convening that starts a new legislative day yields a day boundary
/// followed by the convening itself.
#[must_use]
pub fn classify(act_id: &str, description: &str) -> &'static [EventKind] {
    let lower = description.to_ascii_lowercase();
    match act_id {
        CONVENE_ACT if lower.contains("returning from a recess") => &[EventKind::Recess],
        CONVENE_ACT if lower.contains("new legislative day") => {
            &[EventKind::NewDay, EventKind::Convene]
        }
        CONVENE_ACT => &[EventKind::Convene],
        ADJOURN_ACT if lower.contains("recess") => &[EventKind::Recess],
        ADJOURN_ACT if lower.contains("adjourn") => &[EventKind::Adjourn],
        _ => &[EventKind::Other],
    }
}

fn floor_action(node: Node<'_, '_>, zone: Tz, raw: &[u8]) -> Result<Vec<Event>, ParseError> {
    let act_id = node.attribute("act-id").unwrap_or_default().trim();
    let stamp = first(node, "action_time")
        .and_then(|n| n.attribute("for-search"))
        .ok_or_else(|| ParseError::new(FEED, format!("floor action {act_id} has no action_time"), raw))?;
    let timestamp = parse_local(stamp, &["%Y%m%dT%H:%M:%S", "%Y%m%dT%H:%M"], zone)
        .ok_or_else(|| ParseError::new(FEED, format!("unusable action time '{stamp}'"), raw))?;

    let description = first(node, "action_description")
        .map(|n| normalize_whitespace(&text_of(n)))
        .unwrap_or_default();
    let unique_id = node.attribute("unique-id");

    let kinds = classify(act_id, &description);
    tracing::debug!(act_id, ?kinds, %timestamp, "classified floor action");

    Ok(kinds
        .iter()
        .map(|&kind| {
            let event = Event::new(act_id, kind, timestamp).with_description(description.clone());
            match unique_id {
                Some(id) => event.with_id(id),
                None => event,
            }
        })
        .collect())
}

fn day_finished(
    node: Node<'_, '_>,
    zone: Tz,
    published: Option<DateTime<FixedOffset>>,
    latest_action: Option<DateTime<FixedOffset>>,
    raw: &[u8],
) -> Result<Event, ParseError> {
    let timestamp = published
        .into_iter()
        .chain(latest_action)
        .max()
        .ok_or_else(|| ParseError::new(FEED, "day finished before any floor action", raw))?;

    let event = Event::new(DAY_FINISHED, EventKind::NewDay, timestamp);
    let Some(next) = node.attribute("next-legislative-day-convenes") else {
        return Ok(event);
    };
    let next = parse_local(next, &["%Y%m%dT%H:%M", "%Y%m%dT%H:%M:%S"], zone)
        .ok_or_else(|| ParseError::new(FEED, format!("unusable next convening '{next}'"), raw))?;
    Ok(event.with_next_convene(next))
}

/// `Wed, 02 Jul 2025 14:35:00 EDT`; the zone abbreviation is dropped in
/// favour of the configured chamber zone.
fn parse_pub_date(text: &str, zone: Tz) -> Option<DateTime<FixedOffset>> {
    let trimmed = text.trim();
    let body = match trimmed.rsplit_once(' ') {
        Some((head, tail)) if tail.chars().all(|c| c.is_ascii_alphabetic()) => head,
        _ => trimmed,
    };
    parse_local(body, &["%a, %d %b %Y %H:%M:%S"], zone)
}

fn parse_local(text: &str, formats: &[&str], zone: Tz) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .and_then(|naive| localize(zone, naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    const JOURNAL: &str = include_str!("../../tests/fixtures/house_20250702.xml");
    const NY: Tz = chrono_tz::America::New_York;

    #[test]
    fn parses_floor_actions_in_document_order() {
        let events = parse(JOURNAL.as_bytes(), NY).unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::NewDay,
                EventKind::Convene,
                EventKind::Other,
                EventKind::Recess,
                EventKind::Recess,
                EventKind::Adjourn,
                EventKind::NewDay,
            ]
        );
        assert_eq!(events[1].code, CONVENE_ACT);
        assert_eq!(events[1].id.as_deref(), Some("20250702-1"));
    }

    #[test]
    fn anchors_times_in_chamber_zone() {
        let events = parse(JOURNAL.as_bytes(), NY).unwrap();
        let adjourn = events.iter().find(|e| e.kind == EventKind::Adjourn).unwrap();
        let expected = NY.with_ymd_and_hms(2025, 7, 2, 14, 33, 17).unwrap();
        assert_eq!(adjourn.timestamp, expected.fixed_offset());
        assert_eq!(adjourn.timestamp.offset().local_minus_utc(), -4 * 3600);
    }

    #[test]
    fn day_finished_carries_next_convening() {
        let events = parse(JOURNAL.as_bytes(), NY).unwrap();
        let finished = events.last().unwrap();
        assert_eq!(finished.code, DAY_FINISHED);
        let next = finished.next_convene.unwrap();
        assert_eq!(next, NY.with_ymd_and_hms(2025, 7, 3, 10, 0, 0).unwrap().fixed_offset());
        // pubDate 14:35 is later than the last floor action.
        assert_eq!((finished.timestamp.hour(), finished.timestamp.minute()), (14, 35));
    }

    #[test]
    fn classification_table() {
        let cases = [
            (CONVENE_ACT, "The House convened, starting a new legislative day.", &[EventKind::NewDay, EventKind::Convene][..]),
            (CONVENE_ACT, "The House convened, returning from a recess continuing the legislative day of July 2.", &[EventKind::Recess][..]),
            (CONVENE_ACT, "The House convened.", &[EventKind::Convene][..]),
            (ADJOURN_ACT, "The House adjourned.", &[EventKind::Adjourn][..]),
            (ADJOURN_ACT, "The Speaker announced that the House do now adjourn pursuant to clause 13 of Rule I.", &[EventKind::Adjourn][..]),
            (ADJOURN_ACT, "The Speaker announced that the House do now recess. The next meeting is subject to the call of the Chair.", &[EventKind::Recess][..]),
            (ADJOURN_ACT, "Something unexpected.", &[EventKind::Other][..]),
            ("H8D000", "MORNING-HOUR DEBATE", &[EventKind::Other][..]),
            ("", "", &[EventKind::Other][..]),
        ];
        for (act, desc, expected) in cases {
            assert_eq!(classify(act, desc), expected, "{act}: {desc}");
        }
    }

    #[test]
    fn missing_floor_actions_is_a_parse_error() {
        let err = parse(b"<legislative_activity><pubDate/></legislative_activity>", NY).unwrap_err();
        assert_eq!(err.feed, FeedKind::HouseJournal);
        assert!(err.reason.contains("floor_actions"));
        assert!(err.excerpt.starts_with("<legislative_activity>"));
    }

    #[test]
    fn broken_xml_is_a_parse_error() {
        let err = parse(b"<legislative_activity><floor_actions>", NY).unwrap_err();
        assert!(err.reason.starts_with("XML"));
    }

    #[test]
    fn action_without_time_is_a_parse_error() {
        let xml = r#"<legislative_activity><floor_actions>
            <floor_action act-id="H61000" unique-id="x"><action_description>The House adjourned.</action_description></floor_action>
        </floor_actions></legislative_activity>"#;
        let err = parse(xml.as_bytes(), NY).unwrap_err();
        assert!(err.reason.contains("action_time"));
    }

    #[test]
    fn empty_journal_has_no_events() {
        let xml = "<legislative_activity><floor_actions/></legislative_activity>";
        assert!(parse(xml.as_bytes(), NY).unwrap().is_empty());
    }

    #[test]
    fn pub_date_drops_zone_abbreviation() {
        let dt = parse_pub_date("Wed, 02 Jul 2025 14:35:00 EDT", NY).unwrap();
        assert_eq!(dt, NY.with_ymd_and_hms(2025, 7, 2, 14, 35, 0).unwrap().fixed_offset());
        assert!(parse_pub_date("yesterday-ish", NY).is_none());
    }
}

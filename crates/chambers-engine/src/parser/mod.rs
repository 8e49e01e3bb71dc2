//! Feed parsers: raw upstream payloads to ordered [`Event`] sequences.
//!
//! Parsing is pure. A document that cannot be read yields a [`ParseError`]
//! and the caller keeps whatever state it already had.
//!
//! - [`house`] - House clerk floor proceedings (XML)
//! - [`senate`] - Senate floor activity journal (XML)
//! - [`schedule`] - Senate floor schedule snapshot (JSON)

pub mod house;
pub mod schedule;
pub mod senate;

use std::sync::LazyLock;

use chrono_tz::Tz;
use regex::Regex;

use crate::error::ParseError;
use crate::event::{Event, FeedKind};

/// Parse one upstream document.
///
/// `zone` anchors the naive local times the feeds publish.
///
/// # Errors
/// Returns [`ParseError`] when the document is not well-formed or lacks the
/// elements/keys the feed kind requires.
pub fn parse(raw: &[u8], feed: FeedKind, zone: Tz) -> Result<Vec<Event>, ParseError> {
    match feed {
        FeedKind::HouseJournal => house::parse(raw, zone),
        FeedKind::SenateJournal => senate::parse(raw, zone),
        FeedKind::FloorSchedule => schedule::parse(raw, zone).map(|event| event.into_iter().collect()),
    }
}

pub(crate) fn utf8(raw: &[u8], feed: FeedKind) -> Result<&str, ParseError> {
    std::str::from_utf8(raw).map_err(|e| ParseError::new(feed, format!("not UTF-8: {e}"), raw))
}

pub(crate) fn first<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    tag: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.descendants().find(|n| n.has_tag_name(tag))
}

/// Concatenated text of an element and everything below it.
pub(crate) fn text_of(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(roxmltree::Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

/// Collapse runs of whitespace (including newlines) into single spaces.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[allow(clippy::expect_used)]
static MERIDIEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d)\s*([ap])\s*\.?\s*m(?:\.|\b)").expect("meridiem pattern is valid")
});

/// Rewrite AM/PM indicators to a canonical `am`/`pm` separated from the time
/// by one space: `6:35p. m.` and `6:35 P.M.` both become `6:35 pm`.
#[must_use]
pub fn normalize_meridiem(text: &str) -> String {
    let collapsed = normalize_whitespace(text);
    MERIDIEM
        .replace_all(&collapsed, |caps: &regex::Captures<'_>| {
            format!("{} {}m", &caps[1], caps[2].to_ascii_lowercase())
        })
        .into_owned()
}

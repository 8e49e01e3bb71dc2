//! End-to-end update cycles against a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use chambers_engine::config::SENATE_SCHEDULE_URL;
use chambers_engine::transport::mock::MockFeedTransport;
use chambers_engine::{
    Chamber, ChamberConfig, ChamberId, ConfigurationError, FetchError, Lifecycle, PersistedBlob, Provenance,
};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

const NY: Tz = chrono_tz::America::New_York;

const HOUSE_FULL_DAY: &str = include_str!("fixtures/house_20250702.xml");
const HOUSE_ADJOURNED_ONLY: &str = include_str!("fixtures/house_20250702_adjourned_only.xml");
const HOUSE_IN_SESSION: &str = include_str!("fixtures/house_20250703_in_session.xml");
const SENATE_JOURNAL: &str = include_str!("fixtures/senate_07_01_2025.xml");
const SENATE_SCHEDULE: &str = include_str!("fixtures/floor_schedule.json");

const HOUSE_0702: &str = "https://clerk.house.gov/floor/20250702.xml";
const HOUSE_0703: &str = "https://clerk.house.gov/floor/20250703.xml";
const SENATE_0701: &str = "https://www.senate.gov/legislative/LIS/floor_activity/07_01_2025_Senate_Floor.xml";

fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, d, h, m, 0).unwrap()
}

fn local(d: u32, h: u32, m: u32, s: u32) -> DateTime<Tz> {
    NY.with_ymd_and_hms(2025, 7, d, h, m, s).unwrap()
}

fn chamber(config: ChamberConfig) -> (Chamber, Arc<MockFeedTransport>) {
    let transport = Arc::new(MockFeedTransport::new());
    let chamber = Chamber::new(config, transport.clone()).unwrap();
    (chamber, transport)
}

fn senate_with_journal() -> (Chamber, Arc<MockFeedTransport>) {
    let (senate, transport) = chamber(ChamberConfig::senate());
    transport.set_body(SENATE_0701, SENATE_JOURNAL);
    (senate, transport)
}

#[tokio::test]
async fn house_day_with_adjournment() {
    let (mut house, transport) = chamber(ChamberConfig::house());
    transport.set_body(HOUSE_0702, HOUSE_ADJOURNED_ONLY);

    assert!(house.update_at(utc(2, 19, 0), false).await);
    assert_eq!(transport.calls(), vec![HOUSE_0702]);
    assert_eq!(house.lifecycle(), Lifecycle::Loaded);
    assert!(!house.convened());
    assert_eq!(
        house.adjourned_at(Some("America/New_York")).unwrap(),
        Some(local(2, 14, 33, 17))
    );
    assert_eq!(house.convened_at(None).unwrap(), None);
    assert_eq!(house.decided_by(), Some(Provenance::Journal));
}

#[tokio::test]
async fn second_update_within_interval_does_no_io() {
    let (mut house, transport) = chamber(ChamberConfig::house());
    transport.set_body(HOUSE_0702, HOUSE_ADJOURNED_ONLY);

    assert!(house.update_at(utc(2, 19, 0), false).await);
    assert!(!house.update_at(utc(2, 19, 1), false).await);
    assert_eq!(transport.calls().len(), 1);
    assert_eq!(house.next_update(), utc(2, 19, 10));
}

#[tokio::test]
async fn forced_redelivery_changes_nothing() {
    let (mut house, transport) = chamber(ChamberConfig::house());
    transport.set_body(HOUSE_0702, HOUSE_FULL_DAY);

    assert!(house.update_at(utc(2, 19, 0), true).await);
    let before = house.state().clone();
    assert!(!house.update_at(utc(2, 19, 1), true).await);
    assert_eq!(house.state(), &before);
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn house_falls_back_then_catches_the_convening() {
    let (mut house, transport) = chamber(ChamberConfig::house());
    transport.set_body(HOUSE_0702, HOUSE_FULL_DAY);

    // 08:00 local on July 3rd: today's journal does not exist yet.
    assert!(house.update_at(utc(3, 12, 0), false).await);
    assert_eq!(transport.calls(), vec![HOUSE_0703, HOUSE_0702]);
    assert!(!house.convened());
    assert_eq!(house.convenes_at(None).unwrap(), Some(local(3, 10, 0, 0)));
    assert_eq!(house.next_update(), utc(3, 12, 10));

    transport.set_body(HOUSE_0703, HOUSE_IN_SESSION);
    assert!(house.update_at(utc(3, 14, 5), false).await);
    assert!(house.convened());
    assert_eq!(house.convened_at(None).unwrap(), Some(local(3, 10, 0, 2)));
    assert_eq!(house.convenes_at(None).unwrap(), None);
    assert_eq!(house.adjourned_at(None).unwrap(), None);
}

#[tokio::test]
async fn upstream_error_ends_the_attempt_but_is_not_sticky() {
    let (mut house, transport) = chamber(ChamberConfig::house());
    transport.set_result(
        HOUSE_0703,
        Err(FetchError::Status {
            status: 503,
            url: HOUSE_0703.into(),
        }),
    );
    transport.set_body(HOUSE_0702, HOUSE_FULL_DAY);

    assert!(!house.update_at(utc(3, 12, 0), false).await);
    assert_eq!(transport.calls(), vec![HOUSE_0703]);
    assert_eq!(house.lifecycle(), Lifecycle::Uninitialized);
    assert!(house.source_status("floor").unwrap().last_fetch_at.is_some());

    transport.set_body(HOUSE_0703, HOUSE_IN_SESSION);
    assert!(house.update_at(utc(3, 12, 1), true).await);
    assert_eq!(house.lifecycle(), Lifecycle::Loaded);
    assert!(house.convened());
}

#[tokio::test]
async fn senate_schedule_parse_error_still_applies_journal() {
    let (mut senate, transport) = senate_with_journal();
    transport.set_body(SENATE_SCHEDULE_URL, "{\"floorProceedings\": [");

    assert!(senate.update_at(utc(2, 13, 0), false).await);
    assert!(!senate.convened());
    assert_eq!(senate.adjourned_at(None).unwrap(), Some(local(1, 18, 35, 0)));
    assert_eq!(senate.convenes_at(None).unwrap(), Some(local(2, 10, 0, 0)));
    assert_eq!(senate.decided_by(), Some(Provenance::Journal));

    let schedule = senate.source_status("floor-schedule").unwrap();
    assert!(schedule.last_fetch_at.is_some());
    assert!(schedule.last_success_at.is_none());
}

#[tokio::test]
async fn later_failures_keep_house_state() {
    let (mut house, transport) = chamber(ChamberConfig::house());
    transport.set_body(HOUSE_0702, HOUSE_ADJOURNED_ONLY);
    assert!(house.update_at(utc(2, 19, 0), false).await);
    let state = house.state().clone();
    let journal = house.source_status("floor").unwrap().clone();
    assert!(journal.last_event.is_some());

    transport.set_result(
        HOUSE_0702,
        Err(FetchError::Status {
            status: 503,
            url: HOUSE_0702.into(),
        }),
    );
    assert!(!house.update_at(utc(2, 19, 11), false).await);

    transport.set_body(HOUSE_0702, "<legislative_activity><floor_actions>");
    assert!(!house.update_at(utc(2, 19, 22), false).await);

    assert_eq!(transport.calls().len(), 3);
    assert_eq!(house.state(), &state);
    assert_eq!(house.lifecycle(), Lifecycle::Loaded);
    assert_eq!(house.decided_by(), Some(Provenance::Journal));
    let after = house.source_status("floor").unwrap();
    assert_eq!(after.last_event, journal.last_event);
    assert_eq!(after.derived, journal.derived);
    assert_eq!(after.last_success_at, journal.last_success_at);
    assert_eq!(after.last_fetch_at, Some(utc(2, 19, 22)));
}

#[tokio::test]
async fn later_schedule_failures_keep_the_last_snapshot() {
    let (mut senate, transport) = senate_with_journal();
    transport.set_body(SENATE_SCHEDULE_URL, SENATE_SCHEDULE);
    assert!(senate.update_at(utc(2, 13, 0), false).await);
    assert_eq!(senate.decided_by(), Some(Provenance::Snapshot));
    let state = senate.state().clone();
    let snapshot = senate.source_status("floor-schedule").unwrap().clone();
    assert!(snapshot.derived.is_some());
    transport.clear_calls();

    // Only the schedule is due; the journal waits out its 30 minute floor.
    transport.set_result(
        SENATE_SCHEDULE_URL,
        Err(FetchError::Status {
            status: 500,
            url: SENATE_SCHEDULE_URL.into(),
        }),
    );
    assert!(!senate.update_at(utc(2, 13, 11), false).await);

    transport.set_body(SENATE_SCHEDULE_URL, "{\"floorProceedings\": [");
    assert!(!senate.update_at(utc(2, 13, 22), false).await);

    assert_eq!(transport.calls(), vec![SENATE_SCHEDULE_URL, SENATE_SCHEDULE_URL]);
    assert_eq!(senate.state(), &state);
    assert_eq!(senate.decided_by(), Some(Provenance::Snapshot));
    let after = senate.source_status("floor-schedule").unwrap();
    assert_eq!(after.derived, snapshot.derived);
    assert_eq!(after.as_of, snapshot.as_of);
    assert_eq!(after.last_success_at, snapshot.last_success_at);
}

#[tokio::test]
async fn newer_snapshot_wins_without_guessing_convened_at() {
    let (mut senate, transport) = senate_with_journal();
    transport.set_body(SENATE_SCHEDULE_URL, SENATE_SCHEDULE);

    // 10:30 local: the scheduled 10:00 convening has passed.
    assert!(senate.update_at(utc(2, 14, 30), false).await);
    assert!(senate.convened());
    assert_eq!(senate.convened_at(None).unwrap(), None);
    assert_eq!(senate.adjourned_at(None).unwrap(), None);
    assert_eq!(senate.decided_by(), Some(Provenance::Snapshot));
}

#[tokio::test]
async fn agreeing_snapshot_keeps_journal_adjournment() {
    let (mut senate, transport) = senate_with_journal();
    transport.set_body(SENATE_SCHEDULE_URL, SENATE_SCHEDULE);

    assert!(senate.update_at(utc(2, 13, 0), false).await);
    assert!(!senate.convened());
    assert_eq!(senate.adjourned_at(None).unwrap(), Some(local(1, 18, 35, 0)));
    assert_eq!(senate.convenes_at(None).unwrap(), Some(local(2, 10, 0, 0)));
    assert_eq!(senate.decided_by(), Some(Provenance::Snapshot));
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out_in_isolation() {
    let transport = Arc::new(MockFeedTransport::new());
    transport.set_body(SENATE_0701, SENATE_JOURNAL);
    transport.set_body(SENATE_SCHEDULE_URL, SENATE_SCHEDULE);
    transport.set_delay(SENATE_SCHEDULE_URL, Duration::from_secs(300));
    let config = ChamberConfig::senate().with_fetch_timeout(Duration::from_secs(2));
    let mut senate = Chamber::new(config, transport.clone()).unwrap();

    assert!(senate.update_at(utc(2, 14, 30), false).await);
    assert!(!senate.convened());
    assert_eq!(senate.decided_by(), Some(Provenance::Journal));
    assert!(senate
        .source_status("floor-schedule")
        .unwrap()
        .derived
        .is_none());
}

#[tokio::test]
async fn dump_and_restore_round_trip() {
    let (mut senate, transport) = senate_with_journal();
    transport.set_body(SENATE_SCHEDULE_URL, SENATE_SCHEDULE);
    assert!(senate.update_at(utc(2, 14, 30), false).await);

    let raw = senate.dump().to_bytes().unwrap();
    let blob = PersistedBlob::from_bytes(&raw).unwrap();

    let (mut restored, fresh_transport) = chamber(ChamberConfig::senate());
    restored.restore(&blob).unwrap();
    assert_eq!(restored.lifecycle(), Lifecycle::Loaded);
    assert_eq!(restored.state(), senate.state());
    assert_eq!(restored.decided_by(), senate.decided_by());
    for name in ["floor-activity", "floor-schedule"] {
        assert_eq!(restored.source_status(name), senate.source_status(name));
    }

    // Bookkeeping survived: nothing is due a minute later.
    assert!(!restored.update_at(utc(2, 14, 31), false).await);
    assert!(fresh_transport.calls().is_empty());
}

#[tokio::test]
async fn restore_fails_closed() {
    let (mut house, transport) = chamber(ChamberConfig::house());
    transport.set_body(HOUSE_0702, HOUSE_ADJOURNED_ONLY);
    assert!(house.update_at(utc(2, 19, 0), false).await);
    let mut blob = house.dump();

    let (mut target, _) = chamber(ChamberConfig::house());
    blob.version = 2;
    assert_eq!(
        target.restore(&blob).unwrap_err(),
        ConfigurationError::UnsupportedBlobVersion { found: 2, expected: 1 }
    );
    assert_eq!(target.lifecycle(), Lifecycle::Uninitialized);
    assert!(target.state().is_empty());

    blob.version = 1;
    let (mut senate, _) = chamber(ChamberConfig::senate());
    assert!(matches!(
        senate.restore(&blob),
        Err(ConfigurationError::ChamberMismatch { .. })
    ));
    assert_eq!(senate.id(), ChamberId::Senate);
}

#[tokio::test]
async fn reads_convert_zones() {
    let (mut house, transport) = chamber(ChamberConfig::house().with_display_timezone("America/Chicago"));
    transport.set_body(HOUSE_0702, HOUSE_ADJOURNED_ONLY);
    assert!(house.update_at(utc(2, 19, 0), false).await);

    let central = house.adjourned_at(None).unwrap().unwrap();
    assert_eq!(central.timezone(), chrono_tz::America::Chicago);
    assert_eq!(central.naive_local().to_string(), "2025-07-02 13:33:17");

    let utc_read = house.adjourned_at(Some("UTC")).unwrap().unwrap();
    assert_eq!(utc_read.naive_local().to_string(), "2025-07-02 18:33:17");

    assert_eq!(
        house.convened_at(Some("Mars/Base")).unwrap_err(),
        ConfigurationError::InvalidTimezone("Mars/Base".into())
    );
}

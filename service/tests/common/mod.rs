//! Common test utilities for integration tests.
//!
//! - [`http_mock::MockHttpServer`] - `wiremock` wrapper serving upstream feeds
//! - [`fixtures`] - upstream documents shared with the engine's tests

pub mod http_mock;

#[allow(dead_code)]
pub mod fixtures {
    pub const HOUSE_ADJOURNED_ONLY: &str =
        include_str!("../../../crates/chambers-engine/tests/fixtures/house_20250702_adjourned_only.xml");
    pub const SENATE_JOURNAL: &str =
        include_str!("../../../crates/chambers-engine/tests/fixtures/senate_07_01_2025.xml");
    pub const FLOOR_SCHEDULE: &str = include_str!("../../../crates/chambers-engine/tests/fixtures/floor_schedule.json");
}

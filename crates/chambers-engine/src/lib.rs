//! Floor status tracking for the House and the Senate.
//!
//! Each [`Chamber`] polls its upstream feeds through an injected
//! [`FeedTransport`], parses them into [`Event`]s, folds those into a
//! [`ChamberState`] and, for the Senate, reconciles the lagging journal with
//! the same-day floor schedule.
//!
//! ```ignore
//! let transport: Arc<dyn FeedTransport> = Arc::new(my_http_transport);
//! let mut house = Chamber::new(ChamberConfig::house(), transport)?;
//! if house.update(false).await {
//!     println!("convened: {}", house.convened());
//! }
//! ```

#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

pub mod chamber;
pub mod config;
pub mod error;
pub mod event;
pub mod parser;
pub mod persist;
pub mod polling;
pub mod reconcile;
pub mod reducer;
pub mod source;
pub mod state;
pub mod transport;
pub mod tz;

pub use chamber::{Chamber, Lifecycle};
pub use config::ChamberConfig;
pub use error::{ConfigurationError, FetchError, ParseError, ReconciliationConflict, StoreError};
pub use event::{Event, EventKind, EventMarker, FeedKind};
pub use persist::{FileSnapshotStore, PersistedBlob, BLOB_VERSION};
pub use polling::PollingPolicy;
pub use source::{ChamberId, Endpoint, SourceDescriptor, SourceStatus};
pub use state::{ChamberState, Provenance};
pub use transport::FeedTransport;

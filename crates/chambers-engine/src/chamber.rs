//! A chamber: its sources, current state, and update cycle.
//!
//! The House and the Senate differ only in their configured sources. A
//! chamber with a floor-schedule source reconciles it against its journal;
//! one without just follows the journal.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::config::ChamberConfig;
use crate::error::{ConfigurationError, FetchError};
use crate::event::FeedKind;
use crate::parser;
use crate::persist::{PersistedBlob, BLOB_VERSION};
use crate::polling::PollingPolicy;
use crate::reconcile::{reconcile, snapshot_state, SourceView};
use crate::reducer::{advance, Advance};
use crate::source::{ChamberId, SourceDescriptor, SourceStatus};
use crate::state::{ChamberState, Provenance};
use crate::transport::FeedTransport;
use crate::tz::parse_zone;

/// Whether a chamber has ever held real data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    /// Restored from a blob or updated successfully at least once.
    Loaded,
}

#[derive(Debug, Clone)]
struct Source {
    descriptor: SourceDescriptor,
    status: SourceStatus,
}

/// Live status of one chamber.
///
/// `update` takes `&mut self`, so a chamber is never updated twice at once
/// and never read mid-update. Separate chambers are independent.
pub struct Chamber {
    id: ChamberId,
    zone: Tz,
    display_zone: Tz,
    polling: PollingPolicy,
    fetch_timeout: Duration,
    transport: Arc<dyn FeedTransport>,
    sources: Vec<Source>,
    state: ChamberState,
    decided_by: Option<Provenance>,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chamber")
            .field("id", &self.id)
            .field("zone", &self.zone)
            .field("state", &self.state)
            .field("decided_by", &self.decided_by)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

impl Chamber {
    /// Build an uninitialized chamber.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] for an unknown zone, an invalid
    /// endpoint, duplicate source names, or a source set that does not fit
    /// the chamber (the House needs one House journal; the Senate one Senate
    /// journal and one floor schedule).
    pub fn new(config: ChamberConfig, transport: Arc<dyn FeedTransport>) -> Result<Self, ConfigurationError> {
        let zone = parse_zone(&config.timezone)?;
        let display_zone = config
            .display_timezone
            .as_deref()
            .map(parse_zone)
            .transpose()?
            .unwrap_or(zone);
        validate_sources(config.id, &config.sources)?;

        Ok(Self {
            id: config.id,
            zone,
            display_zone,
            polling: config.polling,
            fetch_timeout: config.fetch_timeout,
            transport,
            sources: config
                .sources
                .into_iter()
                .map(|descriptor| Source {
                    descriptor,
                    status: SourceStatus::default(),
                })
                .collect(),
            state: ChamberState::default(),
            decided_by: None,
            lifecycle: Lifecycle::Uninitialized,
        })
    }

    /// Fetch whatever is due and fold it into the state.
    ///
    /// Returns whether any field of the state changed. Fetch and parse
    /// failures are logged and cost only this cycle's data from that source.
    pub async fn update(&mut self, force: bool) -> bool {
        self.update_at(Utc::now(), force).await
    }

    /// [`Self::update`] with an explicit clock.
    pub async fn update_at(&mut self, now: DateTime<Utc>, force: bool) -> bool {
        let due: Vec<usize> = (0..self.sources.len())
            .filter(|&i| force || self.is_due(i, now))
            .collect();
        if due.is_empty() {
            tracing::debug!(chamber = %self.id, "no source due");
            return false;
        }

        let today = now.with_timezone(&self.zone).date_naive();
        for index in due {
            self.poll_source(index, now, today).await;
        }
        self.compose()
    }

    fn is_due(&self, index: usize, now: DateTime<Utc>) -> bool {
        self.next_eligible(&self.sources[index]) <= now
    }

    fn next_eligible(&self, source: &Source) -> DateTime<Utc> {
        source.status.last_fetch_at.map_or(DateTime::<Utc>::MIN_UTC, |last| {
            self.polling
                .next_eligible(last, &self.state, source.descriptor.min_interval)
        })
    }

    async fn poll_source(&mut self, index: usize, now: DateTime<Utc>, today: NaiveDate) {
        let descriptor = self.sources[index].descriptor.clone();
        self.sources[index].status.last_fetch_at = Some(now);

        let Some(raw) = self.fetch_latest(&descriptor, today).await else {
            return;
        };

        let zone = self.zone;
        let status = &mut self.sources[index].status;
        if descriptor.kind == FeedKind::FloorSchedule {
            match parser::schedule::parse(&raw, zone) {
                Ok(event) => {
                    status.derived = snapshot_state(event.as_ref(), now);
                    status.as_of = Some(now);
                    status.last_success_at = Some(now);
                }
                Err(error) => {
                    tracing::warn!(chamber = %self.id, source = %descriptor.name, %error, "keeping previous snapshot");
                }
            }
            return;
        }

        let events = match parser::parse(&raw, descriptor.kind, zone) {
            Ok(events) => events,
            Err(error) => {
                tracing::warn!(chamber = %self.id, source = %descriptor.name, %error, "skipping unparseable journal");
                return;
            }
        };
        status.last_success_at = Some(now);
        let prior = status.derived.clone().unwrap_or_default();
        match advance(&prior, &events, status.last_event.as_ref()) {
            Advance::Applied { state, marker } => {
                tracing::debug!(
                    chamber = %self.id,
                    source = %descriptor.name,
                    last = %marker.code,
                    at = %marker.timestamp,
                    "processed journal"
                );
                status.as_of = Some(marker.timestamp);
                status.last_event = Some(marker);
                status.derived = Some(state);
            }
            Advance::Unchanged => {
                tracing::debug!(chamber = %self.id, source = %descriptor.name, "journal unchanged");
            }
            Advance::Stale => {
                tracing::debug!(chamber = %self.id, source = %descriptor.name, "ignoring journal older than last processed event");
            }
        }
    }

    /// Fetch the newest available document for `descriptor`.
    ///
    /// Dated endpoints step back a day on [`FetchError::NotFound`]; any other
    /// failure ends the attempt.
    async fn fetch_latest(&self, descriptor: &SourceDescriptor, today: NaiveDate) -> Option<Vec<u8>> {
        let candidates = match descriptor.endpoint.candidates(today) {
            Ok(candidates) => candidates,
            Err(error) => {
                tracing::warn!(chamber = %self.id, source = %descriptor.name, %error, "cannot build URLs");
                return None;
            }
        };

        for url in &candidates {
            let outcome = tokio::time::timeout(self.fetch_timeout, self.transport.fetch(url))
                .await
                .unwrap_or(Err(FetchError::Timeout(self.fetch_timeout)));
            match outcome {
                Ok(raw) => {
                    tracing::debug!(chamber = %self.id, source = %descriptor.name, url = %url, bytes = raw.len(), "fetched");
                    return Some(raw);
                }
                Err(FetchError::NotFound(_)) => {
                    tracing::debug!(chamber = %self.id, source = %descriptor.name, url = %url, "not published");
                }
                Err(error) => {
                    tracing::warn!(chamber = %self.id, source = %descriptor.name, url = %url, %error, "fetch failed");
                    return None;
                }
            }
        }
        tracing::warn!(
            chamber = %self.id,
            source = %descriptor.name,
            tried = candidates.len(),
            "no document found"
        );
        None
    }

    /// Merge per-source states and swap the chamber state if it differs.
    fn compose(&mut self) -> bool {
        let view = |kind: fn(FeedKind) -> bool| {
            self.sources
                .iter()
                .find(|s| kind(s.descriptor.kind))
                .and_then(|s| {
                    s.status.derived.as_ref().map(|state| SourceView {
                        state,
                        as_of: s.status.as_of,
                    })
                })
        };
        let journal = view(FeedKind::is_journal);
        let snapshot = view(|kind| kind == FeedKind::FloorSchedule);

        let Some(merged) = reconcile(journal, snapshot) else {
            return false;
        };

        if self.lifecycle == Lifecycle::Uninitialized {
            tracing::info!(chamber = %self.id, "loaded");
            self.lifecycle = Lifecycle::Loaded;
        }
        self.decided_by = Some(merged.decided_by);
        if merged.state == self.state {
            return false;
        }
        tracing::info!(
            chamber = %self.id,
            convened = merged.state.convened,
            decided_by = ?merged.decided_by,
            "state changed"
        );
        self.state = merged.state;
        true
    }

    #[must_use]
    pub const fn id(&self) -> ChamberId {
        self.id
    }

    #[must_use]
    pub const fn convened(&self) -> bool {
        self.state.convened
    }

    /// When the current sitting began, in `tz` or the display zone.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidTimezone`] for an unknown `tz`,
    /// whether or not a value is set.
    pub fn convened_at(&self, tz: Option<&str>) -> Result<Option<DateTime<Tz>>, ConfigurationError> {
        self.read(self.state.convened_at, tz)
    }

    /// Next scheduled convening, if adjourned and known.
    ///
    /// # Errors
    /// See [`Self::convened_at`].
    pub fn convenes_at(&self, tz: Option<&str>) -> Result<Option<DateTime<Tz>>, ConfigurationError> {
        self.read(self.state.convenes_at, tz)
    }

    /// # Errors
    /// See [`Self::convened_at`].
    pub fn adjourned_at(&self, tz: Option<&str>) -> Result<Option<DateTime<Tz>>, ConfigurationError> {
        self.read(self.state.adjourned_at, tz)
    }

    fn read(&self, at: Option<DateTime<Utc>>, tz: Option<&str>) -> Result<Option<DateTime<Tz>>, ConfigurationError> {
        let zone = tz.map_or(Ok(self.display_zone), parse_zone)?;
        Ok(at.map(|at| at.with_timezone(&zone)))
    }

    #[must_use]
    pub const fn state(&self) -> &ChamberState {
        &self.state
    }

    /// Which source decided `convened` in the last merge.
    #[must_use]
    pub const fn decided_by(&self) -> Option<Provenance> {
        self.decided_by
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn source_status(&self, name: &str) -> Option<&SourceStatus> {
        self.sources
            .iter()
            .find(|s| s.descriptor.name == name)
            .map(|s| &s.status)
    }

    /// Earliest instant any source becomes due. A never-fetched source is
    /// due immediately, reported as the minimum instant.
    #[must_use]
    pub fn next_update(&self) -> DateTime<Utc> {
        self.sources
            .iter()
            .map(|s| self.next_eligible(s))
            .min()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Snapshot state and bookkeeping for persistence.
    #[must_use]
    pub fn dump(&self) -> PersistedBlob {
        PersistedBlob {
            version: BLOB_VERSION,
            chamber: self.id,
            state: self.state.clone(),
            decided_by: self.decided_by,
            sources: self
                .sources
                .iter()
                .map(|s| (s.descriptor.name.clone(), s.status.clone()))
                .collect(),
            written_at: Utc::now(),
        }
    }

    /// Replace state and bookkeeping with a persisted snapshot.
    ///
    /// Sources missing from the blob start fresh. Nothing changes on error.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UnsupportedBlobVersion`] or
    /// [`ConfigurationError::ChamberMismatch`].
    pub fn restore(&mut self, blob: &PersistedBlob) -> Result<(), ConfigurationError> {
        if blob.version != BLOB_VERSION {
            return Err(ConfigurationError::UnsupportedBlobVersion {
                found: blob.version,
                expected: BLOB_VERSION,
            });
        }
        if blob.chamber != self.id {
            return Err(ConfigurationError::ChamberMismatch {
                expected: self.id.to_string(),
                found: blob.chamber.to_string(),
            });
        }
        for name in blob.sources.keys() {
            if self.source_status(name).is_none() {
                tracing::debug!(chamber = %self.id, source = %name, "dropping bookkeeping for unknown source");
            }
        }

        for source in &mut self.sources {
            source.status = blob
                .sources
                .get(&source.descriptor.name)
                .cloned()
                .unwrap_or_default();
        }
        self.state = blob.state.clone();
        self.decided_by = blob.decided_by;
        self.lifecycle = Lifecycle::Loaded;
        tracing::info!(chamber = %self.id, written_at = %blob.written_at, "restored");
        Ok(())
    }
}

fn validate_sources(id: ChamberId, sources: &[SourceDescriptor]) -> Result<(), ConfigurationError> {
    for (i, source) in sources.iter().enumerate() {
        source.endpoint.validate()?;
        if sources[..i].iter().any(|s| s.name == source.name) {
            return Err(ConfigurationError::InvalidSources(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }
    }

    let count = |kind: FeedKind| sources.iter().filter(|s| s.kind == kind).count();
    let expected: &[(FeedKind, usize)] = match id {
        ChamberId::House => &[
            (FeedKind::HouseJournal, 1),
            (FeedKind::SenateJournal, 0),
            (FeedKind::FloorSchedule, 0),
        ],
        ChamberId::Senate => &[
            (FeedKind::HouseJournal, 0),
            (FeedKind::SenateJournal, 1),
            (FeedKind::FloorSchedule, 1),
        ],
    };
    for &(kind, want) in expected {
        let found = count(kind);
        if found != want {
            return Err(ConfigurationError::InvalidSources(format!(
                "{id} needs {want} {kind} source(s), found {found}"
            )));
        }
    }
    Ok(())
}

//! The watcher loop: update both chambers, report changes, keep the cache
//! file current.

use std::sync::Arc;
use std::time::Duration;

use chambers_engine::{Chamber, ChamberConfig, ChamberId, ConfigurationError, FeedTransport, FileSnapshotStore};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::Config;

struct Tracked {
    chamber: Chamber,
    store: Option<FileSnapshotStore>,
    last_persisted: Option<Instant>,
    saves: u64,
}

impl Tracked {
    fn new(
        config: ChamberConfig,
        transport: Arc<dyn FeedTransport>,
        cache: Option<&std::path::Path>,
    ) -> Result<Self, ConfigurationError> {
        let id = config.id;
        let mut chamber = Chamber::new(config, transport)?;
        let store = cache.map(|dir| FileSnapshotStore::new(dir.join(format!("{id}.json"))));

        if let Some(store) = &store {
            match store.load() {
                Ok(Some(blob)) => {
                    if let Err(error) = chamber.restore(&blob) {
                        tracing::warn!(chamber = %id, %error, "ignoring cached state, starting fresh");
                    }
                }
                Ok(None) => tracing::info!(chamber = %id, path = %store.path().display(), "no cached state"),
                Err(error) => tracing::warn!(chamber = %id, %error, "unreadable cache, starting fresh"),
            }
        }

        Ok(Self {
            chamber,
            store,
            last_persisted: None,
            saves: 0,
        })
    }

    async fn update(&mut self, force: bool) -> bool {
        self.chamber.update(force).await
    }

    fn persist(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.save(&self.chamber.dump()) {
            Ok(()) => {
                self.last_persisted = Some(Instant::now());
                self.saves += 1;
                tracing::debug!(chamber = %self.chamber.id(), saves = self.saves, "persisted state");
            }
            Err(error) => tracing::warn!(chamber = %self.chamber.id(), %error, "failed to persist state"),
        }
    }

    fn persist_due(&self, interval: Duration) -> bool {
        self.store.is_some() && self.last_persisted.is_none_or(|at| at.elapsed() >= interval)
    }
}

async fn update(tracked: Option<&mut Tracked>, force: bool) -> bool {
    match tracked {
        Some(tracked) => tracked.update(force).await,
        None => false,
    }
}

/// Drives the enabled chambers.
pub struct Watcher {
    house: Option<Tracked>,
    senate: Option<Tracked>,
    tick: Duration,
    persist_interval: Duration,
}

impl Watcher {
    /// Build the enabled chambers and restore their cached state.
    ///
    /// A missing, unreadable or incompatible cache file is logged and the
    /// chamber starts fresh.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if a chamber cannot be constructed.
    pub fn from_config(config: &Config, transport: &Arc<dyn FeedTransport>) -> Result<Self, ConfigurationError> {
        let cache = config.cache.enabled.then_some(config.cache.directory.as_path());
        let house = config
            .house
            .enabled
            .then(|| Tracked::new(config.house_chamber(), Arc::clone(transport), cache))
            .transpose()?;
        let senate = config
            .senate
            .enabled
            .then(|| Tracked::new(config.senate_chamber(), Arc::clone(transport), cache))
            .transpose()?;

        Ok(Self {
            house,
            senate,
            tick: config.tick(),
            persist_interval: config.persist_interval(),
        })
    }

    #[must_use]
    pub fn chamber(&self, id: ChamberId) -> Option<&Chamber> {
        match id {
            ChamberId::House => self.house.as_ref(),
            ChamberId::Senate => self.senate.as_ref(),
        }
        .map(|tracked| &tracked.chamber)
    }

    fn tracked_mut(&mut self) -> impl Iterator<Item = &mut Tracked> {
        self.house.iter_mut().chain(self.senate.iter_mut())
    }

    /// Update both chambers concurrently and report the ones whose state
    /// changed.
    async fn update_all(&mut self, force: bool) -> Vec<ChamberId> {
        let (house_changed, senate_changed) = tokio::join!(
            update(self.house.as_mut(), force),
            update(self.senate.as_mut(), force),
        );

        let updated = self
            .house
            .iter()
            .filter(|_| house_changed)
            .chain(self.senate.iter().filter(|_| senate_changed));
        updated
            .map(|tracked| {
                report(&tracked.chamber);
                tracked.chamber.id()
            })
            .collect()
    }

    /// Update both chambers concurrently; returns the chambers whose state
    /// changed.
    ///
    /// Each chamber is written at most once per cycle: when it changed, or
    /// once the persist interval has elapsed.
    pub async fn cycle(&mut self, force: bool) -> Vec<ChamberId> {
        let changed = self.update_all(force).await;
        let interval = self.persist_interval;
        for tracked in self.tracked_mut() {
            if changed.contains(&tracked.chamber.id()) || tracked.persist_due(interval) {
                tracked.persist();
            }
        }
        changed
    }

    /// A single forced update: report every chamber, then persist each once.
    pub async fn once(&mut self) -> Vec<ChamberId> {
        let changed = self.update_all(true).await;
        for id in [ChamberId::House, ChamberId::Senate] {
            if let Some(chamber) = self.chamber(id).filter(|_| !changed.contains(&id)) {
                report(chamber);
            }
        }
        self.persist_all();
        changed
    }

    /// Persist every chamber with a cache file.
    pub fn persist_all(&mut self) {
        for tracked in self.tracked_mut() {
            tracked.persist();
        }
    }

    /// Run until Ctrl-C, or for a single forced cycle when `once` is set.
    pub async fn run(mut self, once: bool) {
        if once {
            self.once().await;
            return;
        }

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cycle(false).await;
                }
                result = &mut shutdown => {
                    if let Err(error) = result {
                        tracing::warn!(%error, "failed to listen for shutdown signal");
                    }
                    tracing::info!("shutting down");
                    break;
                }
            }
        }
        self.persist_all();
    }
}

fn report(chamber: &Chamber) {
    tracing::info!(
        chamber = %chamber.id(),
        convened = chamber.convened(),
        convened_at = ?chamber.convened_at(None).ok().flatten().map(|at| at.to_rfc3339()),
        convenes_at = ?chamber.convenes_at(None).ok().flatten().map(|at| at.to_rfc3339()),
        adjourned_at = ?chamber.adjourned_at(None).ok().flatten().map(|at| at.to_rfc3339()),
        decided_by = ?chamber.decided_by(),
        next_update = %chamber.next_update(),
        "chamber status"
    );
}

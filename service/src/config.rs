use std::path::PathBuf;
use std::time::Duration;

use chambers_engine::config::{
    CAPITOL_TIMEZONE, DEFAULT_LOOKBACK_DAYS, HOUSE_FLOOR_URL, SENATE_FLOOR_URL, SENATE_SCHEDULE_URL,
};
use chambers_engine::tz::parse_zone;
use chambers_engine::{ChamberConfig, Endpoint, PollingPolicy};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Watcher configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. config.yaml file (if exists)
/// 3. Environment variables with `CHAMBERS_` prefix (always wins)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub house: HouseConfig,
    #[serde(default)]
    pub senate: SenateConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log filter directive (debug, info, `chambers_engine=debug`, ...).
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// How often the watcher asks each chamber whether anything is due.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    #[serde(default = "default_convened_secs")]
    pub convened_secs: u64,

    #[serde(default = "default_adjourned_secs")]
    pub adjourned_secs: u64,

    /// Start polling this long before a scheduled convening.
    #[serde(default = "default_pre_convene_lead_secs")]
    pub pre_convene_lead_secs: u64,

    /// Retry interval once a scheduled convening is close or past.
    #[serde(default = "default_overdue_secs")]
    pub overdue_secs: u64,

    /// Minimum interval between Senate journal fetches.
    #[serde(default = "default_senate_journal_min_secs")]
    pub senate_journal_min_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Persist chamber state across restarts (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one snapshot file per chamber.
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,

    /// Persist at least this often even without changes.
    #[serde(default = "default_persist_interval_secs")]
    pub persist_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HouseConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Zone for displayed times; the chamber zone when unset.
    #[serde(default)]
    pub display_timezone: Option<String>,

    /// strftime template of the daily floor proceedings URL.
    #[serde(default = "default_house_floor_url")]
    pub floor_url: String,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SenateConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub display_timezone: Option<String>,

    /// strftime template of the daily floor activity URL.
    #[serde(default = "default_senate_floor_url")]
    pub floor_url: String,

    #[serde(default = "default_senate_schedule_url")]
    pub schedule_url: String,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: u64,
}

// These functions cannot be const because serde uses function pointers for defaults
fn default_log_level() -> String {
    "info".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("chambers-watch/{}", env!("CARGO_PKG_VERSION"))
}

#[allow(clippy::missing_const_for_fn)]
fn default_tick_secs() -> u64 {
    15
}

#[allow(clippy::missing_const_for_fn)]
fn default_convened_secs() -> u64 {
    120
}

#[allow(clippy::missing_const_for_fn)]
fn default_adjourned_secs() -> u64 {
    600
}

#[allow(clippy::missing_const_for_fn)]
fn default_pre_convene_lead_secs() -> u64 {
    600
}

#[allow(clippy::missing_const_for_fn)]
fn default_overdue_secs() -> u64 {
    60
}

#[allow(clippy::missing_const_for_fn)]
fn default_senate_journal_min_secs() -> u64 {
    1800
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("cache")
}

#[allow(clippy::missing_const_for_fn)]
fn default_persist_interval_secs() -> u64 {
    900
}

fn default_timezone() -> String {
    CAPITOL_TIMEZONE.to_string()
}

fn default_house_floor_url() -> String {
    HOUSE_FLOOR_URL.to_string()
}

fn default_senate_floor_url() -> String {
    SENATE_FLOOR_URL.to_string()
}

fn default_senate_schedule_url() -> String {
    SENATE_SCHEDULE_URL.to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_lookback_days() -> u64 {
    DEFAULT_LOOKBACK_DAYS
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            convened_secs: default_convened_secs(),
            adjourned_secs: default_adjourned_secs(),
            pre_convene_lead_secs: default_pre_convene_lead_secs(),
            overdue_secs: default_overdue_secs(),
            senate_journal_min_secs: default_senate_journal_min_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            directory: default_cache_directory(),
            persist_interval_secs: default_persist_interval_secs(),
        }
    }
}

impl Default for HouseConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            timezone: default_timezone(),
            display_timezone: None,
            floor_url: default_house_floor_url(),
            lookback_days: default_lookback_days(),
        }
    }
}

impl Default for SenateConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            timezone: default_timezone(),
            display_timezone: None,
            floor_url: default_senate_floor_url(),
            schedule_url: default_senate_schedule_url(),
            lookback_days: default_lookback_days(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl PollingConfig {
    #[must_use]
    pub const fn policy(&self) -> PollingPolicy {
        PollingPolicy {
            convened: Duration::from_secs(self.convened_secs),
            adjourned: Duration::from_secs(self.adjourned_secs),
            pre_convene_lead: Duration::from_secs(self.pre_convene_lead_secs),
            overdue: Duration::from_secs(self.overdue_secs),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Sources are merged in priority order:
    /// 1. Struct defaults (lowest)
    /// 2. config.yaml file (if exists)
    /// 3. Environment variables with `CHAMBERS_` prefix (highest)
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.yaml")
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed("CHAMBERS_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ConfigError::Validation(format!(
                "logging.level '{}' is not a valid filter directive",
                self.logging.level
            )));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Validation("http.timeout_secs cannot be 0".into()));
        }

        let intervals = [
            ("polling.tick_secs", self.polling.tick_secs),
            ("polling.convened_secs", self.polling.convened_secs),
            ("polling.adjourned_secs", self.polling.adjourned_secs),
            ("polling.overdue_secs", self.polling.overdue_secs),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} cannot be 0")));
            }
        }

        if self.cache.enabled {
            if self.cache.directory.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "cache.directory is required when the cache is enabled".into(),
                ));
            }
            if self.cache.persist_interval_secs == 0 {
                return Err(ConfigError::Validation(
                    "cache.persist_interval_secs cannot be 0".into(),
                ));
            }
        }

        if !self.house.enabled && !self.senate.enabled {
            return Err(ConfigError::Validation(
                "at least one of house.enabled or senate.enabled must be true".into(),
            ));
        }

        if self.house.enabled {
            validate_zones("house", &self.house.timezone, self.house.display_timezone.as_deref())?;
            validate_url("house.floor_url", &Endpoint::dated(&self.house.floor_url, 0, 1))?;
            validate_lookback("house.lookback_days", self.house.lookback_days)?;
        }

        if self.senate.enabled {
            validate_zones("senate", &self.senate.timezone, self.senate.display_timezone.as_deref())?;
            validate_url("senate.floor_url", &Endpoint::dated(&self.senate.floor_url, 1, 1))?;
            validate_url("senate.schedule_url", &Endpoint::fixed(&self.senate.schedule_url))?;
            validate_lookback("senate.lookback_days", self.senate.lookback_days)?;
        }

        Ok(())
    }

    /// Engine configuration for the House.
    #[must_use]
    pub fn house_chamber(&self) -> ChamberConfig {
        let mut chamber = self.common(
            ChamberConfig::house(),
            &self.house.timezone,
            self.house.display_timezone.as_deref(),
        );
        if let Some(floor) = chamber.source_mut("floor") {
            floor.endpoint = Endpoint::dated(&self.house.floor_url, 0, self.house.lookback_days);
        }
        chamber
    }

    /// Engine configuration for the Senate.
    #[must_use]
    pub fn senate_chamber(&self) -> ChamberConfig {
        let mut chamber = self.common(
            ChamberConfig::senate(),
            &self.senate.timezone,
            self.senate.display_timezone.as_deref(),
        );
        if let Some(journal) = chamber.source_mut("floor-activity") {
            journal.endpoint = Endpoint::dated(&self.senate.floor_url, 1, self.senate.lookback_days);
            journal.min_interval = Some(Duration::from_secs(self.polling.senate_journal_min_secs));
        }
        if let Some(schedule) = chamber.source_mut("floor-schedule") {
            schedule.endpoint = Endpoint::fixed(&self.senate.schedule_url);
        }
        chamber
    }

    fn common(&self, preset: ChamberConfig, timezone: &str, display: Option<&str>) -> ChamberConfig {
        let mut chamber = preset
            .with_polling(self.polling.policy())
            .with_fetch_timeout(Duration::from_secs(self.http.timeout_secs));
        chamber.timezone = timezone.to_string();
        chamber.display_timezone = display.map(str::to_string);
        chamber
    }

    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_secs(self.polling.tick_secs)
    }

    #[must_use]
    pub const fn persist_interval(&self) -> Duration {
        Duration::from_secs(self.cache.persist_interval_secs)
    }
}

fn validate_zones(section: &str, timezone: &str, display: Option<&str>) -> Result<(), ConfigError> {
    for zone in std::iter::once(timezone).chain(display) {
        parse_zone(zone).map_err(|e| ConfigError::Validation(format!("{section}: {e}")))?;
    }
    Ok(())
}

fn validate_url(name: &str, endpoint: &Endpoint) -> Result<(), ConfigError> {
    let url = match endpoint {
        Endpoint::Fixed { url } => url,
        Endpoint::Dated { template, .. } => template,
    };
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{name} '{url}' must start with http:// or https://"
        )));
    }
    endpoint
        .validate()
        .map_err(|e| ConfigError::Validation(format!("{name}: {e}")))
}

fn validate_lookback(name: &str, days: u64) -> Result<(), ConfigError> {
    if days == 0 {
        return Err(ConfigError::Validation(format!("{name} cannot be 0")));
    }
    Ok(())
}

//! # Runtime configuration.
//!
//! Provides [`AgentConfig`] for the lifecycle supervisor and the boot trigger,
//! and [`DispatcherConfig`] for the alert fanout dispatcher.
//!
//! Every value defaults to the constant the deployed system uses, so
//! `AgentConfig::default()` is a complete, working configuration. Both types
//! deserialize with `#[serde(default)]`, so a YAML file only needs the keys it
//! overrides:
//!
//! ```yaml
//! wake_timeout: 10m
//! restart_delay: 1s
//! status_channel:
//!   importance: low
//! ```
//!
//! ## Sentinel values
//! - `DispatcherConfig::max_concurrent = 0` → unlimited (no semaphore created)
//! - `AgentConfig::bus_capacity = 0` → clamped to 1

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;
use crate::host::{ComponentName, StatusChannelConfig, StickyNotification};

/// Name of the control channel between supervisor and subordinate.
pub const CONTROL_CHANNEL: &str = "background_service";

/// Configuration of the lifecycle supervisor and boot trigger.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Host component the supervisor runs as; target of restarts and boot starts.
    pub component: ComponentName,

    /// Wake lock tag.
    pub wake_tag: String,

    /// Upper bound on how long the wake lock is held.
    ///
    /// A safety ceiling, not an expected runtime: the host drops the lock after
    /// this long even if `destroy` never runs.
    #[serde(with = "humantime_serde")]
    pub wake_timeout: Duration,

    /// Status channel recreated on every `create`.
    pub status_channel: StatusChannelConfig,

    /// Sticky notification posted on every `create`.
    pub notification: StickyNotification,

    /// Control channel name.
    pub channel_name: String,

    /// Delay between task removal and the deferred restart.
    #[serde(with = "humantime_serde")]
    pub restart_delay: Duration,

    /// Request code of the deferred restart pending action.
    pub restart_request_code: i32,

    /// Capacity of the event bus ring buffer.
    pub bus_capacity: usize,
}

impl AgentConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for AgentConfig {
    /// Default configuration:
    ///
    /// - `wake_timeout = 600s`
    /// - `restart_delay = 1s`
    /// - `channel_name = "background_service"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            component: ComponentName::new("com.yasligoz.gpstracker", "BackgroundService"),
            wake_tag: "GpsTracker::BackgroundServiceWakeLock".to_string(),
            wake_timeout: Duration::from_secs(600),
            status_channel: StatusChannelConfig::default(),
            notification: StickyNotification::default(),
            channel_name: CONTROL_CHANNEL.to_string(),
            restart_delay: Duration::from_secs(1),
            restart_request_code: 1,
            bus_capacity: 1024,
        }
    }
}

/// Configuration of the alert fanout dispatcher.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Collection watched for appends (`{collection}/{deviceId}/{alertId}`).
    pub collection: String,

    /// Broadcast topic notifications are published to.
    pub topic: String,

    /// Notification title.
    pub title: String,

    /// Notification body.
    pub body: String,

    /// Maximum concurrent invocations per dispatcher instance (`0` = unlimited).
    pub max_concurrent: usize,

    /// Push service endpoint used by the HTTP publisher.
    pub endpoint: Option<String>,
}

impl DispatcherConfig {
    /// Returns the concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` concurrent invocations
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            collection: "sos_alerts".to_string(),
            topic: "sos_alerts".to_string(),
            title: "🚨 ACİL DURUM: SOS SİNYALİ ALINDI!".to_string(),
            body: "Bir yaşlıdan SOS çağrısı geldi!".to_string(),
            max_concurrent: 10,
            endpoint: None,
        }
    }
}

/// Parses a configuration from YAML text.
pub fn from_yaml_str<T: DeserializeOwned>(text: &str) -> Result<T, ConfigError> {
    Ok(serde_yaml::from_str(text)?)
}

/// Reads and parses a YAML configuration file.
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_yaml_str(&text)
}

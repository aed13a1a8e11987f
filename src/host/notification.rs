//! # Status channel and sticky notification.
//!
//! Both are plain immutable values built fresh on every `create`. The channel
//! is recreated with delete-then-create so a changed configuration always wins
//! over whatever the host cached from the previous run.

use serde::{Deserialize, Serialize};

use crate::error::HostError;

/// Host importance level of a notification channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    /// Not shown.
    None,
    /// Shown only in the shade, no status bar icon.
    Min,
    /// Shown, no sound.
    Low,
    /// Shown, may make sound.
    Default,
    /// Shown, may make sound and peek.
    High,
}

/// Lock-screen visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Content hidden entirely on a secure lock screen.
    Secret,
    /// Shown, content redacted.
    Private,
    /// Shown in full.
    Public,
}

/// Notification priority (pre-channel hosts).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Lowest.
    Min,
    /// Below default.
    Low,
    /// Default.
    Default,
    /// Above default.
    High,
    /// Highest.
    Max,
}

/// Notification category hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Running background service indicator.
    Service,
    /// Alarm or timer.
    Alarm,
    /// Generic status.
    Status,
}

/// Configuration of the status notification channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusChannelConfig {
    /// Stable channel id.
    pub id: String,
    /// Human-readable channel name.
    pub display_name: String,
    /// Human-readable description.
    pub description: String,
    /// Importance level.
    pub importance: Importance,
    /// Lock-screen visibility.
    pub visibility: Visibility,
    /// Show a launcher badge.
    pub show_badge: bool,
    /// Blink the notification light.
    pub lights_enabled: bool,
    /// Play a sound.
    pub sound_enabled: bool,
    /// Vibrate.
    pub vibration_enabled: bool,
}

impl Default for StatusChannelConfig {
    fn default() -> Self {
        Self {
            id: "background_service_channel".to_string(),
            display_name: "GPS Tracker Arka Plan Servisi".to_string(),
            description: "Yaşlı takip sistemi arka plan servisi".to_string(),
            importance: Importance::High,
            visibility: Visibility::Public,
            show_badge: true,
            lights_enabled: true,
            sound_enabled: false,
            vibration_enabled: false,
        }
    }
}

/// The always-visible status indicator shown while the agent runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickyNotification {
    /// Host notification id.
    pub id: u32,
    /// Title line.
    pub title: String,
    /// Body text.
    pub text: String,
    /// Small icon resource.
    pub icon: String,
    /// Component opened when the notification is tapped.
    pub tap_target: String,
    /// Cannot be swiped away.
    pub ongoing: bool,
    /// Posted without sound or vibration.
    pub silent: bool,
    /// Priority on pre-channel hosts.
    pub priority: Priority,
    /// Category hint.
    pub category: Category,
    /// Lock-screen visibility.
    pub visibility: Visibility,
}

impl Default for StickyNotification {
    fn default() -> Self {
        Self {
            id: 1001,
            title: "Ortam Sesi Dinleniyor".to_string(),
            text: "Yaşlı cihazında ortam sesi arka planda dinleniyor".to_string(),
            icon: "android.R.drawable.ic_dialog_info".to_string(),
            tap_target: "MainActivity".to_string(),
            ongoing: true,
            silent: true,
            priority: Priority::High,
            category: Category::Service,
            visibility: Visibility::Public,
        }
    }
}

/// Host notification channel registry.
pub trait NotificationManager: Send + Sync + 'static {
    /// Deletes a channel. Deleting a channel that does not exist is not an error.
    fn delete_channel(&self, id: &str) -> Result<(), HostError>;

    /// Creates a channel from the given configuration.
    fn create_channel(&self, config: &StatusChannelConfig) -> Result<(), HostError>;
}

/// Deletes any channel with the same id, then creates it from `config`.
pub fn recreate_channel(
    manager: &dyn NotificationManager,
    config: &StatusChannelConfig,
) -> Result<(), HostError> {
    manager.delete_channel(&config.id)?;
    manager.create_channel(config)
}

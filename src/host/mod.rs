//! Host interfaces.
//!
//! Everything the supervisor needs from the device (power management,
//! notifications, alarms, service control, wall clock) enters through the
//! traits in this module. The supervisor itself never talks to a real device,
//! which keeps its state machine testable with in-memory fakes.
//!
//! ## Contents
//! - [`PowerManager`] / [`WakeLock`]: exclusive time-bounded wake resource
//! - [`NotificationManager`], [`StatusChannelConfig`], [`StickyNotification`]
//! - [`AlarmScheduler`], [`PendingAction`], [`Clock`]: deferred restart
//! - [`ServiceHost`], [`StartDirective`], [`StartCommand`], [`Binder`]: service contract
//! - [`HostBindings`]: one bundle of all of the above

mod alarm;
mod notification;
mod power;
mod service;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use alarm::{AlarmClock, AlarmScheduler, Clock, PendingAction, PendingFlags, SystemClock};
pub use notification::{
    Category, Importance, NotificationManager, Priority, StatusChannelConfig, StickyNotification,
    Visibility, recreate_channel,
};
pub use power::{PowerManager, WakeLock};
pub use service::{Binder, ServiceHost, StartCommand, StartDirective};

/// Fully qualified host component.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentName {
    /// Owning package.
    pub package: String,
    /// Component class within the package.
    pub class: String,
}

impl ComponentName {
    /// Creates a component name.
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.class)
    }
}

/// All host primitives a supervisor instance is wired to.
#[derive(Clone)]
pub struct HostBindings {
    /// Power manager (wake locks).
    pub power: Arc<dyn PowerManager>,
    /// Notification channel registry.
    pub notifications: Arc<dyn NotificationManager>,
    /// Alarm facility for deferred restarts.
    pub alarms: Arc<dyn AlarmScheduler>,
    /// Service control.
    pub service: Arc<dyn ServiceHost>,
    /// Wall clock for alarm deadlines.
    pub clock: Arc<dyn Clock>,
}

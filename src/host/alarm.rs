//! # Deferred restart scheduling.
//!
//! The restart request after a task removal must outlive the process, so it is
//! handed to the host's alarm facility instead of an in-process timer.
//!
//! ```text
//! on_task_removed()
//!   └─► trigger_at = clock.now_millis() + restart_delay
//!   └─► AlarmScheduler::schedule_exact_wake_capable(trigger_at, PendingAction)
//!                                  │
//!        (process may die here)    ▼
//!                         host fires PendingAction ──► create() on a fresh supervisor
//! ```

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::host::ComponentName;

/// Flags attached to a pending action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PendingFlags {
    /// The host may not alter the action.
    pub immutable: bool,
    /// The action fires at most once.
    pub one_shot: bool,
}

/// Clock used for alarm deadlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmClock {
    /// Wall-clock time, wakes the device.
    RtcWakeup,
}

/// A start request the host performs on our behalf, possibly after we died.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAction {
    /// Component to start.
    pub target: ComponentName,
    /// Request code distinguishing pending actions for the same target.
    pub request_code: i32,
    /// Pending-action flags.
    pub flags: PendingFlags,
}

/// Host alarm facility.
pub trait AlarmScheduler: Send + Sync + 'static {
    /// Schedules `action` to fire at `trigger_at_millis` exactly, even while the
    /// device idles.
    fn schedule_exact_wake_capable(
        &self,
        clock: AlarmClock,
        trigger_at_millis: i64,
        action: PendingAction,
    ) -> Result<(), HostError>;
}

/// Source of wall-clock time in unix milliseconds.
pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock time in unix milliseconds.
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}

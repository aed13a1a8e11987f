//! # LogWriter: tracing event renderer
//!
//! A subscriber that turns every runtime [`Event`] into one `tracing` record.
//! Failures go out at `warn`/`error`, routine lifecycle at `info`, chatty
//! control traffic at `debug`.
//!
//! ## Example output (compact formatter)
//! ```text
//! INFO agent created seq=3
//! INFO wake lock acquired tag="GpsTracker::BackgroundServiceWakeLock" timeout_ms=600000
//! WARN subordinate failed subordinate="flutter" reason="entrypoint: boom"
//! DEBUG control message dropped channel="background_service" method="serviceStarted" reason="no channel"
//! INFO restart scheduled component="BackgroundService" delay_ms=1000 trigger_at_ms=1760000001000
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let component = e.component.as_deref().unwrap_or("unknown");
        let method = e.method.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::SubscriberPanicked => {
                error!(subscriber = component, info = reason, "subscriber panicked");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = component, reason, "subscriber overflow");
            }
            EventKind::AgentCreated => info!(seq = e.seq, "agent created"),
            EventKind::CreateIgnored => debug!(seq = e.seq, "create ignored, already running"),
            EventKind::WakeAcquired => {
                info!(tag = component, timeout_ms = ?e.timeout_ms, "wake lock acquired");
            }
            EventKind::WakeReleased => info!(tag = component, "wake lock released"),
            EventKind::WakeFailed => warn!(tag = component, reason, "wake lock failure"),
            EventKind::StatusChannelRecreated => info!(channel = component, "status channel recreated"),
            EventKind::StickyPosted => info!(channel = component, "sticky notification posted"),
            EventKind::StatusFailed => warn!(channel = component, reason, "status indicator failure"),
            EventKind::CommandReceived => info!("start command received"),
            EventKind::AgentDestroyed => info!(seq = e.seq, "agent destroyed"),
            EventKind::SubordinateStarting => info!(subordinate = component, "subordinate starting"),
            EventKind::SubordinateReady => info!(subordinate = component, "subordinate ready"),
            EventKind::SubordinateFailed => {
                warn!(subordinate = component, reason, "subordinate failed");
            }
            EventKind::SubordinateStopped => info!(subordinate = component, "subordinate stopped"),
            EventKind::ControlSent => debug!(channel = component, method, "control message sent"),
            EventKind::ControlDropped => {
                debug!(channel = component, method, reason, "control message dropped");
            }
            EventKind::ControlRequested => {
                info!(channel = component, method, "control request received");
            }
            EventKind::ControlUnsupported => {
                warn!(channel = component, method, "control method not implemented");
            }
            EventKind::StopRequested => info!("stop requested by subordinate"),
            EventKind::RestartScheduled => info!(
                component,
                delay_ms = ?e.delay_ms,
                trigger_at_ms = ?e.trigger_at_ms,
                "restart scheduled"
            ),
            EventKind::RestartFailed => error!(component, reason, "restart scheduling failed"),
            EventKind::BootStartRequested => info!(component, action = method, "boot start requested"),
            EventKind::BootStartFailed => {
                error!(component, action = method, reason, "boot start failed");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

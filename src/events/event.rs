//! # Runtime events emitted by the supervisor, the boot trigger and subscriber workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: supervisor create/destroy, wake lock, status channel
//! - **Subordinate events**: execution context launch, control channel traffic
//! - **Restart events**: deferred restart on task removal, boot signals
//! - **Subscriber events**: overflow and panic inside the fan-out workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, component
//! name, control method, reasons and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use agentvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ControlRequested)
//!     .with_component("background_service")
//!     .with_method("startService");
//!
//! assert_eq!(ev.kind, EventKind::ControlRequested);
//! assert_eq!(ev.method.as_deref(), Some("startService"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `component`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `component`: subscriber name
    /// - `reason`: reason string ("full", "closed")
    SubscriberOverflow,

    // === Supervisor lifecycle ===
    /// `create` ran and the supervisor entered `Running`.
    AgentCreated,

    /// `create` was delivered while already running; ignored.
    CreateIgnored,

    /// Wake lock acquired.
    ///
    /// Sets:
    /// - `component`: wake lock tag
    /// - `timeout_ms`: acquisition bound
    WakeAcquired,

    /// Wake lock released.
    ///
    /// Sets:
    /// - `component`: wake lock tag
    WakeReleased,

    /// Wake lock acquire or release failed (leak, never fatal).
    ///
    /// Sets:
    /// - `component`: wake lock tag
    /// - `reason`: host error
    WakeFailed,

    /// Status channel deleted and recreated.
    ///
    /// Sets:
    /// - `component`: channel id
    StatusChannelRecreated,

    /// Sticky notification posted and the component moved to the foreground.
    ///
    /// Sets:
    /// - `component`: channel id
    StickyPosted,

    /// Status channel or sticky notification could not be set up.
    ///
    /// Sets:
    /// - `component`: channel id
    /// - `reason`: host error
    StatusFailed,

    /// Host (re)delivered a start command.
    CommandReceived,

    /// `destroy` finished; the supervisor is `Stopped`.
    AgentDestroyed,

    // === Subordinate context ===
    /// Subordinate launch began.
    ///
    /// Sets:
    /// - `component`: subordinate name
    SubordinateStarting,

    /// Subordinate is up and the control channel is live.
    ///
    /// Sets:
    /// - `component`: subordinate name
    SubordinateReady,

    /// Subordinate launch failed; the control channel stays dead.
    ///
    /// Sets:
    /// - `component`: subordinate name
    /// - `reason`: start error
    SubordinateFailed,

    /// Subordinate torn down.
    ///
    /// Sets:
    /// - `component`: subordinate name
    SubordinateStopped,

    /// Message sent to the subordinate.
    ///
    /// Sets:
    /// - `component`: channel name
    /// - `method`: message name
    ControlSent,

    /// Message to the subordinate dropped (no channel yet, or channel closed).
    ///
    /// Sets:
    /// - `component`: channel name
    /// - `method`: message name
    /// - `reason`: why it was dropped
    ControlDropped,

    /// Subordinate called a method on the supervisor.
    ///
    /// Sets:
    /// - `component`: channel name
    /// - `method`: method name
    ControlRequested,

    /// Subordinate called a method the supervisor does not implement.
    ///
    /// Sets:
    /// - `component`: channel name
    /// - `method`: method name
    ControlUnsupported,

    /// Self-teardown was requested through the control channel.
    StopRequested,

    // === Restart / boot ===
    /// Deferred restart queued with the alarm facility.
    ///
    /// Sets:
    /// - `component`: target component
    /// - `delay_ms`: delay relative to now
    /// - `trigger_at_ms`: absolute wall-clock deadline (unix millis)
    RestartScheduled,

    /// The alarm facility refused the deferred restart.
    ///
    /// Sets:
    /// - `component`: target component
    /// - `reason`: host error
    RestartFailed,

    /// Boot signal observed; foreground start requested.
    ///
    /// Sets:
    /// - `component`: target component
    /// - `method`: boot action string
    BootStartRequested,

    /// Boot signal observed but the foreground start failed (not retried).
    ///
    /// Sets:
    /// - `component`: target component
    /// - `method`: boot action string
    /// - `reason`: host error
    BootStartFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Component, channel, tag or subscriber the event is about.
    pub component: Option<Arc<str>>,
    /// Control method or message name.
    pub method: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Absolute wall-clock deadline in unix milliseconds.
    pub trigger_at_ms: Option<i64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            method: None,
            reason: None,
            delay_ms: None,
            timeout_ms: None,
            trigger_at_ms: None,
        }
    }

    /// Attaches a component name.
    #[inline]
    pub fn with_component(mut self, component: impl Into<Arc<str>>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Attaches a control method name.
    #[inline]
    pub fn with_method(mut self, method: impl Into<Arc<str>>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis_u32(d));
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis_u32(d));
        self
    }

    /// Attaches an absolute wall-clock deadline.
    #[inline]
    pub fn with_trigger_at(mut self, unix_millis: i64) -> Self {
        self.trigger_at_ms = Some(unix_millis);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_component(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_component(subscriber)
            .with_reason(info)
    }
}

fn millis_u32(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

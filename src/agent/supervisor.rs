//! # Supervisor: the host-driven lifecycle of the background agent.
//!
//! The [`Supervisor`] owns the agent state, the wake resource, the status
//! indicator and the control channel to the subordinate. The host calls its
//! lifecycle callbacks on a single main context; none of them blocks and none
//! of them returns an error. Every step that can fail is reported on the
//! [`Bus`] and otherwise ignored.
//!
//! ## Callbacks
//! ```text
//! create()
//!   ├─► state: Created|Stopped → Running            (ignored while Running)
//!   ├─► WakeResource::acquire(wake_timeout)         fail → WakeFailed
//!   ├─► recreate status channel (delete + create)   fail → StatusFailed
//!   ├─► start_foreground(sticky notification)       fail → StatusFailed
//!   └─► spawn launch(subordinate) ───────────────────────────────┐
//!                                                                ▼
//!                                     Ok   → install ControlSender, spawn control loop → Ready
//!                                     Err  → SubordinateFailed (channel stays dead)
//!
//! on_start_command() ──► send serviceStarted if the channel is live ──► StartDirective::Sticky
//!
//! control loop: InboundCall ──► handle_control_message() ──► reply
//!                                   ├─ startService → success
//!                                   ├─ stopService  → host.stop_self() + success
//!                                   └─ other        → not implemented
//!
//! destroy()
//!   ├─► WakeResource::release()                     (idempotent)
//!   ├─► cancel subordinate, drop the channel
//!   └─► state → Stopped
//!
//! on_task_removed() ──► AlarmScheduler::schedule_exact_wake_capable(now + restart_delay)
//! ```
//!
//! ## Rules
//! - At most one live supervisor per process (the host's singleton contract);
//!   overlapping `create`/`destroy` from different threads is not supported.
//! - Messages sent before the subordinate is ready are dropped, not queued.
//! - A launch that finishes after `destroy` (or after a newer `create`) is discarded.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::agent::state::{AgentState, Lifecycle};
use crate::agent::subordinate::{SubordinateRef, SubordinateStatus};
use crate::agent::wake::{Release, WakeResource};
use crate::config::AgentConfig;
use crate::control::{
    self, ControlReply, ControlRequest, ControlSender, InboundCall, MethodCall,
    START_CONFIRMATION, STOP_CONFIRMATION, SupervisorEnd, SupervisorMessage,
};
use crate::error::StartError;
use crate::events::{Bus, Event, EventKind};
use crate::host::{
    AlarmClock, Binder, HostBindings, PendingAction, PendingFlags, StartCommand, StartDirective,
    recreate_channel,
};
use crate::subscribers::panic_message;

/// Capacity of each direction of the control channel.
const CONTROL_QUEUE: usize = 64;

/// Teardown handle of a launched (or launching) subordinate.
struct ContextHandle {
    generation: u64,
    cancel: CancellationToken,
}

/// State guarded by the supervisor lock.
#[derive(Default)]
struct Inner {
    state: AgentState,
    wake: WakeResource,
    context: Option<ContextHandle>,
    control: Option<ControlSender>,
    generation: u64,
}

/// Host-driven lifecycle supervisor of the background agent.
pub struct Supervisor {
    cfg: AgentConfig,
    host: HostBindings,
    subordinate: Option<SubordinateRef>,
    bus: Bus,
    runtime: Handle,
    inner: Mutex<Inner>,
    status: watch::Sender<SubordinateStatus>,
    listener: CancellationToken,
}

impl Supervisor {
    pub(crate) fn new_internal(
        cfg: AgentConfig,
        host: HostBindings,
        subordinate: Option<SubordinateRef>,
        bus: Bus,
        runtime: Handle,
        listener: CancellationToken,
    ) -> Self {
        let (status, _) = watch::channel(SubordinateStatus::Idle);
        Self {
            cfg,
            host,
            subordinate,
            bus,
            runtime,
            inner: Mutex::new(Inner::default()),
            status,
            listener,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AgentState {
        self.inner.lock().state
    }

    /// True while the wake resource is held.
    pub fn is_wake_held(&self) -> bool {
        self.inner.lock().wake.is_held()
    }

    /// True while the control channel to the subordinate is live.
    pub fn has_control_channel(&self) -> bool {
        self.inner
            .lock()
            .control
            .as_ref()
            .is_some_and(|c| !c.is_closed())
    }

    /// Watches the subordinate launch status.
    pub fn subordinate_status(&self) -> watch::Receiver<SubordinateStatus> {
        self.status.subscribe()
    }

    /// Event bus the supervisor publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Active configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.cfg
    }

    /// Host `create`.
    ///
    /// Acquires the wake resource, recreates the status channel, posts the
    /// sticky notification and starts the subordinate without waiting for it.
    pub fn create(self: &Arc<Self>) {
        {
            let mut inner = self.inner.lock();
            match inner.state.next(Lifecycle::Create) {
                Some(next) => inner.state = next,
                None => {
                    drop(inner);
                    self.bus.publish(Event::new(EventKind::CreateIgnored));
                    return;
                }
            }
        }

        self.acquire_wake();
        self.post_status_indicator();
        self.bus.publish(Event::new(EventKind::AgentCreated));
        self.start_subordinate();
    }

    /// Host `start-command`; may arrive any number of times per process.
    ///
    /// Always returns [`StartDirective::Sticky`], whether or not the channel is live.
    pub fn on_start_command(&self, _cmd: &StartCommand) -> StartDirective {
        self.bus.publish(Event::new(EventKind::CommandReceived));
        self.send_to_subordinate(SupervisorMessage::ServiceStarted);
        StartDirective::Sticky
    }

    /// Host `bind`. This component is not bindable.
    pub fn on_bind(&self, _cmd: &StartCommand) -> Option<Binder> {
        None
    }

    /// Handles a raw control call from the subordinate.
    pub fn handle_control_message(&self, method: &str, payload: Value) -> ControlReply {
        let request = ControlRequest::decode(&MethodCall::new(method, payload));
        self.handle_request(request)
    }

    /// Handles a decoded control request.
    pub fn handle_request(&self, request: ControlRequest) -> ControlReply {
        let channel = self.cfg.channel_name.as_str();
        match request {
            ControlRequest::StartService => {
                self.bus.publish(
                    Event::new(EventKind::ControlRequested)
                        .with_component(channel)
                        .with_method("startService"),
                );
                ControlReply::success(START_CONFIRMATION)
            }
            ControlRequest::StopService => {
                self.bus.publish(
                    Event::new(EventKind::ControlRequested)
                        .with_component(channel)
                        .with_method("stopService"),
                );
                self.bus.publish(Event::new(EventKind::StopRequested));
                self.host.service.stop_self();
                ControlReply::success(STOP_CONFIRMATION)
            }
            ControlRequest::Unknown { method } => {
                self.bus.publish(
                    Event::new(EventKind::ControlUnsupported)
                        .with_component(channel)
                        .with_method(method),
                );
                ControlReply::NotImplemented
            }
        }
    }

    /// Host `destroy` (also reached through `stopService` once the host reacts).
    ///
    /// Every step runs even if an earlier one failed; calling it again is harmless.
    pub fn destroy(&self) {
        let (release, context) = {
            let mut inner = self.inner.lock();
            if let Some(next) = inner.state.next(Lifecycle::Destroy) {
                inner.state = next;
            }
            inner.control = None;
            (inner.wake.release(), inner.context.take())
        };

        match release {
            Ok(Release::Released) => self
                .bus
                .publish(Event::new(EventKind::WakeReleased).with_component(self.cfg.wake_tag.as_str())),
            Ok(Release::Expired | Release::NotHeld) => {}
            Err(e) => self.bus.publish(
                Event::new(EventKind::WakeFailed)
                    .with_component(self.cfg.wake_tag.as_str())
                    .with_reason(e.as_message()),
            ),
        }

        if let Some(ctx) = context {
            ctx.cancel.cancel();
            self.status.send_replace(SubordinateStatus::Stopped);
            if let Some(sub) = &self.subordinate {
                self.bus
                    .publish(Event::new(EventKind::SubordinateStopped).with_component(sub.name()));
            }
        }

        self.bus.publish(Event::new(EventKind::AgentDestroyed));
    }

    /// Host `task-removed`: the user swiped the app away.
    ///
    /// Queues a one-shot restart of this component with the host alarm
    /// facility, `restart_delay` from now, regardless of the current state.
    pub fn on_task_removed(&self) {
        let delay = self.cfg.restart_delay;
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        let trigger_at = self.host.clock.now_millis().saturating_add(delay_ms);
        let action = PendingAction {
            target: self.cfg.component.clone(),
            request_code: self.cfg.restart_request_code,
            flags: PendingFlags {
                immutable: true,
                one_shot: true,
            },
        };
        let component = self.cfg.component.to_string();

        match self
            .host
            .alarms
            .schedule_exact_wake_capable(AlarmClock::RtcWakeup, trigger_at, action)
        {
            Ok(()) => self.bus.publish(
                Event::new(EventKind::RestartScheduled)
                    .with_component(component)
                    .with_delay(delay)
                    .with_trigger_at(trigger_at),
            ),
            Err(e) => self.bus.publish(
                Event::new(EventKind::RestartFailed)
                    .with_component(component)
                    .with_reason(e.as_message()),
            ),
        }
    }

    fn acquire_wake(&self) {
        let tag = self.cfg.wake_tag.as_str();
        let acquired = self.inner.lock().wake.acquire(
            self.host.power.as_ref(),
            tag,
            self.cfg.wake_timeout,
        );
        match acquired {
            Ok(true) => self.bus.publish(
                Event::new(EventKind::WakeAcquired)
                    .with_component(tag)
                    .with_timeout(self.cfg.wake_timeout),
            ),
            Ok(false) => {}
            Err(e) => self.bus.publish(
                Event::new(EventKind::WakeFailed)
                    .with_component(tag)
                    .with_reason(e.as_message()),
            ),
        }
    }

    fn post_status_indicator(&self) {
        let channel = &self.cfg.status_channel;
        let failed = |e: crate::error::HostError| {
            Event::new(EventKind::StatusFailed)
                .with_component(channel.id.as_str())
                .with_reason(e.as_message())
        };

        match recreate_channel(self.host.notifications.as_ref(), channel) {
            Ok(()) => self.bus.publish(
                Event::new(EventKind::StatusChannelRecreated).with_component(channel.id.as_str()),
            ),
            Err(e) => self.bus.publish(failed(e)),
        }
        match self.host.service.start_foreground(&self.cfg.notification) {
            Ok(()) => self
                .bus
                .publish(Event::new(EventKind::StickyPosted).with_component(channel.id.as_str())),
            Err(e) => self.bus.publish(failed(e)),
        }
    }

    fn start_subordinate(self: &Arc<Self>) {
        let Some(subordinate) = self.subordinate.clone() else {
            return;
        };

        let cancel = CancellationToken::new();
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.context = Some(ContextHandle {
                generation: inner.generation,
                cancel: cancel.clone(),
            });
            inner.generation
        };
        self.status.send_replace(SubordinateStatus::Starting);
        self.bus.publish(
            Event::new(EventKind::SubordinateStarting).with_component(subordinate.name()),
        );

        let me = Arc::downgrade(self);
        let (end, port) = control::channel(self.cfg.channel_name.as_str(), CONTROL_QUEUE);
        self.runtime.spawn(async move {
            let launch = AssertUnwindSafe(subordinate.launch(port, cancel.child_token()))
                .catch_unwind();
            let result = tokio::select! {
                res = launch => match res {
                    Ok(res) => res,
                    Err(panic) => Err(StartError::Panicked { info: panic_message(&*panic) }),
                },
                _ = cancel.cancelled() => Err(StartError::Canceled),
            };

            let Some(me) = me.upgrade() else {
                return;
            };
            match result {
                Ok(()) => me.install_channel(generation, end, cancel),
                Err(e) => me.launch_failed(generation, subordinate.name(), e),
            }
        });
    }

    fn install_channel(self: &Arc<Self>, generation: u64, end: SupervisorEnd, cancel: CancellationToken) {
        {
            let mut inner = self.inner.lock();
            let current = inner
                .context
                .as_ref()
                .is_some_and(|c| c.generation == generation);
            if !current || cancel.is_cancelled() {
                return;
            }
            inner.control = Some(end.sender);
        }
        self.status.send_replace(SubordinateStatus::Ready);
        if let Some(sub) = &self.subordinate {
            self.bus
                .publish(Event::new(EventKind::SubordinateReady).with_component(sub.name()));
        }
        self.runtime
            .spawn(serve_control(Arc::downgrade(self), end.calls, cancel));
    }

    fn launch_failed(&self, generation: u64, name: &str, err: StartError) {
        let current = self
            .inner
            .lock()
            .context
            .as_ref()
            .is_some_and(|c| c.generation == generation);
        if !current {
            return;
        }
        self.bus.publish(
            Event::new(EventKind::SubordinateFailed)
                .with_component(name)
                .with_reason(err.as_message()),
        );
        self.status.send_replace(SubordinateStatus::Failed(err));
    }

    fn send_to_subordinate(&self, msg: SupervisorMessage) {
        let channel = self.cfg.channel_name.as_str();
        let sender = self.inner.lock().control.clone();
        let dropped = |reason: String| {
            Event::new(EventKind::ControlDropped)
                .with_component(channel)
                .with_method(msg.method())
                .with_reason(reason)
        };

        match sender {
            None => self.bus.publish(dropped("no channel".to_string())),
            Some(sender) => match sender.send(msg) {
                Ok(()) => self.bus.publish(
                    Event::new(EventKind::ControlSent)
                        .with_component(channel)
                        .with_method(msg.method()),
                ),
                Err(e) => self.bus.publish(dropped(e.to_string())),
            },
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.listener.cancel();
    }
}

/// Answers calls from the subordinate until teardown or until either side goes away.
async fn serve_control(
    me: Weak<Supervisor>,
    mut calls: mpsc::Receiver<InboundCall>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            call = calls.recv() => {
                let Some(inbound) = call else { break };
                let Some(sup) = me.upgrade() else { break };
                let reply = sup.handle_control_message(
                    &inbound.call.method,
                    inbound.call.payload.clone(),
                );
                inbound.respond(reply);
            }
        }
    }
}

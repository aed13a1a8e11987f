//! In-memory host shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use agentvisor::dispatch::{NotificationPayload, PushPublisher};
use agentvisor::host::{
    AlarmClock, AlarmScheduler, Clock, ComponentName, HostBindings, NotificationManager,
    PendingAction, PowerManager, ServiceHost, StatusChannelConfig, StickyNotification, WakeLock,
};
use agentvisor::{AgentConfig, Event, EventKind, HostError, PublishError, Subscribe};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Fixed wall clock used by [`FakeHost`].
pub const NOW_MILLIS: i64 = 1_760_000_000_000;

/// Everything the fake host observed.
#[derive(Default)]
pub struct FakeHost {
    pub wake: Arc<WakeCounters>,
    pub channels: Mutex<HashMap<String, StatusChannelConfig>>,
    pub channel_deletes: AtomicUsize,
    pub foreground_posts: Mutex<Vec<StickyNotification>>,
    pub alarms: Mutex<Vec<(AlarmClock, i64, PendingAction)>>,
    pub stop_self_calls: AtomicUsize,
    pub started: Mutex<Vec<ComponentName>>,

    pub fail_wake: AtomicBool,
    pub fail_foreground: AtomicBool,
    pub fail_alarm: AtomicBool,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn bindings(self: &Arc<Self>) -> HostBindings {
        HostBindings {
            power: self.clone(),
            notifications: self.clone(),
            alarms: self.clone(),
            service: self.clone(),
            clock: self.clone(),
        }
    }

    pub fn acquired(&self) -> usize {
        self.wake.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.wake.released.load(Ordering::SeqCst)
    }

    /// Simulates the host dropping the lock after its timeout.
    pub fn expire_wake(&self) {
        self.wake.held.store(false, Ordering::SeqCst);
    }

    pub fn stop_self_calls(&self) -> usize {
        self.stop_self_calls.load(Ordering::SeqCst)
    }
}

/// Shared by every lock the fake power manager hands out.
#[derive(Default)]
pub struct WakeCounters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub held: AtomicBool,
    pub timeouts: Mutex<Vec<Duration>>,
}

struct FakeLock {
    state: Arc<WakeCounters>,
}

impl WakeLock for FakeLock {
    fn acquire(&mut self, timeout: Duration) -> Result<(), HostError> {
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        self.state.timeouts.lock().push(timeout);
        self.state.held.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) -> Result<(), HostError> {
        if !self.state.held.swap(false, Ordering::SeqCst) {
            return Err(HostError::WakeLock {
                error: "WakeLock under-locked".into(),
            });
        }
        self.state.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_held(&self) -> bool {
        self.state.held.load(Ordering::SeqCst)
    }
}

impl PowerManager for FakeHost {
    fn new_wake_lock(&self, _tag: &str) -> Result<Box<dyn WakeLock>, HostError> {
        if self.fail_wake.load(Ordering::SeqCst) {
            return Err(HostError::WakeLock {
                error: "permission denied".into(),
            });
        }
        Ok(Box::new(FakeLock {
            state: self.wake.clone(),
        }))
    }
}

impl NotificationManager for FakeHost {
    fn delete_channel(&self, id: &str) -> Result<(), HostError> {
        self.channel_deletes.fetch_add(1, Ordering::SeqCst);
        self.channels.lock().remove(id);
        Ok(())
    }

    fn create_channel(&self, config: &StatusChannelConfig) -> Result<(), HostError> {
        let mut channels = self.channels.lock();
        // The host keeps an existing channel's settings on create.
        channels
            .entry(config.id.clone())
            .or_insert_with(|| config.clone());
        Ok(())
    }
}

impl AlarmScheduler for FakeHost {
    fn schedule_exact_wake_capable(
        &self,
        clock: AlarmClock,
        trigger_at_millis: i64,
        action: PendingAction,
    ) -> Result<(), HostError> {
        if self.fail_alarm.load(Ordering::SeqCst) {
            return Err(HostError::Alarm {
                error: "exact alarms not permitted".into(),
            });
        }
        self.alarms.lock().push((clock, trigger_at_millis, action));
        Ok(())
    }
}

impl ServiceHost for FakeHost {
    fn start_foreground(&self, notification: &StickyNotification) -> Result<(), HostError> {
        if self.fail_foreground.load(Ordering::SeqCst) {
            return Err(HostError::ForegroundStart {
                error: "not allowed".into(),
            });
        }
        self.foreground_posts.lock().push(notification.clone());
        Ok(())
    }

    fn stop_self(&self) {
        self.stop_self_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn start_foreground_service(&self, component: &ComponentName) -> Result<(), HostError> {
        self.started.lock().push(component.clone());
        Ok(())
    }
}

impl Clock for FakeHost {
    fn now_millis(&self) -> i64 {
        NOW_MILLIS
    }
}

pub fn config() -> AgentConfig {
    AgentConfig::default()
}

/// Collects every event of `kind` currently buffered in `rx`.
pub fn drain_kind(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == kind {
            out.push(ev);
        }
    }
    out
}

/// Waits (bounded) until `rx` yields an event of `kind`.
pub async fn wait_for(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("bus closed"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
}

/// Push publisher that records every payload and can be told to fail.
#[derive(Default)]
pub struct RecordingPublisher {
    pub sent: Mutex<Vec<NotificationPayload>>,
    pub fail_with: Mutex<Option<u16>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl PushPublisher for RecordingPublisher {
    async fn send(&self, payload: &NotificationPayload) -> Result<String, PublishError> {
        if let Some(status) = *self.fail_with.lock() {
            return Err(PublishError::Rejected {
                status,
                body: "unavailable".into(),
            });
        }
        let mut sent = self.sent.lock();
        sent.push(payload.clone());
        Ok(format!("projects/test/messages/{}", sent.len()))
    }
}

/// Subscriber that keeps every event it is handed.
#[derive(Default)]
pub struct RecordingSubscriber {
    pub seen: Mutex<Vec<Event>>,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.seen.lock().iter().map(|e| e.kind).collect()
    }

    /// Waits (bounded) until an event of `kind` has been delivered.
    pub async fn wait_for(&self, kind: EventKind) -> Event {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if let Some(ev) = self.seen.lock().iter().find(|e| e.kind == kind) {
                    return ev.clone();
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("{kind:?} never reached the subscriber"))
    }
}

#[async_trait]
impl Subscribe for RecordingSubscriber {
    async fn on_event(&self, event: &Event) {
        self.seen.lock().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// In-memory sink for `tracing` output on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Routes this thread's tracing records into the capture until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Waits (bounded) until the captured output contains `needle`.
    pub async fn wait_for(&self, needle: &str) -> String {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let out = self.contents();
                if out.contains(needle) {
                    return out;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("no log line containing {needle:?}: {}", self.contents()))
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

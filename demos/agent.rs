//! # Agent Example
//!
//! Runs one supervisor lifecycle against a printing in-memory host, with the
//! built-in [`LogWriter`](agentvisor::LogWriter) rendering every event.
//!
//! The subordinate asks the supervisor to start, waits for `serviceStarted`,
//! then asks it to stop. The host answers by destroying the agent, and the
//! user swipes the task away afterwards, which queues the restart alarm.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example agent
//! ```

use std::sync::Arc;
use std::time::Duration;

use agentvisor::host::{
    AlarmClock, AlarmScheduler, ComponentName, HostBindings, NotificationManager, PendingAction,
    PowerManager, ServiceHost, StatusChannelConfig, StickyNotification, SystemClock, WakeLock,
};
use agentvisor::{
    AgentConfig, HostError, LogWriter, StartCommand, StartError, Subscribe, SubordinateFn,
    SubordinatePort, SubordinateRef, SupervisorBuilder, SupervisorMessage,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct PrintHost {
    stop_requested: Notify,
}

struct PrintLock {
    held: bool,
}

impl WakeLock for PrintLock {
    fn acquire(&mut self, timeout: Duration) -> Result<(), HostError> {
        println!("[host] wake lock held for at most {timeout:?}");
        self.held = true;
        Ok(())
    }

    fn release(&mut self) -> Result<(), HostError> {
        println!("[host] wake lock released");
        self.held = false;
        Ok(())
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

impl PowerManager for PrintHost {
    fn new_wake_lock(&self, tag: &str) -> Result<Box<dyn WakeLock>, HostError> {
        println!("[host] new wake lock {tag}");
        Ok(Box::new(PrintLock { held: false }))
    }
}

impl NotificationManager for PrintHost {
    fn delete_channel(&self, id: &str) -> Result<(), HostError> {
        println!("[host] channel {id} deleted");
        Ok(())
    }

    fn create_channel(&self, config: &StatusChannelConfig) -> Result<(), HostError> {
        println!("[host] channel {} created ({:?})", config.id, config.importance);
        Ok(())
    }
}

impl AlarmScheduler for PrintHost {
    fn schedule_exact_wake_capable(
        &self,
        clock: AlarmClock,
        trigger_at_millis: i64,
        action: PendingAction,
    ) -> Result<(), HostError> {
        println!("[host] alarm {clock:?} at {trigger_at_millis} starts {}", action.target);
        Ok(())
    }
}

impl ServiceHost for PrintHost {
    fn start_foreground(&self, notification: &StickyNotification) -> Result<(), HostError> {
        println!("[host] foreground: {}", notification.title);
        Ok(())
    }

    fn stop_self(&self) {
        println!("[host] stop requested");
        self.stop_requested.notify_one();
    }

    fn start_foreground_service(&self, component: &ComponentName) -> Result<(), HostError> {
        println!("[host] start {component}");
        Ok(())
    }
}

/// Subordinate that runs a short conversation with the supervisor.
fn engine() -> SubordinateRef {
    SubordinateFn::arc("engine", |mut port: SubordinatePort, ctx: CancellationToken| async move {
        tokio::spawn(async move {
            match port.invoke("startService", serde_json::Value::Null).await {
                Ok(reply) => println!("[engine] startService -> {reply:?}"),
                Err(e) => println!("[engine] startService failed: {}", e.as_message()),
            }
            tokio::select! {
                msg = port.next_message() => {
                    if msg == Some(SupervisorMessage::ServiceStarted) {
                        println!("[engine] got serviceStarted");
                    }
                }
                _ = ctx.cancelled() => return,
            }
            if let Ok(reply) = port.invoke("stopService", serde_json::Value::Null).await {
                println!("[engine] stopService -> {reply:?}");
            }
            ctx.cancelled().await;
            println!("[engine] cancelled");
        });
        Ok::<(), StartError>(())
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let host = Arc::new(PrintHost {
        stop_requested: Notify::new(),
    });
    let bindings = HostBindings {
        power: host.clone(),
        notifications: host.clone(),
        alarms: host.clone(),
        service: host.clone(),
        clock: Arc::new(SystemClock),
    };
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let sup = SupervisorBuilder::new(AgentConfig::default(), bindings)
        .with_subordinate(engine())
        .with_subscribers(subscribers)
        .build();

    sup.create();
    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("[host] start-command -> {:?}", sup.on_start_command(&StartCommand::default()));

    host.stop_requested.notified().await;
    sup.destroy();
    sup.on_task_removed();

    // Let the subscriber workers flush.
    tokio::time::sleep(Duration::from_millis(100)).await;
}

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use agentvisor::control::{START_CONFIRMATION, STOP_CONFIRMATION};
use agentvisor::host::{AlarmClock, Importance, StatusChannelConfig};
use agentvisor::{
    AgentState, ControlReply, EventKind, LogWriter, StartCommand, StartDirective, StartError,
    Subscribe, SubordinateFn, SubordinatePort, SubordinateRef, SubordinateStatus, Supervisor,
    SupervisorBuilder, SupervisorMessage,
};
use common::{
    FakeHost, LogCapture, NOW_MILLIS, RecordingSubscriber, config, drain_kind, wait_for,
};
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

fn supervisor(host: &Arc<FakeHost>) -> Arc<Supervisor> {
    SupervisorBuilder::new(config(), host.bindings()).build()
}

fn with_subordinate(host: &Arc<FakeHost>, sub: SubordinateRef) -> Arc<Supervisor> {
    SupervisorBuilder::new(config(), host.bindings())
        .with_subordinate(sub)
        .build()
}

/// Subordinate that hands its port to the test and comes up immediately.
fn handing_subordinate() -> (SubordinateRef, mpsc::UnboundedReceiver<SubordinatePort>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sub: SubordinateRef = SubordinateFn::arc(
        "engine",
        move |port: SubordinatePort, _ctx: CancellationToken| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(port);
                Ok::<(), StartError>(())
            }
        },
    );
    (sub, rx)
}

async fn settle(
    mut status: watch::Receiver<SubordinateStatus>,
    done: impl Fn(&SubordinateStatus) -> bool,
) -> SubordinateStatus {
    tokio::time::timeout(Duration::from_secs(2), status.wait_for(|s| done(s)))
        .await
        .expect("subordinate status did not settle")
        .expect("status sender dropped")
        .clone()
}

#[tokio::test]
async fn wake_lock_is_acquired_once_and_released_once() {
    let host = FakeHost::new();
    let sup = supervisor(&host);

    sup.create();
    sup.create();
    assert_eq!(host.acquired(), 1);
    assert!(sup.is_wake_held());
    assert_eq!(
        host.wake.timeouts.lock().as_slice(),
        &[Duration::from_secs(600)]
    );

    sup.destroy();
    sup.destroy();
    sup.destroy();
    assert_eq!(host.released(), 1);
    assert_eq!(sup.state(), AgentState::Stopped);

    sup.create();
    assert_eq!(host.acquired(), 2);
    assert_eq!(sup.state(), AgentState::Running);
    sup.destroy();
    sup.destroy();
    assert_eq!(host.released(), 2);
}

#[tokio::test]
async fn expired_wake_lock_is_not_released() {
    let host = FakeHost::new();
    let sup = supervisor(&host);
    let mut rx = sup.bus().subscribe();

    sup.create();
    host.expire_wake();
    sup.destroy();

    assert_eq!(host.released(), 0);
    assert!(drain_kind(&mut rx, EventKind::WakeFailed).is_empty());
}

#[tokio::test]
async fn duplicate_create_is_reported_and_ignored() {
    let host = FakeHost::new();
    let sup = supervisor(&host);
    let mut rx = sup.bus().subscribe();

    sup.create();
    sup.create();

    assert_eq!(drain_kind(&mut rx, EventKind::CreateIgnored).len(), 1);
    assert_eq!(host.foreground_posts.lock().len(), 1);
}

#[tokio::test]
async fn start_command_is_sticky_whatever_the_subordinate_does() {
    let host = FakeHost::new();

    let none = supervisor(&host);
    none.create();
    assert_eq!(
        none.on_start_command(&StartCommand::default()),
        StartDirective::Sticky
    );

    let failing = with_subordinate(
        &host,
        SubordinateFn::arc(
            "broken",
            |_port: SubordinatePort, _ctx: CancellationToken| async {
                Err::<(), StartError>(StartError::Entrypoint {
                    error: "main not found".into(),
                })
            },
        ),
    );
    failing.create();
    let status = settle(failing.subordinate_status(), |s| {
        matches!(s, SubordinateStatus::Failed(_))
    })
    .await;
    assert_eq!(
        status,
        SubordinateStatus::Failed(StartError::Entrypoint {
            error: "main not found".into()
        })
    );
    assert_eq!(
        failing.on_start_command(&StartCommand::default()),
        StartDirective::Sticky
    );

    let (ok, _ports) = handing_subordinate();
    let ready = with_subordinate(&host, ok);
    ready.create();
    settle(ready.subordinate_status(), |s| *s == SubordinateStatus::Ready).await;
    assert_eq!(
        ready.on_start_command(&StartCommand::default()),
        StartDirective::Sticky
    );
}

#[tokio::test]
async fn failed_launch_leaves_the_supervisor_running() {
    let host = FakeHost::new();
    let sup = with_subordinate(&host, broken_subordinate());
    let mut rx = sup.bus().subscribe();

    sup.create();
    let failed = wait_for(&mut rx, EventKind::SubordinateFailed).await;
    assert_eq!(failed.component.as_deref(), Some("broken"));

    assert_eq!(sup.state(), AgentState::Running);
    assert!(sup.is_wake_held());
    assert!(!sup.has_control_channel());

    sup.on_start_command(&StartCommand::default());
    let dropped = wait_for(&mut rx, EventKind::ControlDropped).await;
    assert_eq!(dropped.method.as_deref(), Some("serviceStarted"));
    assert_eq!(dropped.reason.as_deref(), Some("no channel"));
}

fn broken_subordinate() -> SubordinateRef {
    SubordinateFn::arc(
        "broken",
        |_port: SubordinatePort, _ctx: CancellationToken| async {
            Err::<(), StartError>(StartError::Construction {
                error: "engine init failed".into(),
            })
        },
    )
}

#[tokio::test]
async fn failed_launch_is_logged_by_default() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let host = FakeHost::new();
    let sup = with_subordinate(&host, broken_subordinate());
    sup.create();

    let out = logs.wait_for("subordinate failed").await;
    assert!(out.contains("WARN"), "{out}");
    assert!(out.contains("broken"), "{out}");
    assert!(out.contains("engine init failed"), "{out}");
}

#[tokio::test]
async fn subscribers_receive_lifecycle_events() {
    let recorder = RecordingSubscriber::new();
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![recorder.clone(), Arc::new(LogWriter::new())];
    let host = FakeHost::new();
    let sup = SupervisorBuilder::new(config(), host.bindings())
        .with_subordinate(broken_subordinate())
        .with_subscribers(subscribers)
        .build();

    sup.create();
    let failed = recorder.wait_for(EventKind::SubordinateFailed).await;
    assert_eq!(failed.component.as_deref(), Some("broken"));
    assert!(failed.reason.as_deref().is_some_and(|r| r.contains("engine init failed")));

    let kinds = recorder.kinds();
    let created = kinds.iter().position(|k| *k == EventKind::AgentCreated);
    let starting = kinds.iter().position(|k| *k == EventKind::SubordinateStarting);
    assert!(created.is_some() && created < starting, "{kinds:?}");

    sup.destroy();
    recorder.wait_for(EventKind::AgentDestroyed).await;
}

#[tokio::test]
async fn empty_subscriber_list_runs_silent() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let host = FakeHost::new();
    let sup = SupervisorBuilder::new(config(), host.bindings())
        .with_subordinate(broken_subordinate())
        .with_subscribers(Vec::new())
        .build();
    let mut rx = sup.bus().subscribe();

    sup.create();
    wait_for(&mut rx, EventKind::SubordinateFailed).await;
    tokio::task::yield_now().await;
    assert!(!logs.contents().contains("subordinate failed"));
}

#[tokio::test]
async fn panicking_launch_is_contained() {
    let host = FakeHost::new();
    let sup = with_subordinate(
        &host,
        SubordinateFn::arc(
            "panicky",
            |_port: SubordinatePort, _ctx: CancellationToken| async {
                if true {
                    panic!("engine exploded");
                }
                Ok::<(), StartError>(())
            },
        ),
    );

    sup.create();
    let status = settle(sup.subordinate_status(), |s| {
        matches!(s, SubordinateStatus::Failed(_))
    })
    .await;
    assert_eq!(
        status,
        SubordinateStatus::Failed(StartError::Panicked {
            info: "engine exploded".into()
        })
    );
    assert_eq!(sup.state(), AgentState::Running);
}

#[tokio::test]
async fn service_started_reaches_a_ready_subordinate() {
    let host = FakeHost::new();
    let (sub, mut ports) = handing_subordinate();
    let sup = with_subordinate(&host, sub);

    sup.create();
    let mut port = ports.recv().await.expect("port");
    settle(sup.subordinate_status(), |s| *s == SubordinateStatus::Ready).await;
    assert!(sup.has_control_channel());

    sup.on_start_command(&StartCommand::default());
    sup.on_start_command(&StartCommand::default());

    assert_eq!(
        port.next_message().await,
        Some(SupervisorMessage::ServiceStarted)
    );
    assert_eq!(
        port.next_message().await,
        Some(SupervisorMessage::ServiceStarted)
    );
}

#[tokio::test]
async fn messages_before_ready_are_dropped_not_queued() {
    let host = FakeHost::new();
    let (gate_tx, gate_rx) = watch::channel(false);
    let (port_tx, mut ports) = mpsc::unbounded_channel();
    let sub = SubordinateFn::arc(
        "slow",
        move |port: SubordinatePort, _ctx: CancellationToken| {
            let mut gate = gate_rx.clone();
            let port_tx = port_tx.clone();
            async move {
                let _ = gate.wait_for(|open| *open).await;
                let _ = port_tx.send(port);
                Ok::<(), StartError>(())
            }
        },
    );
    let sup = with_subordinate(&host, sub);
    let mut rx = sup.bus().subscribe();

    sup.create();
    sup.on_start_command(&StartCommand::default());
    wait_for(&mut rx, EventKind::ControlDropped).await;

    gate_tx.send_replace(true);
    let mut port = ports.recv().await.expect("port");
    settle(sup.subordinate_status(), |s| *s == SubordinateStatus::Ready).await;

    assert_eq!(port.try_next_message(), None);
}

#[tokio::test]
async fn control_requests_are_answered() {
    let host = FakeHost::new();
    let sup = supervisor(&host);
    sup.create();

    assert_eq!(
        sup.handle_control_message("startService", Value::Null),
        ControlReply::success(START_CONFIRMATION)
    );
    assert_eq!(sup.state(), AgentState::Running);
    assert_eq!(host.stop_self_calls(), 0);

    for method in ["pause", "", "StartService", "stopservice"] {
        assert_eq!(
            sup.handle_control_message(method, json!({"any": [1, 2]})),
            ControlReply::NotImplemented,
            "{method}"
        );
    }

    assert_eq!(
        sup.handle_control_message("stopService", json!("ignored")),
        ControlReply::success(STOP_CONFIRMATION)
    );
    assert_eq!(host.stop_self_calls(), 1);
}

#[tokio::test]
async fn bind_is_always_refused() {
    let host = FakeHost::new();
    let (sub, _ports) = handing_subordinate();
    let sup = with_subordinate(&host, sub);

    assert!(sup.on_bind(&StartCommand::default()).is_none());
    sup.create();
    settle(sup.subordinate_status(), |s| *s == SubordinateStatus::Ready).await;
    assert!(sup.on_bind(&StartCommand::default()).is_none());
}

#[tokio::test]
async fn subordinate_can_stop_the_agent_over_the_channel() {
    let host = FakeHost::new();
    let (sub, mut ports) = handing_subordinate();
    let sup = with_subordinate(&host, sub);

    sup.create();
    let port = ports.recv().await.expect("port");
    settle(sup.subordinate_status(), |s| *s == SubordinateStatus::Ready).await;

    let reply = port.invoke("startService", Value::Null).await.unwrap();
    assert_eq!(reply, ControlReply::success(START_CONFIRMATION));

    let reply = port.invoke("getLocation", Value::Null).await.unwrap();
    assert_eq!(reply, ControlReply::NotImplemented);

    let reply = port.invoke("stopService", Value::Null).await.unwrap();
    assert_eq!(reply, ControlReply::success(STOP_CONFIRMATION));
    assert_eq!(host.stop_self_calls(), 1);

    // The host answers stop_self with destroy.
    sup.destroy();
    assert_eq!(host.released(), 1);
    assert!(!sup.has_control_channel());
    assert!(port.invoke("startService", Value::Null).await.is_err());
}

#[tokio::test]
async fn destroy_cancels_the_subordinate() {
    let host = FakeHost::new();
    let (stopped_tx, mut stopped_rx) = mpsc::unbounded_channel::<()>();
    let sub = SubordinateFn::arc(
        "engine",
        move |_port: SubordinatePort, ctx: CancellationToken| {
            let stopped_tx = stopped_tx.clone();
            async move {
                tokio::spawn(async move {
                    ctx.cancelled().await;
                    let _ = stopped_tx.send(());
                });
                Ok::<(), StartError>(())
            }
        },
    );
    let sup = with_subordinate(&host, sub);

    sup.create();
    settle(sup.subordinate_status(), |s| *s == SubordinateStatus::Ready).await;
    sup.destroy();

    tokio::time::timeout(Duration::from_secs(2), stopped_rx.recv())
        .await
        .expect("subordinate was not cancelled");
    assert_eq!(*sup.subordinate_status().borrow(), SubordinateStatus::Stopped);
}

#[tokio::test]
async fn launch_finishing_after_destroy_is_discarded() {
    let host = FakeHost::new();
    let sub = SubordinateFn::arc(
        "hanging",
        |_port: SubordinatePort, _ctx: CancellationToken| async {
            std::future::pending::<()>().await;
            Ok::<(), StartError>(())
        },
    );
    let sup = with_subordinate(&host, sub);
    let mut rx = sup.bus().subscribe();

    sup.create();
    wait_for(&mut rx, EventKind::SubordinateStarting).await;
    sup.destroy();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!sup.has_control_channel());
    assert_eq!(*sup.subordinate_status().borrow(), SubordinateStatus::Stopped);
    assert!(drain_kind(&mut rx, EventKind::SubordinateFailed).is_empty());
}

#[tokio::test]
async fn task_removal_always_schedules_one_restart() {
    let host = FakeHost::new();
    let sup = supervisor(&host);
    let cfg = config();

    sup.on_task_removed();
    sup.create();
    sup.on_task_removed();
    sup.destroy();
    sup.on_task_removed();

    let alarms = host.alarms.lock();
    assert_eq!(alarms.len(), 3);
    for (clock, trigger_at, action) in alarms.iter() {
        assert_eq!(*clock, AlarmClock::RtcWakeup);
        assert!(*trigger_at >= NOW_MILLIS + 1000);
        assert_eq!(action.target, cfg.component);
        assert_eq!(action.request_code, 1);
        assert!(action.flags.immutable);
        assert!(action.flags.one_shot);
    }
}

#[tokio::test]
async fn refused_alarm_is_reported() {
    let host = FakeHost::new();
    host.fail_alarm.store(true, Ordering::SeqCst);
    let sup = supervisor(&host);
    let mut rx = sup.bus().subscribe();

    sup.on_task_removed();

    let failed = drain_kind(&mut rx, EventKind::RestartFailed);
    assert_eq!(failed.len(), 1);
    assert!(host.alarms.lock().is_empty());
}

#[tokio::test]
async fn status_channel_takes_the_latest_configuration() {
    let host = FakeHost::new();
    let first = supervisor(&host);
    first.create();
    first.destroy();

    let changed = StatusChannelConfig {
        importance: Importance::Low,
        display_name: "Arka plan".into(),
        ..StatusChannelConfig::default()
    };
    let mut cfg = config();
    cfg.status_channel = changed.clone();
    let second = SupervisorBuilder::new(cfg, host.bindings()).build();
    second.create();

    let channels = host.channels.lock();
    assert_eq!(channels.get(&changed.id), Some(&changed));
    assert_eq!(host.channel_deletes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn host_failures_during_create_are_not_fatal() {
    let host = FakeHost::new();
    host.fail_wake.store(true, Ordering::SeqCst);
    host.fail_foreground.store(true, Ordering::SeqCst);
    let (sub, mut ports) = handing_subordinate();
    let sup = with_subordinate(&host, sub);
    let mut rx = sup.bus().subscribe();

    sup.create();
    let _port = ports.recv().await.expect("port");
    settle(sup.subordinate_status(), |s| *s == SubordinateStatus::Ready).await;

    assert_eq!(sup.state(), AgentState::Running);
    assert!(!sup.is_wake_held());
    assert_eq!(drain_kind(&mut rx, EventKind::WakeFailed).len(), 1);

    sup.destroy();
    assert_eq!(sup.state(), AgentState::Stopped);
}

//! # agentvisor
//!
//! **Agentvisor** keeps a background agent alive on a host that would rather
//! kill it, and fans its SOS alerts out to every listening device.
//!
//! It has three parts:
//! - a lifecycle [`Supervisor`] that reacts to the host's service callbacks,
//!   holds a wake lock, keeps a sticky status notification up and launches a
//!   [`Subordinate`] execution context it talks to over a control channel;
//! - a [`BootTrigger`] that starts the supervised component after reboot;
//! - an [`AlertDispatcher`](dispatch::AlertDispatcher) that turns each appended
//!   alert record into one push notification on a broadcast topic.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   host callbacks                                        boot broadcasts
//!  (create, start-command,                                      │
//!   destroy, task-removed)                                      ▼
//!          │                                             ┌──────────────┐
//!          ▼                                             │ BootTrigger  │──► ServiceHost::start_foreground_service
//! ┌──────────────────────────────────────────────┐       └──────┬───────┘
//! │  Supervisor                                  │              │
//! │  - AgentState (Created → Running → Stopped)  │              │
//! │  - WakeResource (600 s ceiling)              │              │
//! │  - status channel + sticky notification      │              │
//! │  - ControlSender (once subordinate is up)    │              │
//! └──────┬──────────────────────┬────────────────┘              │
//!        │ spawn(launch)        │ publish(Event)                │ publish(Event)
//!        ▼                      ▼                               ▼
//! ┌──────────────┐   ┌───────────────────────────────────────────────────┐
//! │ Subordinate  │   │                 Bus (broadcast channel)           │
//! │  (own logic) │   └─────────────────────────┬─────────────────────────┘
//! └──────┬───────┘                             ▼
//!        │ "background_service"      ┌────────────────────┐
//!        └──── control channel ────► │ subscriber_listener │
//!                                    └─────────┬──────────┘
//!                                              ▼
//!                                        SubscriberSet
//!                                    ┌─────────┼─────────┐
//!                                    ▼         ▼         ▼
//!                                LogWriter   sub2      subN
//! ```
//!
//! ### Alert fanout
//! ```text
//! store append sos_alerts/{deviceId}/{alertId}
//!        │
//!        ▼
//! AlertDispatcher::handle ──► NotificationPayload ──► PushPublisher::send ──► topic "sos_alerts"
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Host-driven lifecycle of the background agent.               | [`Supervisor`], [`SupervisorBuilder`]       |
//! | **Host seam**     | Everything the supervisor needs from the device.             | [`HostBindings`], [`ServiceHost`]           |
//! | **Control**       | Typed method calls between supervisor and subordinate.       | [`ControlRequest`], [`SubordinatePort`]     |
//! | **Boot**          | Start after reboot.                                          | [`BootTrigger`], [`BootSignal`]             |
//! | **Fanout**        | One push notification per appended alert.                    | [`AlertDispatcher`](dispatch::AlertDispatcher), [`PushPublisher`](dispatch::PushPublisher) |
//! | **Subscriber API**| Hook into lifecycle events (logging, custom subscribers).     | [`Subscribe`]                               |
//! | **Configuration** | Defaults for every constant; YAML overrides.                 | [`AgentConfig`], [`DispatcherConfig`]       |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] (tracing renderer).
//! - `http`: exports [`HttpPublisher`](dispatch::HttpPublisher).
//! - `cli`: builds the `sos-dispatch` binary.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use serde_json::json;
//! use agentvisor::DispatcherConfig;
//! use agentvisor::dispatch::{AlertDispatcher, NotificationPayload, PushPublisher};
//!
//! struct Print;
//!
//! #[async_trait]
//! impl PushPublisher for Print {
//!     async fn send(&self, p: &NotificationPayload) -> Result<String, agentvisor::PublishError> {
//!         println!("{} -> {}", p.data.latitude, p.topic);
//!         Ok("m1".into())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), agentvisor::DispatchError> {
//!     let dispatcher = AlertDispatcher::new(DispatcherConfig::default(), Arc::new(Print));
//!     let record = json!({"deviceId": "d1", "alertId": "a1", "location": {"latitude": 41.0}});
//!     dispatcher.handle("sos_alerts/d1/a1", record).await?;
//!     Ok(())
//! }
//! ```
mod agent;
mod boot;
mod config;
mod error;
mod events;
mod subscribers;

pub mod control;
pub mod dispatch;
pub mod host;

// ---- Public re-exports ----

pub use agent::{
    AgentState, Lifecycle, Release, Subordinate, SubordinateFn, SubordinateRef, SubordinateStatus,
    Supervisor, SupervisorBuilder, WakeResource,
};
pub use boot::{BootOutcome, BootSignal, BootTrigger};
pub use config::{AgentConfig, CONTROL_CHANNEL, DispatcherConfig, from_yaml_str, load_yaml};
pub use control::{ControlReply, ControlRequest, SubordinatePort, SupervisorMessage};
pub use error::{ChannelError, ConfigError, DispatchError, HostError, PublishError, StartError};
pub use events::{Bus, Event, EventKind};
pub use host::{HostBindings, ServiceHost, StartCommand, StartDirective};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose the built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

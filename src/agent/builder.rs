use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::agent::subordinate::SubordinateRef;
use crate::agent::supervisor::Supervisor;
use crate::config::AgentConfig;
use crate::events::{Bus, Event};
use crate::host::HostBindings;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Supervisor`] wired to its host.
pub struct SupervisorBuilder {
    cfg: AgentConfig,
    host: HostBindings,
    subordinate: Option<SubordinateRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    runtime: Option<Handle>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration and host bindings.
    pub fn new(cfg: AgentConfig, host: HostBindings) -> Self {
        Self {
            cfg,
            host,
            subordinate: None,
            subscribers: default_subscribers(),
            runtime: None,
        }
    }

    /// Sets event subscribers for observability, replacing the defaults.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues. With the `logging` feature the default set is a single
    /// [`LogWriter`](crate::LogWriter); pass an empty list to run silent.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the subordinate context launched on every `create`.
    ///
    /// Without one the supervisor still manages the wake resource and status
    /// indicator, but the control channel never comes up.
    pub fn with_subordinate(mut self, subordinate: SubordinateRef) -> Self {
        self.subordinate = Some(subordinate);
        self
    }

    /// Sets the runtime that launches run on. Defaults to the current runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the supervisor and starts forwarding bus events to the subscribers.
    ///
    /// Must be called from within a tokio runtime unless [`with_runtime`](Self::with_runtime) was used.
    pub fn build(self) -> Arc<Supervisor> {
        let runtime = self.runtime.unwrap_or_else(Handle::current);
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let _guard = runtime.enter();
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            runtime.spawn(subscriber_listener(bus.subscribe(), subs, listener.clone()));
        }

        Arc::new(Supervisor::new_internal(
            self.cfg,
            self.host,
            self.subordinate,
            bus,
            runtime,
            listener,
        ))
    }
}

#[cfg(feature = "logging")]
fn default_subscribers() -> Vec<Arc<dyn Subscribe>> {
    vec![Arc::new(crate::subscribers::LogWriter::new())]
}

#[cfg(not(feature = "logging"))]
fn default_subscribers() -> Vec<Arc<dyn Subscribe>> {
    Vec::new()
}

/// Forwards bus events to the subscriber set until the supervisor is dropped.
///
/// Lagging behind the bus skips the missed events; the remaining queues are
/// drained before the workers exit.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    stop: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            ev = rx.recv() => match ev {
                Ok(ev) => subs.emit(&ev),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => {
                while let Ok(ev) = rx.try_recv() {
                    subs.emit(&ev);
                }
                break;
            }
        }
    }
    subs.shutdown().await;
}

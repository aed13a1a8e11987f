//! # The `background_service` control channel.
//!
//! One bounded `mpsc` queue per direction:
//!
//! ```text
//!   SubordinatePort::invoke(call) ──► [calls queue] ──► control loop ──► Supervisor::handle_control_message
//!            ▲                                                                   │
//!            └──────────────────────── oneshot reply ◄──────────────────────────┘
//!
//!   Supervisor::on_start_command ──► ControlSender::send ──► [messages queue] ──► SubordinatePort::next_message
//! ```
//!
//! ## Rules
//! - Messages are delivered in send order per direction; nothing orders the two directions.
//! - Nothing is queued for a channel that does not exist yet: the supervisor only
//!   gets a [`ControlSender`] once the subordinate has started.
//! - `ControlSender::send` never blocks; a full queue drops the message.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::control::message::{ControlReply, MethodCall, SupervisorMessage};
use crate::error::ChannelError;

/// A method call waiting for its reply.
#[derive(Debug)]
pub struct InboundCall {
    /// The raw call.
    pub call: MethodCall,
    reply: oneshot::Sender<ControlReply>,
}

impl InboundCall {
    /// Sends the reply. A caller that stopped waiting is ignored.
    pub fn respond(self, reply: ControlReply) {
        let _ = self.reply.send(reply);
    }
}

/// Supervisor-side sender for messages to the subordinate.
#[derive(Clone, Debug)]
pub struct ControlSender {
    name: Arc<str>,
    tx: mpsc::Sender<SupervisorMessage>,
}

impl ControlSender {
    /// Sends a message without waiting.
    pub fn send(&self, msg: SupervisorMessage) -> Result<(), ChannelError> {
        self.tx.try_send(msg).map_err(|_| ChannelError::Closed {
            channel: self.name.to_string(),
        })
    }

    /// True once the subordinate side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Supervisor end of a channel: outbound sender plus the inbound call queue.
#[derive(Debug)]
pub struct SupervisorEnd {
    /// Messages to the subordinate.
    pub sender: ControlSender,
    /// Calls from the subordinate.
    pub calls: mpsc::Receiver<InboundCall>,
}

/// Subordinate end of a channel.
#[derive(Debug)]
pub struct SubordinatePort {
    name: Arc<str>,
    calls: mpsc::Sender<InboundCall>,
    messages: mpsc::Receiver<SupervisorMessage>,
}

impl SubordinatePort {
    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls `method` on the supervisor and waits for its reply.
    pub async fn invoke(
        &self,
        method: impl Into<String>,
        payload: Value,
    ) -> Result<ControlReply, ChannelError> {
        let call = MethodCall::new(method, payload);
        let method = call.method.clone();
        let (reply, rx) = oneshot::channel();

        self.calls
            .send(InboundCall { call, reply })
            .await
            .map_err(|_| ChannelError::Closed {
                channel: self.name.to_string(),
            })?;
        rx.await.map_err(|_| ChannelError::NoReply { method })
    }

    /// Waits for the next message from the supervisor; `None` once the supervisor side is gone.
    pub async fn next_message(&mut self) -> Option<SupervisorMessage> {
        self.messages.recv().await
    }

    /// Returns a pending message without waiting.
    pub fn try_next_message(&mut self) -> Option<SupervisorMessage> {
        self.messages.try_recv().ok()
    }
}

/// Creates a connected channel pair. `capacity` is clamped to at least 1.
pub fn channel(name: impl Into<Arc<str>>, capacity: usize) -> (SupervisorEnd, SubordinatePort) {
    let name = name.into();
    let capacity = capacity.max(1);
    let (msg_tx, msg_rx) = mpsc::channel(capacity);
    let (call_tx, call_rx) = mpsc::channel(capacity);

    let end = SupervisorEnd {
        sender: ControlSender {
            name: Arc::clone(&name),
            tx: msg_tx,
        },
        calls: call_rx,
    };
    let port = SubordinatePort {
        name,
        calls: call_tx,
        messages: msg_rx,
    };
    (end, port)
}

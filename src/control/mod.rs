//! Control channel between the supervisor and its subordinate execution context.
//!
//! - [`message`]: typed requests, replies and supervisor messages
//! - [`channel`]: the in-process transport (`mpsc` per direction, `oneshot` replies)

mod channel;
mod message;

pub use channel::{ControlSender, InboundCall, SubordinatePort, SupervisorEnd, channel};
pub use message::{
    ControlReply, ControlRequest, MethodCall, START_CONFIRMATION, STOP_CONFIRMATION,
    SupervisorMessage,
};

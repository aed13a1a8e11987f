//! # Control messages.
//!
//! On the wire the control channel is method-call style: a method name plus an
//! untyped payload. [`ControlRequest::decode`] turns that into a typed request
//! exactly once, at the channel boundary; everything past that point matches
//! exhaustively on the enum.
//!
//! | direction              | method           | reply                                   |
//! |------------------------|------------------|-----------------------------------------|
//! | subordinate→supervisor | `startService`   | success(`"Servis başlatıldı"`)          |
//! | subordinate→supervisor | `stopService`    | success(`"Servis durduruldu"`) + stop   |
//! | subordinate→supervisor | anything else    | not implemented                         |
//! | supervisor→subordinate | `serviceStarted` | none                                    |

use serde_json::Value;

/// Reply text for `startService`.
pub const START_CONFIRMATION: &str = "Servis başlatıldı";
/// Reply text for `stopService`.
pub const STOP_CONFIRMATION: &str = "Servis durduruldu";

/// Raw method call as it travels over the channel.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodCall {
    /// Method name.
    pub method: String,
    /// Arbitrary payload (`Value::Null` when absent).
    pub payload: Value,
}

impl MethodCall {
    /// Creates a call with the given method and payload.
    pub fn new(method: impl Into<String>, payload: Value) -> Self {
        Self {
            method: method.into(),
            payload,
        }
    }
}

/// Typed request from the subordinate to the supervisor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlRequest {
    /// `startService`: confirm the agent is running.
    StartService,
    /// `stopService`: tear the agent down.
    StopService,
    /// Any other method name.
    Unknown {
        /// The unrecognized method.
        method: String,
    },
}

impl ControlRequest {
    /// Decodes a raw call. Payloads of known methods are ignored.
    pub fn decode(call: &MethodCall) -> Self {
        match call.method.as_str() {
            "startService" => ControlRequest::StartService,
            "stopService" => ControlRequest::StopService,
            other => ControlRequest::Unknown {
                method: other.to_string(),
            },
        }
    }

    /// Wire name of the request.
    pub fn method(&self) -> &str {
        match self {
            ControlRequest::StartService => "startService",
            ControlRequest::StopService => "stopService",
            ControlRequest::Unknown { method } => method,
        }
    }
}

/// Reply to a [`ControlRequest`].
#[derive(Clone, Debug, PartialEq)]
pub enum ControlReply {
    /// The call succeeded.
    Success(Value),
    /// The method is not supported by this side.
    NotImplemented,
}

impl ControlReply {
    /// Success with a text payload.
    pub fn success(text: &str) -> Self {
        ControlReply::Success(Value::String(text.to_string()))
    }

    /// True for [`ControlReply::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, ControlReply::Success(_))
    }
}

/// Message from the supervisor to the subordinate. No reply is expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorMessage {
    /// The host delivered a start command.
    ServiceStarted,
}

impl SupervisorMessage {
    /// Wire name of the message.
    pub fn method(&self) -> &'static str {
        match self {
            SupervisorMessage::ServiceStarted => "serviceStarted",
        }
    }
}

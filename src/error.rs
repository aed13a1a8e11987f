//! Error types used by the agent supervisor, the host bindings and the alert dispatcher.
//!
//! This module defines the following enums:
//!
//! - [`StartError`]: the subordinate execution context failed to come up.
//! - [`HostError`]: a host primitive (wake lock, notification, alarm, service start) failed.
//! - [`ChannelError`]: the control channel is gone or a reply never arrived.
//! - [`PublishError`]: the push delivery call failed.
//! - [`DispatchError`]: a single dispatcher invocation failed.
//! - [`ConfigError`]: configuration could not be loaded.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging.
//! Lifecycle callbacks never surface these errors to the host; they are turned
//! into [`Event`](crate::Event)s instead. Only the dispatcher propagates.

use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced while starting the subordinate execution context.
///
/// These are always swallowed by the supervisor: it stays `Running` with a
/// dead control channel.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// The context could not be constructed.
    #[error("subordinate construction failed: {error}")]
    Construction {
        /// The underlying error message.
        error: String,
    },

    /// The context was constructed but its initial entrypoint failed.
    #[error("subordinate entrypoint failed: {error}")]
    Entrypoint {
        /// The underlying error message.
        error: String,
    },

    /// The launcher panicked.
    #[error("subordinate launcher panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The supervisor was torn down before the launch finished.
    #[error("subordinate launch cancelled")]
    Canceled,
}

impl StartError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use agentvisor::StartError;
    ///
    /// let err = StartError::Entrypoint { error: "boom".into() };
    /// assert_eq!(err.as_label(), "start_entrypoint");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::Construction { .. } => "start_construction",
            StartError::Entrypoint { .. } => "start_entrypoint",
            StartError::Panicked { .. } => "start_panicked",
            StartError::Canceled => "start_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StartError::Construction { error } => format!("construction: {error}"),
            StartError::Entrypoint { error } => format!("entrypoint: {error}"),
            StartError::Panicked { info } => format!("panic: {info}"),
            StartError::Canceled => "launch cancelled".to_string(),
        }
    }
}

/// # Errors produced by host primitives.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Wake lock could not be created, acquired or released.
    #[error("wake lock failure: {error}")]
    WakeLock {
        /// The underlying error message.
        error: String,
    },

    /// Notification channel or foreground notification failure.
    #[error("notification failure: {error}")]
    Notification {
        /// The underlying error message.
        error: String,
    },

    /// The alarm facility refused the deferred restart.
    #[error("alarm scheduling failure: {error}")]
    Alarm {
        /// The underlying error message.
        error: String,
    },

    /// Elevated foreground start of the supervisor component failed.
    #[error("foreground start failure: {error}")]
    ForegroundStart {
        /// The underlying error message.
        error: String,
    },
}

impl HostError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HostError::WakeLock { .. } => "host_wake_lock",
            HostError::Notification { .. } => "host_notification",
            HostError::Alarm { .. } => "host_alarm",
            HostError::ForegroundStart { .. } => "host_foreground_start",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HostError::WakeLock { error } => format!("wake lock: {error}"),
            HostError::Notification { error } => format!("notification: {error}"),
            HostError::Alarm { error } => format!("alarm: {error}"),
            HostError::ForegroundStart { error } => format!("foreground start: {error}"),
        }
    }
}

/// # Errors produced by the control channel.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The other side of the channel is gone.
    #[error("control channel {channel} closed")]
    Closed {
        /// Channel name.
        channel: String,
    },

    /// The request was accepted but the reply sender was dropped.
    #[error("no reply for method {method}")]
    NoReply {
        /// Method name of the unanswered call.
        method: String,
    },
}

impl ChannelError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::Closed { .. } => "channel_closed",
            ChannelError::NoReply { .. } => "channel_no_reply",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ChannelError::Closed { channel } => format!("closed: {channel}"),
            ChannelError::NoReply { method } => format!("no reply: {method}"),
        }
    }
}

/// # Errors produced by the push delivery call.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// The request never reached the push service (connect, TLS, timeout...).
    #[error("push transport failed: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },

    /// The push service answered with a non-success status.
    #[error("push rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The payload could not be encoded.
    #[error("push payload encoding failed: {error}")]
    Encode {
        /// The underlying error message.
        error: String,
    },
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::Transport { .. } => "publish_transport",
            PublishError::Rejected { .. } => "publish_rejected",
            PublishError::Encode { .. } => "publish_encode",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PublishError::Transport { error } => format!("transport: {error}"),
            PublishError::Rejected { status, .. } => format!("rejected: {status}"),
            PublishError::Encode { error } => format!("encode: {error}"),
        }
    }
}

/// # Errors produced by one dispatcher invocation.
///
/// Any of these fails the invocation; the invoking runtime decides about redelivery.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The append path does not match `sos_alerts/{deviceId}/{alertId}`.
    #[error("append path {path:?} does not match {collection}/{{deviceId}}/{{alertId}}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Expected collection prefix.
        collection: String,
    },

    /// The appended record could not be decoded.
    #[error("alert record decode failed: {details}")]
    Decode {
        /// Decoder message.
        details: String,
    },

    /// The publish call failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use agentvisor::DispatchError;
    ///
    /// let err = DispatchError::Decode { details: "eof".into() };
    /// assert_eq!(err.as_label(), "dispatch_decode");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::InvalidPath { .. } => "dispatch_invalid_path",
            DispatchError::Decode { .. } => "dispatch_decode",
            DispatchError::Publish(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::InvalidPath { path, .. } => format!("invalid path: {path}"),
            DispatchError::Decode { details } => format!("decode: {details}"),
            DispatchError::Publish(e) => format!("publish: {e}"),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode {
            details: value.to_string(),
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for the expected shape.
    #[error("cannot parse config: {details}")]
    Parse {
        /// Parser message.
        details: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::Parse { .. } => "config_parse",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConfigError::Io { path, source } => format!("io: {}: {source}", path.display()),
            ConfigError::Parse { details } => format!("parse: {details}"),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Parse {
            details: value.to_string(),
        }
    }
}

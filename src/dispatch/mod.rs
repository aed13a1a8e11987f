//! Alert fanout: turns each appended SOS record into one topic notification.
//!
//! - [`AlertPath`], [`AlertRecord`]: what the store hands over
//! - [`NotificationPayload`]: what gets published
//! - [`PushPublisher`]: the delivery seam ([`HttpPublisher`] with the `http` feature)
//! - [`AlertDispatcher`]: one invocation per append

mod dispatcher;
#[cfg(feature = "http")]
mod http;
mod payload;
mod publisher;
mod record;

pub use dispatcher::AlertDispatcher;
#[cfg(feature = "http")]
pub use http::HttpPublisher;
pub use payload::{ALERT_TYPE, AlertData, NotificationPayload, NotificationText};
pub use publisher::PushPublisher;
pub use record::{AlertPath, AlertRecord, Location, coordinate_text};

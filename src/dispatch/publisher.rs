use async_trait::async_trait;

use crate::dispatch::payload::NotificationPayload;
use crate::error::PublishError;

/// # Push delivery seam.
///
/// One call publishes one payload to its topic. The result is awaited but only
/// inspected for success; the returned string is the push service's message id
/// and is used for logging only.
///
/// Topic fanout to subscribed devices happens inside the push service.
#[async_trait]
pub trait PushPublisher: Send + Sync + 'static {
    /// Publishes `payload` once.
    async fn send(&self, payload: &NotificationPayload) -> Result<String, PublishError>;

    /// Returns a stable, human-readable name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

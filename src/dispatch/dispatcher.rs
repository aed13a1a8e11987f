//! # AlertDispatcher: one push notification per appended alert.
//!
//! ```text
//! append(path, record) ──► AlertPath::parse ──► AlertRecord::from_value
//!                              │ Err → InvalidPath      │ Err → Decode
//!                              ▼                        ▼
//!                      [semaphore permit] ──► NotificationPayload::for_alert
//!                                                       │
//!                                                       ▼
//!                                          PushPublisher::send (awaited once)
//!                                                       │ Err → Publish (invocation fails)
//!                                                       ▼
//!                                                   Ok(message id)
//! ```
//!
//! Invocations share nothing but the optional concurrency permit, and run in
//! any order. There is no dedup: the same record delivered twice is published
//! twice.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::DispatcherConfig;
use crate::dispatch::payload::NotificationPayload;
use crate::dispatch::publisher::PushPublisher;
use crate::dispatch::record::{AlertPath, AlertRecord};
use crate::error::DispatchError;

/// Turns appended alert records into topic notifications.
#[derive(Clone)]
pub struct AlertDispatcher {
    cfg: DispatcherConfig,
    publisher: Arc<dyn PushPublisher>,
    permits: Option<Arc<Semaphore>>,
}

impl AlertDispatcher {
    /// Creates a dispatcher. `cfg.max_concurrent = 0` disables the concurrency cap.
    pub fn new(cfg: DispatcherConfig, publisher: Arc<dyn PushPublisher>) -> Self {
        let permits = cfg.concurrency_limit().map(|n| Arc::new(Semaphore::new(n)));
        Self {
            cfg,
            publisher,
            permits,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.cfg
    }

    /// Handles one append event with a raw JSON record.
    pub async fn handle_json(&self, path: &str, raw: &str) -> Result<String, DispatchError> {
        let value: Value = serde_json::from_str(raw)?;
        self.handle(path, value).await
    }

    /// Handles one append event.
    ///
    /// Returns the push service's message id once the publish call resolved.
    pub async fn handle(&self, path: &str, record: Value) -> Result<String, DispatchError> {
        let path = AlertPath::parse(path, &self.cfg.collection)?;
        let record = AlertRecord::from_value(record)?;
        self.handle_record(&path, &record).await
    }

    /// Handles an already decoded record.
    pub async fn handle_record(
        &self,
        path: &AlertPath,
        record: &AlertRecord,
    ) -> Result<String, DispatchError> {
        // The semaphore is never closed, so `acquire` only fails in theory.
        let _permit = match &self.permits {
            Some(sem) => sem.acquire().await.ok(),
            None => None,
        };

        let payload = NotificationPayload::for_alert(record, &self.cfg);
        if payload.data.latitude.is_empty() || payload.data.longitude.is_empty() {
            debug!(alert = %path, "alert without full location; sending empty coordinates");
        }

        match self.publisher.send(&payload).await {
            Ok(id) => {
                info!(
                    alert = %path,
                    topic = %payload.topic,
                    publisher = self.publisher.name(),
                    message_id = %id,
                    "sos notification published"
                );
                Ok(id)
            }
            Err(e) => {
                warn!(
                    alert = %path,
                    topic = %payload.topic,
                    publisher = self.publisher.name(),
                    label = e.as_label(),
                    error = %e,
                    "sos notification failed"
                );
                Err(e.into())
            }
        }
    }
}

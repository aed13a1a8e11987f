//! HTTP push publisher.
//!
//! Posts `{"message": payload}` to the configured endpoint, the shape of the
//! FCM HTTP v1 `messages:send` call. A 2xx answer is success; its `name`
//! field, when present, is returned as the message id.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dispatch::payload::NotificationPayload;
use crate::dispatch::publisher::PushPublisher;
use crate::error::PublishError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a NotificationPayload,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    name: Option<String>,
}

/// [`PushPublisher`] over HTTP.
#[derive(Clone, Debug)]
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpPublisher {
    /// Creates a publisher posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PublishError::Transport {
                error: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PushPublisher for HttpPublisher {
    async fn send(&self, payload: &NotificationPayload) -> Result<String, PublishError> {
        let body = serde_json::to_vec(&SendRequest { message: payload }).map_err(|e| {
            PublishError::Encode {
                error: e.to_string(),
            }
        })?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| PublishError::Transport {
            error: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| PublishError::Transport {
            error: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }
        let name = serde_json::from_str::<SendResponse>(&text)
            .ok()
            .and_then(|r| r.name)
            .unwrap_or_default();
        Ok(name)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

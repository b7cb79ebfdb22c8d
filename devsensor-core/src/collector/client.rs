//! HTTP client for the remote collector's events API

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use thiserror::Error;

use crate::config::SensorConfig;
use crate::error::{Error, Result};
use crate::event::EventRecord;

use super::wire::{EventBatch, SensorIdentity};
use super::{Deliver, DeliveryOutcome};

/// Opaque user credential, handed in by whoever loaded the configuration
#[derive(Clone)]
pub struct Credential {
    pub user: String,
    pub key: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Response from POST /sensors/events
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct EventsResponse {
    /// Number of events accepted
    #[serde(default)]
    pub accepted: usize,
    /// Number of events rejected (duplicates, validation errors)
    #[serde(default)]
    pub rejected: usize,
}

/// Why a send did not succeed
#[derive(Debug, Error)]
pub enum SendError {
    /// Connection, DNS, TLS or timeout failure
    #[error("HTTP request failed: {message}")]
    Transport { message: String, timeout: bool },

    /// The server answered with a non-success status
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The server answered 2xx with a body we could not read
    #[error("failed to parse response: {0}")]
    InvalidResponse(String),
}

impl SendError {
    /// Whether sending the same batch later could succeed
    ///
    /// Transport failures, timeouts, 5xx and 429 are transient; other
    /// statuses mean the server will keep refusing this batch.
    pub fn is_retryable(&self) -> bool {
        match self {
            SendError::Transport { .. } => true,
            SendError::Status { status, .. } => *status >= 500 || *status == 429,
            SendError::InvalidResponse(_) => false,
        }
    }
}

impl From<reqwest::Error> for SendError {
    fn from(e: reqwest::Error) -> Self {
        SendError::Transport {
            timeout: e.is_timeout(),
            message: e.to_string(),
        }
    }
}

impl From<SendError> for Error {
    fn from(e: SendError) -> Self {
        Error::Collector(e.to_string())
    }
}

/// HTTP client for the collector API
pub struct CollectorClient {
    http_client: reqwest::Client,
    base_url: String,
    identity: SensorIdentity,
}

impl CollectorClient {
    /// Create a client for `host` using `credential` for every request
    pub fn new(
        host: &str,
        credential: Credential,
        tool: &str,
        session_id: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = host.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("sensor.host must not be empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = format!("Bearer {}", credential.key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| Error::Config(format!("invalid key: {}", e)))?,
        );
        headers.insert(
            "X-Sensor-User",
            HeaderValue::from_str(&credential.user)
                .map_err(|e| Error::Config(format!("invalid user: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            identity: SensorIdentity {
                tool: tool.to_string(),
                session_id: session_id.to_string(),
                user: credential.user,
            },
        })
    }

    /// Create a client from sensor configuration
    ///
    /// Returns an error if the configuration is invalid or missing required fields.
    pub fn from_config(config: &SensorConfig, session_id: &str) -> Result<Self> {
        config.validate_collector()?;

        let host = config
            .host
            .as_deref()
            .ok_or_else(|| Error::Config("sensor.host is required".to_string()))?;
        let credential = Credential {
            user: config.user.clone().unwrap_or_default(),
            key: config.key.clone().unwrap_or_default(),
        };

        Self::new(
            host,
            credential,
            &config.tool,
            session_id,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Send one batch of records
    pub async fn send_events(
        &self,
        records: &[EventRecord],
    ) -> std::result::Result<EventsResponse, SendError> {
        let url = format!("{}/sensors/events", self.base_url);
        let body = EventBatch::new(&self.identity, records);

        let response = self.http_client.post(&url).json(&body).send().await?;
        let status = response.status();

        if status.is_success() {
            response
                .json::<EventsResponse>()
                .await
                .map_err(|e| SendError::InvalidResponse(e.to_string()))
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(SendError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Check if the collector is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);

        match self.http_client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    pub fn identity(&self) -> &SensorIdentity {
        &self.identity
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Classify a send result for one batch of `batch_size` records
pub fn classify(
    batch_size: usize,
    result: std::result::Result<EventsResponse, SendError>,
) -> DeliveryOutcome {
    match result {
        // A response without counts (`{}`) covers the whole batch
        Ok(response) if response.rejected == 0 => DeliveryOutcome::Success {
            accepted: response.accepted.max(batch_size),
        },
        Ok(response) if response.accepted == 0 && response.rejected >= batch_size => {
            DeliveryOutcome::TotalFailure {
                retryable: false,
                reason: format!("collector rejected all {} events", response.rejected),
            }
        }
        Ok(response) => DeliveryOutcome::PartialFailure {
            accepted: response.accepted,
            rejected: response.rejected,
        },
        Err(e) => DeliveryOutcome::TotalFailure {
            retryable: e.is_retryable(),
            reason: e.to_string(),
        },
    }
}

/// Blocking front-end over [`CollectorClient`]
///
/// Owns a small runtime so the sensor's plain threads can deliver without
/// being async themselves.
pub struct BlockingCollector {
    inner: CollectorClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingCollector {
    pub fn new(client: CollectorClient) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("devsensor-http")
            .enable_all()
            .build()
            .map_err(|e| Error::Collector(format!("failed to create runtime: {}", e)))?;

        Ok(Self {
            inner: client,
            runtime,
        })
    }

    /// Build from configuration; `None` when the sensor is not ready to deliver
    pub fn from_config(config: &SensorConfig, session_id: &str) -> Result<Option<Self>> {
        if !config.is_ready() {
            return Ok(None);
        }
        let client = CollectorClient::from_config(config, session_id)?;
        Self::new(client).map(Some)
    }

    /// Check if the collector is reachable (blocking)
    pub fn health_check(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.health_check())
    }

    pub fn client(&self) -> &CollectorClient {
        &self.inner
    }
}

impl Deliver for BlockingCollector {
    fn deliver(&self, batch: &[EventRecord]) -> DeliveryOutcome {
        let result = self.runtime.block_on(self.inner.send_events(batch));
        classify(batch.len(), result)
    }
}

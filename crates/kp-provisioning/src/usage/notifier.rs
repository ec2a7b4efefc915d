//! Usage notifiers: no-op and HTTP collection endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event::UsageEvent;

#[derive(Error, Debug)]
pub enum UsageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Collection endpoint rejected event with status {status}")]
    Rejected { status: u16 },
}

/// Notifier configuration, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct UsageNotifierConfig {
    pub endpoint: String,
    pub tracking_id: String,
    pub app_name: String,
    pub app_version: String,
    pub timeout: Duration,
}

impl Default for UsageNotifierConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            tracking_id: String::new(),
            app_name: "keyprov".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            timeout: Duration::from_secs(2),
        }
    }
}

#[async_trait]
pub trait UsageNotifier: Send + Sync {
    async fn notify(&self, event: &UsageEvent) -> Result<(), UsageError>;

    fn is_enabled(&self) -> bool;
}

/// Notifier used when analytics is disabled
pub struct NoOpUsageNotifier;

#[async_trait]
impl UsageNotifier for NoOpUsageNotifier {
    async fn notify(&self, _event: &UsageEvent) -> Result<(), UsageError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Body posted to the collection endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsagePayload<'a> {
    tracking_id: &'a str,
    client_id: &'a str,
    #[serde(rename = "type")]
    hit_type: &'static str,
    category: &'a str,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    app_name: &'a str,
    app_version: &'a str,
}

pub struct HttpUsageNotifier {
    client: reqwest::Client,
    config: UsageNotifierConfig,
}

impl HttpUsageNotifier {
    pub fn new(config: UsageNotifierConfig) -> Result<Self, UsageError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        info!(endpoint = %config.endpoint, "HttpUsageNotifier initialized");

        Ok(Self { client, config })
    }

    fn payload<'a>(&'a self, event: &'a UsageEvent) -> UsagePayload<'a> {
        UsagePayload {
            tracking_id: &self.config.tracking_id,
            client_id: &event.client_id,
            hit_type: "event",
            category: &event.category,
            action: &event.action,
            label: event.label.as_deref(),
            app_name: &self.config.app_name,
            app_version: &self.config.app_version,
        }
    }
}

#[async_trait]
impl UsageNotifier for HttpUsageNotifier {
    async fn notify(&self, event: &UsageEvent) -> Result<(), UsageError> {
        let response = self
            .client
            .post(self.config.endpoint.as_str())
            .json(&self.payload(event))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UsageError::Rejected { status: status.as_u16() });
        }

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Fire-and-forget delivery. The returned handle never yields an error;
/// callers may await it to let delivery finish before shutdown.
pub fn notify_detached(notifier: Arc<dyn UsageNotifier>, event: UsageEvent) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !notifier.is_enabled() {
            return;
        }

        match notifier.notify(&event).await {
            Ok(()) => debug!(action = %event.action, "Usage event sent"),
            Err(e) => warn!(error = %e, action = %event.action, "Usage event dropped"),
        }
    })
}

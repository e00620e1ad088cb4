//! # RGBridge Sender
//!
//! Bounded retry with linear backoff. Attempt `n` that fails waits `n * base_delay`
//! before attempt `n + 1`; nothing is waited after the last attempt. There is no
//! durable queue: a delivery in flight when the process stops is lost.

use super::{DeliveryTransport, HttpTransport};
use crate::config::RgbridgeConfig;
use crate::error::BridgeResult;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Final error once every attempt returned a non-2xx status
pub const MAX_RETRIES_REACHED: &str = "Max retry attempts reached";

/// Delay after failed attempt `attempt` (1-based)
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

/// Record of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryAttempt {
    pub attempt: u32,
    /// Response status, absent when the request itself failed
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Outcome of `send_xml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub success: bool,
    pub response: Option<String>,
    pub error: Option<String>,
    pub attempts: Vec<DeliveryAttempt>,
}

impl DeliveryResult {
    /// Human-readable status reported back to the feed submitter
    pub fn status_message(&self) -> String {
        if self.success {
            "Delivered to RGBridge".to_string()
        } else {
            format!(
                "RGBridge delivery failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

/// Delivers translated XML to RGBridge
pub struct RgbridgeSender {
    transport: Arc<dyn DeliveryTransport>,
    max_retries: u32,
    base_delay: Duration,
}

impl RgbridgeSender {
    pub fn new(transport: Arc<dyn DeliveryTransport>, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            transport,
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    /// Sender over HTTP using the configured endpoint, credentials and retry policy
    pub fn from_config(config: &RgbridgeConfig) -> BridgeResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(
            Arc::new(transport),
            config.max_retries,
            config.retry_base_delay(),
        ))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Deliver an XML payload, retrying failed attempts up to `max_retries` in total.
    ///
    /// A request error on the final attempt ends with that error's text; if every
    /// attempt got a non-2xx response the error is [`MAX_RETRIES_REACHED`].
    #[instrument(skip(self, payload), fields(payload_len = payload.len(), max_retries = self.max_retries))]
    pub async fn send_xml(&self, payload: &str) -> DeliveryResult {
        let mut attempts = Vec::with_capacity(self.max_retries as usize);

        for attempt in 1..=self.max_retries {
            match self.transport.post(payload).await {
                Ok(response) if response.is_success() => {
                    info!(attempt, status = response.status, "Delivered payload to RGBridge");
                    attempts.push(DeliveryAttempt {
                        attempt,
                        status: Some(response.status),
                        error: None,
                    });
                    return DeliveryResult {
                        success: true,
                        response: Some(response.body),
                        error: None,
                        attempts,
                    };
                }
                Ok(response) => {
                    warn!(
                        attempt,
                        status = response.status,
                        body = %response.body,
                        "RGBridge rejected payload"
                    );
                    attempts.push(DeliveryAttempt {
                        attempt,
                        status: Some(response.status),
                        error: None,
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(attempt, error = %message, "RGBridge request failed");
                    attempts.push(DeliveryAttempt {
                        attempt,
                        status: None,
                        error: Some(message.clone()),
                    });
                    if attempt == self.max_retries {
                        return DeliveryResult {
                            success: false,
                            response: None,
                            error: Some(message),
                            attempts,
                        };
                    }
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(backoff_delay(self.base_delay, attempt)).await;
            }
        }

        warn!(attempts = attempts.len(), "Giving up on RGBridge delivery");
        DeliveryResult {
            success: false,
            response: None,
            error: Some(MAX_RETRIES_REACHED.to_string()),
            attempts,
        }
    }
}

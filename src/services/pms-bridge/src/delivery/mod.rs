//! Outbound delivery to RGBridge
//!
//! The sender owns the retry policy; the transport performs one authenticated POST.
//! Tests substitute the transport to script responses without a network.

pub mod sender;

pub use sender::{backoff_delay, DeliveryAttempt, DeliveryResult, RgbridgeSender};

use crate::config::RgbridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

/// Status and body of one downstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One POST of an XML payload to the downstream endpoint
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn post(&self, payload: &str) -> BridgeResult<TransportResponse>;
}

/// HTTP transport with Basic authentication
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(config: &RgbridgeConfig) -> BridgeResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("PMS-Bridge-Service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BridgeError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn post(&self, payload: &str) -> BridgeResult<TransportResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/xml")
            .body(payload.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(endpoint = %self.endpoint, status, "RGBridge responded");

        Ok(TransportResponse { status, body })
    }
}

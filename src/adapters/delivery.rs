use crate::domain::model::{DeliveryReceipt, DeliveryStatus, Recipient};
use crate::domain::ports::DeliverySink;
use crate::utils::error::{GymError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 模擬投遞：只寫 log 並回傳假的 message id，不會真的送出簡訊。
#[derive(Debug, Clone, Default)]
pub struct LogDeliverySink;

#[async_trait]
impl DeliverySink for LogDeliverySink {
    async fn send(&self, recipient: &Recipient, message: &str) -> Result<DeliveryReceipt> {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        let message_id = format!("mock_{}", &simple[..12]);

        tracing::info!(
            member_id = recipient.member_id,
            phone = %recipient.phone,
            message_id = %message_id,
            "[MOCK NOTIFICATION] {}",
            message
        );

        Ok(DeliveryReceipt {
            message_id,
            status: DeliveryStatus::Mock,
        })
    }
}

#[derive(Debug, Serialize)]
struct WebhookRequest<'a> {
    to: &'a str,
    name: &'a str,
    member_id: u64,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(alias = "request_id", alias = "id")]
    message_id: Option<String>,
}

/// 透過 HTTP webhook 交給簡訊供應商。
///
/// 非 2xx 或連線建立失敗代表訊息確定沒有送出（`DeliveryError`）；
/// 請求已送出但沒有拿到回應時回傳 `DeliveryUnconfirmed`。
#[derive(Clone)]
pub struct WebhookDeliverySink {
    client: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl fmt::Debug for WebhookDeliverySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookDeliverySink")
            .field("endpoint", &self.endpoint)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl WebhookDeliverySink {
    pub fn new(endpoint: String, auth_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            auth_token,
        })
    }
}

#[async_trait]
impl DeliverySink for WebhookDeliverySink {
    async fn send(&self, recipient: &Recipient, message: &str) -> Result<DeliveryReceipt> {
        let body = WebhookRequest {
            to: &recipient.phone,
            name: &recipient.name,
            member_id: recipient.member_id,
            message,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!("Posting message for member {} to {}", recipient.member_id, self.endpoint);
        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_builder() {
                GymError::DeliveryError {
                    member_id: recipient.member_id,
                    message: format!("request not sent: {}", e),
                }
            } else {
                GymError::DeliveryUnconfirmed {
                    member_id: recipient.member_id,
                    message: format!("no response from provider: {}", e),
                }
            }
        })?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GymError::DeliveryError {
                member_id: recipient.member_id,
                message: format!("provider returned {}: {}", status, text),
            });
        }

        let parsed: Option<WebhookResponse> = response.json().await.ok();
        let message_id = parsed
            .and_then(|r| r.message_id)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(DeliveryReceipt {
            message_id,
            status: DeliveryStatus::Sent,
        })
    }
}

/// 由設定決定的投遞端
#[derive(Debug, Clone)]
pub enum ConfiguredSink {
    Log(LogDeliverySink),
    Webhook(WebhookDeliverySink),
}

#[async_trait]
impl DeliverySink for ConfiguredSink {
    async fn send(&self, recipient: &Recipient, message: &str) -> Result<DeliveryReceipt> {
        match self {
            ConfiguredSink::Log(sink) => sink.send(recipient, message).await,
            ConfiguredSink::Webhook(sink) => sink.send(recipient, message).await,
        }
    }
}

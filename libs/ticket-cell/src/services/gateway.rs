use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

/// Delivery failures, classified for the retry policy: `Transient` is worth
/// another attempt, `Permanent` is not.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("transient delivery failure: {0}")]
    Transient(String),

    #[error("permanent delivery failure: {0}")]
    Permanent(String),

    #[error("messaging gateway is not configured")]
    NotConfigured,
}

/// External messaging provider boundary. Latency and availability are outside
/// this system's control; callers must treat every invocation as fallible.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// `idempotency_key` guards against double delivery when a retry follows
    /// a timeout that actually succeeded, where the provider honors it.
    async fn send(&self, to: &str, body: &str, idempotency_key: Uuid)
        -> Result<(), DeliveryError>;
}

/// Twilio WhatsApp client.
/// Based on: https://www.twilio.com/docs/whatsapp/api
pub struct WhatsAppGateway {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: String,
}

impl WhatsAppGateway {
    pub fn new(config: &AppConfig) -> Result<Self, DeliveryError> {
        if !config.is_messaging_configured() {
            return Err(DeliveryError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            account_sid: config.twilio_sid.clone(),
            auth_token: config.twilio_token.clone(),
            from_number: config.twilio_whatsapp_from.clone(),
            base_url: config.twilio_base_url.clone(),
        })
    }
}

#[async_trait]
impl MessagingGateway for WhatsAppGateway {
    async fn send(&self, to: &str, body: &str, idempotency_key: Uuid)
        -> Result<(), DeliveryError>
    {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );

        debug!("Sending WhatsApp message to {}", to);

        let params = [
            ("To", format!("whatsapp:{}", to)),
            ("From", format!("whatsapp:{}", self.from_number)),
            ("Body", body.to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header("Idempotency-Key", idempotency_key.to_string())
            .form(&params)
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("WhatsApp message accepted for {}", to);
            return Ok(());
        }

        let response_text = response.text().await.unwrap_or_default();
        error!("WhatsApp delivery failed: {} - {}", status, response_text);

        if is_transient(status) {
            Err(DeliveryError::Transient(format!(
                "HTTP {}: {}",
                status, response_text
            )))
        } else {
            Err(DeliveryError::Permanent(format!(
                "HTTP {}: {}",
                status, response_text
            )))
        }
    }
}

/// Stand-in used when messaging credentials are absent (local development,
/// CI). Ticket issuance keeps working; confirmations are recorded as failed.
pub struct DisabledGateway;

#[async_trait]
impl MessagingGateway for DisabledGateway {
    async fn send(&self, to: &str, _body: &str, _key: Uuid) -> Result<(), DeliveryError> {
        debug!("Messaging disabled; dropping confirmation for {}", to);
        Err(DeliveryError::NotConfigured)
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

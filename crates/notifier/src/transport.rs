//! Outbound mail transport.
//!
//! Production sends go through the Resend HTTP API. `send` returns
//! `Ok(false)` for a rejected send (the caller marks the item failed and
//! the next scan retries it) and `Err` only for infrastructure faults.

use async_trait::async_trait;
use serde_json::json;

use tenure_common::config::AppConfig;
use tenure_common::error::AppError;

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<bool, AppError>;
}

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Resend-backed transport.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let api_key = config
            .resend_api_key
            .clone()
            .ok_or_else(|| AppError::Config("RESEND_API_KEY not set".to_string()))?;
        let from = config
            .email_from
            .clone()
            .ok_or_else(|| AppError::Config("EMAIL_FROM not set".to_string()))?;
        Ok(Self::new(api_key, from))
    }
}

#[async_trait]
impl MailTransport for ResendMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<bool, AppError> {
        let mut payload = json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
        });
        let body_key = if is_html { "html" } else { "text" };
        payload[body_key] = json!(body);

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(%status, detail, to, "Mail provider rejected send");
            return Ok(false);
        }

        Ok(true)
    }
}

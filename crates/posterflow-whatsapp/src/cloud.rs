//! WhatsApp Business Cloud API binding.
//!
//! Requires an access token and Phone Number ID from Meta Business Suite;
//! both come from the `[whatsapp]` config section. The Phone Number ID is
//! the fixed sender address — recipients vary per call, the sender never
//! does.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use posterflow_core::config::{WhatsAppConfig, SEND_TIMEOUT_SECS};

use crate::{
    error::DeliveryError,
    phone,
    sender::{MediaSender, MessageReceipt},
};

/// Production [`MediaSender`] over the Cloud API `/messages` endpoint.
pub struct CloudApiSender {
    http: reqwest::Client,
    access_token: String,
    phone_number_id: String,
    api_base: String,
    default_country_code: String,
}

#[derive(Debug, Serialize)]
struct SendImageRequest<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    image: ImageLink<'a>,
}

#[derive(Debug, Serialize)]
struct ImageLink<'a> {
    link: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl CloudApiSender {
    /// Build a sender from config. Fails fast when credentials are missing —
    /// a dispatch loop without a usable channel has nothing to do.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, DeliveryError> {
        if config.access_token.is_empty() {
            return Err(DeliveryError::Config(
                "whatsapp.access_token not configured".into(),
            ));
        }
        if config.phone_number_id.is_empty() {
            return Err(DeliveryError::Config(
                "whatsapp.phone_number_id not configured".into(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .map_err(|e| DeliveryError::Config(format!("http client: {e}")))?;

        Ok(Self {
            http,
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            default_country_code: config.default_country_code.clone(),
        })
    }
}

#[async_trait::async_trait]
impl MediaSender for CloudApiSender {
    async fn send(&self, phone: &str, media_url: &str) -> Result<MessageReceipt, DeliveryError> {
        let to = phone::normalize(phone, &self.default_country_code)?;
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);

        let body = SendImageRequest {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: &to,
            message_type: "image",
            image: ImageLink { link: media_url },
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(format!("invalid provider response: {e}")))?;

        let message_id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .unwrap_or_else(|| "unknown".to_string());

        tracing::debug!(to = %to, message_id = %message_id, "WhatsApp media message accepted");
        Ok(MessageReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WhatsAppConfig {
        WhatsAppConfig {
            access_token: "token".into(),
            phone_number_id: "12345".into(),
            ..WhatsAppConfig::default()
        }
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let mut cfg = config();
        cfg.access_token.clear();
        assert!(matches!(
            CloudApiSender::new(&cfg),
            Err(DeliveryError::Config(_))
        ));

        let mut cfg = config();
        cfg.phone_number_id.clear();
        assert!(matches!(
            CloudApiSender::new(&cfg),
            Err(DeliveryError::Config(_))
        ));
    }

    #[test]
    fn request_body_matches_cloud_api_shape() {
        let body = SendImageRequest {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: "+919876543210",
            message_type: "image",
            image: ImageLink {
                link: "https://example.com/uploads/posters/p1.jpg",
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""messaging_product":"whatsapp""#));
        assert!(json.contains(r#""type":"image""#));
        assert!(json.contains(r#""link":"https://example.com/uploads/posters/p1.jpg""#));
    }

    #[test]
    fn response_with_no_messages_still_parses() {
        let parsed: SendResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.messages.is_empty());
    }
}

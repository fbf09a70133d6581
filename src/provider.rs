//! Twilio "create message" client behind the [`MessagingProvider`] trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{Sender, TwilioCredentials};

/// A message ready to hand to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Destination in E.164 form
    pub to: String,
    pub body: String,
}

/// What the provider reports back for an accepted message.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MessageReceipt {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn create_message(
        &self,
        credentials: &TwilioCredentials,
        message: &OutboundMessage,
    ) -> Result<MessageReceipt>;
}

/// Error body returned by Twilio on non-2xx responses.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    message: Option<String>,
}

pub struct TwilioClient {
    /// Shared HTTP client
    client: reqwest::Client,
    /// API root, e.g. `https://api.twilio.com`
    base_url: String,
}

impl TwilioClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn messages_endpoint(&self, account_sid: &str) -> String {
        format!(
            "{base}/2010-04-01/Accounts/{account_sid}/Messages.json",
            base = self.base_url
        )
    }
}

/// Form fields for the create-message call.
fn message_form<'a>(
    credentials: &'a TwilioCredentials,
    message: &'a OutboundMessage,
) -> Vec<(&'static str, &'a str)> {
    let mut form = vec![("To", message.to.as_str()), ("Body", message.body.as_str())];
    match &credentials.sender {
        Sender::MessagingService(sid) => form.push(("MessagingServiceSid", sid.as_str())),
        Sender::FromNumber(number) => form.push(("From", number.as_str())),
    }
    if let Some(url) = &credentials.status_callback {
        form.push(("StatusCallback", url.as_str()));
    }
    form
}

#[async_trait]
impl MessagingProvider for TwilioClient {
    async fn create_message(
        &self,
        credentials: &TwilioCredentials,
        message: &OutboundMessage,
    ) -> Result<MessageReceipt> {
        let response = self
            .client
            .post(self.messages_endpoint(&credentials.account_sid))
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .header("Accept", "application/json")
            .form(&message_form(credentials, message))
            .send()
            .await
            .context("Failed to send request to Twilio API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            // Twilio's own message is what callers act on, e.g. "Invalid 'To' Phone Number".
            if let Some(message) = serde_json::from_str::<TwilioErrorBody>(&body)
                .ok()
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty())
            {
                anyhow::bail!("{message}");
            }
            anyhow::bail!("Twilio API returned error status {}: {}", status, body);
        }

        response
            .json::<MessageReceipt>()
            .await
            .context("Failed to parse Twilio API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::json;

    #[derive(Clone, Default)]
    struct Seen {
        requests: Arc<Mutex<Vec<(String, Option<String>, HashMap<String, String>)>>>,
    }

    async fn fake_messages(
        State(seen): State<Seen>,
        Path(account): Path<String>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> impl IntoResponse {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let to = form.get("To").cloned().unwrap_or_default();
        seen.requests.lock().unwrap().push((account, auth, form));

        if to == "+10000000000" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "code": 21211,
                    "message": "Invalid 'To' Phone Number: +10000000000",
                    "status": 400
                })),
            );
        }
        if to == "+19999999999" {
            return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
        }
        (
            StatusCode::CREATED,
            Json(json!({"sid": "SM123", "status": "queued", "to": to})),
        )
    }

    async fn spawn_fake_twilio() -> (String, Seen) {
        let seen = Seen::default();
        let app = Router::new()
            .route(
                "/2010-04-01/Accounts/:account/Messages.json",
                post(fake_messages),
            )
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), seen)
    }

    fn credentials(sender: Sender, status_callback: Option<&str>) -> TwilioCredentials {
        TwilioCredentials {
            account_sid: "AC123".into(),
            auth_token: "token".into(),
            sender,
            status_callback: status_callback.map(str::to_string),
        }
    }

    fn message(to: &str) -> OutboundMessage {
        OutboundMessage {
            to: to.into(),
            body: "hello".into(),
        }
    }

    #[test]
    fn form_prefers_messaging_service_and_attaches_callback() {
        let creds = credentials(
            Sender::MessagingService("MG1".into()),
            Some("https://example.com/cb"),
        );
        let msg = message("+15551234567");
        let form = message_form(&creds, &msg);
        assert_eq!(
            form,
            vec![
                ("To", "+15551234567"),
                ("Body", "hello"),
                ("MessagingServiceSid", "MG1"),
                ("StatusCallback", "https://example.com/cb"),
            ]
        );
    }

    #[test]
    fn form_falls_back_to_from_number() {
        let creds = credentials(Sender::FromNumber("+15550001111".into()), None);
        let msg = message("+15551234567");
        let form = message_form(&creds, &msg);
        assert!(form.contains(&("From", "+15550001111")));
        assert!(!form.iter().any(|(k, _)| *k == "StatusCallback"));
    }

    #[tokio::test]
    async fn creates_message_with_basic_auth() {
        let (base, seen) = spawn_fake_twilio().await;
        let client = TwilioClient::new(reqwest::Client::new(), base);

        let receipt = client
            .create_message(
                &credentials(Sender::FromNumber("+15550001111".into()), None),
                &message("+15551234567"),
            )
            .await
            .unwrap();

        assert_eq!(receipt.sid, "SM123");
        assert_eq!(receipt.status.as_deref(), Some("queued"));

        let requests = seen.requests.lock().unwrap();
        let (account, auth, form) = &requests[0];
        assert_eq!(account, "AC123");
        // base64("AC123:token")
        assert_eq!(auth.as_deref(), Some("Basic QUMxMjM6dG9rZW4="));
        assert_eq!(form.get("From").map(String::as_str), Some("+15550001111"));
        assert_eq!(form.get("Body").map(String::as_str), Some("hello"));
    }

    #[tokio::test]
    async fn twilio_error_message_is_surfaced_verbatim() {
        let (base, _) = spawn_fake_twilio().await;
        let client = TwilioClient::new(reqwest::Client::new(), base);

        let err = client
            .create_message(
                &credentials(Sender::FromNumber("+15550001111".into()), None),
                &message("+10000000000"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid 'To' Phone Number: +10000000000");
    }

    #[tokio::test]
    async fn error_without_message_reports_status() {
        let (base, _) = spawn_fake_twilio().await;
        let client = TwilioClient::new(reqwest::Client::new(), base);

        let err = client
            .create_message(
                &credentials(Sender::FromNumber("+15550001111".into()), None),
                &message("+19999999999"),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("503"));
    }
}

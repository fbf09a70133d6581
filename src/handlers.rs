use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::any;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::auth;
use crate::config::RelayConfig;
use crate::error::ApiError;
use crate::phone;
use crate::provider::{MessagingProvider, OutboundMessage};
use crate::types::{PingResponse, SendRequest, SendResponse};

/// Largest request body the relay will buffer.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub struct AppState {
    pub config: RelayConfig,
    pub provider: Arc<dyn MessagingProvider>,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/ping", any(ping))
        .route("/api/send-sms", any(send_sms))
        .with_state(state)
}

pub async fn ping(method: Method) -> Result<impl IntoResponse, ApiError> {
    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed { allow: "GET" });
    }
    Ok(Json(PingResponse {
        ok: true,
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

pub async fn send_sms(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed { allow: "POST" });
    }

    let request_id = Uuid::new_v4();

    if !auth::is_authorized(&headers, state.config.function_secret()) {
        warn!("[{}] rejected send-sms: bad or missing bearer token", request_id);
        return Err(ApiError::Unauthorized);
    }

    let credentials = state.config.twilio_credentials().map_err(|missing| {
        warn!("[{}] rejected send-sms: {}", request_id, missing);
        ApiError::Misconfigured(missing)
    })?;

    // Buffered only after method, auth and config have passed.
    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        warn!("[{}] rejected send-sms: unreadable body: {}", request_id, e);
        ApiError::PayloadTooLarge
    })?;

    // Unparseable bodies are treated like empty ones and fail the field check.
    let raw: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let req = SendRequest::from_json(&raw);

    let (to, text) = match (phone::to_e164(req.to.as_deref()), req.body) {
        (Some(to), Some(text)) => (to, text),
        _ => {
            warn!("[{}] rejected send-sms: missing to or body", request_id);
            return Err(ApiError::InvalidPayload);
        }
    };

    info!("[{}] sending SMS to {}", request_id, to);

    let message = OutboundMessage { to, body: text };
    let receipt = state
        .provider
        .create_message(&credentials, &message)
        .await
        .inspect_err(|e| warn!("[{}] provider rejected message: {:#}", request_id, e))?;

    info!("[{}] message {} accepted", request_id, receipt.sid);

    Ok((
        StatusCode::OK,
        Json(SendResponse {
            ok: true,
            sid: receipt.sid,
            to: message.to,
            message_status: receipt.status.unwrap_or_else(|| "queued".to_string()),
            metadata: req.metadata,
        }),
    ))
}

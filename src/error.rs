use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::types::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method Not Allowed")]
    MethodNotAllowed { allow: &'static str },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Misconfigured(String),

    #[error("Missing to or body")]
    InvalidPayload,

    #[error("Payload Too Large")]
    PayloadTooLarge,

    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidPayload => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Misconfigured(_) | Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text surfaced to the caller. Provider errors report their whole chain.
    fn message(&self) -> String {
        let message = match self {
            Self::Provider(err) => format!("{err:#}"),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let Self::MethodNotAllowed { allow } = self {
            return (
                status,
                [(header::ALLOW, allow)],
                "Method Not Allowed",
            )
                .into_response();
        }

        (
            status,
            Json(ErrorResponse {
                ok: false,
                error: self.message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn provider_message_is_passed_through_verbatim() {
        let err = ApiError::from(anyhow::anyhow!("Invalid 'To' number"));
        assert_eq!(err.message(), "Invalid 'To' number");
    }

    #[test]
    fn provider_context_chain_is_kept() {
        let inner: Result<(), std::io::Error> = Err(std::io::Error::other("connection reset"));
        let err = ApiError::from(inner.context("failed to reach Twilio API").unwrap_err());
        assert_eq!(err.message(), "failed to reach Twilio API: connection reset");
    }

    #[test]
    fn empty_provider_message_becomes_unknown_error() {
        let err = ApiError::from(anyhow::anyhow!(""));
        assert_eq!(err.message(), "Unknown error");
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            ApiError::MethodNotAllowed { allow: "GET" }.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Misconfigured("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::InvalidPayload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}

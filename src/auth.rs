use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively and must be followed by
/// whitespace.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, rest) = value.split_at_checked(6)?;
    if !scheme.eq_ignore_ascii_case("bearer") || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let token = rest.trim_start();
    (!token.is_empty()).then_some(token)
}

/// True when the request carries the configured shared secret.
///
/// With no secret configured every request is rejected.
pub fn is_authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    match (bearer_token(headers), secret) {
        (Some(token), Some(secret)) => token.as_bytes().ct_eq(secret.as_bytes()).into(),
        _ => false,
    }
}

//! Bearer-token guard.
//!
//! Token validation proper is an external concern; this guard only unwraps the
//! authenticated user id the upstream gateway encodes into the bearer token
//! (base64 of the user's UUID) and makes it available to handlers as a request
//! extension.

use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::Engine;
use uuid::Uuid;

use crate::error::AppError;

/// Authenticated staff user attached to the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Encode a user id as a bearer token. Used by tests and tooling.
pub fn issue_token(user_id: Uuid) -> String {
    base64::engine::general_purpose::STANDARD.encode(user_id.to_string())
}

fn decode_token(token: &str) -> Option<Uuid> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(token)
        .ok()?;
    let text = String::from_utf8(bytes).ok()?;
    Uuid::parse_str(text.trim()).ok()
}

/// Middleware rejecting requests without a decodable bearer token.
pub async fn require_bearer(mut request: Request, next: Next) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let user_id = decode_token(token).ok_or(AppError::Unauthorized)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(decode_token(&issue_token(id)), Some(id));
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert_eq!(decode_token("not-base64!!"), None);
        let not_a_uuid = base64::engine::general_purpose::STANDARD.encode("hello");
        assert_eq!(decode_token(&not_a_uuid), None);
    }
}

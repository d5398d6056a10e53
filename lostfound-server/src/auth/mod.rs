//! JWT authentication module
//!
//! Tokens are issued by the external credential service and signed with a
//! shared HS256 secret. The `sub` claim is the user's UUID.
//!
//! Extractors:
//! - [`Caller`] derives the caller's [`Access`] once per request; a request
//!   without an `Authorization` header is anonymous.
//! - [`AuthenticatedUser`] requires a token and an existing user record.
//! - [`TokenIdentity`] validates the token only, for the sync endpoint that
//!   creates the user record on first sign-in.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use lostfound_core::{Access, User};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims carried by credential service tokens
#[derive(Debug, Deserialize)]
pub struct TokenClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Expiration time (validated by jsonwebtoken)
    #[allow(dead_code)]
    exp: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Validates HS256 tokens against the shared secret
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // Tokens are not issued for a specific audience
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, ApiError> {
        let data = decode::<TokenClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::auth_error("AUTH_TOKEN_EXPIRED", "Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ApiError::auth_error("AUTH_INVALID_TOKEN", "Invalid token signature")
                }
                _ => ApiError::auth_error(
                    "AUTH_INVALID_TOKEN",
                    format!("Token validation failed: {}", e),
                ),
            }
        })?;
        Ok(data.claims)
    }

    /// Validate a token and parse its subject as a user id.
    pub fn verify_subject(&self, token: &str) -> Result<(Uuid, TokenClaims), ApiError> {
        let claims = self.verify(token)?;
        let user_id = claims.sub.parse::<Uuid>().map_err(|_| {
            ApiError::auth_error("AUTH_INVALID_TOKEN", "Token subject is not a valid user id")
        })?;
        Ok((user_id, claims))
    }
}

/// Extract the Bearer token from the Authorization header
fn extract_bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| {
            ApiError::auth_error("AUTH_MISSING_TOKEN", "Missing Authorization header")
        })?;

    let auth_value = auth_header.to_str().map_err(|_| {
        ApiError::auth_error(
            "AUTH_INVALID_TOKEN",
            "Invalid Authorization header encoding",
        )
    })?;

    auth_value.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::auth_error(
            "AUTH_INVALID_TOKEN",
            "Authorization header must use Bearer scheme",
        )
    })
}

/// Resolve a token to its stored user record.
async fn resolve_user(token: &str, state: &AppState) -> Result<User, ApiError> {
    let (user_id, _) = state.tokens.verify_subject(token)?;

    state
        .store
        .find_user(user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, %user_id, "Failed to look up user");
            ApiError::internal("A database error occurred")
        })?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Capability of the current request.
///
/// - no `Authorization` header → `Access::Anonymous`
/// - invalid or expired token → 401
/// - valid token whose subject has no user record → 404
pub struct Caller(pub Access);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts
            .headers
            .contains_key(axum::http::header::AUTHORIZATION)
        {
            return Ok(Caller(Access::Anonymous));
        }

        let token = extract_bearer_token(parts)?;
        let user = resolve_user(token, state).await?;
        Ok(Caller(Access::from_user(user)))
    }
}

/// Authenticated user extractor that validates the token and resolves the user.
///
/// Use this for handlers that act on behalf of a known user.
pub struct AuthenticatedUser {
    pub user: User,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;
        let user = resolve_user(token, state).await?;
        Ok(AuthenticatedUser { user })
    }
}

/// Token claims extractor that validates the token without a user lookup.
///
/// Use this where the user may not exist yet (the sync endpoint).
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl FromRequestParts<AppState> for TokenIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts)?;
        let (user_id, claims) = state.tokens.verify_subject(token)?;

        Ok(TokenIdentity {
            user_id,
            email: claims.email,
            name: claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret";

    /// Test JWT claims for creating test tokens
    #[derive(Debug, Serialize)]
    struct TestClaims {
        sub: String,
        exp: u64,
        iat: u64,
        email: Option<String>,
    }

    fn now_epoch() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn create_test_token(sub: &str, exp: u64, secret: &str) -> String {
        let claims = TestClaims {
            sub: sub.to_string(),
            exp,
            iat: now_epoch(),
            email: Some("someone@example.com".to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn expect_auth_code(err: ApiError, expected: &str) {
        match err {
            ApiError::AuthError { code, .. } => assert_eq!(code, expected),
            other => panic!("Expected AuthError with {}, got: {:?}", expected, other),
        }
    }

    #[test]
    fn test_valid_token() {
        let id = Uuid::new_v4();
        let token = create_test_token(&id.to_string(), now_epoch() + 3600, SECRET);

        let (user_id, claims) = TokenVerifier::new(SECRET).verify_subject(&token).unwrap();
        assert_eq!(user_id, id);
        assert_eq!(claims.email.as_deref(), Some("someone@example.com"));
    }

    #[test]
    fn test_expired_token() {
        let token = create_test_token(&Uuid::new_v4().to_string(), now_epoch() - 3600, SECRET);
        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        expect_auth_code(err, "AUTH_TOKEN_EXPIRED");
    }

    #[test]
    fn test_wrong_secret() {
        let token = create_test_token(&Uuid::new_v4().to_string(), now_epoch() + 3600, "other");
        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        expect_auth_code(err, "AUTH_INVALID_TOKEN");
    }

    #[test]
    fn test_non_uuid_subject() {
        let token = create_test_token("user_42", now_epoch() + 3600, SECRET);
        let err = TokenVerifier::new(SECRET).verify_subject(&token).unwrap_err();
        expect_auth_code(err, "AUTH_INVALID_TOKEN");
    }

    #[test]
    fn test_invalid_token() {
        let err = TokenVerifier::new(SECRET)
            .verify("not-a-valid-jwt")
            .unwrap_err();
        expect_auth_code(err, "AUTH_INVALID_TOKEN");
    }

    #[test]
    fn test_extract_bearer_token_missing_header() {
        let (parts, _) = axum::http::Request::builder()
            .body(())
            .unwrap()
            .into_parts();

        let err = extract_bearer_token(&parts).unwrap_err();
        expect_auth_code(err, "AUTH_MISSING_TOKEN");
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        let (parts, _) = axum::http::Request::builder()
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap()
            .into_parts();

        let err = extract_bearer_token(&parts).unwrap_err();
        expect_auth_code(err, "AUTH_INVALID_TOKEN");
    }

    #[test]
    fn test_extract_bearer_token_success() {
        let (parts, _) = axum::http::Request::builder()
            .header("Authorization", "Bearer my-jwt-token")
            .body(())
            .unwrap()
            .into_parts();

        let token = extract_bearer_token(&parts).unwrap();
        assert_eq!(token, "my-jwt-token");
    }
}

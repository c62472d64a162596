//! HTTP client for the remote identity provider.
//!
//! This module provides the `IdentityClient` for the two account operations
//! the provider exposes (sign-up and sign-in with password), plus the
//! `IdentityApi` trait the session store consumes so the network can be
//! faked in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AuthError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the identity provider's account endpoints
pub const DEFAULT_PROVIDER_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Operation selector for account creation
const SIGN_UP_OP: &str = "accounts:signUp";

/// Operation selector for password sign-in
const SIGN_IN_OP: &str = "accounts:signInWithPassword";

/// HTTP request timeout in seconds.
/// 30s allows for slow provider responses while still failing fast.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Successful authentication result handed back to the caller.
///
/// `expires_in_secs` is the provider's token lifetime in whole seconds,
/// already parsed from the wire string.
#[derive(Debug, Clone)]
pub struct IdentityResponse {
    pub email: String,
    pub user_id: String,
    pub token: String,
    pub expires_in_secs: u64,
}

/// Boundary seam to the remote identity provider.
///
/// Both operations perform exactly one outbound request and never retry:
/// retry policy belongs to the caller, since a wrong-password attempt must
/// not be silently repeated.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Register a new account and return a fresh token.
    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentityResponse, AuthError>;

    /// Sign in to an existing account and return a fresh token.
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityResponse, AuthError>;
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    email: String,
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(rename = "idToken")]
    id_token: String,
    /// Token lifetime in seconds, as a string on the wire
    #[serde(rename = "expiresIn")]
    expires_in: String,
}

/// Identity provider client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    /// Create a client against the default provider endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, AuthError> {
        Self::with_base_url(DEFAULT_PROVIDER_URL, api_key)
    }

    /// Create a client against a custom provider endpoint
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Perform one account operation against the provider.
    /// Sign-up and sign-in share everything but the operation selector.
    async fn request(
        &self,
        operation: &str,
        email: &str,
        password: &str,
    ) -> Result<IdentityResponse, AuthError> {
        let url = format!("{}/{}?key={}", self.base_url, operation, self.api_key);

        let response = self
            .client
            .post(&url)
            .json(&AuthRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(operation, %status, "identity request rejected");
            return Err(AuthError::from_response_body(status, &body));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Failed(format!("malformed provider response: {}", e)))?;
        auth.try_into()
    }
}

impl TryFrom<AuthResponse> for IdentityResponse {
    type Error = AuthError;

    fn try_from(auth: AuthResponse) -> Result<Self, AuthError> {
        let expires_in_secs = auth
            .expires_in
            .parse::<u64>()
            .map_err(|_| AuthError::Failed(format!("non-numeric expiresIn: {}", auth.expires_in)))?;

        Ok(IdentityResponse {
            email: auth.email,
            user_id: auth.local_id,
            token: auth.id_token,
            expires_in_secs,
        })
    }
}

#[async_trait]
impl IdentityApi for IdentityClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<IdentityResponse, AuthError> {
        self.request(SIGN_UP_OP, email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityResponse, AuthError> {
        self.request(SIGN_IN_OP, email, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_parses_wire_fields() {
        let json = r#"{
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "email": "scout@example.com",
            "localId": "abc123",
            "idToken": "header.payload.sig",
            "registered": true,
            "refreshToken": "r-token",
            "expiresIn": "3600"
        }"#;

        let auth: AuthResponse = serde_json::from_str(json).expect("parse auth response");
        let response = IdentityResponse::try_from(auth).expect("convert auth response");
        assert_eq!(response.email, "scout@example.com");
        assert_eq!(response.user_id, "abc123");
        assert_eq!(response.token, "header.payload.sig");
        assert_eq!(response.expires_in_secs, 3600);
    }

    #[test]
    fn non_numeric_expiry_is_rejected() {
        let json = r#"{"email":"a@b.c","localId":"u","idToken":"t","expiresIn":"soon"}"#;
        let auth: AuthResponse = serde_json::from_str(json).expect("parse auth response");
        match IdentityResponse::try_from(auth) {
            Err(AuthError::Failed(msg)) => assert!(msg.contains("expiresIn")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn request_body_matches_provider_contract() {
        let body = AuthRequest {
            email: "scout@example.com",
            password: "hunter2",
            return_secure_token: true,
        };
        let json = serde_json::to_value(&body).expect("serialize request");
        assert_eq!(json["email"], "scout@example.com");
        assert_eq!(json["password"], "hunter2");
        assert_eq!(json["returnSecureToken"], true);
    }
}

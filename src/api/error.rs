use thiserror::Error;

/// Errors surfaced by the identity client and session store.
///
/// The provider's failure codes are a closed set; anything unrecognized
/// collapses into `Failed` so callers never have to match on raw code strings.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("an account with this email already exists")]
    EmailExists,

    #[error("no account exists for this email")]
    EmailNotFound,

    #[error("incorrect password")]
    InvalidPassword,

    #[error("authentication failed: {0}")]
    Failed(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("sign-in superseded by a later request or logout")]
    Superseded,
}

/// Maximum length for provider response bodies embedded in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl AuthError {
    /// Truncate a response body to avoid dragging excessive data into errors
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    /// Map a provider failure code (the nested `error.message` string) to the taxonomy
    pub fn from_provider_code(code: &str) -> Self {
        match code {
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "EMAIL_NOT_FOUND" => AuthError::EmailNotFound,
            "INVALID_PASSWORD" => AuthError::InvalidPassword,
            other => AuthError::Failed(Self::truncate_body(other)),
        }
    }

    /// Build an error from a non-success HTTP response body.
    /// The provider nests the code under `error.message`; a body that doesn't
    /// parse yields the generic kind with the (truncated) raw body attached.
    pub fn from_response_body(status: reqwest::StatusCode, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            error: ErrorDetail,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: String,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self::from_provider_code(&parsed.error.message),
            Err(_) => AuthError::Failed(format!(
                "status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_provider_codes_map_to_taxonomy() {
        assert!(matches!(
            AuthError::from_provider_code("EMAIL_EXISTS"),
            AuthError::EmailExists
        ));
        assert!(matches!(
            AuthError::from_provider_code("EMAIL_NOT_FOUND"),
            AuthError::EmailNotFound
        ));
        assert!(matches!(
            AuthError::from_provider_code("INVALID_PASSWORD"),
            AuthError::InvalidPassword
        ));
    }

    #[test]
    fn unknown_provider_code_is_generic() {
        match AuthError::from_provider_code("TOO_MANY_ATTEMPTS_TRY_LATER") {
            AuthError::Failed(msg) => assert_eq!(msg, "TOO_MANY_ATTEMPTS_TRY_LATER"),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn nested_error_body_is_parsed() {
        let body = r#"{"error":{"code":400,"message":"INVALID_PASSWORD","errors":[]}}"#;
        let err = AuthError::from_response_body(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, AuthError::InvalidPassword));
    }

    #[test]
    fn unparseable_error_body_is_generic() {
        let err =
            AuthError::from_response_body(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        match err {
            AuthError::Failed(msg) => assert!(msg.contains("502")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        match AuthError::from_response_body(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body) {
            AuthError::Failed(msg) => {
                assert!(msg.contains("truncated"));
                assert!(msg.len() < 700);
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}

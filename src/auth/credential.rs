//! The authenticated-session record and its persisted wire shape.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::IdentityResponse;

/// One authenticated session: identity, bearer token, and absolute expiry.
///
/// The token is opaque and never parsed or validated locally; `expires_at`
/// is the sole authority on validity. Absence of a session is modeled as
/// `Option<Credential>::None`, never as a credential with a blank token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Identity display label, not used for authorization decisions
    pub email: String,
    /// Opaque stable subject identifier
    pub user_id: String,
    /// Opaque bearer value
    pub token: String,
    /// Absolute instant after which the token is invalid
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a fresh provider response.
    /// The provider reports lifetime in seconds; expiry math is done in
    /// whole milliseconds.
    pub fn from_response(response: IdentityResponse, now: DateTime<Utc>) -> Self {
        let lifetime_ms = (response.expires_in_secs as i64).saturating_mul(1000);
        Self {
            email: response.email,
            user_id: response.user_id,
            token: response.token,
            expires_at: now + Duration::milliseconds(lifetime_ms),
        }
    }

    /// A credential is valid strictly before its expiry instant;
    /// an instant exactly equal to `expires_at` is already invalid.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whole milliseconds until expiry, clamped at zero
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_milliseconds().max(0) as u64
    }
}

/// Wire shape of the persisted session record.
///
/// Field names are part of the storage contract and must not change:
/// existing records were written with exactly this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedCredential {
    email: String,
    id: String,
    #[serde(rename = "_token")]
    token: String,
    #[serde(rename = "_tokenExpirationDate")]
    token_expiration_date: DateTime<Utc>,
}

impl From<&Credential> for PersistedCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            email: credential.email.clone(),
            id: credential.user_id.clone(),
            token: credential.token.clone(),
            token_expiration_date: credential.expires_at,
        }
    }
}

impl PersistedCredential {
    /// Reconstruct the credential, taking the persisted expiry verbatim.
    /// A record with an empty token is unusable and yields `None`.
    pub fn into_credential(self) -> Option<Credential> {
        if self.token.is_empty() {
            return None;
        }
        Some(Credential {
            email: self.email,
            user_id: self.id,
            token: self.token,
            expires_at: self.token_expiration_date,
        })
    }
}

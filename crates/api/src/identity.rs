//! Identity adapter: turns request credentials into a [`Principal`].
//!
//! Authentication itself belongs to the external identity provider; this
//! module only verifies the bearer token it issued. Tokens carry the subject
//! and a validity window. Roles are never read from the token.

use std::collections::HashSet;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bookwell_auth::{Principal, PrincipalId};

/// Source of the current principal for a request.
pub trait IdentityAdapter: Send + Sync {
    fn current_principal(&self, headers: &HeaderMap) -> Principal;
}

/// Bearer token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject / principal identifier.
    pub sub: PrincipalId,

    /// Issued-at timestamp.
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Validate the claim time window against `now`.
pub fn validate_claims(claims: &IdentityClaims, now: DateTime<Utc>) -> Result<(), IdentityError> {
    if claims.expires_at <= claims.issued_at {
        return Err(IdentityError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(IdentityError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(IdentityError::Expired);
    }
    Ok(())
}

/// HS256 bearer-token adapter.
pub struct JwtIdentityAdapter {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityAdapter {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time window lives in `issued_at`/`expires_at`, checked by `validate_claims`.
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn authenticate(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<PrincipalId, IdentityError> {
        let token = extract_bearer(headers)?;
        let data = jsonwebtoken::decode::<IdentityClaims>(token, &self.key, &self.validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims.sub)
    }
}

impl IdentityAdapter for JwtIdentityAdapter {
    fn current_principal(&self, headers: &HeaderMap) -> Principal {
        match self.authenticate(headers, Utc::now()) {
            Ok(id) => Principal::authenticated(id),
            Err(IdentityError::MissingToken) => Principal::anonymous(),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                Principal::anonymous()
            }
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, IdentityError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(IdentityError::MissingToken)?;

    let header = header
        .to_str()
        .map_err(|_| IdentityError::InvalidToken("non-ascii authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| IdentityError::InvalidToken("expected a bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(IdentityError::MissingToken);
    }

    Ok(token)
}

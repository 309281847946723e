//! Bearer token signing and verification (HS256)

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::TokenConfig;

/// Token signing/verification error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Signing(String),
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Token has expired")]
    Expired,
    #[error("Token is not yet valid")]
    NotYetValid,
    #[error("Token issuer or audience does not match")]
    IssuerMismatch,
}

/// Token subject
///
/// Issued as a JSON number. Strings are still accepted on the way in so a
/// non-numeric subject fails as malformed credentials rather than as a
/// decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Id(i64),
    Name(String),
}

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Subject,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl TokenClaims {
    /// Claims valid from now for `ttl`, issued and addressed to `issuer`
    pub fn for_principal(user_id: i64, issuer: &str, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        Self {
            sub: Subject::Id(user_id),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl),
            iss: issuer.to_string(),
            aud: issuer.to_string(),
        }
    }

    /// Subject as a principal id, `None` if it is not numeric
    pub fn principal_id(&self) -> Option<i64> {
        match &self.sub {
            Subject::Id(id) => Some(*id),
            Subject::Name(name) => name.parse().ok(),
        }
    }
}

/// Signs and verifies bearer tokens with a shared secret
#[derive(Clone)]
pub struct TokenAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    expiry: Duration,
    has_secret: bool,
}

impl fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("issuer", &self.issuer)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl TokenAuthenticator {
    pub fn new(config: &TokenConfig) -> Self {
        let secret = config.secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.issuer.as_str()]);
        // `sub` may be numeric, which the library's presence check does not
        // accept; `TokenClaims` requires the field instead.
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            expiry: config.expiry,
            has_secret: !secret.is_empty(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign `claims` as given
    pub fn issue(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        if !self.has_secret {
            return Err(TokenError::Signing("signing secret is not configured".into()));
        }
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Sign a fresh token for `user_id` with the configured lifetime
    pub fn issue_for(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue(&TokenClaims::for_principal(
            user_id,
            &self.issuer,
            self.expiry,
        ))
    }

    /// Verify signature, structure, timing window and issuer/audience
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                    TokenError::IssuerMismatch
                }
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;

        // The library accepts now == exp; the token is already dead at exp.
        if Utc::now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

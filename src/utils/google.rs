//! Google ID token verification.
//!
//! Validates bearer credentials against Google's published JWKS and extracts
//! the verified claims. Audience and issuer are always enforced; there is no
//! lenient variant. Verification is pure; no local state is mutated.

use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tracing::warn;

use crate::config::google::GoogleConfig;
use crate::utils::errors::AppError;

/// Issuers Google uses for ID tokens.
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Verified claims asserted by Google about the token bearer.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    pub email: String,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

impl GoogleClaims {
    pub fn full_name(&self) -> String {
        let mut name = String::new();
        if let Some(given) = &self.given_name {
            name.push_str(given);
        }
        if let Some(family) = &self.family_name {
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(family);
        }
        name
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// A malformed header (missing scheme or missing token segment) yields
/// `None` ("no credential supplied", never an error) so the caller can
/// fall back to an unauthenticated path.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?;
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Verification failure taxonomy.
#[derive(Debug)]
pub enum VerifyError {
    /// Signature, expiry, audience or claims validation failed.
    InvalidCredential,
    /// The identity provider could not be reached.
    UpstreamUnavailable,
}

impl VerifyError {
    /// Map to the HTTP error taxonomy without leaking upstream detail.
    pub fn into_app_error(self) -> AppError {
        match self {
            VerifyError::InvalidCredential => AppError::unauthorized("Invalid token".to_string()),
            VerifyError::UpstreamUnavailable => {
                AppError::unavailable("Identity provider unavailable".to_string())
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct GoogleTokenVerifier {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleTokenVerifier {
    pub fn new(config: GoogleConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    /// Verify an ID token and return its claims.
    ///
    /// Signature, expiry, audience (the configured client id) and issuer are
    /// all checked. The only network hop is the JWKS fetch, bounded by the
    /// configured timeout and retried once on transient failure.
    pub async fn verify_id_token(&self, token: &str) -> Result<GoogleClaims, VerifyError> {
        let header = decode_header(token).map_err(|e| {
            warn!(error = %e, "ID token header could not be decoded");
            VerifyError::InvalidCredential
        })?;
        let kid = header.kid.ok_or(VerifyError::InvalidCredential)?;

        let jwks = self.fetch_jwks().await?;
        let jwk = jwks.find(&kid).ok_or(VerifyError::InvalidCredential)?;
        let key = DecodingKey::from_jwk(jwk).map_err(|_| VerifyError::InvalidCredential)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.config.client_id]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<GoogleClaims>(token, &key, &validation).map_err(|e| {
            warn!(error = %e, "ID token failed validation");
            VerifyError::InvalidCredential
        })?;

        if data.claims.email_verified == Some(false) {
            return Err(VerifyError::InvalidCredential);
        }

        Ok(data.claims)
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, VerifyError> {
        match self.try_fetch_jwks().await {
            Ok(jwks) => Ok(jwks),
            // One retry on transient failure, then surface as 503-equivalent.
            Err(first) => {
                warn!(error = %first, "JWKS fetch failed, retrying once");
                self.try_fetch_jwks().await.map_err(|e| {
                    warn!(error = %e, "JWKS fetch failed after retry");
                    VerifyError::UpstreamUnavailable
                })
            }
        }
    }

    async fn try_fetch_jwks(&self) -> Result<JwkSet, reqwest::Error> {
        self.http
            .get(&self.config.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await
    }
}

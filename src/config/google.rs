use std::env;

/// Identity provider settings for Google ID token verification.
#[derive(Clone, Debug)]
pub struct GoogleConfig {
    /// OAuth client id; tokens must carry this audience.
    pub client_id: String,
    pub jwks_url: String,
    /// Timeout for the JWKS fetch, in seconds.
    pub timeout_secs: u64,
}

impl GoogleConfig {
    pub fn from_env() -> Self {
        Self {
            client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            jwks_url: env::var("GOOGLE_JWKS_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v3/certs".to_string()),
            timeout_secs: env::var("GOOGLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }
}

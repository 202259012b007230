use std::env;

/// What to do when a verified email has no matching account.
///
/// One policy per deployment; the two behaviors are never mixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountPolicy {
    /// Unknown email is an error; nothing is created.
    Strict,
    /// Unknown email provisions a new student account.
    Provision,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub account_policy: AccountPolicy,
    /// When set, verification requests for emails outside this domain are
    /// rejected before any store lookup.
    pub allowed_email_domain: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let account_policy = match env::var("ACCOUNT_POLICY").as_deref() {
            Ok("provision") => AccountPolicy::Provision,
            _ => AccountPolicy::Strict,
        };

        let allowed_email_domain = env::var("ALLOWED_EMAIL_DOMAIN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            account_policy,
            allowed_email_domain,
        }
    }
}

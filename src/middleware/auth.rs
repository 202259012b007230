use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;

use crate::modules::accounts::model::Account;
use crate::modules::accounts::service::AccountService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::google::bearer_token;

/// Extractor that verifies the bearer ID token, resolves the caller's
/// account and applies the lockout gate.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Account);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        // Malformed headers read as "no credential supplied".
        let token = bearer_token(header)
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let claims = state
            .google
            .verify_id_token(token)
            .await
            .map_err(|e| e.into_app_error())?;

        let resolved = AccountService::resolve(
            &state.db,
            &claims.email,
            state.auth_config.account_policy,
            Some((
                claims.given_name.as_deref().unwrap_or(""),
                claims.family_name.as_deref().unwrap_or(""),
            )),
        )
        .await?;

        let (account, _) = resolved.ok_or_else(|| {
            AppError::unauthorized("No user found with this email".to_string())
        })?;

        let lock = AccountService::reconcile_lock_state(&state.db, account.id, Utc::now()).await?;
        if lock.is_locked() {
            return Err(AppError::locked("Account temporarily locked".to_string()));
        }

        if !account.is_active {
            return Err(AppError::forbidden("Account is inactive".to_string()));
        }

        Ok(AuthUser(account))
    }
}

/// Caller metadata for the audit trail.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub ip: String,
    pub user_agent: String,
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();

        Ok(RequestMeta { ip, user_agent })
    }
}

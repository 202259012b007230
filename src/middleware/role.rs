//! Role-based authorization extractors.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::middleware::auth::AuthUser;
use crate::modules::accounts::model::Account;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Authenticated caller with teacher privileges (teacher or admin).
#[derive(Debug, Clone)]
pub struct RequireTeacher(pub Account);

impl FromRequestParts<AppState> for RequireTeacher {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(account) = AuthUser::from_request_parts(parts, state).await?;

        if !account.is_teacher() && !account.is_admin() {
            return Err(AppError::forbidden(
                "Teacher privileges required".to_string(),
            ));
        }

        Ok(RequireTeacher(account))
    }
}

/// Authenticated caller with admin privileges.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Account);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(account) = AuthUser::from_request_parts(parts, state).await?;

        if !account.is_admin() {
            return Err(AppError::forbidden(
                "Administrator privileges required".to_string(),
            ));
        }

        Ok(RequireAdmin(account))
    }
}

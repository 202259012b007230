use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::instrument;
use validator::ValidateEmail;

use crate::middleware::auth::RequestMeta;
use crate::state::AppState;
use crate::utils::audit::{AuditLevel, AuditRecord};
use crate::utils::errors::AppError;
use crate::utils::google::VerifyError;

use super::model::{
    Account, TokenVerifySuccess, VerifyFailure, VerifyRequest, VerifySuccess, VerifyTokenRequest,
    normalize_email,
};
use super::service::AccountService;

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(VerifyFailure::new(message))).into_response()
}

fn domain_allowed(email: &str, allowed: Option<&str>) -> bool {
    match allowed {
        None => true,
        Some(domain) => email
            .rsplit_once('@')
            .is_some_and(|(_, d)| d.eq_ignore_ascii_case(domain)),
    }
}

struct AuditContext<'a> {
    state: &'a AppState,
    email: &'a str,
    meta: &'a RequestMeta,
}

impl AuditContext<'_> {
    fn emit(&self, level: AuditLevel, message: &str, role: Option<&str>) {
        self.state.audit.record(&AuditRecord {
            level,
            message,
            email: self.email,
            ip: &self.meta.ip,
            user_agent: &self.meta.user_agent,
            role,
        });
    }
}

/// Verify that an account exists for an email and return its role.
///
/// The email is treated as already verified upstream unless the body also
/// carries a `token`, in which case the token is verified against the
/// identity provider and must assert the same email. Every branch emits one
/// audit record.
#[utoipa::path(
    post,
    path = "/api/accounts/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Account verified", body = VerifySuccess),
        (status = 400, description = "Missing or malformed email", body = VerifyFailure),
        (status = 401, description = "Invalid credential", body = VerifyFailure),
        (status = 404, description = "No account for this email", body = VerifyFailure),
        (status = 423, description = "Account temporarily locked", body = VerifyFailure),
        (status = 503, description = "Identity provider unavailable", body = VerifyFailure)
    ),
    tag = "Accounts"
)]
#[instrument(skip(state, dto))]
pub async fn verify_user(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(dto): Json<VerifyRequest>,
) -> Result<Response, AppError> {
    let supplied = dto.email.as_deref().unwrap_or("");
    let audit = AuditContext {
        state: &state,
        email: supplied,
        meta: &meta,
    };

    let Some(email) = dto.email.as_deref().filter(|e| !e.trim().is_empty()) else {
        audit.emit(AuditLevel::Warning, "Login attempt without email", None);
        return Ok(failure(StatusCode::BAD_REQUEST, "Email is required"));
    };

    if !email.validate_email() {
        audit.emit(AuditLevel::Warning, "Login attempt with malformed email", None);
        return Ok(failure(StatusCode::BAD_REQUEST, "Invalid email format"));
    }

    // Institutional domain allowlist, checked before any store lookup.
    if !domain_allowed(email, state.auth_config.allowed_email_domain.as_deref()) {
        audit.emit(
            AuditLevel::Warning,
            "Login attempt from disallowed email domain",
            None,
        );
        return Ok(failure(StatusCode::BAD_REQUEST, "Email domain not allowed"));
    }

    let resolved = AccountService::resolve(
        &state.db,
        email,
        state.auth_config.account_policy,
        None,
    )
    .await?;

    let Some((account, _)) = resolved else {
        audit.emit(AuditLevel::Warning, "Unrecognized login attempt", None);
        return Ok(failure(StatusCode::NOT_FOUND, "User not found in system"));
    };

    let now = Utc::now();
    let lock = AccountService::reconcile_lock_state(&state.db, account.id, now).await?;
    if lock.is_locked() {
        audit.emit(
            AuditLevel::Warning,
            "Verification attempt for locked account",
            Some(&account.role),
        );
        return Ok(failure(StatusCode::LOCKED, "Account temporarily locked"));
    }

    // Token-accompanied form: the credential must verify and assert the
    // same email; a bad credential counts against the lockout threshold.
    if let Some(token) = dto.token.as_deref() {
        match state.google.verify_id_token(token).await {
            Ok(claims) if normalize_email(&claims.email) == normalize_email(email) => {}
            Ok(_) | Err(VerifyError::InvalidCredential) => {
                AccountService::record_failed_attempt(&state.db, account.id, now).await?;
                audit.emit(
                    AuditLevel::Error,
                    "Invalid credential presented",
                    Some(&account.role),
                );
                return Ok(failure(StatusCode::UNAUTHORIZED, "Invalid token"));
            }
            Err(VerifyError::UpstreamUnavailable) => {
                audit.emit(
                    AuditLevel::Error,
                    "Identity provider unavailable",
                    Some(&account.role),
                );
                return Ok(failure(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Identity provider unavailable",
                ));
            }
        }
    }

    verification_success(&state, &audit, &account).await
}

/// Verify a Google ID token and return the bearer's account info.
///
/// Under the provisioning policy an unknown (verified) email creates a new
/// student account; `is_new_user` reports whether this request created it.
#[utoipa::path(
    post,
    path = "/api/accounts/verify-token",
    request_body = VerifyTokenRequest,
    responses(
        (status = 200, description = "Token verified", body = TokenVerifySuccess),
        (status = 400, description = "Missing token or disallowed domain", body = VerifyFailure),
        (status = 401, description = "Invalid credential", body = VerifyFailure),
        (status = 404, description = "No account for this identity", body = VerifyFailure),
        (status = 423, description = "Account temporarily locked", body = VerifyFailure),
        (status = 503, description = "Identity provider unavailable", body = VerifyFailure)
    ),
    tag = "Accounts"
)]
#[instrument(skip(state, dto))]
pub async fn verify_google_token(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(dto): Json<VerifyTokenRequest>,
) -> Result<Response, AppError> {
    let audit = AuditContext {
        state: &state,
        email: "-",
        meta: &meta,
    };

    let Some(token) = dto.token.as_deref().filter(|t| !t.is_empty()) else {
        audit.emit(AuditLevel::Warning, "Token verification without token", None);
        return Ok(failure(StatusCode::BAD_REQUEST, "No token provided"));
    };

    let claims = match state.google.verify_id_token(token).await {
        Ok(claims) => claims,
        Err(VerifyError::InvalidCredential) => {
            audit.emit(AuditLevel::Error, "Invalid token presented", None);
            return Ok(failure(StatusCode::UNAUTHORIZED, "Invalid token"));
        }
        Err(VerifyError::UpstreamUnavailable) => {
            audit.emit(AuditLevel::Error, "Identity provider unavailable", None);
            return Ok(failure(
                StatusCode::SERVICE_UNAVAILABLE,
                "Identity provider unavailable",
            ));
        }
    };

    let audit = AuditContext {
        state: &state,
        email: &claims.email,
        meta: &meta,
    };

    if !domain_allowed(&claims.email, state.auth_config.allowed_email_domain.as_deref()) {
        audit.emit(
            AuditLevel::Warning,
            "Login attempt from disallowed email domain",
            None,
        );
        return Ok(failure(StatusCode::BAD_REQUEST, "Email domain not allowed"));
    }

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

    let Some((account, created)) = resolved else {
        audit.emit(AuditLevel::Warning, "Unrecognized login attempt", None);
        return Ok(failure(StatusCode::NOT_FOUND, "User not found in system"));
    };

    let now = Utc::now();
    let lock = AccountService::reconcile_lock_state(&state.db, account.id, now).await?;
    if lock.is_locked() {
        audit.emit(
            AuditLevel::Warning,
            "Verification attempt for locked account",
            Some(&account.role),
        );
        return Ok(failure(StatusCode::LOCKED, "Account temporarily locked"));
    }

    AccountService::reset_failed_attempts(&state.db, account.id, now).await?;
    audit.emit(
        AuditLevel::Info,
        "Successful user verification",
        Some(&account.role),
    );

    Ok(Json(TokenVerifySuccess {
        status: "success".to_string(),
        email: account.email.clone(),
        role: account.role.clone(),
        name: account.full_name(),
        is_new_user: created,
    })
    .into_response())
}

async fn verification_success(
    state: &AppState,
    audit: &AuditContext<'_>,
    account: &Account,
) -> Result<Response, AppError> {
    AccountService::reset_failed_attempts(&state.db, account.id, Utc::now()).await?;
    audit.emit(
        AuditLevel::Info,
        "Successful user verification",
        Some(&account.role),
    );

    Ok(Json(VerifySuccess {
        status: "success".to_string(),
        role: account.role.clone(),
        name: account.full_name(),
    })
    .into_response())
}

//! Account entity, role definitions and verification DTOs.
//!
//! An account is keyed by its email (the sole authentication key) and tagged
//! with one of three roles. Role-dependent fields are cross-validated at
//! write time, producing a structured list of field-level violations rather
//! than a single opaque error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::errors::FieldViolation;

/// Account roles. Stored as lowercase text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub failed_login_attempts: i32,
    pub last_login_attempt: Option<DateTime<Utc>>,
    pub is_locked: bool,
    pub lock_expiry: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_student(&self) -> bool {
        self.role == "student"
    }

    pub fn is_teacher(&self) -> bool {
        self.role == "teacher"
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// Lock state as of `now`, without touching the store.
    ///
    /// An expired lock reads as [`LockState::Open`]; persisting that
    /// transition is `AccountService::reconcile_lock_state`'s job.
    pub fn lock_state(&self, now: DateTime<Utc>) -> LockState {
        match (self.is_locked, self.lock_expiry) {
            (true, Some(expiry)) if now <= expiry => LockState::Locked { until: expiry },
            _ => LockState::Open,
        }
    }
}

/// Post-reconciliation lockout state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Open,
    Locked { until: DateTime<Utc> },
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked { .. })
    }
}

/// Lowercase and trim an email for exact-match lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Fixed-length numeric student id.
pub fn is_valid_student_id(s: &str) -> bool {
    s.len() == 6 && s.chars().all(|c| c.is_ascii_digit())
}

/// Cross-field role validation, evaluated at write time.
///
/// Returns every violated rule; an empty vector means the combination is
/// valid.
pub fn validate_role_fields(
    role: Role,
    student_id: Option<&str>,
    department: Option<&str>,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    match role {
        Role::Student => {
            if let Some(id) = student_id {
                if !is_valid_student_id(id) {
                    violations.push(FieldViolation::new(
                        "student_id",
                        "must be a 6-digit number",
                    ));
                }
            }
            if department.is_some_and(|d| !d.is_empty()) {
                violations.push(FieldViolation::new(
                    "department",
                    "only teachers have a department",
                ));
            }
        }
        Role::Teacher | Role::Admin => {
            if student_id.is_some_and(|id| !id.is_empty()) {
                violations.push(FieldViolation::new(
                    "student_id",
                    "only students have a student id",
                ));
            }
            if role == Role::Admin && department.is_some_and(|d| !d.is_empty()) {
                violations.push(FieldViolation::new(
                    "department",
                    "only teachers have a department",
                ));
            }
        }
    }

    violations
}

/// Body for `POST /api/accounts/verify`.
///
/// `email` is required; `token` optionally carries a bearer credential to be
/// verified against the identity provider. Both are `Option` so missing
/// fields surface as 400s rather than deserialization failures.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    pub email: Option<String>,
    pub token: Option<String>,
}

/// Body for `POST /api/accounts/verify-token`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyTokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifySuccess {
    pub status: String,
    pub role: String,
    pub name: String,
}

/// Token-path success payload; additionally reports the verified email and
/// whether the account was provisioned by this request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenVerifySuccess {
    pub status: String,
    pub email: String,
    pub role: String,
    pub name: String,
    pub is_new_user: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyFailure {
    pub status: String,
    pub message: String,
    pub role: Option<String>,
}

impl VerifyFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            role: None,
        }
    }
}

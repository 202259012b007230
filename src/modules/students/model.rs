//! Student profile models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub grade: i32,
    pub hcpss_email: String,
    pub account_email: Option<String>,
    pub phone_num: Option<String>,
    pub theme: String,
    pub notifications_enabled: bool,
    pub teacher_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudentDto {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 9, max = 12))]
    pub grade: i32,
    #[validate(email)]
    pub hcpss_email: String,
    #[validate(email)]
    pub account_email: Option<String>,
    pub phone_num: Option<String>,
    /// "light" or "dark"; defaults to "light".
    pub theme: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub teacher_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(range(min = 9, max = 12))]
    pub grade: Option<i32>,
    #[validate(email)]
    pub hcpss_email: Option<String>,
    #[validate(email)]
    pub account_email: Option<String>,
    pub phone_num: Option<String>,
    pub theme: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub teacher_id: Option<Uuid>,
}

/// List filters; all optional and combinable.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct StudentFilterParams {
    /// Filter by grade (9-12).
    pub grade: Option<i32>,
    /// Filter by primary teacher id.
    pub teacher: Option<Uuid>,
    /// Case-insensitive name substring.
    pub search: Option<String>,
}

pub fn is_valid_theme(theme: &str) -> bool {
    matches!(theme, "light" | "dark")
}

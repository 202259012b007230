use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::utils::errors::FieldViolation;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassPeriod {
    pub id: Uuid,
    pub name: String,
    pub teacher_id: Uuid,
    pub room_number: String,
    pub capacity: i32,
    pub current_enrollment: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClassPeriodDto {
    #[validate(length(min = 1))]
    pub name: String,
    pub teacher_id: Uuid,
    #[validate(length(min = 1))]
    pub room_number: String,
    pub capacity: Option<i32>,
    pub current_enrollment: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateClassPeriodDto {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub teacher_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub room_number: Option<String>,
    pub capacity: Option<i32>,
    pub current_enrollment: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ClassPeriodFilterParams {
    /// Filter by teacher id.
    pub teacher: Option<Uuid>,
}

/// Enrollment must be non-negative and never exceed capacity.
pub fn validate_enrollment(capacity: i32, current_enrollment: i32) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    if capacity < 0 {
        violations.push(FieldViolation::new("capacity", "must be non-negative"));
    }
    if current_enrollment < 0 {
        violations.push(FieldViolation::new(
            "current_enrollment",
            "must be non-negative",
        ));
    }
    if current_enrollment > capacity {
        violations.push(FieldViolation::new(
            "current_enrollment",
            "exceeds capacity",
        ));
    }
    violations
}

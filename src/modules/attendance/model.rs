use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Attendance statuses. Stored as lowercase text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Tardy,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Tardy => "tardy",
            AttendanceStatus::Excused => "excused",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_period_id: Uuid,
    pub date: NaiveDate,
    pub status: String,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
    /// Account that last wrote this record; null if that account was
    /// deleted.
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAttendanceDto {
    pub student_id: Uuid,
    pub class_period_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAttendanceDto {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AttendanceFilterParams {
    /// Filter by student id.
    pub student: Option<Uuid>,
    /// Filter by class period id.
    pub class_period: Option<Uuid>,
    /// Filter by date (YYYY-MM-DD).
    pub date: Option<NaiveDate>,
}

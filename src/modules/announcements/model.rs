use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub teacher_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub target_grade: Option<i32>,
    pub is_urgent: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAnnouncementDto {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    /// Defaults to the calling teacher.
    pub teacher_id: Option<Uuid>,
    #[validate(range(min = 9, max = 12))]
    pub target_grade: Option<i32>,
    pub is_urgent: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AnnouncementFilterParams {
    /// Filter by authoring teacher id.
    pub teacher: Option<Uuid>,
    /// Filter by targeted grade (9-12).
    pub target_grade: Option<i32>,
}

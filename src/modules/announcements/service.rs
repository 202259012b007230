use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::accounts::model::Account;
use crate::modules::accounts::service::AccountService;
use crate::modules::announcements::model::{
    Announcement, AnnouncementFilterParams, CreateAnnouncementDto,
};
use crate::utils::errors::AppError;

const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, body, teacher_id, timestamp, target_grade, is_urgent";

pub struct AnnouncementService;

impl AnnouncementService {
    #[instrument(skip(db, dto, caller))]
    pub async fn create_announcement(
        db: &PgPool,
        dto: CreateAnnouncementDto,
        caller: &Account,
    ) -> Result<Announcement, AppError> {
        let teacher_id = dto.teacher_id.unwrap_or(caller.id);
        AccountService::ensure_teacher(db, teacher_id).await?;

        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            "INSERT INTO announcements (title, body, teacher_id, target_grade, is_urgent) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ANNOUNCEMENT_COLUMNS}"
        ))
        .bind(&dto.title)
        .bind(&dto.body)
        .bind(teacher_id)
        .bind(dto.target_grade)
        .bind(dto.is_urgent.unwrap_or(false))
        .fetch_one(db)
        .await
        .context("Failed to create announcement")
        .map_err(AppError::database)?;

        Ok(announcement)
    }

    /// Announcements visible to the caller, newest first.
    ///
    /// Admins see everything (subject to filters), teachers their own, and
    /// students their primary teacher's. A caller with no student profile
    /// sees an empty list rather than an error.
    #[instrument(skip(db, caller))]
    pub async fn get_announcements_for(
        db: &PgPool,
        caller: &Account,
        filters: &AnnouncementFilterParams,
    ) -> Result<Vec<Announcement>, AppError> {
        let teacher_scope: Option<Uuid> = if caller.is_admin() {
            filters.teacher
        } else if caller.is_teacher() {
            Some(caller.id)
        } else {
            let teacher_id = sqlx::query_as::<_, (Uuid,)>(
                "SELECT teacher_id FROM students WHERE account_email = $1 OR hcpss_email = $1",
            )
            .bind(&caller.email)
            .fetch_optional(db)
            .await
            .context("Failed to resolve student's teacher")
            .map_err(AppError::database)?
            .map(|(id,)| id);

            match teacher_id {
                Some(id) => Some(id),
                None => return Ok(Vec::new()),
            }
        };

        let announcements = sqlx::query_as::<_, Announcement>(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements \
             WHERE ($1::uuid IS NULL OR teacher_id = $1) \
               AND ($2::int IS NULL OR target_grade = $2) \
             ORDER BY timestamp DESC"
        ))
        .bind(teacher_scope)
        .bind(filters.target_grade)
        .fetch_all(db)
        .await
        .context("Failed to fetch announcements")
        .map_err(AppError::database)?;

        Ok(announcements)
    }

    #[instrument(skip(db))]
    pub async fn get_announcement_by_id(db: &PgPool, id: Uuid) -> Result<Announcement, AppError> {
        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch announcement")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Announcement not found")))?;

        Ok(announcement)
    }

    /// Teachers may delete their own announcements; admins any.
    #[instrument(skip(db, caller))]
    pub async fn delete_announcement(
        db: &PgPool,
        id: Uuid,
        caller: &Account,
    ) -> Result<(), AppError> {
        let announcement = Self::get_announcement_by_id(db, id).await?;

        if !caller.is_admin() && announcement.teacher_id != caller.id {
            return Err(AppError::forbidden(
                "Only the authoring teacher can delete this announcement".to_string(),
            ));
        }

        sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete announcement")
            .map_err(AppError::database)?;

        Ok(())
    }
}

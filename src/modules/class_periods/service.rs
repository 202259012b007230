use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::accounts::service::AccountService;
use crate::modules::class_periods::model::{
    ClassPeriod, ClassPeriodFilterParams, CreateClassPeriodDto, UpdateClassPeriodDto,
    validate_enrollment,
};
use crate::utils::errors::AppError;

const CLASS_PERIOD_COLUMNS: &str =
    "id, name, teacher_id, room_number, capacity, current_enrollment, created_at, updated_at";

pub struct ClassPeriodService;

impl ClassPeriodService {
    #[instrument(skip(db, dto))]
    pub async fn create_class_period(
        db: &PgPool,
        dto: CreateClassPeriodDto,
    ) -> Result<ClassPeriod, AppError> {
        AccountService::ensure_teacher(db, dto.teacher_id).await?;

        let capacity = dto.capacity.unwrap_or(30);
        let current_enrollment = dto.current_enrollment.unwrap_or(0);
        let violations = validate_enrollment(capacity, current_enrollment);
        if !violations.is_empty() {
            return Err(AppError::validation(violations));
        }

        let class_period = sqlx::query_as::<_, ClassPeriod>(&format!(
            "INSERT INTO class_periods (name, teacher_id, room_number, capacity, current_enrollment) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CLASS_PERIOD_COLUMNS}"
        ))
        .bind(&dto.name)
        .bind(dto.teacher_id)
        .bind(&dto.room_number)
        .bind(capacity)
        .bind(current_enrollment)
        .fetch_one(db)
        .await
        .context("Failed to create class period")
        .map_err(AppError::database)?;

        Ok(class_period)
    }

    #[instrument(skip(db))]
    pub async fn get_class_periods(
        db: &PgPool,
        filters: &ClassPeriodFilterParams,
    ) -> Result<Vec<ClassPeriod>, AppError> {
        let class_periods = sqlx::query_as::<_, ClassPeriod>(&format!(
            "SELECT {CLASS_PERIOD_COLUMNS} FROM class_periods \
             WHERE ($1::uuid IS NULL OR teacher_id = $1) \
             ORDER BY name"
        ))
        .bind(filters.teacher)
        .fetch_all(db)
        .await
        .context("Failed to fetch class periods")
        .map_err(AppError::database)?;

        Ok(class_periods)
    }

    #[instrument(skip(db))]
    pub async fn get_class_period_by_id(db: &PgPool, id: Uuid) -> Result<ClassPeriod, AppError> {
        let class_period = sqlx::query_as::<_, ClassPeriod>(&format!(
            "SELECT {CLASS_PERIOD_COLUMNS} FROM class_periods WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch class period")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class period not found")))?;

        Ok(class_period)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_class_period(
        db: &PgPool,
        id: Uuid,
        dto: UpdateClassPeriodDto,
    ) -> Result<ClassPeriod, AppError> {
        let existing = Self::get_class_period_by_id(db, id).await?;

        let teacher_id = dto.teacher_id.unwrap_or(existing.teacher_id);
        if teacher_id != existing.teacher_id {
            AccountService::ensure_teacher(db, teacher_id).await?;
        }

        let capacity = dto.capacity.unwrap_or(existing.capacity);
        let current_enrollment = dto.current_enrollment.unwrap_or(existing.current_enrollment);
        let violations = validate_enrollment(capacity, current_enrollment);
        if !violations.is_empty() {
            return Err(AppError::validation(violations));
        }

        let class_period = sqlx::query_as::<_, ClassPeriod>(&format!(
            "UPDATE class_periods \
             SET name = $1, teacher_id = $2, room_number = $3, capacity = $4, \
                 current_enrollment = $5, updated_at = NOW() \
             WHERE id = $6 \
             RETURNING {CLASS_PERIOD_COLUMNS}"
        ))
        .bind(dto.name.unwrap_or(existing.name))
        .bind(teacher_id)
        .bind(dto.room_number.unwrap_or(existing.room_number))
        .bind(capacity)
        .bind(current_enrollment)
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to update class period")
        .map_err(AppError::database)?;

        Ok(class_period)
    }

    #[instrument(skip(db))]
    pub async fn delete_class_period(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM class_periods WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete class period")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Class period not found"
            )));
        }

        Ok(())
    }
}

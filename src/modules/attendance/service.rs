use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::attendance::model::{
    AttendanceFilterParams, AttendanceRecord, CreateAttendanceDto, UpdateAttendanceDto,
};
use crate::utils::errors::AppError;

const ATTENDANCE_COLUMNS: &str =
    "id, student_id, class_period_id, date, status, notes, timestamp, updated_by";

pub struct AttendanceService;

impl AttendanceService {
    /// Record attendance for a (student, class period, date) triple.
    ///
    /// The triple is unique; a second write for the same triple is a 400.
    #[instrument(skip(db, dto))]
    pub async fn create_attendance(
        db: &PgPool,
        dto: CreateAttendanceDto,
        recorded_by: Uuid,
    ) -> Result<AttendanceRecord, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "INSERT INTO attendance_records \
                 (student_id, class_period_id, date, status, notes, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ATTENDANCE_COLUMNS}"
        ))
        .bind(dto.student_id)
        .bind(dto.class_period_id)
        .bind(dto.date)
        .bind(dto.status.as_str())
        .bind(dto.notes.unwrap_or_default())
        .bind(recorded_by)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow::anyhow!(
                        "Attendance already recorded for this student, class period and date"
                    ));
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::bad_request(anyhow::anyhow!(
                        "Referenced student or class period does not exist"
                    ));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(record)
    }

    #[instrument(skip(db))]
    pub async fn get_attendance(
        db: &PgPool,
        filters: &AttendanceFilterParams,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records \
             WHERE ($1::uuid IS NULL OR student_id = $1) \
               AND ($2::uuid IS NULL OR class_period_id = $2) \
               AND ($3::date IS NULL OR date = $3) \
             ORDER BY date DESC, timestamp DESC"
        ))
        .bind(filters.student)
        .bind(filters.class_period)
        .bind(filters.date)
        .fetch_all(db)
        .await
        .context("Failed to fetch attendance records")
        .map_err(AppError::database)?;

        Ok(records)
    }

    #[instrument(skip(db))]
    pub async fn get_attendance_by_id(db: &PgPool, id: Uuid) -> Result<AttendanceRecord, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch attendance record")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Attendance record not found")))?;

        Ok(record)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_attendance(
        db: &PgPool,
        id: Uuid,
        dto: UpdateAttendanceDto,
        updated_by: Uuid,
    ) -> Result<AttendanceRecord, AppError> {
        let existing = Self::get_attendance_by_id(db, id).await?;

        let status = dto
            .status
            .map(|s| s.as_str().to_string())
            .unwrap_or(existing.status);

        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "UPDATE attendance_records \
             SET status = $1, notes = $2, updated_by = $3 \
             WHERE id = $4 \
             RETURNING {ATTENDANCE_COLUMNS}"
        ))
        .bind(&status)
        .bind(dto.notes.unwrap_or(existing.notes))
        .bind(updated_by)
        .bind(id)
        .fetch_one(db)
        .await
        .context("Failed to update attendance record")
        .map_err(AppError::database)?;

        Ok(record)
    }
}

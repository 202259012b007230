use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::accounts::model::normalize_email;
use crate::modules::accounts::service::AccountService;
use crate::modules::students::model::{
    CreateStudentDto, Student, StudentFilterParams, UpdateStudentDto, is_valid_theme,
};
use crate::utils::errors::{AppError, FieldViolation};

const STUDENT_COLUMNS: &str = "id, name, grade, hcpss_email, account_email, phone_num, theme, \
     notifications_enabled, teacher_id, created_at, updated_at";

pub struct StudentService;

impl StudentService {
    #[instrument(skip(db, dto))]
    pub async fn create_student(db: &PgPool, dto: CreateStudentDto) -> Result<Student, AppError> {
        AccountService::ensure_teacher(db, dto.teacher_id).await?;

        let theme = dto.theme.unwrap_or_else(|| "light".to_string());
        if !is_valid_theme(&theme) {
            return Err(AppError::validation(vec![FieldViolation::new(
                "theme",
                "must be 'light' or 'dark'",
            )]));
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            "INSERT INTO students \
                 (name, grade, hcpss_email, account_email, phone_num, theme, \
                  notifications_enabled, teacher_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(&dto.name)
        .bind(dto.grade)
        .bind(normalize_email(&dto.hcpss_email))
        .bind(dto.account_email.as_deref().map(normalize_email))
        .bind(&dto.phone_num)
        .bind(&theme)
        .bind(dto.notifications_enabled.unwrap_or(true))
        .bind(dto.teacher_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow::anyhow!(
                        "Student with this email already exists"
                    ));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(student)
    }

    #[instrument(skip(db))]
    pub async fn get_students(
        db: &PgPool,
        filters: &StudentFilterParams,
    ) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students \
             WHERE ($1::int IS NULL OR grade = $1) \
               AND ($2::uuid IS NULL OR teacher_id = $2) \
               AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%') \
             ORDER BY grade, name"
        ))
        .bind(filters.grade)
        .bind(filters.teacher)
        .bind(&filters.search)
        .fetch_all(db)
        .await
        .context("Failed to fetch students")
        .map_err(AppError::database)?;

        Ok(students)
    }

    #[instrument(skip(db))]
    pub async fn get_student_by_id(db: &PgPool, id: Uuid) -> Result<Student, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student by ID")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        Ok(student)
    }

    /// Look up a student by either account email or institutional email.
    #[instrument(skip(db))]
    pub async fn get_student_by_email(db: &PgPool, email: &str) -> Result<Student, AppError> {
        let email = normalize_email(email);

        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students \
             WHERE account_email = $1 OR hcpss_email = $1"
        ))
        .bind(&email)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student by email")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        Ok(student)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_student(
        db: &PgPool,
        id: Uuid,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let existing = Self::get_student_by_id(db, id).await?;

        let teacher_id = dto.teacher_id.unwrap_or(existing.teacher_id);
        if teacher_id != existing.teacher_id {
            AccountService::ensure_teacher(db, teacher_id).await?;
        }

        let theme = dto.theme.unwrap_or(existing.theme);
        if !is_valid_theme(&theme) {
            return Err(AppError::validation(vec![FieldViolation::new(
                "theme",
                "must be 'light' or 'dark'",
            )]));
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students \
             SET name = $1, grade = $2, hcpss_email = $3, account_email = $4, \
                 phone_num = $5, theme = $6, notifications_enabled = $7, \
                 teacher_id = $8, updated_at = NOW() \
             WHERE id = $9 \
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(dto.name.unwrap_or(existing.name))
        .bind(dto.grade.unwrap_or(existing.grade))
        .bind(
            dto.hcpss_email
                .as_deref()
                .map(normalize_email)
                .unwrap_or(existing.hcpss_email),
        )
        .bind(
            dto.account_email
                .as_deref()
                .map(normalize_email)
                .or(existing.account_email),
        )
        .bind(dto.phone_num.or(existing.phone_num))
        .bind(&theme)
        .bind(
            dto.notifications_enabled
                .unwrap_or(existing.notifications_enabled),
        )
        .bind(teacher_id)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow::anyhow!(
                        "Student with this email already exists"
                    ));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(student)
    }

    #[instrument(skip(db))]
    pub async fn delete_student(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete student")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        Ok(())
    }
}

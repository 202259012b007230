use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::auth::AccountPolicy;
use crate::modules::accounts::model::{
    Account, LockState, Role, normalize_email, validate_role_fields,
};
use crate::utils::errors::{AppError, FieldViolation};

/// Failed attempts allowed before an account locks.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;
/// How long a lock lasts once applied.
pub const LOCKOUT_COOLDOWN_SECS: i64 = 300;

const ACCOUNT_COLUMNS: &str = "id, email, first_name, last_name, role, student_id, department, \
     failed_login_attempts, last_login_attempt, is_locked, lock_expiry, is_active, \
     created_at, updated_at";

/// Outcome of recording one failed attempt.
#[derive(Debug, Clone, Copy)]
pub struct FailedAttempt {
    pub attempts: i32,
    pub locked: bool,
    pub lock_expiry: Option<DateTime<Utc>>,
}

pub struct AccountService;

impl AccountService {
    #[instrument(skip(db))]
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(db)
        .await
        .context("Failed to fetch account by email")
        .map_err(AppError::database)?;

        Ok(account)
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch account by id")
        .map_err(AppError::database)?;

        Ok(account)
    }

    /// Resolve a verified email to an account under the configured policy.
    ///
    /// Strict: unknown email yields `Ok(None)`; nothing is created.
    /// Provision: unknown email atomically creates a student account; the
    /// returned flag is true when this call created the row.
    #[instrument(skip(db, names))]
    pub async fn resolve(
        db: &PgPool,
        email: &str,
        policy: AccountPolicy,
        names: Option<(&str, &str)>,
    ) -> Result<Option<(Account, bool)>, AppError> {
        if let Some(account) = Self::find_by_email(db, email).await? {
            return Ok(Some((account, false)));
        }

        if policy == AccountPolicy::Strict {
            return Ok(None);
        }

        let (first_name, last_name) = names.unwrap_or(("", ""));

        // ON CONFLICT DO NOTHING keeps concurrent first-logins from racing
        // into duplicates; the loser of the race re-reads the winner's row.
        let inserted = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (email, first_name, last_name, role, is_active) \
             VALUES ($1, $2, $3, 'student', true) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(normalize_email(email))
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(db)
        .await
        .context("Failed to provision account")
        .map_err(AppError::database)?;

        match inserted {
            Some(account) => Ok(Some((account, true))),
            None => {
                let account = Self::find_by_email(db, email).await?.ok_or_else(|| {
                    AppError::internal(anyhow::anyhow!("Provisioned account disappeared"))
                })?;
                Ok(Some((account, false)))
            }
        }
    }

    /// Record one failed verification attempt against an account.
    ///
    /// A single atomic UPDATE increments the counter, stamps the attempt
    /// time, and applies the lock when the incremented count reaches the
    /// threshold. Already-locked accounts are frozen at the threshold and
    /// return `Ok(None)`.
    #[instrument(skip(db))]
    pub async fn record_failed_attempt(
        db: &PgPool,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<FailedAttempt>, AppError> {
        let lock_expiry = now + Duration::seconds(LOCKOUT_COOLDOWN_SECS);

        let row = sqlx::query_as::<_, (i32, bool, Option<DateTime<Utc>>)>(
            "UPDATE accounts \
             SET failed_login_attempts = failed_login_attempts + 1, \
                 last_login_attempt = $2, \
                 is_locked = failed_login_attempts + 1 >= $3, \
                 lock_expiry = CASE WHEN failed_login_attempts + 1 >= $3 \
                                    THEN $4 ELSE lock_expiry END, \
                 updated_at = NOW() \
             WHERE id = $1 AND NOT is_locked \
             RETURNING failed_login_attempts, is_locked, lock_expiry",
        )
        .bind(account_id)
        .bind(now)
        .bind(MAX_FAILED_ATTEMPTS)
        .bind(lock_expiry)
        .fetch_optional(db)
        .await
        .context("Failed to record failed attempt")
        .map_err(AppError::database)?;

        Ok(row.map(|(attempts, locked, lock_expiry)| FailedAttempt {
            attempts,
            locked,
            lock_expiry,
        }))
    }

    /// Reconcile the lockout state as of `now` and return the result.
    ///
    /// Invoked once per request before any read. An expired lock is cleared
    /// (counter reset to zero) and the returned state reflects that
    /// transition, so the first check strictly after expiry reads OPEN.
    #[instrument(skip(db))]
    pub async fn reconcile_lock_state(
        db: &PgPool,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<LockState, AppError> {
        sqlx::query(
            "UPDATE accounts \
             SET is_locked = false, lock_expiry = NULL, failed_login_attempts = 0, \
                 updated_at = NOW() \
             WHERE id = $1 AND is_locked AND lock_expiry IS NOT NULL AND lock_expiry < $2",
        )
        .bind(account_id)
        .bind(now)
        .execute(db)
        .await
        .context("Failed to reconcile lock state")
        .map_err(AppError::database)?;

        let (is_locked, lock_expiry) =
            sqlx::query_as::<_, (bool, Option<DateTime<Utc>>)>(
                "SELECT is_locked, lock_expiry FROM accounts WHERE id = $1",
            )
            .bind(account_id)
            .fetch_one(db)
            .await
            .context("Failed to read lock state")
            .map_err(AppError::database)?;

        match (is_locked, lock_expiry) {
            (true, Some(until)) => Ok(LockState::Locked { until }),
            _ => Ok(LockState::Open),
        }
    }

    /// Success always clears the counter and the lock, unconditionally, and
    /// stamps the attempt time.
    #[instrument(skip(db))]
    pub async fn reset_failed_attempts(
        db: &PgPool,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE accounts \
             SET failed_login_attempts = 0, is_locked = false, lock_expiry = NULL, \
                 last_login_attempt = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(account_id)
        .bind(now)
        .execute(db)
        .await
        .context("Failed to reset login attempts")
        .map_err(AppError::database)?;

        Ok(())
    }

    /// Validate that `teacher_id` references an account with role=teacher.
    ///
    /// Used by every entity carrying a teacher reference; failures surface
    /// as a structured field-level violation.
    pub async fn ensure_teacher(db: &PgPool, teacher_id: Uuid) -> Result<Account, AppError> {
        match Self::find_by_id(db, teacher_id).await? {
            Some(account) if account.is_teacher() => Ok(account),
            Some(_) => Err(AppError::validation(vec![FieldViolation::new(
                "teacher",
                "must reference a teacher account",
            )])),
            None => Err(AppError::validation(vec![FieldViolation::new(
                "teacher",
                "referenced account does not exist",
            )])),
        }
    }

    /// Insert a pre-provisioned account (seeder and administrative use).
    ///
    /// Role-dependent fields are cross-validated; violations surface as a
    /// structured 422.
    #[instrument(skip(db))]
    pub async fn insert_account(
        db: &PgPool,
        email: &str,
        first_name: &str,
        last_name: &str,
        role: Role,
        student_id: Option<&str>,
        department: Option<&str>,
    ) -> Result<Account, AppError> {
        let violations = validate_role_fields(role, student_id, department);
        if !violations.is_empty() {
            return Err(AppError::validation(violations));
        }

        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (email, first_name, last_name, role, student_id, department) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(normalize_email(email))
        .bind(first_name)
        .bind(last_name)
        .bind(role.as_str())
        .bind(student_id)
        .bind(department)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow::anyhow!(
                        "Account with email {} already exists",
                        email
                    ));
                }
            }
            AppError::database(anyhow::Error::from(e))
        })?;

        Ok(account)
    }
}

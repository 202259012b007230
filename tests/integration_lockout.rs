mod common;

use chrono::{Duration, Utc};
use common::{create_test_account, generate_unique_email};
use rollcall::config::auth::AccountPolicy;
use rollcall::modules::accounts::model::{LockState, Role, normalize_email};
use rollcall::modules::accounts::service::{
    AccountService, LOCKOUT_COOLDOWN_SECS, MAX_FAILED_ATTEMPTS,
};
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_attempts_accumulate_until_threshold(pool: PgPool) {
    let email = generate_unique_email();
    let account = create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    for expected in 1..MAX_FAILED_ATTEMPTS {
        let outcome = AccountService::record_failed_attempt(&pool, account.id, Utc::now())
            .await
            .unwrap()
            .expect("open account records attempts");
        assert_eq!(outcome.attempts, expected);
        assert!(!outcome.locked);
        assert!(outcome.lock_expiry.is_none());
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fifth_failure_locks_with_cooldown_expiry(pool: PgPool) {
    let email = generate_unique_email();
    let account = create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    sqlx::query("UPDATE accounts SET failed_login_attempts = 4 WHERE id = $1")
        .bind(account.id)
        .execute(&pool)
        .await
        .unwrap();

    let now = Utc::now();
    let outcome = AccountService::record_failed_attempt(&pool, account.id, now)
        .await
        .unwrap()
        .expect("fifth attempt still records");

    assert_eq!(outcome.attempts, MAX_FAILED_ATTEMPTS);
    assert!(outcome.locked);

    let expiry = outcome.lock_expiry.expect("lock expiry is set");
    let expected = now + Duration::seconds(LOCKOUT_COOLDOWN_SECS);
    assert!((expiry - expected).num_milliseconds().abs() < 50);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_locked_account_freezes_at_threshold(pool: PgPool) {
    let email = generate_unique_email();
    let account = create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    let now = Utc::now();
    for _ in 0..MAX_FAILED_ATTEMPTS {
        AccountService::record_failed_attempt(&pool, account.id, now)
            .await
            .unwrap();
    }

    // Further failures against a locked account do not increment.
    let outcome = AccountService::record_failed_attempt(&pool, account.id, now)
        .await
        .unwrap();
    assert!(outcome.is_none());

    let (attempts,): (i32,) =
        sqlx::query_as("SELECT failed_login_attempts FROM accounts WHERE id = $1")
            .bind(account.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(attempts, MAX_FAILED_ATTEMPTS);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reconcile_before_expiry_stays_locked(pool: PgPool) {
    let email = generate_unique_email();
    let account = create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    let now = Utc::now();
    for _ in 0..MAX_FAILED_ATTEMPTS {
        AccountService::record_failed_attempt(&pool, account.id, now)
            .await
            .unwrap();
    }

    let state = AccountService::reconcile_lock_state(&pool, account.id, now)
        .await
        .unwrap();
    assert!(state.is_locked());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reconcile_after_expiry_reopens_and_resets(pool: PgPool) {
    let email = generate_unique_email();
    let account = create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    let now = Utc::now();
    for _ in 0..MAX_FAILED_ATTEMPTS {
        AccountService::record_failed_attempt(&pool, account.id, now)
            .await
            .unwrap();
    }

    // Evaluated strictly after the expiry: the same call both performs the
    // transition and reports the post-transition state.
    let later = now + Duration::seconds(LOCKOUT_COOLDOWN_SECS + 1);
    let state = AccountService::reconcile_lock_state(&pool, account.id, later)
        .await
        .unwrap();
    assert_eq!(state, LockState::Open);

    let (attempts, is_locked): (i32, bool) =
        sqlx::query_as("SELECT failed_login_attempts, is_locked FROM accounts WHERE id = $1")
            .bind(account.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(attempts, 0);
    assert!(!is_locked);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reset_clears_counter_and_lock(pool: PgPool) {
    let email = generate_unique_email();
    let account = create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    let now = Utc::now();
    for _ in 0..MAX_FAILED_ATTEMPTS {
        AccountService::record_failed_attempt(&pool, account.id, now)
            .await
            .unwrap();
    }

    AccountService::reset_failed_attempts(&pool, account.id, now)
        .await
        .unwrap();

    let (attempts, is_locked, last_attempt): (i32, bool, Option<chrono::DateTime<Utc>>) =
        sqlx::query_as(
            "SELECT failed_login_attempts, is_locked, last_login_attempt \
             FROM accounts WHERE id = $1",
        )
        .bind(account.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(attempts, 0);
    assert!(!is_locked);
    assert!(last_attempt.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resolve_strict_does_not_create(pool: PgPool) {
    let email = generate_unique_email();

    let resolved = AccountService::resolve(&pool, &email, AccountPolicy::Strict, None)
        .await
        .unwrap();
    assert!(resolved.is_none());

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resolve_provision_creates_student_once(pool: PgPool) {
    let email = generate_unique_email();

    let (account, created) =
        AccountService::resolve(&pool, &email, AccountPolicy::Provision, Some(("New", "User")))
            .await
            .unwrap()
            .expect("provisioning resolves unknown emails");
    assert!(created);
    assert_eq!(account.role, "student");
    assert!(account.is_active);
    assert_eq!(account.email, normalize_email(&email));
    assert_eq!(account.first_name, "New");

    // A second resolve finds the same row instead of creating another.
    let (again, created_again) =
        AccountService::resolve(&pool, &email, AccountPolicy::Provision, None)
            .await
            .unwrap()
            .unwrap();
    assert!(!created_again);
    assert_eq!(again.id, account.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_account_retrievable_by_exact_email_only(pool: PgPool) {
    let email = generate_unique_email();
    AccountService::resolve(&pool, &email, AccountPolicy::Provision, None)
        .await
        .unwrap();

    assert!(
        AccountService::find_by_email(&pool, &email)
            .await
            .unwrap()
            .is_some()
    );
    // Lookup is case-normalized.
    assert!(
        AccountService::find_by_email(&pool, &email.to_ascii_uppercase())
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        AccountService::find_by_email(&pool, "someone-else@inst.hcpss.org")
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_insert_account_rejects_role_field_mismatch(pool: PgPool) {
    let err = AccountService::insert_account(
        &pool,
        &generate_unique_email(),
        "Test",
        "Teacher",
        Role::Teacher,
        Some("123456"),
        None,
    )
    .await
    .unwrap_err();

    let violations = err.violations.expect("structured violations");
    assert_eq!(violations[0].field, "student_id");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ensure_teacher_rejects_students(pool: PgPool) {
    let email = generate_unique_email();
    let student = create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    let err = AccountService::ensure_teacher(&pool, student.id)
        .await
        .unwrap_err();
    let violations = err.violations.expect("structured violations");
    assert_eq!(violations[0].field, "teacher");
}

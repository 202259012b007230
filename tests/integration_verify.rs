mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use common::{
    audit_contents, create_test_account, generate_unique_email, json_request, setup_test_app,
    test_state,
};
use http_body_util::BodyExt;
use rollcall::config::auth::AccountPolicy;
use rollcall::modules::accounts::model::Role;
use rollcall::router::init_router;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

async fn response_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn account_state(pool: &PgPool, email: &str) -> (i32, bool, Option<DateTime<Utc>>) {
    sqlx::query_as(
        "SELECT failed_login_attempts, is_locked, lock_expiry FROM accounts WHERE email = $1",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_existing_users(pool: PgPool) {
    let emails = [
        ("teacher@inst.hcpss.org", "Teacher", Role::Teacher),
        ("student@inst.hcpss.org", "Student", Role::Student),
        ("admin@inst.hcpss.org", "Admin", Role::Admin),
    ];
    for (email, last_name, role) in &emails {
        create_test_account(&pool, email, "Test", last_name, *role).await;
    }

    let (app, _) = setup_test_app(pool.clone());

    for (email, last_name, role) in &emails {
        let response = app
            .clone()
            .oneshot(json_request("/api/accounts/verify", json!({"email": email})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["role"], role.as_str());
        assert_eq!(body["name"], format!("Test {}", last_name));
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_nonexistent_user(pool: PgPool) {
    let (app, audit) = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "/api/accounts/verify",
            json!({"email": "nonexistent@inst.hcpss.org"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "User not found in system");
    assert_eq!(body["role"], Value::Null);

    // No row is created under the strict policy.
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);

    let log = audit_contents(&audit);
    assert!(log.contains("WARNING"));
    assert!(log.contains("Unrecognized login attempt"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_missing_email(pool: PgPool) {
    let (app, _) = setup_test_app(pool);

    let response = app
        .oneshot(json_request("/api/accounts/verify", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Email is required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_invalid_email_format(pool: PgPool) {
    let (app, _) = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "/api/accounts/verify",
            json!({"email": "invalid-email"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_domain_allowlist_rejects_before_lookup(pool: PgPool) {
    let (state, _) = test_state(pool, AccountPolicy::Strict, Some("inst.hcpss.org"));
    let app = init_router(state);

    let response = app
        .oneshot(json_request(
            "/api/accounts/verify",
            json!({"email": "test@gmail.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Email domain not allowed");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_resets_failed_attempts(pool: PgPool) {
    let email = generate_unique_email();
    create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    sqlx::query("UPDATE accounts SET failed_login_attempts = 3 WHERE email = $1")
        .bind(&email)
        .execute(&pool)
        .await
        .unwrap();

    let (app, _) = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request("/api/accounts/verify", json!({"email": email})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (attempts, is_locked, _) = account_state(&pool, &email).await;
    assert_eq!(attempts, 0);
    assert!(!is_locked);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bad_credential_locks_after_five_attempts(pool: PgPool) {
    let email = generate_unique_email();
    create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    let (app, audit) = setup_test_app(pool.clone());
    let before = Utc::now();

    // A structurally invalid token fails verification without any network
    // traffic, so each attempt counts against the threshold.
    for attempt in 1..=5 {
        let response = app
            .clone()
            .oneshot(json_request(
                "/api/accounts/verify",
                json!({"email": email, "token": "not-a-jwt"}),
            ))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "attempt {attempt}"
        );
    }

    let (attempts, is_locked, lock_expiry) = account_state(&pool, &email).await;
    assert_eq!(attempts, 5);
    assert!(is_locked);

    // lock_expiry is approximately now + 300 seconds.
    let expiry = lock_expiry.unwrap();
    let lower = before + Duration::seconds(295);
    let upper = Utc::now() + Duration::seconds(305);
    assert!(expiry > lower && expiry < upper, "expiry {expiry} out of range");

    // The sixth attempt reports the distinct locked signal, and the counter
    // freezes at the threshold.
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/accounts/verify",
            json!({"email": email, "token": "not-a-jwt"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::LOCKED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Account temporarily locked");

    let (attempts, is_locked, _) = account_state(&pool, &email).await;
    assert_eq!(attempts, 5);
    assert!(is_locked);

    let log = audit_contents(&audit);
    assert!(log.contains("Invalid credential presented"));
    assert!(log.contains("Verification attempt for locked account"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_lock_reopens_on_next_verification(pool: PgPool) {
    let email = generate_unique_email();
    create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    sqlx::query(
        "UPDATE accounts \
         SET failed_login_attempts = 5, is_locked = true, lock_expiry = NOW() - INTERVAL '1 second' \
         WHERE email = $1",
    )
    .bind(&email)
    .execute(&pool)
    .await
    .unwrap();

    let (app, _) = setup_test_app(pool.clone());

    // First check strictly after expiry reflects OPEN, not stale LOCKED.
    let response = app
        .oneshot(json_request("/api/accounts/verify", json!({"email": email})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (attempts, is_locked, lock_expiry) = account_state(&pool, &email).await;
    assert_eq!(attempts, 0);
    assert!(!is_locked);
    assert!(lock_expiry.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lock_before_expiry_reports_locked(pool: PgPool) {
    let email = generate_unique_email();
    create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    sqlx::query(
        "UPDATE accounts \
         SET failed_login_attempts = 5, is_locked = true, lock_expiry = NOW() + INTERVAL '5 minutes' \
         WHERE email = $1",
    )
    .bind(&email)
    .execute(&pool)
    .await
    .unwrap();

    let (app, _) = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request("/api/accounts/verify", json!({"email": email})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::LOCKED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_repeated_success_never_locks(pool: PgPool) {
    let email = generate_unique_email();
    create_test_account(&pool, &email, "Test", "Student", Role::Student).await;

    let (app, _) = setup_test_app(pool.clone());

    for _ in 0..6 {
        let response = app
            .clone()
            .oneshot(json_request("/api/accounts/verify", json!({"email": email})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let (attempts, is_locked, _) = account_state(&pool, &email).await;
    assert_eq!(attempts, 0);
    assert!(!is_locked);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_success_writes_audit_record(pool: PgPool) {
    let email = generate_unique_email();
    create_test_account(&pool, &email, "Test", "Teacher", Role::Teacher).await;

    let (app, audit) = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request("/api/accounts/verify", json!({"email": email})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let log = audit_contents(&audit);
    assert!(log.contains("INFO"));
    assert!(log.contains("Successful user verification"));
    assert!(log.contains(&format!("Email: {}", email)));
    assert!(log.contains("IP: 127.0.0.1"));
    assert!(log.contains("UA: rollcall-tests"));
    assert!(log.contains("Role: teacher"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_token_requires_token(pool: PgPool) {
    let (app, _) = setup_test_app(pool);

    let response = app
        .oneshot(json_request("/api/accounts/verify-token", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], "No token provided");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_token_rejects_garbage_token(pool: PgPool) {
    let (app, audit) = setup_test_app(pool);

    let response = app
        .oneshot(json_request(
            "/api/accounts/verify-token",
            json!({"token": "not-a-jwt"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Invalid token");

    let log = audit_contents(&audit);
    assert!(log.contains("ERROR"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_crud_endpoints_require_authentication(pool: PgPool) {
    let (app, _) = setup_test_app(pool);

    for uri in [
        "/api/students",
        "/api/class-periods",
        "/api/attendance",
        "/api/announcements",
    ] {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

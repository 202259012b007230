use axum::Router;
use axum::body::Body;
use axum::http::Request;
use sqlx::PgPool;
use uuid::Uuid;

use rollcall::config::auth::{AccountPolicy, AuthConfig};
use rollcall::config::cors::CorsConfig;
use rollcall::config::google::GoogleConfig;
use rollcall::modules::accounts::model::{Account, Role};
use rollcall::modules::accounts::service::AccountService;
use rollcall::router::init_router;
use rollcall::state::AppState;
use rollcall::utils::audit::{AuditLog, MemoryBuffer};
use rollcall::utils::google::GoogleTokenVerifier;

#[allow(dead_code)]
pub fn test_state(
    pool: PgPool,
    policy: AccountPolicy,
    allowed_email_domain: Option<&str>,
) -> (AppState, MemoryBuffer) {
    let (audit, buffer) = AuditLog::to_memory();

    let state = AppState {
        db: pool,
        google: GoogleTokenVerifier::new(GoogleConfig {
            client_id: "test-client-id".to_string(),
            jwks_url: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
            timeout_secs: 5,
        }),
        auth_config: AuthConfig {
            account_policy: policy,
            allowed_email_domain: allowed_email_domain.map(|s| s.to_string()),
        },
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        audit,
    };

    (state, buffer)
}

/// Router with the strict policy and no domain allowlist.
#[allow(dead_code)]
pub fn setup_test_app(pool: PgPool) -> (Router, MemoryBuffer) {
    let (state, buffer) = test_state(pool, AccountPolicy::Strict, None);
    (init_router(state), buffer)
}

#[allow(dead_code)]
pub async fn create_test_account(
    pool: &PgPool,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> Account {
    let department = match role {
        Role::Teacher => Some("Science"),
        _ => None,
    };

    AccountService::insert_account(pool, email, first_name, last_name, role, None, department)
        .await
        .unwrap()
}

#[allow(dead_code)]
pub fn generate_unique_email() -> String {
    format!("test-{}@inst.hcpss.org", Uuid::new_v4())
}

#[allow(dead_code)]
pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "127.0.0.1")
        .header("user-agent", "rollcall-tests")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[allow(dead_code)]
pub fn audit_contents(buffer: &MemoryBuffer) -> String {
    String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
}

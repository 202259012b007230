use sqlx::PgPool;

use crate::config::auth::AuthConfig;
use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::google::GoogleConfig;
use crate::utils::audit::AuditLog;
use crate::utils::google::GoogleTokenVerifier;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub google: GoogleTokenVerifier,
    pub auth_config: AuthConfig,
    pub cors_config: CorsConfig,
    pub audit: AuditLog,
}

pub async fn init_app_state() -> AppState {
    let audit = AuditLog::to_file("logs").expect("Failed to open audit log");

    AppState {
        db: init_db_pool().await,
        google: GoogleTokenVerifier::new(GoogleConfig::from_env()),
        auth_config: AuthConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        audit,
    }
}

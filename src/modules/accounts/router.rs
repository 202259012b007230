use crate::state::AppState;
use axum::{Router, routing::post};

use super::controller::{verify_google_token, verify_user};

pub fn init_accounts_router() -> Router<AppState> {
    Router::new()
        .route("/verify", post(verify_user))
        .route("/verify-token", post(verify_google_token))
}

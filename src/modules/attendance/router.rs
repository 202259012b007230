use crate::modules::attendance::controller::{
    create_attendance, get_attendance, get_attendance_record, update_attendance,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_attendance).get(get_attendance))
        .route("/{id}", get(get_attendance_record).put(update_attendance))
}

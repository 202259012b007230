use crate::modules::class_periods::controller::{
    create_class_period, delete_class_period, get_class_period, get_class_periods,
    update_class_period,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_class_periods_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_class_period).get(get_class_periods))
        .route(
            "/{id}",
            get(get_class_period)
                .put(update_class_period)
                .delete(delete_class_period),
        )
}

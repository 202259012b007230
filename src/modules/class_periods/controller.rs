use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireTeacher;
use crate::modules::class_periods::model::{
    ClassPeriod, ClassPeriodFilterParams, CreateClassPeriodDto, UpdateClassPeriodDto,
};
use crate::modules::class_periods::service::ClassPeriodService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/class-periods",
    request_body = CreateClassPeriodDto,
    responses(
        (status = 200, description = "Class period created", body = ClassPeriod),
        (status = 403, description = "Teacher privileges required"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Class Periods"
)]
#[instrument(skip(state, dto))]
pub async fn create_class_period(
    State(state): State<AppState>,
    _auth: RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateClassPeriodDto>,
) -> Result<Json<ClassPeriod>, AppError> {
    let class_period = ClassPeriodService::create_class_period(&state.db, dto).await?;
    Ok(Json(class_period))
}

#[utoipa::path(
    get,
    path = "/api/class-periods",
    params(ClassPeriodFilterParams),
    responses(
        (status = 200, description = "List of class periods", body = [ClassPeriod]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Class Periods"
)]
#[instrument(skip(state))]
pub async fn get_class_periods(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ClassPeriodFilterParams>,
) -> Result<Json<Vec<ClassPeriod>>, AppError> {
    let class_periods = ClassPeriodService::get_class_periods(&state.db, &params).await?;
    Ok(Json(class_periods))
}

#[utoipa::path(
    get,
    path = "/api/class-periods/{id}",
    params(("id" = Uuid, Path, description = "Class period ID")),
    responses(
        (status = 200, description = "Class period details", body = ClassPeriod),
        (status = 404, description = "Class period not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Class Periods"
)]
#[instrument(skip(state))]
pub async fn get_class_period(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassPeriod>, AppError> {
    let class_period = ClassPeriodService::get_class_period_by_id(&state.db, id).await?;
    Ok(Json(class_period))
}

#[utoipa::path(
    put,
    path = "/api/class-periods/{id}",
    params(("id" = Uuid, Path, description = "Class period ID")),
    request_body = UpdateClassPeriodDto,
    responses(
        (status = 200, description = "Class period updated", body = ClassPeriod),
        (status = 404, description = "Class period not found"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Class Periods"
)]
#[instrument(skip(state, dto))]
pub async fn update_class_period(
    State(state): State<AppState>,
    _auth: RequireTeacher,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassPeriodDto>,
) -> Result<Json<ClassPeriod>, AppError> {
    let class_period = ClassPeriodService::update_class_period(&state.db, id, dto).await?;
    Ok(Json(class_period))
}

#[utoipa::path(
    delete,
    path = "/api/class-periods/{id}",
    params(("id" = Uuid, Path, description = "Class period ID")),
    responses(
        (status = 200, description = "Class period deleted"),
        (status = 404, description = "Class period not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Class Periods"
)]
#[instrument(skip(state))]
pub async fn delete_class_period(
    State(state): State<AppState>,
    _auth: RequireTeacher,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    ClassPeriodService::delete_class_period(&state.db, id).await?;
    Ok(Json(json!({"message": "Class period deleted successfully"})))
}

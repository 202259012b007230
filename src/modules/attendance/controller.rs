use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireTeacher;
use crate::modules::attendance::model::{
    AttendanceFilterParams, AttendanceRecord, CreateAttendanceDto, UpdateAttendanceDto,
};
use crate::modules::attendance::service::AttendanceService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendanceDto,
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceRecord),
        (status = 400, description = "Duplicate or invalid references"),
        (status = 403, description = "Teacher privileges required")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state, dto))]
pub async fn create_attendance(
    State(state): State<AppState>,
    RequireTeacher(caller): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateAttendanceDto>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let record = AttendanceService::create_attendance(&state.db, dto, caller.id).await?;
    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilterParams),
    responses(
        (status = 200, description = "List of attendance records", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn get_attendance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<AttendanceFilterParams>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let records = AttendanceService::get_attendance(&state.db, &params).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(("id" = Uuid, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance record", body = AttendanceRecord),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state))]
pub async fn get_attendance_record(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let record = AttendanceService::get_attendance_by_id(&state.db, id).await?;
    Ok(Json(record))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id" = Uuid, Path, description = "Attendance record ID")),
    request_body = UpdateAttendanceDto,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceRecord),
        (status = 403, description = "Teacher privileges required"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(state, dto))]
pub async fn update_attendance(
    State(state): State<AppState>,
    RequireTeacher(caller): RequireTeacher,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAttendanceDto>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let record = AttendanceService::update_attendance(&state.db, id, dto, caller.id).await?;
    Ok(Json(record))
}

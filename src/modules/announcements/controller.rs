use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireTeacher;
use crate::modules::announcements::model::{
    Announcement, AnnouncementFilterParams, CreateAnnouncementDto,
};
use crate::modules::announcements::service::AnnouncementService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/announcements",
    request_body = CreateAnnouncementDto,
    responses(
        (status = 200, description = "Announcement created", body = Announcement),
        (status = 403, description = "Teacher privileges required"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state, dto))]
pub async fn create_announcement(
    State(state): State<AppState>,
    RequireTeacher(caller): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateAnnouncementDto>,
) -> Result<Json<Announcement>, AppError> {
    let announcement = AnnouncementService::create_announcement(&state.db, dto, &caller).await?;
    Ok(Json(announcement))
}

#[utoipa::path(
    get,
    path = "/api/announcements",
    params(AnnouncementFilterParams),
    responses(
        (status = 200, description = "Announcements visible to the caller", body = [Announcement]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state))]
pub async fn get_announcements(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(params): Query<AnnouncementFilterParams>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    let announcements =
        AnnouncementService::get_announcements_for(&state.db, &caller, &params).await?;
    Ok(Json(announcements))
}

#[utoipa::path(
    get,
    path = "/api/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement details", body = Announcement),
        (status = 404, description = "Announcement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state))]
pub async fn get_announcement(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, AppError> {
    let announcement = AnnouncementService::get_announcement_by_id(&state.db, id).await?;
    Ok(Json(announcement))
}

#[utoipa::path(
    delete,
    path = "/api/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement deleted"),
        (status = 403, description = "Not the authoring teacher"),
        (status = 404, description = "Announcement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
#[instrument(skip(state))]
pub async fn delete_announcement(
    State(state): State<AppState>,
    RequireTeacher(caller): RequireTeacher,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    AnnouncementService::delete_announcement(&state.db, id, &caller).await?;
    Ok(Json(json!({"message": "Announcement deleted successfully"})))
}

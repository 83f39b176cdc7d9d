//! Fee schedule administration handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::UserId;

use crate::dto::schedule::*;
use crate::error::ApiError;
use crate::AppState;

/// Saves the current fee configuration as a named restore point
pub async fn create_version(
    State(state): State<AppState>,
    Json(request): Json<CreateVersionRequest>,
) -> Result<(StatusCode, Json<VersionResponse>), ApiError> {
    request.validate()?;

    let created_by = UserId::from_uuid(request.user_id.unwrap_or_else(Uuid::nil));
    let version = state
        .schedule
        .create_version(
            request.fbo_location_id.into(),
            request.name,
            request.description,
            created_by,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(VersionResponse::from(&version))))
}

/// Lists saved versions for an FBO, newest first
pub async fn list_versions(
    State(state): State<AppState>,
    Query(query): Query<ListVersionsQuery>,
) -> Result<Json<Vec<VersionResponse>>, ApiError> {
    let versions = state
        .schedule
        .list_versions(query.fbo_location_id.into())
        .await?;

    Ok(Json(versions.iter().map(VersionResponse::from).collect()))
}

/// Reverts the live configuration to a stored version
pub async fn restore_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RestoreResponse>, ApiError> {
    let summary = state.schedule.restore_from_version(id.into()).await?;
    Ok(Json(RestoreResponse::from(summary)))
}

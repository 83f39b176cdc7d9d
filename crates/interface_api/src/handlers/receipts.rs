//! Receipt lifecycle handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::UserId;
use domain_receipts::{DraftUpdate, PageRequest, ReceiptError, ReceiptFilter};

use crate::dto::receipts::*;
use crate::error::ApiError;
use crate::AppState;

/// Actor attribution for requests; deployed environments inject the
/// authenticated user, tests and local runs fall back to the nil actor
fn actor(user_id: Option<Uuid>) -> UserId {
    UserId::from_uuid(user_id.unwrap_or_else(Uuid::nil))
}

/// Creates a draft receipt from a completed fuel order
pub async fn create_draft(
    State(state): State<AppState>,
    Json(request): Json<CreateDraftRequest>,
) -> Result<(StatusCode, Json<ReceiptResponse>), ApiError> {
    request.validate()?;

    let receipt = state
        .receipts
        .create_draft_from_fuel_order(request.fuel_order_id.into(), actor(request.user_id))
        .await?;

    Ok((StatusCode::CREATED, Json(ReceiptResponse::from(&receipt))))
}

/// Updates editable draft fields
pub async fn update_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDraftRequest>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    request.validate()?;

    let update = DraftUpdate {
        customer_id: request.customer_id.map(Into::into),
        aircraft_type_name: request.aircraft_type,
        notes: request.notes,
        additional_services: request
            .additional_services
            .map(|services| services.into_iter().map(Into::into).collect()),
    };

    let receipt = state
        .receipts
        .update_draft(id.into(), update, actor(request.user_id))
        .await
        .map_err(|err| match err {
            // Editing a finalized receipt is a conflict with its current
            // state, not a malformed request
            ReceiptError::DraftRequired(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::from(other),
        })?;

    Ok(Json(ReceiptResponse::from(&receipt)))
}

/// Runs the fee calculation engine against the draft
pub async fn calculate_fees(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CalculateFeesRequest>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    request.validate()?;

    let services = request
        .additional_services
        .map(|services| services.into_iter().map(Into::into).collect());

    let receipt = state
        .receipts
        .calculate_and_update_draft(id.into(), services)
        .await?;

    Ok(Json(ReceiptResponse::from(&receipt)))
}

/// Finalizes a draft and assigns its receipt number
pub async fn generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let receipt = state.receipts.generate_receipt(id.into()).await?;
    Ok(Json(ReceiptResponse::from(&receipt)))
}

/// Marks a generated receipt as paid
pub async fn mark_paid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let receipt = state.receipts.mark_as_paid(id.into()).await?;
    Ok(Json(ReceiptResponse::from(&receipt)))
}

/// Voids a generated or paid receipt; the body is optional, carrying
/// only the reason and actor when present
pub async fn void(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<VoidReceiptRequest>>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let (reason, user_id) = match request {
        Some(Json(body)) => {
            body.validate()?;
            (body.reason, body.user_id)
        }
        None => (None, None),
    };

    let receipt = state
        .receipts
        .void_receipt(id.into(), actor(user_id), reason)
        .await?;

    Ok(Json(ReceiptResponse::from(&receipt)))
}

/// Toggles a manual waiver on one fee line; the body is optional since
/// the actor is the only field it can carry
pub async fn toggle_waiver(
    State(state): State<AppState>,
    Path((id, line_item_id)): Path<(Uuid, Uuid)>,
    request: Option<Json<ToggleWaiverRequest>>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let user_id = request.and_then(|Json(r)| r.user_id);
    let receipt = state
        .receipts
        .toggle_line_item_waiver(id.into(), line_item_id.into(), actor(user_id))
        .await?;

    Ok(Json(ReceiptResponse::from(&receipt)))
}

/// Lists receipts with status/customer filters and pagination
pub async fn list_receipts(
    State(state): State<AppState>,
    Query(query): Query<ListReceiptsQuery>,
) -> Result<Json<ReceiptListResponse>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(parse_status_param)
        .transpose()?;

    let filter = ReceiptFilter {
        fbo_location_id: query
            .fbo_location_id
            .or(state.config.fbo_location_id)
            .map(Into::into),
        status,
        customer_id: query.customer_id.map(Into::into),
    };
    let page = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };

    let receipts = state.receipts.list_receipts(filter, page).await?;
    Ok(Json(ReceiptListResponse::from(&receipts)))
}

/// Fetches one receipt with its line items
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    let receipt = state.receipts.get_receipt(id.into()).await?;
    Ok(Json(ReceiptResponse::from(&receipt)))
}

//! Handlers for confirmed classes: billing, reviews and reminders.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use lifesafe_core::types::DbId;
use lifesafe_db::models::confirmed_class::{SubmitReview, UpdateBilling};

use crate::error::AppResult;
use crate::handlers::class_requests::LockReleased;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /confirmed-classes/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let class = state.lifecycle.get_class(&actor, id).await?;
    Ok(Json(DataResponse { data: class }))
}

/// GET /confirmed-classes/pending-bills
pub async fn pending_bills(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> AppResult<impl IntoResponse> {
    let classes = state.lifecycle.pending_bills(&actor).await?;
    Ok(Json(DataResponse { data: classes }))
}

/// PUT /confirmed-classes/{id}/billing
pub async fn update_billing(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBilling>,
) -> AppResult<impl IntoResponse> {
    let class = state.lifecycle.update_billing(&actor, id, input).await?;
    Ok(Json(DataResponse { data: class }))
}

/// POST /confirmed-classes/{id}/bill
pub async fn mark_billed(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let class = state.lifecycle.mark_billed(&actor, id).await?;
    Ok(Json(DataResponse { data: class }))
}

/// POST /confirmed-classes/{id}/roster-reminder
pub async fn roster_reminder(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.lifecycle.send_roster_reminder(&actor, id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /confirmed-classes/{id}/review
pub async fn submit_review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<SubmitReview>,
) -> AppResult<impl IntoResponse> {
    let class = state.lifecycle.submit_review(&actor, id, input).await?;
    Ok(Json(DataResponse { data: class }))
}

/// POST /confirmed-classes/{id}/release-lock
pub async fn release_lock(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let released = state.lifecycle.release_class_lock(&actor, id).await?;
    Ok(Json(DataResponse {
        data: LockReleased { released },
    }))
}

/// GET /confirmed-classes/upcoming
pub async fn upcoming(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> AppResult<impl IntoResponse> {
    let classes = state.lifecycle.upcoming_classes(&actor).await?;
    Ok(Json(DataResponse { data: classes }))
}

/// GET /confirmed-classes/{id}/class-reminder/preview
pub async fn preview_class_reminder(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let preview = state.lifecycle.preview_class_reminder(&actor, id).await?;
    Ok(Json(DataResponse { data: preview }))
}

/// POST /confirmed-classes/{id}/class-reminder
pub async fn send_class_reminder(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = state.lifecycle.send_class_reminder(&actor, id).await?;
    Ok(Json(DataResponse { data: report }))
}

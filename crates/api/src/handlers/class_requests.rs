//! Handlers for class request endpoints.
//!
//! Every handler resolves the acting user through [`AuthUser`] and defers
//! authorization, transition rules and locking to the lifecycle manager.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use lifesafe_core::class_catalog::split_class_types;
use lifesafe_core::types::{Date, DbId};
use lifesafe_db::models::class_request::{CreateClassRequest, UpdateClassRequest};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AssignEducatorBody {
    pub educator_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct ClassDateBody {
    /// Absent or null is rejected with a validation error naming the field.
    pub class_date: Option<Date>,
}

/// `?class_types=CPR,AED&educator_id=7`
#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub class_types: String,
    pub educator_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct LockReleased {
    pub released: bool,
}

// ---------------------------------------------------------------------------
// Create / read / edit / remove
// ---------------------------------------------------------------------------

/// POST /class-requests
pub async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(input): Json<CreateClassRequest>,
) -> AppResult<impl IntoResponse> {
    let created = state.lifecycle.create_request(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /class-requests/queue
pub async fn queue(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> AppResult<impl IntoResponse> {
    let rows = state.lifecycle.work_queue(&actor).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /educator/class-requests
pub async fn educator_offers(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> AppResult<impl IntoResponse> {
    let rows = state.lifecycle.educator_offers(&actor).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /class-requests/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = state.lifecycle.get_request(&actor, id).await?;
    Ok(Json(DataResponse { data: row }))
}

/// PUT /class-requests/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateClassRequest>,
) -> AppResult<impl IntoResponse> {
    let row = state.lifecycle.edit_request(&actor, id, input).await?;
    Ok(Json(DataResponse { data: row }))
}

/// DELETE /class-requests/{id}
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.lifecycle.remove_request(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /class-requests/{id}/release-lock
pub async fn release_lock(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let released = state.lifecycle.release_request_lock(&actor, id).await?;
    Ok(Json(DataResponse {
        data: LockReleased { released },
    }))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// POST /class-requests/{id}/assign-educator
pub async fn assign_educator(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<AssignEducatorBody>,
) -> AppResult<impl IntoResponse> {
    let row = state
        .lifecycle
        .assign_educator(&actor, id, body.educator_id)
        .await?;
    Ok(Json(DataResponse { data: row }))
}

/// POST /class-requests/{id}/contact-educator
///
/// Responds with the request and the outcome of the offer email.
pub async fn contact_educator(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let result = state.lifecycle.contact_educator(&actor, id).await?;
    Ok(Json(DataResponse { data: result }))
}

/// POST /class-requests/{id}/class-date
pub async fn record_class_date(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
    Json(body): Json<ClassDateBody>,
) -> AppResult<impl IntoResponse> {
    let row = state
        .lifecycle
        .record_class_date(&actor, id, body.class_date)
        .await?;
    Ok(Json(DataResponse { data: row }))
}

/// POST /class-requests/{id}/accept
pub async fn accept(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = state.lifecycle.accept_offer(&actor, id).await?;
    Ok(Json(DataResponse { data: row }))
}

/// POST /class-requests/{id}/decline
pub async fn decline(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = state.lifecycle.decline_offer(&actor, id).await?;
    Ok(Json(DataResponse { data: row }))
}

/// POST /class-requests/{id}/confirm
///
/// Promotes the request; responds with the new confirmed class.
pub async fn confirm(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let class = state.lifecycle.confirm_class(&actor, id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: class })))
}

// ---------------------------------------------------------------------------
// Estimate
// ---------------------------------------------------------------------------

/// GET /class-requests/estimate
pub async fn estimate(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<EstimateQuery>,
) -> AppResult<impl IntoResponse> {
    let class_types = split_class_types(&params.class_types);
    if class_types.is_empty() {
        return Err(AppError::BadRequest(
            "class_types must list at least one class type".into(),
        ));
    }
    let estimate = state
        .lifecycle
        .estimate_cost(&actor, class_types, params.educator_id)
        .await?;
    Ok(Json(DataResponse { data: estimate }))
}

//! Staff maintenance endpoints.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReconcileParams {
    /// Delete leftover requests instead of only reporting them.
    #[serde(default)]
    pub repair: bool,
}

/// POST /admin/reconcile?repair=true
pub async fn reconcile(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(params): Query<ReconcileParams>,
) -> AppResult<impl IntoResponse> {
    let report = state.lifecycle.reconcile_as(&actor, params.repair).await?;
    Ok(Json(DataResponse { data: report }))
}

use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Admin routes mounted at `/admin`.
///
/// ```text
/// POST /reconcile                   -> reconcile
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/reconcile", post(admin::reconcile))
}

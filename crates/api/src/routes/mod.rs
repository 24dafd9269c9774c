pub mod admin;
pub mod class_requests;
pub mod confirmed_classes;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /class-requests/...                class request lifecycle
/// /educator/class-requests           offers for the acting educator
/// /confirmed-classes/...             billing, reviews, reminders
/// /admin/reconcile                   complete interrupted promotions
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/class-requests", class_requests::router())
        .nest("/educator", class_requests::educator_router())
        .nest("/confirmed-classes", confirmed_classes::router())
        .nest("/admin", admin::router())
}

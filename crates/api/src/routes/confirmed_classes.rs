use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::confirmed_classes;
use crate::state::AppState;

/// Confirmed class routes mounted at `/confirmed-classes`.
///
/// ```text
/// GET  /pending-bills                  -> pending_bills
/// GET  /upcoming                       -> upcoming
/// GET  /{id}                           -> get_by_id
/// PUT  /{id}/billing                   -> update_billing
/// POST /{id}/bill                      -> mark_billed
/// POST /{id}/roster-reminder           -> roster_reminder
/// POST /{id}/review                    -> submit_review
/// POST /{id}/release-lock              -> release_lock
/// GET  /{id}/class-reminder/preview    -> preview_class_reminder
/// POST /{id}/class-reminder            -> send_class_reminder
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending-bills", get(confirmed_classes::pending_bills))
        .route("/upcoming", get(confirmed_classes::upcoming))
        .route("/{id}", get(confirmed_classes::get_by_id))
        .route("/{id}/billing", put(confirmed_classes::update_billing))
        .route("/{id}/bill", post(confirmed_classes::mark_billed))
        .route("/{id}/roster-reminder", post(confirmed_classes::roster_reminder))
        .route("/{id}/review", post(confirmed_classes::submit_review))
        .route("/{id}/release-lock", post(confirmed_classes::release_lock))
        .route(
            "/{id}/class-reminder/preview",
            get(confirmed_classes::preview_class_reminder),
        )
        .route(
            "/{id}/class-reminder",
            post(confirmed_classes::send_class_reminder),
        )
}

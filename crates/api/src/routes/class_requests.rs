use axum::routing::{get, post};
use axum::Router;

use crate::handlers::class_requests;
use crate::state::AppState;

/// Class request routes mounted at `/class-requests`.
///
/// ```text
/// POST   /                          -> create
/// GET    /queue                     -> queue
/// GET    /estimate                  -> estimate
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> remove
/// POST   /{id}/assign-educator      -> assign_educator
/// POST   /{id}/contact-educator     -> contact_educator
/// POST   /{id}/class-date           -> record_class_date
/// POST   /{id}/accept               -> accept
/// POST   /{id}/decline              -> decline
/// POST   /{id}/confirm              -> confirm
/// POST   /{id}/release-lock         -> release_lock
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(class_requests::create))
        .route("/queue", get(class_requests::queue))
        .route("/estimate", get(class_requests::estimate))
        .route(
            "/{id}",
            get(class_requests::get_by_id)
                .put(class_requests::update)
                .delete(class_requests::remove),
        )
        .route("/{id}/assign-educator", post(class_requests::assign_educator))
        .route("/{id}/contact-educator", post(class_requests::contact_educator))
        .route("/{id}/class-date", post(class_requests::record_class_date))
        .route("/{id}/accept", post(class_requests::accept))
        .route("/{id}/decline", post(class_requests::decline))
        .route("/{id}/confirm", post(class_requests::confirm))
        .route("/{id}/release-lock", post(class_requests::release_lock))
}

/// Educator-facing routes mounted at `/educator`.
///
/// ```text
/// GET /class-requests               -> educator_offers
/// ```
pub fn educator_router() -> Router<AppState> {
    Router::new().route("/class-requests", get(class_requests::educator_offers))
}

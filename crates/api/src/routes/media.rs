//! Route definitions for the `/media` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch};
use axum::Router;
use classiklust_core::media::MAX_UPLOAD_BYTES;

use crate::handlers::media;
use crate::state::AppState;

/// Headroom for the non-file multipart fields.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/media`.
///
/// ```text
/// GET    /      -> list (public)
/// POST   /      -> upload (admin, multipart)
/// PATCH  /{id}  -> update (admin)
/// DELETE /{id}  -> delete (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(media::list).post(media::upload).layer(DefaultBodyLimit::max(
                MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES,
            )),
        )
        .route("/{id}", patch(media::update).delete(media::delete))
}

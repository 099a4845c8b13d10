pub mod auth;
pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

pub use auth::IdpConfig;
pub use handlers::AppState;

/// Create the TMF632 party-management router.
///
/// `GET /organization/` and `GET /organization/:id` share one handler; the
/// id is extracted as `Option<Path<i32>>`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // ================================================================
        // Organization
        // ================================================================
        .route(
            "/organization/",
            post(handlers::create_organization).get(handlers::get_organization),
        )
        .route(
            "/organization/:id",
            get(handlers::get_organization)
                .patch(handlers::update_organization)
                .delete(handlers::delete_organization),
        )
        // ================================================================
        // Authorized Users
        // ================================================================
        .route(
            "/organization/:id/authorized-users",
            get(handlers::get_organization_authorized_users)
                .post(handlers::create_organization_authorized_user),
        )
        .route(
            "/organization/:id/authorized-users/:user_id",
            delete(handlers::delete_organization_authorized_user),
        )
}

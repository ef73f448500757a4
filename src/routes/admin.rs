use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to sessions holding the Admin
/// role: the approval gate mutations, user moderation and category management.
///
/// Access Control:
/// Each handler authenticates via the `AuthUser` extractor and then explicitly
/// requires the Admin role before touching the repository. An authenticated
/// non-admin receives 403; an anonymous caller receives 401 from the extractor.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters (users, recipes, categories, comments, pending approvals).
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/users
        // The moderation list: every account with authored-content counts.
        .route("/users", get(handlers::list_users))
        // POST /admin/users/{id}/approve | /reject
        // The approval gate mutations. Both are idempotent; rejecting an
        // approved account revokes its ability to authenticate at next login.
        .route("/users/{id}/approve", post(handlers::approve_user))
        .route("/users/{id}/reject", post(handlers::reject_user))
        // DELETE /admin/users/{id}
        // Removes an account (never the admin's own); authored content
        // cascades away with it.
        .route("/users/{id}", delete(handlers::delete_user))
        // Category management. Deletion is refused while recipes reference
        // the category.
        .route("/categories", post(handlers::create_category))
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
}

use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in): the identity gateway (register/login) and the
/// read-only catalog. Every write surface lives behind the authenticated or
/// admin routers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // New account creation. The approval gate decides the initial
        // is_approved value from the requested role; elevated roles wait for
        // an admin.
        .route("/register", post(handlers::register))
        // POST /login
        // Credential check followed by the approval gate; yields a signed
        // session token. The two rejection reasons stay distinguishable.
        .route("/login", post(handlers::login))
        // GET /recipes?search=...&category_id=...
        // Lists recipes newest first with substring search over
        // title/description/ingredients and an exact category filter.
        .route("/recipes", get(handlers::list_recipes))
        // GET /recipes/{id}
        // The joined detail view. Every call increments the view counter by
        // exactly one, anonymous views included.
        .route("/recipes/{id}", get(handlers::get_recipe_detail))
        // GET /categories
        // The category list backing the filter UI.
        .route("/categories", get(handlers::list_categories))
}

use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer: the social interaction surface (comments, ratings,
/// favorites), recipe authoring and the personal dashboard.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. The extractor yields
/// the session's point-in-time (id, username, role) snapshot; the finer-grained
/// gates (`is_chef_or_admin` for authoring, `owns_or_admin` for mutation) are
/// evaluated inside the handlers so a denied caller receives 403, never 404.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Echo of the session snapshot (id, username, role).
        .route("/me", get(handlers::get_me))
        // GET /me/recipes
        // The author's own recipes, newest first.
        .route("/me/recipes", get(handlers::get_my_recipes))
        // GET /me/stats
        // The author dashboard: recipe/view/comment totals and rating average.
        .route("/me/stats", get(handlers::get_my_stats))
        // GET /me/favorites
        // The user's favorites, newest-favorited first.
        .route("/me/favorites", get(handlers::get_my_favorites))
        // --- Recipe Authoring ---
        // POST /recipes
        // Submits a new recipe. Gated on the Chef/Admin roles inside the handler.
        .route("/recipes", post(handlers::create_recipe))
        // PUT/DELETE /recipes/{id}
        // Modify or remove a recipe. Strict ownership check (owner or admin
        // override) is enforced within the handler logic.
        .route(
            "/recipes/{id}",
            put(handlers::update_recipe).delete(handlers::delete_recipe),
        )
        // --- Social Interaction ---
        // POST /recipes/{id}/comments
        // Appends a comment; any authenticated role may comment.
        .route("/recipes/{id}/comments", post(handlers::add_comment))
        // PUT /recipes/{id}/rating
        // Upserts the caller's rating for the recipe: one row per
        // (user, recipe), last submitted score wins.
        .route("/recipes/{id}/rating", put(handlers::rate_recipe))
        // POST /recipes/{id}/favorite
        // Toggles the favorite flag; two calls in a row are a no-op pair.
        .route("/recipes/{id}/favorite", post(handlers::toggle_favorite))
}

use crate::{
    AppState,
    auth::{AuthUser, issue_token},
    error::ApiError,
    models::{
        AdminDashboardStats, Category, CategoryRequest, ChefDashboardStats, Comment,
        CreateCommentRequest, CreateRecipeRequest, FavoriteRecipe, LoginRequest, LoginResponse,
        ManagedUser, RateRecipeRequest, Rating, Recipe, RecipeDetail, RecipeSummary,
        RegisterRequest, Role, SessionInfo, ToggleFavoriteResponse, UpdateRecipeRequest,
        UserProfile,
    },
    repository::NewUser,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

// --- Filter Structs ---

/// RecipeFilter
///
/// Accepted query parameters for the public recipe listing (GET /recipes).
/// Both filters are optional and compose with AND when both are supplied.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct RecipeFilter {
    /// Substring match against title, description or ingredients.
    pub search: Option<String>,
    /// Exact-match restriction to one category.
    pub category_id: Option<i64>,
}

/// Rejects blank required fields with a per-field message.
fn require_field(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

// --- Identity & Session Handlers ---

/// register
///
/// [Public Route] Creates an account. Field checks run in contract order:
/// password mismatch, then duplicate email, then duplicate username; the
/// first match wins.
///
/// *Approval Gate*: the approval flag is derived from the requested role
/// server-side (`User` → approved, `Chef`/`Admin` → pending) and is not part
/// of the payload, so it can never be client-set.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered (possibly pending approval)", body = UserProfile),
        (status = 409, description = "Duplicate email or username"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    if payload.password != payload.confirm_password {
        return Err(ApiError::Validation("passwords do not match".to_string()));
    }
    require_field(&payload.username, "username")?;
    require_field(&payload.email, "email")?;
    require_field(&payload.password, "password")?;

    // The plaintext never goes further than this call.
    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    let role = payload.role.unwrap_or(Role::User);
    let user = state
        .repo
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            role,
            full_name: payload.full_name,
            is_approved: role.approved_on_registration(),
        })
        .await?;

    if !user.is_approved {
        tracing::info!(user_id = user.id, role = ?user.role, "registration pending admin approval");
    }

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// login
///
/// [Public Route] Exchanges credentials for a session grant.
///
/// The two rejection reasons stay distinguishable: wrong credentials yield
/// `invalid email or password`, an unapproved elevated account yields
/// `account awaiting approval`. The approval gate runs only after the
/// credential check so it never leaks whether an email is registered.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session granted", body = LoginResponse),
        (status = 401, description = "Bad credentials or awaiting approval")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(ApiError::BadCredentials)?;

    let valid = bcrypt::verify(&payload.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))?;
    if !valid {
        return Err(ApiError::BadCredentials);
    }

    // Approval gate: canAuthenticate(user) == user.is_approved.
    if !user.is_approved {
        return Err(ApiError::NotApproved);
    }

    let token = issue_token(&user, &state.config)?;
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// get_me
///
/// [Authenticated Route] Echoes the session snapshot resolved by the
/// `AuthUser` extractor. Deliberately not a database read.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Session", body = SessionInfo))
)]
pub async fn get_me(AuthUser { id, username, role }: AuthUser) -> Json<SessionInfo> {
    Json(SessionInfo { id, username, role })
}

// --- Recipe Catalog Handlers ---

/// list_recipes
///
/// [Public Route] Lists recipes newest first, with optional search and
/// category filters.
#[utoipa::path(
    get,
    path = "/recipes",
    params(RecipeFilter),
    responses((status = 200, description = "List filtered recipes", body = [RecipeSummary]))
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(filter): Query<RecipeFilter>,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let recipes = state
        .repo
        .list_recipes(filter.search, filter.category_id)
        .await?;
    Ok(Json(recipes))
}

/// get_recipe_detail
///
/// [Public Route] Retrieves the joined detail view.
///
/// Side effect: the view counter increments by exactly 1 per call, owner
/// views included. Not idempotent and not deduplicated per viewer.
#[utoipa::path(
    get,
    path = "/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Found", body = RecipeDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_recipe_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let detail = state.repo.get_recipe_detail(id).await?;
    Ok(Json(detail))
}

/// create_recipe
///
/// [Authenticated Route] Submits a new recipe. Gate: `is_chef_or_admin`.
/// The server sets owner, creation date and a zero view count regardless of
/// client-supplied values.
#[utoipa::path(
    post,
    path = "/recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Created", body = Recipe),
        (status = 403, description = "Not a chef or admin"),
        (status = 422, description = "Missing required fields")
    )
)]
pub async fn create_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    auth.require_chef_or_admin()?;

    require_field(&payload.title, "title")?;
    require_field(&payload.description, "description")?;
    require_field(&payload.ingredients, "ingredients")?;
    require_field(&payload.instructions, "instructions")?;

    let recipe = state.repo.create_recipe(payload, auth.id).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// update_recipe
///
/// [Authenticated Route] Partial update of a recipe. Gate: `owns_or_admin`.
///
/// Existence resolves first, then ownership: an absent id yields 404, a
/// non-owner non-admin gets 403; the two outcomes never conflate. Owner,
/// creation date and view count survive the update untouched.
#[utoipa::path(
    put,
    path = "/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Updated", body = Recipe),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = state
        .repo
        .get_recipe(id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    auth.require_owner_or_admin(recipe.user_id)?;

    let updated = state.repo.update_recipe(id, payload).await?;
    Ok(Json(updated))
}

/// delete_recipe
///
/// [Authenticated Route] Deletes a recipe. Gate: `owns_or_admin`.
/// The store cascades the deletion to the recipe's comments, ratings and
/// favorites, leaving no orphans.
#[utoipa::path(
    delete,
    path = "/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_recipe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let recipe = state
        .repo
        .get_recipe(id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    auth.require_owner_or_admin(recipe.user_id)?;

    state.repo.delete_recipe(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// list_categories
///
/// [Public Route] Lists all categories, used by the listing filter UI.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = state.repo.list_categories().await?;
    Ok(Json(categories))
}

// --- Owner Dashboard Handlers ---

/// get_my_recipes
///
/// [Authenticated Route] Lists the requesting user's own recipes, newest first.
#[utoipa::path(
    get,
    path = "/me/recipes",
    responses((status = 200, description = "My Recipes", body = [RecipeSummary]))
)]
pub async fn get_my_recipes(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let recipes = state.repo.list_recipes_by_owner(id).await?;
    Ok(Json(recipes))
}

/// get_my_stats
///
/// [Authenticated Route] The author dashboard: totals over the requesting
/// user's own recipes.
#[utoipa::path(
    get,
    path = "/me/stats",
    responses((status = 200, description = "My Stats", body = ChefDashboardStats))
)]
pub async fn get_my_stats(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ChefDashboardStats>, ApiError> {
    let stats = state.repo.chef_stats(id).await?;
    Ok(Json(stats))
}

/// get_my_favorites
///
/// [Authenticated Route] Lists the requesting user's favorites,
/// newest-favorited first.
#[utoipa::path(
    get,
    path = "/me/favorites",
    responses((status = 200, description = "My Favorites", body = [FavoriteRecipe]))
)]
pub async fn get_my_favorites(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<FavoriteRecipe>>, ApiError> {
    let favorites = state.repo.list_favorites(id).await?;
    Ok(Json(favorites))
}

// --- Social Interaction Handlers ---

/// add_comment
///
/// [Authenticated Route] Appends a comment to a recipe. Any authenticated
/// role may comment; the server sets the creation date.
#[utoipa::path(
    post,
    path = "/recipes/{id}/comments",
    params(("id" = i64, Path, description = "Recipe ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = Comment),
        (status = 404, description = "Recipe Not Found")
    )
)]
pub async fn add_comment(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    require_field(&payload.text, "text")?;

    state
        .repo
        .get_recipe(recipe_id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;

    let comment = state.repo.add_comment(recipe_id, user_id, payload.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// rate_recipe
///
/// [Authenticated Route] Rates a recipe with a score in [1,5].
///
/// *Upsert*: a repeat rating by the same user overwrites the existing row's
/// score in place: after any sequence of calls exactly one rating row exists
/// per (user, recipe), holding the most recent score.
#[utoipa::path(
    put,
    path = "/recipes/{id}/rating",
    params(("id" = i64, Path, description = "Recipe ID")),
    request_body = RateRecipeRequest,
    responses(
        (status = 200, description = "Rated", body = Rating),
        (status = 404, description = "Recipe Not Found"),
        (status = 422, description = "Score out of bounds")
    )
)]
pub async fn rate_recipe(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(payload): Json<RateRecipeRequest>,
) -> Result<Json<Rating>, ApiError> {
    if !(1..=5).contains(&payload.score) {
        return Err(ApiError::Validation(
            "score must be between 1 and 5".to_string(),
        ));
    }

    state
        .repo
        .get_recipe(recipe_id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;

    let rating = state
        .repo
        .upsert_rating(recipe_id, user_id, payload.score)
        .await?;
    Ok(Json(rating))
}

/// toggle_favorite
///
/// [Authenticated Route] Toggles the favorite state for (user, recipe).
/// Two successive calls restore the original state.
#[utoipa::path(
    post,
    path = "/recipes/{id}/favorite",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Toggled", body = ToggleFavoriteResponse),
        (status = 404, description = "Recipe Not Found")
    )
)]
pub async fn toggle_favorite(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> Result<Json<ToggleFavoriteResponse>, ApiError> {
    state
        .repo
        .get_recipe(recipe_id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;

    let favorited = state.repo.toggle_favorite(recipe_id, user_id).await?;
    Ok(Json(ToggleFavoriteResponse { favorited }))
}

// --- Admin Handlers ---

/// get_admin_stats
///
/// [Admin Route] Core application statistics for the dashboard.
/// Gate: `is_admin`.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.repo.admin_stats().await?))
}

/// list_users
///
/// [Admin Route] Lists all users, newest first, with authored-content counts
/// for the moderation view. Gate: `is_admin`.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All users", body = [ManagedUser]))
)]
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ManagedUser>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.repo.list_users().await?))
}

/// approve_user
///
/// [Admin Route] Flips the approval gate open for an elevated account.
/// Idempotent: approving an already-approved user still succeeds.
#[utoipa::path(
    post,
    path = "/admin/users/{id}/approve",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Approved", body = UserProfile),
        (status = 404, description = "Not Found")
    )
)]
pub async fn approve_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    auth.require_admin()?;
    let user = state.repo.set_user_approval(id, true).await?;
    tracing::info!(user_id = id, "user approved");
    Ok(Json(user.into()))
}

/// reject_user
///
/// [Admin Route] Closes the approval gate for an account. Also idempotent.
/// A rejected user keeps their record but can no longer authenticate.
#[utoipa::path(
    post,
    path = "/admin/users/{id}/reject",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Rejected", body = UserProfile),
        (status = 404, description = "Not Found")
    )
)]
pub async fn reject_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    auth.require_admin()?;
    let user = state.repo.set_user_approval(id, false).await?;
    tracing::info!(user_id = id, "user approval revoked");
    Ok(Json(user.into()))
}

/// delete_user
///
/// [Admin Route] Deletes a user account. Self-deletion is refused so an
/// admin cannot lock the system out of moderation. The user's authored
/// recipes and interactions cascade away with the row.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Cannot delete own account")
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    if id == auth.id {
        return Err(ApiError::Validation(
            "cannot delete your own account".to_string(),
        ));
    }
    state.repo.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// create_category
///
/// [Admin Route] Adds a category. Gate: `is_admin`.
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryRequest,
    responses((status = 201, description = "Created", body = Category))
)]
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    auth.require_admin()?;
    require_field(&payload.name, "name")?;
    let category = state.repo.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route] Replaces a category's name and description.
#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    auth.require_admin()?;
    require_field(&payload.name, "name")?;
    let category = state.repo.update_category(id, payload).await?;
    Ok(Json(category))
}

/// delete_category
///
/// [Admin Route] Deletes a category, refused with a business-rule conflict
/// while any recipe still references it.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Category in use")
    )
)]
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    state.repo.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

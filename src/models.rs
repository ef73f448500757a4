use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The closed set of account roles, stored as TEXT in the `users` table.
/// `User` accounts are active immediately; `Chef` and `Admin` registrations
/// sit behind the approval gate until an admin flips `is_approved`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "text")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Chef,
    Admin,
}

impl Role {
    /// Registration policy: only plain users are approved at creation time.
    /// Elevated roles always start unapproved, irrespective of any value the
    /// client attempted to supply. The flag is not even part of the payload.
    pub fn approved_on_registration(self) -> bool {
        matches!(self, Role::User)
    }
}

/// User
///
/// The canonical identity record from the `users` table, including the bcrypt
/// password hash. This struct never crosses the API boundary; handlers convert
/// it to [`UserProfile`] before serialization so the hash cannot leak.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    // Salted one-way bcrypt hash. The plaintext password is never persisted.
    pub password_hash: String,
    pub role: Role,
    pub full_name: String,
    pub created_date: DateTime<Utc>,
    // The approval gate flag. Mutable only through the admin endpoints.
    pub is_approved: bool,
}

/// UserProfile
///
/// The outward-facing projection of a [`User`]: everything except the
/// password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    #[ts(type = "string")]
    pub created_date: DateTime<Utc>,
    pub is_approved: bool,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            full_name: u.full_name,
            created_date: u.created_date,
            is_approved: u.is_approved,
        }
    }
}

/// Category
///
/// A recipe category from the `categories` table. Deletion is blocked while
/// any recipe references it (checked as a business rule, not an FK error).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Recipe
///
/// A recipe record from the `recipes` table. Owned exclusively by its creator
/// for mutation purposes; admins hold an override. `view_count` is monotonic,
/// incremented once per detail view, never deduplicated per viewer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub description: String,
    // Free text; participates in the list search alongside title/description.
    pub ingredients: String,
    pub instructions: String,
    pub preparation_time: i32,
    pub image_url: String,
    #[ts(type = "string")]
    pub created_date: DateTime<Utc>,
    pub view_count: i64,
    pub category_id: i64,
    // FK to users.id (Owner).
    pub user_id: i64,
}

/// Comment
///
/// A comment record augmented with the author's username (a join operation).
/// Append-only from the interaction surface; removed only by the recipe
/// deletion cascade.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    #[ts(type = "string")]
    pub created_date: DateTime<Utc>,
    pub recipe_id: i64,
    pub user_id: i64,
    // Loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub author_username: Option<String>,
}

/// Rating
///
/// A score in [1,5]. At most one row exists per (user, recipe) pair; a repeat
/// rating overwrites the score in place (upsert on the uniqueness constraint).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Rating {
    pub id: i64,
    pub score: i32,
    pub recipe_id: i64,
    pub user_id: i64,
}

/// average_rating
///
/// Arithmetic mean of the given scores, defined as 0.0 when there are none,
/// so it is never null and never a divide-by-zero.
pub fn average_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    ratings.iter().map(|r| f64::from(r.score)).sum::<f64>() / ratings.len() as f64
}

// --- Composite Read Models (Output) ---

/// RecipeSummary
///
/// A single row of the public recipe listing: the recipe joined with its
/// category name, author username and rating aggregates. Produced by one
/// grouped query in the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub preparation_time: i32,
    pub image_url: String,
    #[ts(type = "string")]
    pub created_date: DateTime<Utc>,
    pub view_count: i64,
    pub category_id: i64,
    pub category_name: String,
    pub user_id: i64,
    pub author_username: String,
    // COALESCE(AVG(score), 0): defined as 0 when no ratings exist.
    pub average_rating: f64,
    pub rating_count: i64,
}

/// Author
///
/// The minimal owner projection embedded in a recipe detail.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Author {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

/// RecipeDetail
///
/// The full detail view: recipe plus joined category, owner, comments
/// (with author usernames), ratings and aggregates. Fetching it is the one
/// read with a side effect: the view counter has already been incremented
/// by the time this struct is assembled.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub category: Category,
    pub owner: Author,
    pub comments: Vec<Comment>,
    pub ratings: Vec<Rating>,
    pub average_rating: f64,
    pub favorite_count: i64,
}

/// FavoriteRecipe
///
/// A row of the "my favorites" listing, ordered newest-favorited first:
/// the favorite joined with the recipe, its category name, author and
/// rating average.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct FavoriteRecipe {
    pub favorite_id: i64,
    #[ts(type = "string")]
    pub added_date: DateTime<Utc>,
    pub recipe_id: i64,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category_name: String,
    pub author_username: String,
    pub average_rating: f64,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /register).
/// Note the deliberate absence of an approval field: the approval flag is a
/// server-side decision derived from the requested role and must never be
/// client-settable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    /// Requested role; defaults to `User` when omitted.
    pub role: Option<Role>,
}

/// LoginRequest
///
/// Input payload for POST /login. Yields a session grant or one of two
/// distinguishable rejections (bad credentials vs. not approved).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// The session grant: a signed bearer token carrying the point-in-time
/// (id, username, role) snapshot, plus the resolved profile for the UI.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// CreateRecipeRequest
///
/// Input payload for submitting a new recipe (POST /recipes). The server sets
/// the owner, creation date and view count regardless of client input.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub description: String,
    pub ingredients: String,
    pub instructions: String,
    pub preparation_time: i32,
    pub image_url: Option<String>,
    pub category_id: i64,
}

/// UpdateRecipeRequest
///
/// Partial update payload for PUT /recipes/{id}.
///
/// Uses `Option<T>` for all fields with `#[serde(skip_serializing_if)]` so
/// only provided fields are included; the repository applies them with
/// COALESCE. Owner, creation date and view count are never updatable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRecipeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preparation_time: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// CreateCommentRequest
///
/// Input payload for posting a new comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// RateRecipeRequest
///
/// Input payload for rating a recipe. The score bound is enforced in the
/// handler; repeated submissions by the same user upsert in place.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RateRecipeRequest {
    pub score: i32,
}

/// ToggleFavoriteResponse
///
/// Result of the favorite toggle: `favorited` reflects the state after the
/// call. Two successive toggles return to the original state.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ToggleFavoriteResponse {
    pub favorited: bool,
}

/// SessionInfo
///
/// Echo of the authenticated session's claims (GET /me). This is the
/// point-in-time snapshot from the token, not a fresh database read: role
/// changes made after login show up here only after the next login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionInfo {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// CategoryRequest
///
/// Input payload for creating or replacing a category (admin only).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryRequest {
    pub name: String,
    pub description: String,
}

// --- Dashboard & Moderation Schemas (Output) ---

/// AdminDashboardStats
///
/// Output schema for the administrative statistics dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub total_recipes: i64,
    pub total_categories: i64,
    pub total_comments: i64,
    /// The number of elevated accounts still waiting for approval.
    pub pending_approvals: i64,
}

/// ChefDashboardStats
///
/// Output schema for the authenticated author's own dashboard (GET /me/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChefDashboardStats {
    pub total_recipes: i64,
    pub total_views: i64,
    pub total_comments: i64,
    /// Mean of the per-recipe rating averages over the author's rated recipes;
    /// 0 when none of them have ratings yet.
    pub average_rating: f64,
}

/// ManagedUser
///
/// A row of the admin user list (GET /admin/users): the profile joined with
/// authored recipe and comment counts.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ManagedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    #[ts(type = "string")]
    pub created_date: DateTime<Utc>,
    pub is_approved: bool,
    pub recipe_count: i64,
    pub comment_count: i64,
}

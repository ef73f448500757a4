use crate::error::ApiError;
use crate::models::{
    AdminDashboardStats, Author, Category, CategoryRequest, ChefDashboardStats, Comment,
    CreateRecipeRequest, FavoriteRecipe, ManagedUser, Rating, Recipe, RecipeDetail, RecipeSummary,
    Role, UpdateRecipeRequest, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// NewUser
///
/// The write model for user creation. Assembled by the registration handler:
/// the password is already hashed and the approval flag already derived from
/// the requested role, so the repository never sees client-controlled values
/// for either.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub full_name: String,
    pub is_approved: bool,
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the
/// core of the Repository Abstraction pattern, allowing the handlers to
/// interact with the data layer without knowing the specific implementation
/// (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's async task
/// boundaries.
///
/// Error contract: every method returns `Result<_, ApiError>` so the store's
/// constraint breaches surface through the application's error taxonomy
/// instead of being swallowed.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identity Store & Approval Gate ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, ApiError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    // Enforces email/username uniqueness, checked in that order (first match wins);
    // the store's unique indexes remain the final arbiter under concurrency.
    async fn create_user(&self, user: NewUser) -> Result<User, ApiError>;
    // Admin moderation view: all users, newest first, with authored-content counts.
    async fn list_users(&self) -> Result<Vec<ManagedUser>, ApiError>;
    // Approve/reject in one operation. Idempotent: re-applying the current
    // state still succeeds.
    async fn set_user_approval(&self, id: i64, approved: bool) -> Result<User, ApiError>;
    // Admin-only. Cascades to the user's recipes (and their dependents),
    // comments, ratings and favorites; see db.rs for the cascade contract.
    async fn delete_user(&self, id: i64) -> Result<(), ApiError>;

    // --- Category Catalog ---
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;
    async fn create_category(&self, req: CategoryRequest) -> Result<Category, ApiError>;
    async fn update_category(&self, id: i64, req: CategoryRequest) -> Result<Category, ApiError>;
    // Blocked with a business-rule conflict while any recipe references the
    // category. Checked before deletion, not left to the FK error path.
    async fn delete_category(&self, id: i64) -> Result<(), ApiError>;

    // --- Recipe Catalog ---
    // Public listing, newest first. Search is a substring match over
    // title/description/ingredients; the category filter is exact; both
    // compose with AND.
    async fn list_recipes(
        &self,
        search: Option<String>,
        category_id: Option<i64>,
    ) -> Result<Vec<RecipeSummary>, ApiError>;
    // Bare row fetch, used by handlers to resolve existence and ownership
    // before mutating.
    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, ApiError>;
    // The joined detail view. Side effect: increments view_count by exactly 1,
    // unconditionally, before assembling the response.
    async fn get_recipe_detail(&self, id: i64) -> Result<RecipeDetail, ApiError>;
    async fn create_recipe(
        &self,
        req: CreateRecipeRequest,
        owner_id: i64,
    ) -> Result<Recipe, ApiError>;
    // Partial update via COALESCE. Owner, creation date and view count are
    // never touched; authorization happens in the handler so a non-owner gets
    // Forbidden rather than NotFound.
    async fn update_recipe(&self, id: i64, req: UpdateRecipeRequest) -> Result<Recipe, ApiError>;
    // Cascades to comments, ratings and favorites at the store.
    async fn delete_recipe(&self, id: i64) -> Result<(), ApiError>;
    // The author's own recipes, newest first, for the chef dashboard.
    async fn list_recipes_by_owner(&self, user_id: i64) -> Result<Vec<RecipeSummary>, ApiError>;

    // --- Social Interaction Engine ---
    async fn add_comment(
        &self,
        recipe_id: i64,
        user_id: i64,
        text: String,
    ) -> Result<Comment, ApiError>;
    // Single atomic insert-or-update keyed on the (user_id, recipe_id)
    // uniqueness constraint. Never a check-then-insert pair.
    async fn upsert_rating(
        &self,
        recipe_id: i64,
        user_id: i64,
        score: i32,
    ) -> Result<Rating, ApiError>;
    // Toggle semantics: delete-if-present, else insert. Returns the state
    // after the call (true = now favorited).
    async fn toggle_favorite(&self, recipe_id: i64, user_id: i64) -> Result<bool, ApiError>;
    // Newest-favorited first.
    async fn list_favorites(&self, user_id: i64) -> Result<Vec<FavoriteRecipe>, ApiError>;

    // --- Dashboards ---
    async fn admin_stats(&self) -> Result<AdminDashboardStats, ApiError>;
    async fn chef_stats(&self, user_id: i64) -> Result<ChefDashboardStats, ApiError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, full_name, created_date, is_approved";
const RECIPE_COLUMNS: &str = "id, title, description, ingredients, instructions, \
     preparation_time, image_url, created_date, view_count, category_id, user_id";

// The grouped listing projection shared by the public list and the owner list.
const RECIPE_SUMMARY_SELECT: &str = r#"
    SELECT
        r.id, r.title, r.description, r.preparation_time, r.image_url,
        r.created_date, r.view_count,
        r.category_id, c.name AS category_name,
        r.user_id, u.username AS author_username,
        COALESCE(AVG(rt.score), 0)::float8 AS average_rating,
        COUNT(rt.id) AS rating_count
    FROM recipes r
    JOIN categories c ON r.category_id = c.id
    JOIN users u ON r.user_id = u.id
    LEFT JOIN ratings rt ON rt.recipe_id = r.id
    "#;

#[async_trait]
impl Repository for PostgresRepository {
    // --- Identity Store & Approval Gate ---

    async fn get_user(&self, id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_user
    ///
    /// Pre-checks duplicates in the contract-mandated order (email first,
    /// username second) so each collision gets its own message. A concurrent
    /// registration slipping between the checks and the insert still cannot
    /// produce a duplicate: the unique indexes reject it and the violation
    /// surfaces as a Conflict.
    async fn create_user(&self, user: NewUser) -> Result<User, ApiError> {
        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&user.email)
                .fetch_one(&self.pool)
                .await?;
        if email_taken {
            return Err(ApiError::Conflict("email already registered".to_string()));
        }

        let username_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(&user.username)
                .fetch_one(&self.pool)
                .await?;
        if username_taken {
            return Err(ApiError::Conflict("username already taken".to_string()));
        }

        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, role, full_name, is_approved) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.full_name)
        .bind(user.is_approved)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list_users(&self) -> Result<Vec<ManagedUser>, ApiError> {
        let users = sqlx::query_as::<_, ManagedUser>(
            r#"
            SELECT
                u.id, u.username, u.email, u.role, u.full_name, u.created_date, u.is_approved,
                (SELECT COUNT(*) FROM recipes r WHERE r.user_id = u.id) AS recipe_count,
                (SELECT COUNT(*) FROM comments c WHERE c.user_id = u.id) AS comment_count
            FROM users u
            ORDER BY u.created_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// set_user_approval
    ///
    /// The approval gate mutation. The UPDATE applies whether or not the flag
    /// already holds the requested value, which makes approve/reject
    /// idempotent: only a missing id fails.
    async fn set_user_approval(&self, id: i64, approved: bool) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_approved = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("user"))
    }

    async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("user"));
        }
        Ok(())
    }

    // --- Category Catalog ---

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn create_category(&self, req: CategoryRequest) -> Result<Category, ApiError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) \
             RETURNING id, name, description",
        )
        .bind(&req.name)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn update_category(&self, id: i64, req: CategoryRequest) -> Result<Category, ApiError> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, description = $3 WHERE id = $1 \
             RETURNING id, name, description",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("category"))
    }

    /// delete_category
    ///
    /// The in-use check runs as an explicit business rule before the DELETE so
    /// the caller gets "category in use" rather than a raw FK violation.
    async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if in_use > 0 {
            return Err(ApiError::Conflict(
                "category in use: recipes still reference it".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("category"));
        }
        Ok(())
    }

    // --- Recipe Catalog ---

    /// list_recipes
    ///
    /// Implements flexible search/filtering using QueryBuilder for safe
    /// parameterization: all user input is bound, never interpolated.
    async fn list_recipes(
        &self,
        search: Option<String>,
        category_id: Option<i64>,
    ) -> Result<Vec<RecipeSummary>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(RECIPE_SUMMARY_SELECT);
        builder.push(" WHERE TRUE ");

        if let Some(s) = search {
            // Substring match across title, description and ingredients.
            let pattern = format!("%{}%", s);
            builder.push(" AND (r.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR r.description ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR r.ingredients ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        if let Some(cid) = category_id {
            builder.push(" AND r.category_id = ");
            builder.push_bind(cid);
        }

        builder.push(" GROUP BY r.id, c.name, u.username ORDER BY r.created_date DESC");

        let recipes = builder
            .build_query_as::<RecipeSummary>()
            .fetch_all(&self.pool)
            .await?;
        Ok(recipes)
    }

    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, ApiError> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(recipe)
    }

    /// get_recipe_detail
    ///
    /// The increment and the fetch are one statement: UPDATE .. RETURNING.
    /// Each concurrent detail view bumps the counter by exactly 1; no global
    /// ordering is guaranteed, only per-write atomicity.
    async fn get_recipe_detail(&self, id: i64) -> Result<RecipeDetail, ApiError> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "UPDATE recipes SET view_count = view_count + 1 WHERE id = $1 \
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;

        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE id = $1",
        )
        .bind(recipe.category_id)
        .fetch_one(&self.pool)
        .await?;

        let owner =
            sqlx::query_as::<_, Author>("SELECT id, username, full_name FROM users WHERE id = $1")
                .bind(recipe.user_id)
                .fetch_one(&self.pool)
                .await?;

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.text, c.created_date, c.recipe_id, c.user_id,
                   u.username AS author_username
            FROM comments c
            JOIN users u ON c.user_id = u.id
            WHERE c.recipe_id = $1
            ORDER BY c.created_date ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT id, score, recipe_id, user_id FROM ratings WHERE recipe_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let favorite_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE recipe_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        let average_rating = crate::models::average_rating(&ratings);

        Ok(RecipeDetail {
            recipe,
            category,
            owner,
            comments,
            ratings,
            average_rating,
            favorite_count,
        })
    }

    /// create_recipe
    ///
    /// The server decides owner, creation date and the zero view count;
    /// nothing the client sends can influence them.
    async fn create_recipe(
        &self,
        req: CreateRecipeRequest,
        owner_id: i64,
    ) -> Result<Recipe, ApiError> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "INSERT INTO recipes \
             (title, description, ingredients, instructions, preparation_time, image_url, \
              view_count, category_id, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8) \
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.ingredients)
        .bind(&req.instructions)
        .bind(req.preparation_time)
        .bind(req.image_url.unwrap_or_default())
        .bind(req.category_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(recipe)
    }

    /// update_recipe
    ///
    /// Uses COALESCE to apply only the provided fields. user_id, created_date
    /// and view_count never appear in the SET list, which is what preserves
    /// them across the update regardless of client input.
    async fn update_recipe(&self, id: i64, req: UpdateRecipeRequest) -> Result<Recipe, ApiError> {
        sqlx::query_as::<_, Recipe>(&format!(
            "UPDATE recipes SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                ingredients = COALESCE($4, ingredients), \
                instructions = COALESCE($5, instructions), \
                preparation_time = COALESCE($6, preparation_time), \
                image_url = COALESCE($7, image_url), \
                category_id = COALESCE($8, category_id) \
             WHERE id = $1 \
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.ingredients)
        .bind(req.instructions)
        .bind(req.preparation_time)
        .bind(req.image_url)
        .bind(req.category_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ApiError::NotFound("recipe"))
    }

    async fn delete_recipe(&self, id: i64) -> Result<(), ApiError> {
        // Comments, ratings and favorites go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("recipe"));
        }
        Ok(())
    }

    async fn list_recipes_by_owner(&self, user_id: i64) -> Result<Vec<RecipeSummary>, ApiError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(RECIPE_SUMMARY_SELECT);
        builder.push(" WHERE r.user_id = ");
        builder.push_bind(user_id);
        builder.push(" GROUP BY r.id, c.name, u.username ORDER BY r.created_date DESC");

        let recipes = builder
            .build_query_as::<RecipeSummary>()
            .fetch_all(&self.pool)
            .await?;
        Ok(recipes)
    }

    // --- Social Interaction Engine ---

    /// add_comment
    ///
    /// A CTE performs the insert and the author join in one round trip, so the
    /// response carries the username without a second query.
    async fn add_comment(
        &self,
        recipe_id: i64,
        user_id: i64,
        text: String,
    ) -> Result<Comment, ApiError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (text, recipe_id, user_id)
                VALUES ($1, $2, $3)
                RETURNING id, text, created_date, recipe_id, user_id
            )
            SELECT i.id, i.text, i.created_date, i.recipe_id, i.user_id,
                   u.username AS author_username
            FROM inserted i
            JOIN users u ON i.user_id = u.id
            "#,
        )
        .bind(&text)
        .bind(recipe_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    /// upsert_rating
    ///
    /// One atomic statement. Two concurrent submissions from the same user
    /// cannot produce two rows: the (user_id, recipe_id) uniqueness constraint
    /// arbitrates, and the loser's INSERT becomes an UPDATE of the same row.
    async fn upsert_rating(
        &self,
        recipe_id: i64,
        user_id: i64,
        score: i32,
    ) -> Result<Rating, ApiError> {
        let rating = sqlx::query_as::<_, Rating>(
            "INSERT INTO ratings (score, recipe_id, user_id) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, recipe_id) DO UPDATE SET score = EXCLUDED.score \
             RETURNING id, score, recipe_id, user_id",
        )
        .bind(score)
        .bind(recipe_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(rating)
    }

    /// toggle_favorite
    ///
    /// Delete-if-present, else insert. The insert carries ON CONFLICT DO
    /// NOTHING so a concurrent duplicate toggle degrades to a no-op instead of
    /// a constraint error; presence stays a toggle, never a counter.
    async fn toggle_favorite(&self, recipe_id: i64, user_id: i64) -> Result<bool, ApiError> {
        let removed = sqlx::query("DELETE FROM favorites WHERE recipe_id = $1 AND user_id = $2")
            .bind(recipe_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO favorites (recipe_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, recipe_id) DO NOTHING",
        )
        .bind(recipe_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(true)
    }

    async fn list_favorites(&self, user_id: i64) -> Result<Vec<FavoriteRecipe>, ApiError> {
        let favorites = sqlx::query_as::<_, FavoriteRecipe>(
            r#"
            SELECT
                f.id AS favorite_id, f.added_date,
                r.id AS recipe_id, r.title, r.description, r.image_url,
                c.name AS category_name,
                u.username AS author_username,
                COALESCE(AVG(rt.score), 0)::float8 AS average_rating
            FROM favorites f
            JOIN recipes r ON f.recipe_id = r.id
            JOIN categories c ON r.category_id = c.id
            JOIN users u ON r.user_id = u.id
            LEFT JOIN ratings rt ON rt.recipe_id = r.id
            WHERE f.user_id = $1
            GROUP BY f.id, r.id, c.name, u.username
            ORDER BY f.added_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(favorites)
    }

    // --- Dashboards ---

    /// admin_stats
    ///
    /// Compiles all counters for the administrative dashboard in a single call.
    async fn admin_stats(&self) -> Result<AdminDashboardStats, ApiError> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let total_recipes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
            .fetch_one(&self.pool)
            .await?;
        let total_categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        let total_comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;
        let pending_approvals: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE NOT is_approved")
                .fetch_one(&self.pool)
                .await?;

        Ok(AdminDashboardStats {
            total_users,
            total_recipes,
            total_categories,
            total_comments,
            pending_approvals,
        })
    }

    async fn chef_stats(&self, user_id: i64) -> Result<ChefDashboardStats, ApiError> {
        let total_recipes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        let total_views: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(view_count), 0)::int8 FROM recipes WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        let total_comments: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments c \
             JOIN recipes r ON c.recipe_id = r.id WHERE r.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        // Mean of the per-recipe averages, over rated recipes only.
        let average_rating: f64 = sqlx::query_scalar(
            "SELECT COALESCE(AVG(per.avg_score), 0)::float8 FROM ( \
                 SELECT AVG(rt.score) AS avg_score \
                 FROM ratings rt JOIN recipes r ON rt.recipe_id = r.id \
                 WHERE r.user_id = $1 GROUP BY rt.recipe_id \
             ) per",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ChefDashboardStats {
            total_recipes,
            total_views,
            total_comments,
            average_rating,
        })
    }
}

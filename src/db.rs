use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::Role;
use crate::repository::NewUser;

/// Schema DDL
///
/// The cascade contract is explicit here rather than implied by an ORM:
/// - recipes → users: ON DELETE CASCADE (deleting a user removes their
///   authored recipes, which transitively removes those recipes' dependents).
/// - comments/ratings/favorites → recipes: ON DELETE CASCADE (deleting a
///   recipe leaves no orphaned interactions).
/// - comments/ratings/favorites → users: ON DELETE CASCADE (a deleted user's
///   own interactions go with them).
/// - recipes → categories: NO cascade. Category deletion is blocked by a
///   business-rule check while any recipe references it.
///
/// Uniqueness: users.email, users.username, and the one-rating / one-favorite
/// per (user, recipe) pairs. The pair constraints are the arbiters that make
/// the rating upsert and the favorite toggle race-safe.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id              BIGSERIAL PRIMARY KEY,
    username        TEXT NOT NULL UNIQUE,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,
    role            TEXT NOT NULL,
    full_name       TEXT NOT NULL,
    created_date    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    is_approved     BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS categories (
    id              BIGSERIAL PRIMARY KEY,
    name            TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS recipes (
    id               BIGSERIAL PRIMARY KEY,
    title            TEXT NOT NULL,
    description      TEXT NOT NULL,
    ingredients      TEXT NOT NULL,
    instructions     TEXT NOT NULL,
    preparation_time INTEGER NOT NULL DEFAULT 0,
    image_url        TEXT NOT NULL DEFAULT '',
    created_date     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    view_count       BIGINT NOT NULL DEFAULT 0,
    category_id      BIGINT NOT NULL REFERENCES categories(id),
    user_id          BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS comments (
    id              BIGSERIAL PRIMARY KEY,
    text            TEXT NOT NULL,
    created_date    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    recipe_id       BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    user_id         BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS ratings (
    id              BIGSERIAL PRIMARY KEY,
    score           INTEGER NOT NULL,
    recipe_id       BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    user_id         BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    UNIQUE (user_id, recipe_id)
);

CREATE TABLE IF NOT EXISTS favorites (
    id              BIGSERIAL PRIMARY KEY,
    added_date      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    recipe_id       BIGINT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    user_id         BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    UNIQUE (user_id, recipe_id)
);
"#;

/// init_schema
///
/// Creates the six relations on first start. Idempotent: every statement is
/// IF NOT EXISTS, so restarting against an existing database is a no-op.
pub async fn init_schema(pool: &PgPool) -> Result<(), ApiError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

/// seed
///
/// First-run data: the five fixed categories and one demo account per role,
/// all pre-approved, password "123456" stored bcrypt-hashed. Runs only when
/// the corresponding table is empty so existing deployments are untouched.
pub async fn seed(pool: &PgPool) -> Result<(), ApiError> {
    let category_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(pool)
        .await?;
    if category_count == 0 {
        let categories = [
            ("Soup", "Soup recipes"),
            ("Main Course", "Main course recipes"),
            ("Dessert", "Dessert recipes"),
            ("Salad", "Salad recipes"),
            ("Beverage", "Beverage recipes"),
        ];
        for (name, description) in categories {
            sqlx::query("INSERT INTO categories (name, description) VALUES ($1, $2)")
                .bind(name)
                .bind(description)
                .execute(pool)
                .await?;
        }
        tracing::info!("seeded {} categories", categories.len());
    }

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count == 0 {
        let password_hash = bcrypt::hash("123456", bcrypt::DEFAULT_COST)
            .map_err(|e| ApiError::Internal(format!("seed password hashing failed: {e}")))?;

        let demo_users = [
            NewUser {
                username: "admin".to_string(),
                email: "admin@recipebox.dev".to_string(),
                password_hash: password_hash.clone(),
                role: Role::Admin,
                full_name: "Admin User".to_string(),
                is_approved: true,
            },
            NewUser {
                username: "chef1".to_string(),
                email: "chef@recipebox.dev".to_string(),
                password_hash: password_hash.clone(),
                role: Role::Chef,
                full_name: "Demo Chef".to_string(),
                is_approved: true,
            },
            NewUser {
                username: "user1".to_string(),
                email: "user@recipebox.dev".to_string(),
                password_hash,
                role: Role::User,
                full_name: "Demo User".to_string(),
                is_approved: true,
            },
        ];
        for user in demo_users {
            sqlx::query(
                "INSERT INTO users (username, email, password_hash, role, full_name, is_approved) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(&user.full_name)
            .bind(user.is_approved)
            .execute(pool)
            .await?;
        }
        tracing::info!("seeded demo users (admin, chef1, user1)");
    }

    Ok(())
}

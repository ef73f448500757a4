use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ApiError
///
/// The application-wide error taxonomy. Every fallible handler and repository
/// method resolves to one of these variants, which carry enough information to
/// produce a stable HTTP status and a user-facing message.
///
/// The two authentication failures (`BadCredentials`, `NotApproved`) are kept
/// as distinct variants: the login form must be able to tell a user "wrong
/// password" apart from "your chef account has not been approved yet".
/// Likewise `Forbidden` and `NotFound` are never conflated: a non-owner
/// editing someone else's recipe learns the recipe exists but is off limits.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Login rejected: no user with that email, or the password hash did not match.
    #[error("invalid email or password")]
    BadCredentials,

    /// Login rejected: credentials are correct, but the elevated account has not
    /// been approved by an admin yet.
    #[error("account awaiting approval")]
    NotApproved,

    /// The request carried no valid session token. The client should re-authenticate.
    #[error("authentication required")]
    Unauthenticated,

    /// The session is valid but lacks rights over the target resource.
    #[error("forbidden")]
    Forbidden,

    /// The referenced entity does not exist. Terminal for the operation.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Malformed or missing required input. Nothing was applied.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness or referential constraint was breached at the store
    /// (duplicate email/username, rating race, category in use). The operation
    /// aborted with no partial write retained.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store failure. The underlying error is logged, never surfaced.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadCredentials | ApiError::NotApproved | ApiError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            // The detail may contain SQL fragments; keep it in the logs only.
            tracing::error!("internal error: {detail}");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Maps store-level failures onto the taxonomy.
///
/// Uniqueness breaches (SQLSTATE 23505) become `Conflict` so that the rating
/// upsert race and duplicate email/username registrations surface as
/// user-facing messages rather than opaque 500s. Foreign-key breaches (23503)
/// are likewise conflicts: the referenced row vanished or is still referenced.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound("record"),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("23505") => ApiError::Conflict("duplicate record".to_string()),
                Some("23503") => ApiError::Conflict("referenced record in use".to_string()),
                _ => ApiError::Internal(err.to_string()),
            },
            _ => ApiError::Internal(err.to_string()),
        }
    }
}


/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible to all users (anonymous, read-only, plus the identity
/// gateway endpoints). Anonymous writes are rejected by the tiers below, not
/// here.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated session token.
pub mod authenticated;

/// Routes restricted exclusively to sessions holding the Admin role.
/// The role check itself runs inside each handler.
pub mod admin;

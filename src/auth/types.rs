//! Authentication user types.

use crate::db::User;
use crate::jwt::Claims;

/// Caller identity resolved from a valid access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// JWT claims from the access token
    pub claims: Claims,
    /// The user the token's email resolves to
    pub user: User,
}

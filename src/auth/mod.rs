//! Access token verification for protected API routes.
//!
//! Protected requests carry a short-lived access token in the `Authorization`
//! header. The long-lived refresh token never reaches these routes: it lives in
//! an HTTP-only cookie and is only read by the refresh endpoint.

mod bearer;
mod cookie;
mod errors;
mod extractors;
mod state;
mod types;

pub use bearer::bearer_token;
pub use cookie::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::ApiAuth;
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;

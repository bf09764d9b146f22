//! Refresh cookie parsing and construction.

use axum::http::header;

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "jwt";

/// Browser lifetime of the refresh cookie: 24 hours.
/// Shorter than the token itself, so this is the effective session ceiling.
const REFRESH_COOKIE_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Set-Cookie value carrying a refresh token.
///
/// Cross-site (`SameSite=None`) because the web client is served from another
/// origin. Browsers only accept that together with `Secure`, which is dropped
/// only for local HTTP development.
pub fn refresh_cookie(token: &str, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=None; Path=/; Max-Age={}{}",
        REFRESH_COOKIE_NAME,
        token,
        REFRESH_COOKIE_MAX_AGE_SECS,
        secure_attr(secure)
    )
}

/// Set-Cookie value that removes the refresh cookie.
pub fn clear_refresh_cookie(secure: bool) -> String {
    format!(
        "{}=; HttpOnly; SameSite=None; Path=/; Max-Age=0{}",
        REFRESH_COOKIE_NAME,
        secure_attr(secure)
    )
}

fn secure_attr(secure: bool) -> &'static str {
    if secure { "; Secure" } else { "" }
}

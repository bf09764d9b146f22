//! Bearer credential parsing.

use axum::http::{HeaderMap, header};

use super::errors::AuthErrorKind;

/// Extract the access token from `Authorization: Bearer <token>`.
///
/// A missing header, an empty token and the literal `undefined` (what a
/// browser client sends when it has no token) count as no token at all.
/// A header that is present but not a readable bearer credential is invalid.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthErrorKind> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(AuthErrorKind::NoToken);
    };
    let value = value.to_str().map_err(|_| AuthErrorKind::InvalidToken)?.trim();
    if value.is_empty() {
        return Err(AuthErrorKind::NoToken);
    }

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthErrorKind::InvalidToken);
    }

    let token = token.trim();
    if token.is_empty() || token == "undefined" {
        return Err(AuthErrorKind::NoToken);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: HeaderValue) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value);
        headers
    }

    fn parse(value: &'static str) -> Result<String, AuthErrorKind> {
        bearer_token(&headers_with(HeaderValue::from_static(value))).map(str::to_string)
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(parse("Bearer abc.def").as_deref(), Ok("abc.def"));
        assert_eq!(parse("bearer abc.def").as_deref(), Ok("abc.def"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthErrorKind::NoToken));
    }

    #[test]
    fn test_undefined_is_absent() {
        assert_eq!(parse("Bearer undefined"), Err(AuthErrorKind::NoToken));
    }

    #[test]
    fn test_empty_token_is_absent() {
        assert_eq!(parse("Bearer"), Err(AuthErrorKind::NoToken));
        assert_eq!(parse("Bearer   "), Err(AuthErrorKind::NoToken));
    }

    #[test]
    fn test_other_scheme_is_invalid() {
        assert_eq!(parse("Basic dXNlcjpwYXNz"), Err(AuthErrorKind::InvalidToken));
    }

    #[test]
    fn test_non_ascii_header_is_invalid() {
        let value = HeaderValue::from_bytes(b"Bearer \xffabc").unwrap();
        assert_eq!(
            bearer_token(&headers_with(value)),
            Err(AuthErrorKind::InvalidToken)
        );
    }
}

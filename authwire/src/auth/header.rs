//! `Authorization` header parsing.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// Schemes stripped from the front of the header value.
const SCHEMES: [&str; 2] = ["Bearer", "Token"];

/// Raw token carried in an `Authorization` header value.
///
/// Strips an optional `Bearer ` or `Token ` prefix and surrounding
/// whitespace. Returns `None` when nothing is left.
#[must_use]
pub fn extract_token(value: &str) -> Option<&str> {
    extract_token_for(value, &SCHEMES)
}

/// Like [`extract_token`], but only `schemes` are accepted. A value led by
/// any other known scheme yields `None`; a bare token is still accepted.
#[must_use]
pub fn extract_token_for<'a, S: AsRef<str>>(value: &'a str, schemes: &[S]) -> Option<&'a str> {
    let value = value.trim();

    let token = match schemes
        .iter()
        .find_map(|scheme| strip_scheme(value, scheme.as_ref()))
    {
        Some(rest) => rest.trim(),
        None if SCHEMES.iter().any(|scheme| strip_scheme(value, scheme).is_some()) => {
            return None;
        }
        None => value,
    };

    if token.is_empty() { None } else { Some(token) }
}

/// Raw token from the request's `Authorization` header, if any.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    token_from_headers_for(headers, &SCHEMES)
}

/// Raw token from the `Authorization` header, accepting only `schemes`.
#[must_use]
pub fn token_from_headers_for<'a, S: AsRef<str>>(
    headers: &'a HeaderMap,
    schemes: &[S],
) -> Option<&'a str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    extract_token_for(value, schemes)
}

fn strip_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let rest = value.strip_prefix(scheme)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

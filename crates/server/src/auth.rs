use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum_extra::extract::cookie::CookieJar;

pub const AUTH_COOKIE: &str = "auth_token";

/// Bearer token of the request, if any.
///
/// Read from `Authorization: Bearer <token>`, falling back to the
/// `auth_token` cookie. Absence is not rejected here; the workflow turns it
/// into Unauthorized after routing so every endpoint answers uniformly.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn as_deref(&self) -> Option<&str> { self.0.as_deref() }
}

fn from_authorization(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(from_authorization);
        if header.is_some() {
            return Ok(BearerToken(header));
        }
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|v| !v.is_empty());
        if cookie.is_none() {
            tracing::debug!(path = %parts.uri.path(), "no bearer token on request");
        }
        Ok(BearerToken(cookie))
    }
}

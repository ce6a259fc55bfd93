use axum::{extract::{rejection::JsonRejection, State}, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use service::domain::{LoginInput, RegisterInput, User};

use crate::auth::AUTH_COOKIE;
use crate::errors::JsonApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct DummyLoginRequest {
    pub role: String,
}

#[utoipa::path(post, path = "/dummyLogin", tag = "auth", request_body = crate::openapi::DummyLoginRequestDoc, responses((status = 200, description = "Token", body = String), (status = 400, description = "Unknown role", body = crate::openapi::ErrorDoc)))]
pub async fn dummy_login(
    State(state): State<AppState>,
    payload: Result<Json<DummyLoginRequest>, JsonRejection>,
) -> Result<Json<String>, JsonApiError> {
    let Json(input) = payload?;
    Ok(Json(state.svc.dummy_login(&input.role)?))
}

#[utoipa::path(post, path = "/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered", body = crate::openapi::UserDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc)))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), JsonApiError> {
    let Json(input) = payload?;
    let user = state.svc.register_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Token; also set as the auth_token cookie", body = String), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc)))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<String>), JsonApiError> {
    let Json(input) = payload?;
    let token = state.svc.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(token)))
}

use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use service::domain::{Product, Pvz, PvzListItem, Reception};
use service::pagination::PvzListQuery;

use crate::auth::BearerToken;
use crate::errors::JsonApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePvzRequest {
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReceptionRequest {
    #[serde(rename = "pvzId")]
    pub pvz_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(rename = "type")]
    pub product_type: String,
    #[serde(rename = "pvzId")]
    pub pvz_id: String,
}

fn parse_pvz_id(raw: &str) -> Result<Uuid, JsonApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| JsonApiError::bad_request("pvzId must be a UUID"))
}

#[utoipa::path(post, path = "/pvz", tag = "pvz", request_body = crate::openapi::CreatePvzRequestDoc, responses((status = 201, description = "Created", body = crate::openapi::PvzDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 403, description = "Forbidden", body = crate::openapi::ErrorDoc)), security(("bearer" = [])))]
pub async fn create_pvz(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<CreatePvzRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Pvz>), JsonApiError> {
    let Json(input) = payload?;
    let pvz = state.svc.create_pvz(token.as_deref(), &input.city).await?;
    Ok((StatusCode::CREATED, Json(pvz)))
}

#[utoipa::path(get, path = "/pvz", tag = "pvz", params(crate::openapi::PvzListParams), responses((status = 200, description = "Pickup points with nested receptions and products", body = [crate::openapi::PvzListItemDoc]), (status = 401, description = "Unauthorized", body = crate::openapi::ErrorDoc)), security(("bearer" = [])))]
pub async fn list_pvz(
    State(state): State<AppState>,
    token: BearerToken,
    query: Option<Query<PvzListQuery>>,
) -> Result<Json<Vec<PvzListItem>>, JsonApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    Ok(Json(state.svc.list_pvz(token.as_deref(), &query).await?))
}

#[utoipa::path(post, path = "/receptions", tag = "pvz", request_body = crate::openapi::CreateReceptionRequestDoc, responses((status = 201, description = "Opened", body = crate::openapi::ReceptionDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 403, description = "Forbidden", body = crate::openapi::ErrorDoc)), security(("bearer" = [])))]
pub async fn create_reception(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<CreateReceptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reception>), JsonApiError> {
    let Json(input) = payload?;
    let pvz_id = parse_pvz_id(&input.pvz_id)?;
    let reception = state.svc.create_reception(token.as_deref(), pvz_id).await?;
    Ok((StatusCode::CREATED, Json(reception)))
}

#[utoipa::path(post, path = "/products", tag = "pvz", request_body = crate::openapi::CreateProductRequestDoc, responses((status = 201, description = "Added", body = crate::openapi::ProductDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 403, description = "Forbidden", body = crate::openapi::ErrorDoc)), security(("bearer" = [])))]
pub async fn create_product(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), JsonApiError> {
    let Json(input) = payload?;
    let pvz_id = parse_pvz_id(&input.pvz_id)?;
    let product = state.svc.create_product(token.as_deref(), pvz_id, &input.product_type).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(post, path = "/pvz/{pvzId}/close_last_reception", tag = "pvz", params(("pvzId" = Uuid, Path, description = "Pickup point id")), responses((status = 200, description = "Closed", body = crate::openapi::ReceptionDoc), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 403, description = "Forbidden", body = crate::openapi::ErrorDoc)), security(("bearer" = [])))]
pub async fn close_last_reception(
    State(state): State<AppState>,
    token: BearerToken,
    pvz_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Reception>, JsonApiError> {
    let Path(pvz_id) = pvz_id?;
    Ok(Json(state.svc.close_last_reception(token.as_deref(), pvz_id).await?))
}

#[utoipa::path(post, path = "/pvz/{pvzId}/delete_last_product", tag = "pvz", params(("pvzId" = Uuid, Path, description = "Pickup point id")), responses((status = 200, description = "Deleted"), (status = 400, description = "Bad Request", body = crate::openapi::ErrorDoc), (status = 403, description = "Forbidden", body = crate::openapi::ErrorDoc)), security(("bearer" = [])))]
pub async fn delete_last_product(
    State(state): State<AppState>,
    token: BearerToken,
    pvz_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<serde_json::Value>, JsonApiError> {
    let Path(pvz_id) = pvz_id?;
    state.svc.delete_last_product(token.as_deref(), pvz_id).await?;
    Ok(Json(serde_json::json!({})))
}

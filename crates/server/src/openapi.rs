use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{IntoParams, Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
pub struct ErrorDoc { pub message: String }

#[derive(Serialize, ToSchema)]
pub struct DummyLoginRequestDoc {
    /// `employee` or `moderator`
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterRequest { pub email: String, pub password: String, pub role: String }

#[derive(Serialize, ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(Serialize, ToSchema)]
pub struct UserDoc { pub id: Uuid, pub email: String, pub role: String }

#[derive(Serialize, ToSchema)]
pub struct CreatePvzRequestDoc {
    /// `Moscow`, `SaintPetersburg` or `Kazan`
    pub city: String,
}

#[derive(Serialize, ToSchema)]
pub struct CreateReceptionRequestDoc {
    #[serde(rename = "pvzId")]
    pub pvz_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct CreateProductRequestDoc {
    /// `electronics`, `clothing` or `footwear`
    #[serde(rename = "type")]
    pub product_type: String,
    #[serde(rename = "pvzId")]
    pub pvz_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct PvzDoc {
    pub id: Uuid,
    #[serde(rename = "registrationDate")]
    pub registration_date: DateTime<Utc>,
    pub city: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReceptionDoc {
    pub id: Uuid,
    #[serde(rename = "dateTime")]
    pub date_time: DateTime<Utc>,
    #[serde(rename = "pvzId")]
    pub pvz_id: Uuid,
    /// `in_progress` or `close`
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ProductDoc {
    pub id: Uuid,
    #[serde(rename = "dateTime")]
    pub date_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub product_type: String,
    #[serde(rename = "receptionId")]
    pub reception_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct ReceptionWithProductsDoc {
    pub reception: ReceptionDoc,
    pub products: Vec<ProductDoc>,
}

#[derive(Serialize, ToSchema)]
pub struct PvzListItemDoc {
    pub pvz: PvzDoc,
    pub receptions: Vec<ReceptionWithProductsDoc>,
}

/// Unparsable values fall back to defaults instead of failing.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PvzListParams {
    /// RFC 3339, inclusive
    #[serde(rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    /// RFC 3339, inclusive
    #[serde(rename = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based, default 1
    pub page: Option<u32>,
    /// 1..=30, default 10
    pub limit: Option<u32>,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::dummy_login,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::pvz::create_pvz,
        crate::routes::pvz::list_pvz,
        crate::routes::pvz::create_reception,
        crate::routes::pvz::create_product,
        crate::routes::pvz::close_last_reception,
        crate::routes::pvz::delete_last_product,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorDoc,
            DummyLoginRequestDoc,
            RegisterRequest,
            LoginRequest,
            UserDoc,
            CreatePvzRequestDoc,
            CreateReceptionRequestDoc,
            CreateProductRequestDoc,
            PvzDoc,
            ReceptionDoc,
            ProductDoc,
            ReceptionWithProductsDoc,
            PvzListItemDoc,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "pvz")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, StorageBackend};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::auth::TokenService;
use service::storage::{InMemoryStorage, SeaOrmStorage};
use service::{PvzService, Storage};

use crate::errors::StartupError;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the configured storage backend; postgres is migrated before use.
pub async fn build_storage(cfg: &AppConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match cfg.storage.backend() {
        StorageBackend::Memory => {
            info!(backend = "memory", "storage ready");
            Ok(Arc::new(InMemoryStorage::new()))
        }
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            models::db::migrate(&db).await?;
            info!(backend = "postgres", "storage ready");
            Ok(Arc::new(SeaOrmStorage::new(db)))
        }
    }
}

pub fn build_state(cfg: &AppConfig, storage: Arc<dyn Storage>) -> AppState {
    let tokens = TokenService::new(&cfg.auth.jwt_secret)
        .with_ttl(chrono::Duration::hours(cfg.auth.token_ttl_hours));
    AppState { svc: PvzService::new(storage, tokens) }
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let storage = build_storage(cfg).await?;
    Ok(routes::build_router(build_state(cfg, storage), build_cors()))
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad server address: {}", e)))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, backend = ?cfg.storage.backend(), "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_host_is_a_config_error() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not a host".into();
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));
        cfg.server.host = "0.0.0.0".into();
        assert_eq!(bind_addr(&cfg).unwrap().port(), 8080);
    }
}

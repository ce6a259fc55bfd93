//! Persistence behind the reception workflow.
//!
//! Backends own the lifecycle invariants: one open reception per pickup
//! point, products only inside an open reception, and "last" meaning highest
//! per-parent sequence number. Compound operations are atomic per parent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{City, Product, ProductType, Pvz, PvzListItem, Reception, Role, UserRecord};

pub mod memory;
pub mod seaorm;

pub use memory::InMemoryStorage;
pub use seaorm::SeaOrmStorage;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn not_found(what: &str) -> Self { Self::NotFound(format!("{} not found", what)) }
}

/// Storage operations consumed by the workflow.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Conflict when the email is already registered.
    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<UserRecord, StorageError>;
    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord, StorageError>;

    async fn create_pvz(&self, city: City) -> Result<Pvz, StorageError>;
    async fn get_pvz_by_id(&self, id: Uuid) -> Result<Pvz, StorageError>;

    /// Pickup points newest-registered first, 1-based `page`.
    ///
    /// A bound selects pickup points owning at least one reception inside
    /// the inclusive range; each selected point comes back with its whole
    /// tree, receptions newest first and products oldest first.
    async fn list_pvz(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        page: u64,
        limit: u64,
    ) -> Result<Vec<PvzListItem>, StorageError>;

    /// NotFound for an unknown pvz, Conflict while another reception is open.
    async fn create_reception(&self, pvz_id: Uuid) -> Result<Reception, StorageError>;
    async fn get_last_reception_by_pvz_id(&self, pvz_id: Uuid) -> Result<Reception, StorageError>;
    /// Conflict when the reception is unknown or already closed.
    async fn close_reception(&self, reception_id: Uuid) -> Result<(), StorageError>;

    /// NotFound for an unknown reception, Conflict once it is closed.
    async fn create_product(&self, reception_id: Uuid, product_type: ProductType) -> Result<Product, StorageError>;
    async fn get_products_by_reception_id(&self, reception_id: Uuid) -> Result<Vec<Product>, StorageError>;
    /// Removes and returns the newest product. Conflict if the reception was
    /// closed meanwhile, NotFound if it has no products.
    async fn delete_last_product_in_reception(&self, reception_id: Uuid) -> Result<Product, StorageError>;
}

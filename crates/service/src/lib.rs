//! Pickup-point business layer.
//! - Domain types and the token service shared by every caller.
//! - A `Storage` trait with in-memory and sea-orm backends.
//! - `PvzService`, the reception workflow that authorizes, delegates to
//!   storage and folds every failure into `ServiceError`.

pub mod domain;
pub mod errors;
pub mod auth;
pub mod pagination;
pub mod storage;
pub mod workflow;
#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
pub use storage::Storage;
pub use workflow::PvzService;

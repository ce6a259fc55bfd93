//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20250401_000001_create_user;
mod m20250401_000002_create_pvz;
mod m20250401_000003_create_reception;
mod m20250401_000004_create_product;
mod m20250401_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250401_000001_create_user::Migration),
            Box::new(m20250401_000002_create_pvz::Migration),
            Box::new(m20250401_000003_create_reception::Migration),
            Box::new(m20250401_000004_create_product::Migration),
            // Indexes should always be applied last
            Box::new(m20250401_000005_add_indexes::Migration),
        ]
    }
}

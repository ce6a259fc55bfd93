//! Create `product` table with FK to `reception`.
//!
//! `seq` is a per-reception monotonic counter used to find the last product.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(uuid(Product::Id).primary_key())
                    .col(timestamp_with_time_zone(Product::DateTime).not_null())
                    .col(string_len(Product::Type, 32).not_null())
                    .col(uuid(Product::ReceptionId).not_null())
                    .col(big_integer(Product::Seq).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_reception")
                            .from(Product::Table, Product::ReceptionId)
                            .to(Reception::Table, Reception::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product { Table, Id, DateTime, Type, ReceptionId, Seq }

#[derive(DeriveIden)]
enum Reception { Table, Id }

//! Create `pvz` table (pickup points).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pvz::Table)
                    .if_not_exists()
                    .col(uuid(Pvz::Id).primary_key())
                    .col(timestamp_with_time_zone(Pvz::RegistrationDate).not_null())
                    .col(string_len(Pvz::City, 32).not_null())
                    // insertion order, breaks registration_date ties
                    .col(big_integer(Pvz::Seq).auto_increment().unique_key())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Pvz::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Pvz { Table, Id, RegistrationDate, City, Seq }

//! Create `reception` table with FK to `pvz`.
//!
//! `seq` is a per-pvz monotonic counter; the highest `seq` is the last reception.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reception::Table)
                    .if_not_exists()
                    .col(uuid(Reception::Id).primary_key())
                    .col(timestamp_with_time_zone(Reception::DateTime).not_null())
                    .col(uuid(Reception::PvzId).not_null())
                    .col(string_len(Reception::Status, 16).not_null())
                    .col(big_integer(Reception::Seq).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reception_pvz")
                            .from(Reception::Table, Reception::PvzId)
                            .to(Pvz::Table, Pvz::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Reception::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Reception { Table, Id, DateTime, PvzId, Status, Seq }

#[derive(DeriveIden)]
enum Pvz { Table, Id }

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

const OPEN_RECEPTION_INDEX: &str = "uniq_reception_open_per_pvz";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Pvz: listing is ordered by (registration_date, seq) desc
        manager
            .create_index(
                Index::create()
                    .name("idx_pvz_registration_date")
                    .table(Pvz::Table)
                    .col(Pvz::RegistrationDate)
                    .col(Pvz::Seq)
                    .to_owned(),
            )
            .await?;

        // Reception: (pvz_id, seq) is the per-pvz ordered index
        manager
            .create_index(
                Index::create()
                    .name("uniq_reception_pvz_seq")
                    .table(Reception::Table)
                    .col(Reception::PvzId)
                    .col(Reception::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_reception_date_time")
                    .table(Reception::Table)
                    .col(Reception::DateTime)
                    .to_owned(),
            )
            .await?;

        // Product: (reception_id, seq) is the per-reception ordered index
        manager
            .create_index(
                Index::create()
                    .name("uniq_product_reception_seq")
                    .table(Product::Table)
                    .col(Product::ReceptionId)
                    .col(Product::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // At most one open reception per pvz; partial indexes are not
        // expressible through the index builder.
        manager
            .get_connection()
            .execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {OPEN_RECEPTION_INDEX} ON reception (pvz_id) WHERE status = 'in_progress'"
            ))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!("DROP INDEX IF EXISTS {OPEN_RECEPTION_INDEX}"))
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_product_reception_seq").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_reception_date_time").table(Reception::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_reception_pvz_seq").table(Reception::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_pvz_registration_date").table(Pvz::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Pvz { Table, RegistrationDate, Seq }

#[derive(DeriveIden)]
enum Reception { Table, PvzId, DateTime, Seq }

#[derive(DeriveIden)]
enum Product { Table, ReceptionId, Seq }

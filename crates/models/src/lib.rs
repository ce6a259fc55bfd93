//! SeaORM entities for the PVZ schema plus the small query helpers the
//! storage layer composes inside its transactions.

pub mod errors;
pub mod db;
pub mod user;
pub mod pvz;
pub mod reception;
pub mod product;

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, EntityTrait, QuerySelect, QueryTrait};
    use uuid::Uuid;

    use crate::{product, pvz, reception};

    #[test]
    fn product_type_maps_to_type_column() {
        let sql = product::Entity::find().build(DbBackend::Postgres).to_string();
        assert!(sql.contains(r#""product"."type""#), "{sql}");
    }

    #[test]
    fn locked_lookup_uses_for_update() {
        let sql = reception::Entity::find_by_id(Uuid::nil())
            .lock_exclusive()
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with("FOR UPDATE"), "{sql}");
    }

    #[test]
    fn open_status_check() {
        let r = reception::Model {
            id: Uuid::new_v4(),
            date_time: chrono::Utc::now().into(),
            pvz_id: Uuid::new_v4(),
            status: reception::STATUS_IN_PROGRESS.into(),
            seq: 1,
        };
        assert!(r.is_open());
        let closed = reception::Model { status: reception::STATUS_CLOSE.into(), ..r };
        assert!(!closed.is_open());
    }

    #[test]
    fn pvz_table_name() {
        let sql = pvz::Entity::find().build(DbBackend::Postgres).to_string();
        assert!(sql.contains(r#"FROM "pvz""#), "{sql}");
    }

    #[test]
    fn pvz_page_breaks_date_ties_by_insertion_order() {
        let sql = pvz::page_select(None, None, 20, 10).build(DbBackend::Postgres).to_string();
        assert!(
            sql.contains(r#"ORDER BY "pvz"."registration_date" DESC, "pvz"."seq" DESC"#),
            "{sql}"
        );
        assert!(sql.ends_with("LIMIT 10 OFFSET 20"), "{sql}");
    }

    #[test]
    fn pvz_page_date_filter_uses_reception_subquery() {
        let start: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let sql = pvz::page_select(Some(start), None, 0, 10).build(DbBackend::Postgres).to_string();
        assert!(sql.contains(r#"IN (SELECT "pvz_id" FROM "reception" WHERE"#), "{sql}");
    }
}

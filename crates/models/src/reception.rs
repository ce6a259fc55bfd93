use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, QuerySelect, Set};
use sea_orm::sea_query::Expr;
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{product, pvz};

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_CLOSE: &str = "close";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reception")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date_time: DateTimeWithTimeZone,
    pub pvz_id: Uuid,
    pub status: String,
    pub seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Pvz,
    Product,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Pvz => Entity::belongs_to(pvz::Entity)
                .from(Column::PvzId)
                .to(pvz::Column::Id)
                .into(),
            Relation::Product => Entity::has_many(product::Entity).into(),
        }
    }
}

impl Related<pvz::Entity> for Entity {
    fn to() -> RelationDef { Relation::Pvz.def() }
}

impl Related<product::Entity> for Entity {
    fn to() -> RelationDef { Relation::Product.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_open(&self) -> bool { self.status == STATUS_IN_PROGRESS }
}

/// Insert an open reception with the next per-pvz sequence number.
/// Callers hold the pvz row lock so the sequence read cannot race.
pub async fn open<C: ConnectionTrait>(db: &C, pvz_id: Uuid) -> Result<Model, ModelError> {
    let seq = last_for_pvz(db, pvz_id).await?.map(|r| r.seq + 1).unwrap_or(1);
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        date_time: Set(Utc::now().into()),
        pvz_id: Set(pvz_id),
        status: Set(STATUS_IN_PROGRESS.to_string()),
        seq: Set(seq),
    };
    Ok(am.insert(db).await?)
}

pub async fn last_for_pvz<C: ConnectionTrait>(db: &C, pvz_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::PvzId.eq(pvz_id))
        .order_by_desc(Column::Seq)
        .one(db)
        .await?)
}

pub async fn open_for_pvz<C: ConnectionTrait>(db: &C, pvz_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::PvzId.eq(pvz_id))
        .filter(Column::Status.eq(STATUS_IN_PROGRESS))
        .one(db)
        .await?)
}

pub async fn find_locked<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).lock_exclusive().one(db).await?)
}

/// Flip `in_progress` to `close` in a single conditional update.
/// Returns `false` when the row is unknown or already closed.
pub async fn close<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Status, Expr::value(STATUS_CLOSE))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(STATUS_IN_PROGRESS))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

/// All receptions of the given pickup points, newest first.
pub async fn list_for_pvzs<C: ConnectionTrait>(db: &C, pvz_ids: Vec<Uuid>) -> Result<Vec<Model>, ModelError> {
    if pvz_ids.is_empty() { return Ok(Vec::new()); }
    Ok(Entity::find()
        .filter(Column::PvzId.is_in(pvz_ids))
        .order_by_desc(Column::Seq)
        .all(db)
        .await?)
}

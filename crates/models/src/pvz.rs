use sea_orm::{entity::prelude::*, ConnectionTrait, NotSet, QueryOrder, QuerySelect, Select, Set};
use sea_orm::sea_query::{Expr, Query};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::reception;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pvz")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub registration_date: DateTimeWithTimeZone,
    pub city: String,
    /// Assigned by the database (`bigserial`) on insert.
    pub seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Reception,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Reception => Entity::has_many(reception::Entity).into() }
    }
}

impl Related<reception::Entity> for Entity {
    fn to() -> RelationDef { Relation::Reception.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(db: &C, city: &str) -> Result<Model, ModelError> {
    if city.trim().is_empty() { return Err(ModelError::Validation("city required".into())); }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        registration_date: Set(Utc::now().into()),
        city: Set(city.to_string()),
        seq: NotSet,
    };
    Ok(am.insert(db).await?)
}

pub async fn find<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Like `find`, but takes a row lock (`FOR UPDATE`) for the rest of the transaction.
pub async fn find_locked<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).lock_exclusive().one(db).await?)
}

/// One page of pickup points, newest registration first; equal dates keep
/// reverse insertion order.
///
/// When a bound is given only pvz rows owning at least one reception whose
/// `date_time` falls inside the (inclusive) range qualify.
pub async fn list_page<C: ConnectionTrait>(
    db: &C,
    start: Option<DateTimeWithTimeZone>,
    end: Option<DateTimeWithTimeZone>,
    offset: u64,
    limit: u64,
) -> Result<Vec<Model>, ModelError> {
    Ok(page_select(start, end, offset, limit).all(db).await?)
}

pub fn page_select(
    start: Option<DateTimeWithTimeZone>,
    end: Option<DateTimeWithTimeZone>,
    offset: u64,
    limit: u64,
) -> Select<Entity> {
    let mut select = Entity::find();
    if start.is_some() || end.is_some() {
        let mut sub = Query::select();
        sub.column(reception::Column::PvzId).from(reception::Entity);
        if let Some(start) = start {
            sub.and_where(Expr::col(reception::Column::DateTime).gte(start));
        }
        if let Some(end) = end {
            sub.and_where(Expr::col(reception::Column::DateTime).lte(end));
        }
        select = select.filter(Column::Id.in_subquery(sub.to_owned()));
    }
    select
        .order_by_desc(Column::RegistrationDate)
        .order_by_desc(Column::Seq)
        .offset(offset)
        .limit(limit)
}

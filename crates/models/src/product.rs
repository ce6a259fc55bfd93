use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::reception;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date_time: DateTimeWithTimeZone,
    #[sea_orm(column_name = "type")]
    pub product_type: String,
    pub reception_id: Uuid,
    pub seq: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Reception,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Reception => Entity::belongs_to(reception::Entity)
                .from(Column::ReceptionId)
                .to(reception::Column::Id)
                .into(),
        }
    }
}

impl Related<reception::Entity> for Entity {
    fn to() -> RelationDef { Relation::Reception.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Insert a product with the next per-reception sequence number.
/// Callers hold the reception row lock.
pub async fn create<C: ConnectionTrait>(db: &C, reception_id: Uuid, product_type: &str) -> Result<Model, ModelError> {
    if product_type.trim().is_empty() { return Err(ModelError::Validation("product type required".into())); }
    let seq = last_for_reception(db, reception_id).await?.map(|p| p.seq + 1).unwrap_or(1);
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        date_time: Set(Utc::now().into()),
        product_type: Set(product_type.to_string()),
        reception_id: Set(reception_id),
        seq: Set(seq),
    };
    Ok(am.insert(db).await?)
}

pub async fn last_for_reception<C: ConnectionTrait>(db: &C, reception_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::ReceptionId.eq(reception_id))
        .order_by_desc(Column::Seq)
        .one(db)
        .await?)
}

/// Products of one reception, oldest first.
pub async fn list_for_reception<C: ConnectionTrait>(db: &C, reception_id: Uuid) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::ReceptionId.eq(reception_id))
        .order_by_asc(Column::Seq)
        .all(db)
        .await?)
}

/// Products of many receptions, oldest first within each reception.
pub async fn list_for_receptions<C: ConnectionTrait>(db: &C, reception_ids: Vec<Uuid>) -> Result<Vec<Model>, ModelError> {
    if reception_ids.is_empty() { return Ok(Vec::new()); }
    Ok(Entity::find()
        .filter(Column::ReceptionId.is_in(reception_ids))
        .order_by_asc(Column::ReceptionId)
        .order_by_asc(Column::Seq)
        .all(db)
        .await?)
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use models::errors::ModelError;
use models::{product, pvz, reception, user};
use sea_orm::{AccessMode, DatabaseConnection, DbErr, IsolationLevel, TransactionTrait};
use uuid::Uuid;

use super::{Storage, StorageError};
use crate::pagination::Pagination;
use crate::domain::{
    City, Product, ProductType, Pvz, PvzListItem, Reception, ReceptionWithProducts, Role, UserRecord,
};

/// PostgreSQL backend. Compound operations run in one transaction with the
/// parent row locked `FOR UPDATE`.
pub struct SeaOrmStorage {
    pub db: DatabaseConnection,
}

impl SeaOrmStorage {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

impl From<ModelError> for StorageError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Conflict(m) => StorageError::Conflict(m),
            ModelError::Validation(m) => StorageError::Backend(format!("rejected by model: {}", m)),
            ModelError::Db(m) => StorageError::Backend(m),
        }
    }
}

impl From<DbErr> for StorageError {
    fn from(e: DbErr) -> Self { ModelError::from(e).into() }
}

fn corrupt(column: &str, value: &str) -> StorageError {
    StorageError::Backend(format!("unexpected {} value in database: {}", column, value))
}

fn to_user(m: user::Model) -> Result<UserRecord, StorageError> {
    let role: Role = m.role.parse().map_err(|_| corrupt("user.role", &m.role))?;
    Ok(UserRecord { id: m.id, email: m.email, password_hash: m.password_hash, role })
}

fn to_pvz(m: pvz::Model) -> Result<Pvz, StorageError> {
    let city: City = m.city.parse().map_err(|_| corrupt("pvz.city", &m.city))?;
    Ok(Pvz { id: m.id, registration_date: m.registration_date.with_timezone(&Utc), city })
}

fn to_reception(m: reception::Model) -> Result<Reception, StorageError> {
    let status = m.status.parse().map_err(|_| corrupt("reception.status", &m.status))?;
    Ok(Reception { id: m.id, date_time: m.date_time.with_timezone(&Utc), pvz_id: m.pvz_id, status, seq: m.seq })
}

fn to_product(m: product::Model) -> Result<Product, StorageError> {
    let product_type: ProductType = m.product_type.parse().map_err(|_| corrupt("product.type", &m.product_type))?;
    Ok(Product {
        id: m.id,
        date_time: m.date_time.with_timezone(&Utc),
        product_type,
        reception_id: m.reception_id,
        seq: m.seq,
    })
}

#[async_trait]
impl Storage for SeaOrmStorage {
    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<UserRecord, StorageError> {
        match user::create(&self.db, email, password_hash, role.as_str()).await {
            Ok(m) => to_user(m),
            Err(ModelError::Conflict(_)) => {
                Err(StorageError::Conflict(format!("user with email {} already exists", email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord, StorageError> {
        let found = user::find_by_email(&self.db, email).await?;
        to_user(found.ok_or_else(|| StorageError::not_found("user"))?)
    }

    async fn create_pvz(&self, city: City) -> Result<Pvz, StorageError> {
        to_pvz(pvz::create(&self.db, city.as_str()).await?)
    }

    async fn get_pvz_by_id(&self, id: Uuid) -> Result<Pvz, StorageError> {
        to_pvz(pvz::find(&self.db, id).await?.ok_or_else(|| StorageError::not_found("pvz"))?)
    }

    async fn list_pvz(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        page: u64,
        limit: u64,
    ) -> Result<Vec<PvzListItem>, StorageError> {
        let offset = Pagination { page, limit }.offset();
        // One snapshot for the page and its nested rows.
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await?;
        let points = pvz::list_page(&txn, start.map(Into::into), end.map(Into::into), offset, limit).await?;
        let receptions = reception::list_for_pvzs(&txn, points.iter().map(|p| p.id).collect()).await?;
        let products = product::list_for_receptions(&txn, receptions.iter().map(|r| r.id).collect()).await?;
        txn.commit().await?;

        let mut products_by_reception: HashMap<Uuid, Vec<Product>> = HashMap::new();
        for m in products {
            let p = to_product(m)?;
            products_by_reception.entry(p.reception_id).or_default().push(p);
        }
        let mut receptions_by_pvz: HashMap<Uuid, Vec<ReceptionWithProducts>> = HashMap::new();
        for m in receptions {
            let r = to_reception(m)?;
            let products = products_by_reception.remove(&r.id).unwrap_or_default();
            receptions_by_pvz.entry(r.pvz_id).or_default().push(ReceptionWithProducts { reception: r, products });
        }
        points
            .into_iter()
            .map(|m| {
                let receptions = receptions_by_pvz.remove(&m.id).unwrap_or_default();
                Ok(PvzListItem { pvz: to_pvz(m)?, receptions })
            })
            .collect()
    }

    async fn create_reception(&self, pvz_id: Uuid) -> Result<Reception, StorageError> {
        let txn = self.db.begin().await?;
        let point = pvz::find_locked(&txn, pvz_id).await?.ok_or_else(|| StorageError::not_found("pvz"))?;
        if reception::open_for_pvz(&txn, point.id).await?.is_some() {
            return Err(StorageError::Conflict("pvz already has a reception in progress".into()));
        }
        let created = match reception::open(&txn, point.id).await {
            Ok(m) => m,
            // partial unique index on open receptions
            Err(ModelError::Conflict(_)) => {
                return Err(StorageError::Conflict("pvz already has a reception in progress".into()))
            }
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;
        to_reception(created)
    }

    async fn get_last_reception_by_pvz_id(&self, pvz_id: Uuid) -> Result<Reception, StorageError> {
        let last = reception::last_for_pvz(&self.db, pvz_id).await?;
        to_reception(last.ok_or_else(|| StorageError::NotFound("pvz has no receptions".into()))?)
    }

    async fn close_reception(&self, reception_id: Uuid) -> Result<(), StorageError> {
        if reception::close(&self.db, reception_id).await? {
            Ok(())
        } else {
            Err(StorageError::Conflict("reception is already closed or does not exist".into()))
        }
    }

    async fn create_product(&self, reception_id: Uuid, product_type: ProductType) -> Result<Product, StorageError> {
        let txn = self.db.begin().await?;
        let parent = reception::find_locked(&txn, reception_id)
            .await?
            .ok_or_else(|| StorageError::not_found("reception"))?;
        if !parent.is_open() {
            return Err(StorageError::Conflict("reception is already closed".into()));
        }
        let created = product::create(&txn, parent.id, product_type.as_str()).await?;
        txn.commit().await?;
        to_product(created)
    }

    async fn get_products_by_reception_id(&self, reception_id: Uuid) -> Result<Vec<Product>, StorageError> {
        product::list_for_reception(&self.db, reception_id).await?.into_iter().map(to_product).collect()
    }

    async fn delete_last_product_in_reception(&self, reception_id: Uuid) -> Result<Product, StorageError> {
        let txn = self.db.begin().await?;
        let parent = reception::find_locked(&txn, reception_id)
            .await?
            .ok_or_else(|| StorageError::not_found("reception"))?;
        if !parent.is_open() {
            return Err(StorageError::Conflict("reception is already closed".into()));
        }
        let last = product::last_for_reception(&txn, parent.id)
            .await?
            .ok_or_else(|| StorageError::NotFound("no products to delete".into()))?;
        product::hard_delete(&txn, last.id).await?;
        txn.commit().await?;
        to_product(last)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::get_db;

    async fn storage() -> Option<SeaOrmStorage> {
        match get_db().await {
            Ok(Some(db)) => Some(SeaOrmStorage::new(db)),
            Ok(None) => None,
            Err(e) => panic!("database setup failed: {e}"),
        }
    }

    #[tokio::test]
    async fn user_roundtrip_and_duplicate() {
        let Some(store) = storage().await else { return };
        let email = format!("{}@pvz.test", Uuid::new_v4());
        let created = store.create_user(&email, "digest", Role::Moderator).await.unwrap();
        let found = store.get_user_by_email(&email).await.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Moderator);
        assert!(matches!(store.create_user(&email, "d", Role::Employee).await, Err(StorageError::Conflict(_))));
    }

    #[tokio::test]
    async fn reception_lifecycle() {
        let Some(store) = storage().await else { return };
        let point = store.create_pvz(City::Kazan).await.unwrap();
        assert_eq!(store.get_pvz_by_id(point.id).await.unwrap().city, City::Kazan);

        let rec = store.create_reception(point.id).await.unwrap();
        assert!(matches!(store.create_reception(point.id).await, Err(StorageError::Conflict(_))));

        let a = store.create_product(rec.id, ProductType::Electronics).await.unwrap();
        let b = store.create_product(rec.id, ProductType::Footwear).await.unwrap();
        assert!(b.seq > a.seq);
        assert_eq!(store.delete_last_product_in_reception(rec.id).await.unwrap().id, b.id);

        store.close_reception(rec.id).await.unwrap();
        assert!(matches!(store.close_reception(rec.id).await, Err(StorageError::Conflict(_))));
        assert!(matches!(
            store.create_product(rec.id, ProductType::Clothing).await,
            Err(StorageError::Conflict(_))
        ));
        assert!(matches!(store.delete_last_product_in_reception(rec.id).await, Err(StorageError::Conflict(_))));

        let next = store.create_reception(point.id).await.unwrap();
        assert_eq!(store.get_last_reception_by_pvz_id(point.id).await.unwrap().id, next.id);

        let items = store.list_pvz(Some(rec.date_time), Some(next.date_time), 1, 30).await.unwrap();
        let item = items.iter().find(|i| i.pvz.id == point.id).expect("pvz listed");
        assert_eq!(item.receptions[0].reception.id, next.id);
        assert_eq!(item.receptions[1].products.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_openings_yield_one_success() {
        let Some(store) = storage().await else { return };
        let store = Arc::new(store);
        let point = store.create_pvz(City::Moscow).await.unwrap();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create_reception(point.id).await })
            })
            .collect();
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    fn sorted(mut ids: Vec<Uuid>) -> Vec<Uuid> {
        ids.sort();
        ids
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn products_racing_close_are_kept_only_when_accepted() {
        let Some(store) = storage().await else { return };
        let store = Arc::new(store);
        let point = store.create_pvz(City::SaintPetersburg).await.unwrap();
        let rec = store.create_reception(point.id).await.unwrap();

        let mut handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create_product(rec.id, ProductType::Clothing).await.map(Some) })
            })
            .collect();
        let closer = store.clone();
        handles.insert(4, tokio::spawn(async move { closer.close_reception(rec.id).await.map(|_| None) }));

        let mut accepted = Vec::new();
        for h in handles {
            match h.await.unwrap() {
                Ok(Some(product)) => accepted.push(product.id),
                Ok(None) => {}
                Err(e) => assert!(matches!(e, StorageError::Conflict(_)), "{e:?}"),
            }
        }

        let stored: Vec<Uuid> = store.get_products_by_reception_id(rec.id).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(sorted(stored.clone()), sorted(accepted));
        assert!(matches!(store.create_product(rec.id, ProductType::Footwear).await, Err(StorageError::Conflict(_))));
        assert!(matches!(store.delete_last_product_in_reception(rec.id).await, Err(StorageError::Conflict(_))));
        assert_eq!(store.get_products_by_reception_id(rec.id).await.unwrap().len(), stored.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn deletes_racing_close_never_lose_or_revive_products() {
        let Some(store) = storage().await else { return };
        let store = Arc::new(store);
        let point = store.create_pvz(City::Kazan).await.unwrap();
        let rec = store.create_reception(point.id).await.unwrap();
        let mut initial = Vec::new();
        for _ in 0..4 {
            initial.push(store.create_product(rec.id, ProductType::Electronics).await.unwrap().id);
        }

        let mut handles: Vec<_> = (0..6)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.delete_last_product_in_reception(rec.id).await.map(Some) })
            })
            .collect();
        let closer = store.clone();
        handles.insert(2, tokio::spawn(async move { closer.close_reception(rec.id).await.map(|_| None) }));

        let mut deleted = Vec::new();
        for h in handles {
            match h.await.unwrap() {
                Ok(Some(product)) => deleted.push(product.id),
                Ok(None) => {}
                Err(e) => assert!(matches!(e, StorageError::Conflict(_) | StorageError::NotFound(_)), "{e:?}"),
            }
        }

        let remaining: Vec<Uuid> =
            store.get_products_by_reception_id(rec.id).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(remaining.len() + deleted.len(), initial.len());
        assert_eq!(remaining, initial[..remaining.len()].to_vec());
        assert!(matches!(store.delete_last_product_in_reception(rec.id).await, Err(StorageError::Conflict(_))));
    }
}

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Storage, StorageError};
use crate::pagination::Pagination;
use crate::domain::{
    City, Product, ProductType, Pvz, PvzListItem, Reception, ReceptionStatus, ReceptionWithProducts, Role,
    UserRecord,
};

struct PvzEntry {
    pvz: Pvz,
    /// Insertion order, breaks registration-date ties in listings.
    seq: i64,
    /// Reception ids, oldest first.
    receptions: Vec<Uuid>,
}

struct ReceptionEntry {
    reception: Reception,
    /// Live products, oldest first.
    products: Vec<Product>,
    next_product_seq: i64,
}

#[derive(Default)]
struct State {
    users: HashMap<String, UserRecord>,
    pvzs: HashMap<Uuid, PvzEntry>,
    receptions: HashMap<Uuid, ReceptionEntry>,
    next_pvz_seq: i64,
}

/// Process-local backend. Every operation runs inside one critical section
/// over the whole state, which makes the compound checks atomic.
#[derive(Default)]
pub struct InMemoryStorage {
    state: Mutex<State>,
}

impl InMemoryStorage {
    pub fn new() -> Self { Self::default() }

    fn state(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state.lock().map_err(|_| StorageError::Backend("in-memory state lock poisoned".into()))
    }
}

impl State {
    fn tree(&self, entry: &PvzEntry) -> PvzListItem {
        let receptions = entry
            .receptions
            .iter()
            .rev()
            .filter_map(|id| self.receptions.get(id))
            .map(|r| ReceptionWithProducts { reception: r.reception.clone(), products: r.products.clone() })
            .collect();
        PvzListItem { pvz: entry.pvz.clone(), receptions }
    }

    fn has_reception_within(&self, entry: &PvzEntry, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
        entry.receptions.iter().filter_map(|id| self.receptions.get(id)).any(|r| {
            let at = r.reception.date_time;
            start.map_or(true, |s| at >= s) && end.map_or(true, |e| at <= e)
        })
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, email: &str, password_hash: &str, role: Role) -> Result<UserRecord, StorageError> {
        let mut state = self.state()?;
        if state.users.contains_key(email) {
            return Err(StorageError::Conflict(format!("user with email {} already exists", email)));
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
        };
        state.users.insert(email.to_string(), user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord, StorageError> {
        self.state()?.users.get(email).cloned().ok_or_else(|| StorageError::not_found("user"))
    }

    async fn create_pvz(&self, city: City) -> Result<Pvz, StorageError> {
        let mut state = self.state()?;
        state.next_pvz_seq += 1;
        let pvz = Pvz { id: Uuid::new_v4(), registration_date: Utc::now(), city };
        let entry = PvzEntry { pvz: pvz.clone(), seq: state.next_pvz_seq, receptions: Vec::new() };
        state.pvzs.insert(pvz.id, entry);
        Ok(pvz)
    }

    async fn get_pvz_by_id(&self, id: Uuid) -> Result<Pvz, StorageError> {
        self.state()?.pvzs.get(&id).map(|e| e.pvz.clone()).ok_or_else(|| StorageError::not_found("pvz"))
    }

    async fn list_pvz(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        page: u64,
        limit: u64,
    ) -> Result<Vec<PvzListItem>, StorageError> {
        let state = self.state()?;
        let filtered = start.is_some() || end.is_some();
        let mut entries: Vec<&PvzEntry> = state
            .pvzs
            .values()
            .filter(|e| !filtered || state.has_reception_within(e, start, end))
            .collect();
        entries.sort_by(|a, b| (b.pvz.registration_date, b.seq).cmp(&(a.pvz.registration_date, a.seq)));

        let offset = Pagination { page, limit }.offset();
        Ok(entries
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|e| state.tree(e))
            .collect())
    }

    async fn create_reception(&self, pvz_id: Uuid) -> Result<Reception, StorageError> {
        let mut guard = self.state()?;
        let state = &mut *guard;
        let entry = state.pvzs.get_mut(&pvz_id).ok_or_else(|| StorageError::not_found("pvz"))?;
        let open = entry
            .receptions
            .last()
            .and_then(|id| state.receptions.get(id))
            .is_some_and(|r| r.reception.is_open());
        if open {
            return Err(StorageError::Conflict("pvz already has a reception in progress".into()));
        }
        let reception = Reception {
            id: Uuid::new_v4(),
            date_time: Utc::now(),
            pvz_id,
            status: ReceptionStatus::InProgress,
            seq: entry.receptions.len() as i64 + 1,
        };
        entry.receptions.push(reception.id);
        state.receptions.insert(
            reception.id,
            ReceptionEntry { reception: reception.clone(), products: Vec::new(), next_product_seq: 1 },
        );
        Ok(reception)
    }

    async fn get_last_reception_by_pvz_id(&self, pvz_id: Uuid) -> Result<Reception, StorageError> {
        let state = self.state()?;
        let entry = state.pvzs.get(&pvz_id).ok_or_else(|| StorageError::not_found("pvz"))?;
        entry
            .receptions
            .last()
            .and_then(|id| state.receptions.get(id))
            .map(|r| r.reception.clone())
            .ok_or_else(|| StorageError::NotFound("pvz has no receptions".into()))
    }

    async fn close_reception(&self, reception_id: Uuid) -> Result<(), StorageError> {
        let mut state = self.state()?;
        match state.receptions.get_mut(&reception_id) {
            Some(entry) if entry.reception.is_open() => {
                entry.reception.status = ReceptionStatus::Close;
                Ok(())
            }
            Some(_) => Err(StorageError::Conflict("reception is already closed".into())),
            None => Err(StorageError::Conflict("reception does not exist".into())),
        }
    }

    async fn create_product(&self, reception_id: Uuid, product_type: ProductType) -> Result<Product, StorageError> {
        let mut state = self.state()?;
        let entry = state.receptions.get_mut(&reception_id).ok_or_else(|| StorageError::not_found("reception"))?;
        if !entry.reception.is_open() {
            return Err(StorageError::Conflict("reception is already closed".into()));
        }
        let product = Product {
            id: Uuid::new_v4(),
            date_time: Utc::now(),
            product_type,
            reception_id,
            seq: entry.next_product_seq,
        };
        entry.next_product_seq += 1;
        entry.products.push(product.clone());
        Ok(product)
    }

    async fn get_products_by_reception_id(&self, reception_id: Uuid) -> Result<Vec<Product>, StorageError> {
        let state = self.state()?;
        state
            .receptions
            .get(&reception_id)
            .map(|e| e.products.clone())
            .ok_or_else(|| StorageError::not_found("reception"))
    }

    async fn delete_last_product_in_reception(&self, reception_id: Uuid) -> Result<Product, StorageError> {
        let mut state = self.state()?;
        let entry = state.receptions.get_mut(&reception_id).ok_or_else(|| StorageError::not_found("reception"))?;
        if !entry.reception.is_open() {
            return Err(StorageError::Conflict("reception is already closed".into()));
        }
        entry.products.pop().ok_or_else(|| StorageError::NotFound("no products to delete".into()))
    }
}

//! Reception workflow.
//!
//! Every operation authorizes first, then validates its arguments, then
//! delegates to storage. Storage and token failures are translated here and
//! nowhere else.

use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::auth::{password, TokenService};
use crate::domain::{City, LoginInput, Product, ProductType, Pvz, PvzListItem, Reception, ReceptionStatus, RegisterInput, Role, User};
use crate::errors::ServiceError;
use crate::pagination::PvzListQuery;
use crate::storage::{Storage, StorageError};

/// Business service independent of web framework
pub struct PvzService<S: Storage + ?Sized> {
    storage: Arc<S>,
    tokens: TokenService,
}

impl<S: Storage + ?Sized> Clone for PvzService<S> {
    fn clone(&self) -> Self {
        Self { storage: self.storage.clone(), tokens: self.tokens.clone() }
    }
}

/// Log the raw cause and hand the caller a generic message.
fn internal(op: &'static str, cause: impl std::fmt::Display) -> ServiceError {
    error!(op, cause = %cause, "storage failure");
    ServiceError::Internal("internal server error".into())
}

impl<S: Storage + ?Sized> PvzService<S> {
    pub fn new(storage: Arc<S>, tokens: TokenService) -> Self { Self { storage, tokens } }

    pub fn tokens(&self) -> &TokenService { &self.tokens }

    /// Token for a role without any registered user.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::{PvzService, auth::TokenService, storage::InMemoryStorage};
    /// let svc = PvzService::new(Arc::new(InMemoryStorage::new()), TokenService::new("secret"));
    /// assert!(svc.dummy_login("employee").is_ok());
    /// assert!(svc.dummy_login("admin").is_err());
    /// ```
    pub fn dummy_login(&self, role: &str) -> Result<String, ServiceError> {
        let role: Role = role.parse().map_err(|e: crate::domain::UnknownVariant| ServiceError::validation(e.to_string()))?;
        self.tokens.issue(role.as_str()).map_err(|e| internal("dummy_login", e))
    }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::{PvzService, auth::TokenService, storage::InMemoryStorage};
    /// use service::domain::{RegisterInput, Role};
    /// let svc = PvzService::new(Arc::new(InMemoryStorage::new()), TokenService::new("secret"));
    /// let input = RegisterInput { email: "user@example.com".into(), password: "Secret123".into(), role: "employee".into() };
    /// let user = tokio_test::block_on(svc.register_user(input)).unwrap();
    /// assert_eq!(user.role, Role::Employee);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register_user(&self, input: RegisterInput) -> Result<User, ServiceError> {
        let role: Role = input.role.parse().map_err(|_| ServiceError::validation("role must be employee or moderator"))?;
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(ServiceError::validation("email and password are required"));
        }
        let digest = password::hash_password(&input.password).map_err(|e| internal("register_user", e))?;
        let user = match self.storage.create_user(input.email.trim(), &digest, role).await {
            Ok(u) => u.into_public(),
            Err(StorageError::Conflict(_)) => return Err(ServiceError::conflict("user with this email already exists")),
            Err(e) => return Err(internal("register_user", e)),
        };
        info!(user_id = %user.id, role = %user.role, "user_registered");
        Ok(user)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<String, ServiceError> {
        let record = match self.storage.get_user_by_email(input.email.trim()).await {
            Ok(r) => r,
            Err(StorageError::NotFound(_)) => return Err(ServiceError::Unauthorized("invalid credentials".into())),
            Err(e) => return Err(internal("login", e)),
        };
        let matches = password::verify_password(&input.password, &record.password_hash).map_err(|e| internal("login", e))?;
        if !matches {
            return Err(ServiceError::Unauthorized("invalid credentials".into()));
        }
        let user = record.into_public();
        let token = self.tokens.issue_for_user(&user).map_err(|e| internal("login", e))?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(token)
    }

    #[instrument(skip(self, token))]
    pub async fn create_pvz(&self, token: Option<&str>, city: &str) -> Result<Pvz, ServiceError> {
        self.tokens.check_role(token, Role::Moderator)?;
        let city: City = city.parse().map_err(|_| ServiceError::validation(format!("unsupported city: {}", city)))?;
        let pvz = self.storage.create_pvz(city).await.map_err(|e| internal("create_pvz", e))?;
        info!(pvz_id = %pvz.id, city = %pvz.city, "pvz_created");
        Ok(pvz)
    }

    #[instrument(skip(self, token, query))]
    pub async fn list_pvz(&self, token: Option<&str>, query: &PvzListQuery) -> Result<Vec<PvzListItem>, ServiceError> {
        self.tokens.check_role_any(token, &Role::ALL)?;
        let filter = query.normalize();
        self.storage
            .list_pvz(filter.start, filter.end, filter.pagination.page, filter.pagination.limit)
            .await
            .map_err(|e| internal("list_pvz", e))
    }

    #[instrument(skip(self, token))]
    pub async fn create_reception(&self, token: Option<&str>, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        self.tokens.check_role(token, Role::Employee)?;
        let reception = match self.storage.create_reception(pvz_id).await {
            Ok(r) => r,
            Err(StorageError::NotFound(_)) => return Err(ServiceError::validation("pvz does not exist")),
            Err(StorageError::Conflict(m)) => return Err(ServiceError::Conflict(m)),
            Err(e) => return Err(internal("create_reception", e)),
        };
        info!(reception_id = %reception.id, "reception_opened");
        Ok(reception)
    }

    #[instrument(skip(self, token))]
    pub async fn close_last_reception(&self, token: Option<&str>, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        self.tokens.check_role(token, Role::Employee)?;
        let mut reception = self.last_reception("close_last_reception", pvz_id).await?;
        match self.storage.close_reception(reception.id).await {
            Ok(()) => {}
            Err(StorageError::Conflict(m)) | Err(StorageError::NotFound(m)) => return Err(ServiceError::Conflict(m)),
            Err(e) => return Err(internal("close_last_reception", e)),
        }
        reception.status = ReceptionStatus::Close;
        info!(reception_id = %reception.id, "reception_closed");
        Ok(reception)
    }

    #[instrument(skip(self, token))]
    pub async fn create_product(&self, token: Option<&str>, pvz_id: Uuid, product_type: &str) -> Result<Product, ServiceError> {
        self.tokens.check_role(token, Role::Employee)?;
        let product_type: ProductType = product_type
            .parse()
            .map_err(|_| ServiceError::validation(format!("unsupported product type: {}", product_type)))?;
        let reception = self.open_reception("create_product", pvz_id).await?;
        let product = match self.storage.create_product(reception.id, product_type).await {
            Ok(p) => p,
            Err(StorageError::Conflict(m)) => return Err(ServiceError::Conflict(m)),
            Err(StorageError::NotFound(_)) => return Err(ServiceError::validation("reception does not exist")),
            Err(e) => return Err(internal("create_product", e)),
        };
        info!(product_id = %product.id, reception_id = %reception.id, "product_added");
        Ok(product)
    }

    #[instrument(skip(self, token))]
    pub async fn delete_last_product(&self, token: Option<&str>, pvz_id: Uuid) -> Result<Product, ServiceError> {
        self.tokens.check_role(token, Role::Employee)?;
        let reception = self.open_reception("delete_last_product", pvz_id).await?;
        let product = match self.storage.delete_last_product_in_reception(reception.id).await {
            Ok(p) => p,
            Err(StorageError::Conflict(m)) => return Err(ServiceError::Conflict(m)),
            Err(StorageError::NotFound(_)) => return Err(ServiceError::validation("no products to delete")),
            Err(e) => return Err(internal("delete_last_product", e)),
        };
        info!(product_id = %product.id, reception_id = %reception.id, "product_deleted");
        Ok(product)
    }

    async fn last_reception(&self, op: &'static str, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        match self.storage.get_last_reception_by_pvz_id(pvz_id).await {
            Ok(r) => Ok(r),
            Err(StorageError::NotFound(_)) => Err(ServiceError::validation("no reception found for this pvz")),
            Err(e) => Err(internal(op, e)),
        }
    }

    async fn open_reception(&self, op: &'static str, pvz_id: Uuid) -> Result<Reception, ServiceError> {
        let reception = self.last_reception(op, pvz_id).await?;
        if !reception.is_open() {
            return Err(ServiceError::conflict("reception is already closed"));
        }
        Ok(reception)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::storage::InMemoryStorage;

    fn service() -> PvzService<InMemoryStorage> {
        PvzService::new(Arc::new(InMemoryStorage::new()), TokenService::new("test-secret"))
    }

    struct Tokens {
        employee: String,
        moderator: String,
    }

    fn tokens(svc: &PvzService<InMemoryStorage>) -> Tokens {
        Tokens { employee: svc.dummy_login("employee").unwrap(), moderator: svc.dummy_login("moderator").unwrap() }
    }

    #[tokio::test]
    async fn full_scan_scenario() {
        let svc = service();
        let t = tokens(&svc);
        let pvz = svc.create_pvz(Some(&t.moderator), "Moscow").await.unwrap();
        let rec = svc.create_reception(Some(&t.employee), pvz.id).await.unwrap();
        assert_eq!(rec.status, ReceptionStatus::InProgress);

        for i in 0..50 {
            let ty = ProductType::ALL[i % 3];
            let p = svc.create_product(Some(&t.employee), pvz.id, ty.as_str()).await.unwrap();
            assert_eq!(p.reception_id, rec.id);
        }
        let closed = svc.close_last_reception(Some(&t.employee), pvz.id).await.unwrap();
        assert_eq!(closed.id, rec.id);
        assert_eq!(closed.status, ReceptionStatus::Close);

        let items = svc.list_pvz(Some(&t.employee), &PvzListQuery::default()).await.unwrap();
        assert_eq!(items.len(), 1);
        let nested = &items[0].receptions[0];
        assert_eq!(nested.reception.status, ReceptionStatus::Close);
        assert_eq!(nested.products.len(), 50);
        assert_eq!(nested.products[0].product_type, ProductType::Electronics);
        assert_eq!(nested.products[49].product_type, ProductType::Clothing);
    }

    #[tokio::test]
    async fn unsupported_city_is_rejected_for_every_role() {
        let svc = service();
        let t = tokens(&svc);
        let err = svc.create_pvz(Some(&t.moderator), "Novosibirsk").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = svc.create_pvz(Some(&t.employee), "Novosibirsk").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let err = svc.create_pvz(None, "Novosibirsk").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn russian_city_alias_is_stored_canonically() {
        let svc = service();
        let t = tokens(&svc);
        let pvz = svc.create_pvz(Some(&t.moderator), "Казань").await.unwrap();
        assert_eq!(pvz.city, City::Kazan);
    }

    #[tokio::test]
    async fn second_open_reception_conflicts() {
        let svc = service();
        let t = tokens(&svc);
        let pvz = svc.create_pvz(Some(&t.moderator), "Kazan").await.unwrap();
        svc.create_reception(Some(&t.employee), pvz.id).await.unwrap();
        let err = svc.create_reception(Some(&t.employee), pvz.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = svc.create_reception(Some(&t.moderator), pvz.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn unknown_pvz_is_a_validation_failure() {
        let svc = service();
        let t = tokens(&svc);
        let err = svc.create_reception(Some(&t.employee), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = svc.close_last_reception(Some(&t.employee), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn closed_reception_rejects_changes() {
        let svc = service();
        let t = tokens(&svc);
        let pvz = svc.create_pvz(Some(&t.moderator), "SaintPetersburg").await.unwrap();
        svc.create_reception(Some(&t.employee), pvz.id).await.unwrap();
        svc.create_product(Some(&t.employee), pvz.id, "electronics").await.unwrap();
        svc.close_last_reception(Some(&t.employee), pvz.id).await.unwrap();

        let err = svc.close_last_reception(Some(&t.employee), pvz.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        for ty in ProductType::ALL {
            let err = svc.create_product(Some(&t.employee), pvz.id, ty.as_str()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Conflict);
        }
        let err = svc.delete_last_product(Some(&t.employee), pvz.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let items = svc.list_pvz(Some(&t.moderator), &PvzListQuery::default()).await.unwrap();
        assert_eq!(items[0].receptions[0].reception.status, ReceptionStatus::Close);
    }

    #[tokio::test]
    async fn delete_removes_newest_until_empty() {
        let svc = service();
        let t = tokens(&svc);
        let pvz = svc.create_pvz(Some(&t.moderator), "Moscow").await.unwrap();
        svc.create_reception(Some(&t.employee), pvz.id).await.unwrap();
        let first = svc.create_product(Some(&t.employee), pvz.id, "clothing").await.unwrap();
        let second = svc.create_product(Some(&t.employee), pvz.id, "обувь").await.unwrap();
        assert_eq!(second.product_type, ProductType::Footwear);

        assert_eq!(svc.delete_last_product(Some(&t.employee), pvz.id).await.unwrap().id, second.id);
        assert_eq!(svc.delete_last_product(Some(&t.employee), pvz.id).await.unwrap().id, first.id);
        let err = svc.delete_last_product(Some(&t.employee), pvz.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn wrong_role_wins_over_bad_arguments() {
        let svc = service();
        let t = tokens(&svc);
        let err = svc.create_product(Some(&t.moderator), Uuid::new_v4(), "food").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let err = svc.create_product(Some(&t.employee), Uuid::new_v4(), "food").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn listing_second_page_of_fifteen() {
        let svc = service();
        let t = tokens(&svc);
        let mut created = Vec::new();
        for _ in 0..15 {
            created.push(svc.create_pvz(Some(&t.moderator), "Moscow").await.unwrap().id);
        }
        created.reverse();

        let query = PvzListQuery { page: Some("2".into()), limit: Some("5".into()), ..Default::default() };
        let page: Vec<Uuid> = svc.list_pvz(Some(&t.employee), &query).await.unwrap().iter().map(|i| i.pvz.id).collect();
        assert_eq!(page, created[5..10].to_vec());

        let query = PvzListQuery { page: Some("x".into()), limit: Some("500".into()), ..Default::default() };
        assert_eq!(svc.list_pvz(Some(&t.employee), &query).await.unwrap().len(), 10);
        assert_eq!(svc.list_pvz(None, &query).await.unwrap_err().kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn register_then_login() {
        let svc = service();
        let user = svc
            .register_user(RegisterInput { email: "mod@pvz.io".into(), password: "pw".into(), role: "moderator".into() })
            .await
            .unwrap();
        let token = svc.login(LoginInput { email: "mod@pvz.io".into(), password: "pw".into() }).await.unwrap();
        let claims = svc.tokens().validate(&token).unwrap();
        assert_eq!(claims.role, Role::Moderator);
        assert_eq!(claims.sub, user.id.to_string());

        let err = svc.login(LoginInput { email: "mod@pvz.io".into(), password: "nope".into() }).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err = svc.login(LoginInput { email: "ghost@pvz.io".into(), password: "pw".into() }).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn registration_validation_and_duplicates() {
        let svc = service();
        let bad_role = RegisterInput { email: "a@b.c".into(), password: "pw".into(), role: "admin".into() };
        assert_eq!(svc.register_user(bad_role).await.unwrap_err().kind(), ErrorKind::Validation);
        let empty = RegisterInput { email: " ".into(), password: "pw".into(), role: "employee".into() };
        assert_eq!(svc.register_user(empty).await.unwrap_err().kind(), ErrorKind::Validation);

        let input = RegisterInput { email: "a@b.c".into(), password: "pw".into(), role: "employee".into() };
        svc.register_user(input.clone()).await.unwrap();
        assert_eq!(svc.register_user(input).await.unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reception_openings() {
        let svc = service();
        let t = tokens(&svc);
        let pvz = svc.create_pvz(Some(&t.moderator), "Moscow").await.unwrap();
        let handles: Vec<_> = (0..12)
            .map(|_| {
                let svc = svc.clone();
                let token = t.employee.clone();
                tokio::spawn(async move { svc.create_reception(Some(&token), pvz.id).await })
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

    #[tokio::test]
    async fn dummy_login_rejects_unknown_role() {
        let svc = service();
        assert_eq!(svc.dummy_login("admin").unwrap_err().kind(), ErrorKind::Validation);
    }
}

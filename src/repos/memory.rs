//! In-memory `UserStore` / `ProductStore` used by unit and router tests.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::product_repo::{NewProduct, ProductRecord, ProductStore};
use crate::repos::user_repo::{NewUser, StoredSession, UserProfile, UserRecord, UserStore};

#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, UserRecord>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_session` fail with a db error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Insert a user without going through password hashing.
    pub async fn seed(&self, email: &str, full_name: &str) -> UserProfile {
        self.insert(NewUser {
            email: email.to_string(),
            full_name: full_name.to_string(),
            password_hash: "$argon2id$unused".to_string(),
        })
        .await
        .unwrap()
    }

    pub async fn session_of(&self, id: Uuid) -> Option<StoredSession> {
        self.users.read().await.get(&id).map(|u| u.session.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_profile_by_id(&self, id: Uuid) -> RepoResult<Option<UserProfile>> {
        Ok(self.users.read().await.get(&id).map(|u| u.profile.clone()))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.profile.email == email)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> RepoResult<UserProfile> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.profile.email == user.email) {
            return Err(RepoError::Conflict);
        }

        let now = Utc::now();
        let profile = UserProfile {
            id: Uuid::new_v4(),
            email: user.email,
            full_name: user.full_name,
            created_at: now,
            updated_at: now,
        };
        users.insert(
            profile.id,
            UserRecord {
                profile: profile.clone(),
                password_hash: user.password_hash,
                session: StoredSession::None,
            },
        );

        Ok(profile)
    }

    async fn set_session(&self, id: Uuid, session: StoredSession) -> RepoResult<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }

        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.session = session;
                user.profile.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryProductStore {
    products: Arc<RwLock<Vec<ProductRecord>>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list_by_user(&self, user_id: Uuid) -> RepoResult<Vec<ProductRecord>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find(&self, user_id: Uuid, product_id: i64) -> RepoResult<Option<ProductRecord>> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.user_id == user_id && p.product_id == product_id)
            .cloned())
    }

    async fn insert(&self, user_id: Uuid, product: NewProduct) -> RepoResult<ProductRecord> {
        let mut products = self.products.write().await;
        if products
            .iter()
            .any(|p| p.user_id == user_id && p.product_id == product.product_id)
        {
            return Err(RepoError::Conflict);
        }

        let now = Utc::now();
        let record = ProductRecord {
            id: Uuid::new_v4(),
            product_id: product.product_id,
            title: product.title,
            description: product.description,
            image: product.image,
            category: product.category,
            price: product.price,
            discount: product.discount,
            quantity: product.quantity,
            rating: product.rating,
            user_id,
            created_at: now,
            updated_at: now,
        };
        products.push(record.clone());

        Ok(record)
    }

    async fn update_quantity(
        &self,
        user_id: Uuid,
        product_id: i64,
        quantity: i32,
    ) -> RepoResult<Option<ProductRecord>> {
        let mut products = self.products.write().await;
        let Some(record) = products
            .iter_mut()
            .find(|p| p.user_id == user_id && p.product_id == product_id)
        else {
            return Ok(None);
        };

        record.quantity = quantity;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, user_id: Uuid, product_id: i64) -> RepoResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| !(p.user_id == user_id && p.product_id == product_id));
        Ok(products.len() < before)
    }
}

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{MarketStore, UsernameTaken};
use crate::schema::{
    Job, NewJob, NewProduct, NewServiceRequest, Product, ServiceRequest, User,
};

/// Process-local store used when no `DATABASE_URL` is configured, and by tests.
/// Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    last_id: i32,
    users: BTreeMap<i32, User>,
    sessions: HashMap<String, (i32, OffsetDateTime)>,
    products: BTreeMap<i32, Product>,
    jobs: BTreeMap<i32, Job>,
    requests: BTreeMap<i32, ServiceRequest>,
}

impl Tables {
    // one sequence for every table; ids only need to be unique per table
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn get_user(&self, id: i32) -> anyhow::Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> anyhow::Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(UsernameTaken.into());
        }
        let user = User {
            id: tables.next_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: i32,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        anyhow::ensure!(tables.users.contains_key(&user_id), "unknown user {user_id}");
        tables
            .sessions
            .insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn session_user(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let tables = self.tables.read().await;
        let user = match tables.sessions.get(token) {
            Some((user_id, expires_at)) if *expires_at > now => {
                tables.users.get(user_id).cloned()
            }
            _ => None,
        };
        Ok(user)
    }

    async fn delete_session(&self, token: &str) -> anyhow::Result<()> {
        self.tables.write().await.sessions.remove(token);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> anyhow::Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        Ok(self.tables.read().await.products.values().rev().cloned().collect())
    }

    async fn get_product(&self, id: i32) -> anyhow::Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_product(&self, new: NewProduct, seller_id: i32) -> anyhow::Result<Product> {
        let mut tables = self.tables.write().await;
        let product = Product {
            id: tables.next_id(),
            title: new.title,
            description: new.description,
            price: new.price,
            image: new.image,
            whatsapp: new.whatsapp,
            seller_id,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn list_jobs(&self) -> anyhow::Result<Vec<Job>> {
        Ok(self.tables.read().await.jobs.values().rev().cloned().collect())
    }

    async fn get_job(&self, id: i32) -> anyhow::Result<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(&id).cloned())
    }

    async fn create_job(&self, new: NewJob, employer_id: i32) -> anyhow::Result<Job> {
        let mut tables = self.tables.write().await;
        let job = Job {
            id: tables.next_id(),
            title: new.title,
            description: new.description,
            salary: new.salary,
            whatsapp: new.whatsapp,
            employer_id,
        };
        tables.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn delete_job(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.tables.write().await.jobs.remove(&id).is_some())
    }

    async fn list_requests(&self) -> anyhow::Result<Vec<ServiceRequest>> {
        Ok(self.tables.read().await.requests.values().rev().cloned().collect())
    }

    async fn get_request(&self, id: i32) -> anyhow::Result<Option<ServiceRequest>> {
        Ok(self.tables.read().await.requests.get(&id).cloned())
    }

    async fn create_request(
        &self,
        new: NewServiceRequest,
        requester_id: i32,
    ) -> anyhow::Result<ServiceRequest> {
        let mut tables = self.tables.write().await;
        let request = ServiceRequest {
            id: tables.next_id(),
            title: new.title,
            description: new.description,
            budget: new.budget,
            requester_id,
        };
        tables.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn delete_request(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.tables.write().await.requests.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn product(title: &str) -> NewProduct {
        NewProduct {
            title: title.into(),
            description: "Ten or more characters".into(),
            price: 10,
            image: "https://placehold.co/600x400".into(),
            whatsapp: "27123456789".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemoryStore::new();
        store.create_user("demo", "hash").await.unwrap();
        let err = store.create_user("demo", "hash").await.unwrap_err();
        assert!(err.downcast_ref::<UsernameTaken>().is_some());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_delete_removes() {
        let store = MemoryStore::new();
        let user = store.create_user("seller", "hash").await.unwrap();
        let a = store.create_product(product("Sofa"), user.id).await.unwrap();
        let b = store.create_product(product("Table"), user.id).await.unwrap();

        let ids: Vec<i32> = store.list_products().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);

        assert!(store.delete_product(a.id).await.unwrap());
        assert!(!store.delete_product(a.id).await.unwrap());
        let ids: Vec<i32> = store.list_products().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id]);
    }

    #[tokio::test]
    async fn expired_sessions_are_ignored_and_purged() {
        let store = MemoryStore::new();
        let user = store.create_user("demo", "hash").await.unwrap();
        let now = OffsetDateTime::now_utc();
        store
            .create_session("live", user.id, now + Duration::hours(1))
            .await
            .unwrap();
        store
            .create_session("stale", user.id, now - Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(store.session_user("live", now).await.unwrap().map(|u| u.id), Some(user.id));
        assert!(store.session_user("stale", now).await.unwrap().is_none());
        assert_eq!(store.purge_expired_sessions(now).await.unwrap(), 1);
        assert!(store.session_user("live", now).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn session_requires_existing_user() {
        let store = MemoryStore::new();
        let res = store
            .create_session("t", 42, OffsetDateTime::now_utc())
            .await;
        assert!(res.is_err());
    }
}

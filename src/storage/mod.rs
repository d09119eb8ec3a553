use async_trait::async_trait;
use time::OffsetDateTime;

use crate::schema::{
    Job, NewJob, NewProduct, NewServiceRequest, Product, ServiceRequest, User,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Returned (inside `anyhow::Error`) when a username is already registered.
#[derive(Debug, thiserror::Error)]
#[error("username already taken")]
pub struct UsernameTaken;

/// Everything the API needs from the relational store.
///
/// Listing methods return newest rows first. `delete_*` returns whether a row
/// was removed.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn get_user(&self, id: i32) -> anyhow::Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, username: &str, password_hash: &str) -> anyhow::Result<User>;

    async fn create_session(
        &self,
        token: &str,
        user_id: i32,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()>;
    /// User behind `token`, if the session exists and has not expired at `now`.
    async fn session_user(&self, token: &str, now: OffsetDateTime)
        -> anyhow::Result<Option<User>>;
    async fn delete_session(&self, token: &str) -> anyhow::Result<()>;
    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> anyhow::Result<u64>;

    async fn list_products(&self) -> anyhow::Result<Vec<Product>>;
    async fn get_product(&self, id: i32) -> anyhow::Result<Option<Product>>;
    async fn create_product(&self, new: NewProduct, seller_id: i32) -> anyhow::Result<Product>;
    async fn delete_product(&self, id: i32) -> anyhow::Result<bool>;

    async fn list_jobs(&self) -> anyhow::Result<Vec<Job>>;
    async fn get_job(&self, id: i32) -> anyhow::Result<Option<Job>>;
    async fn create_job(&self, new: NewJob, employer_id: i32) -> anyhow::Result<Job>;
    async fn delete_job(&self, id: i32) -> anyhow::Result<bool>;

    async fn list_requests(&self) -> anyhow::Result<Vec<ServiceRequest>>;
    async fn get_request(&self, id: i32) -> anyhow::Result<Option<ServiceRequest>>;
    async fn create_request(
        &self,
        new: NewServiceRequest,
        requester_id: i32,
    ) -> anyhow::Result<ServiceRequest>;
    async fn delete_request(&self, id: i32) -> anyhow::Result<bool>;
}

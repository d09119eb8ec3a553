use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;

use super::{MarketStore, UsernameTaken};
use crate::schema::{
    Job, NewJob, NewProduct, NewServiceRequest, Product, ServiceRequest, User,
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn get_user(&self, id: i32) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, username, password_hash FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get user")?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("get user by username")?;
        Ok(user)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> anyhow::Result<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(UsernameTaken.into()),
            Err(e) => Err(anyhow::Error::new(e).context("insert user")),
        }
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: i32,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("insert session")?;
        Ok(())
    }

    async fn session_user(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.password_hash
              FROM sessions s
              JOIN users u ON u.id = s.user_id
             WHERE s.token = $1 AND s.expires_at > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .context("lookup session")?;
        Ok(user)
    }

    async fn delete_session(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM sessions WHERE token = $1"#)
            .bind(token)
            .execute(&self.db)
            .await
            .context("delete session")?;
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> anyhow::Result<u64> {
        let res = sqlx::query(r#"DELETE FROM sessions WHERE expires_at <= $1"#)
            .bind(now)
            .execute(&self.db)
            .await
            .context("purge sessions")?;
        Ok(res.rows_affected())
    }

    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, title, description, price, image, whatsapp, seller_id
            FROM products
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list products")?;
        Ok(rows)
    }

    async fn get_product(&self, id: i32) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, title, description, price, image, whatsapp, seller_id
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get product")?;
        Ok(row)
    }

    async fn create_product(&self, new: NewProduct, seller_id: i32) -> anyhow::Result<Product> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (title, description, price, image, whatsapp, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, price, image, whatsapp, seller_id
            "#,
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.price)
        .bind(new.image)
        .bind(new.whatsapp)
        .bind(seller_id)
        .fetch_one(&self.db)
        .await
        .context("insert product")?;
        Ok(row)
    }

    async fn delete_product(&self, id: i32) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM products WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete product")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_jobs(&self) -> anyhow::Result<Vec<Job>> {
        let rows = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, title, description, salary, whatsapp, employer_id
            FROM jobs
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list jobs")?;
        Ok(rows)
    }

    async fn get_job(&self, id: i32) -> anyhow::Result<Option<Job>> {
        let row = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, title, description, salary, whatsapp, employer_id
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get job")?;
        Ok(row)
    }

    async fn create_job(&self, new: NewJob, employer_id: i32) -> anyhow::Result<Job> {
        let row = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (title, description, salary, whatsapp, employer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, salary, whatsapp, employer_id
            "#,
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.salary)
        .bind(new.whatsapp)
        .bind(employer_id)
        .fetch_one(&self.db)
        .await
        .context("insert job")?;
        Ok(row)
    }

    async fn delete_job(&self, id: i32) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM jobs WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete job")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_requests(&self) -> anyhow::Result<Vec<ServiceRequest>> {
        let rows = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, title, description, budget, requester_id
            FROM requests
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list requests")?;
        Ok(rows)
    }

    async fn get_request(&self, id: i32) -> anyhow::Result<Option<ServiceRequest>> {
        let row = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT id, title, description, budget, requester_id
            FROM requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get request")?;
        Ok(row)
    }

    async fn create_request(
        &self,
        new: NewServiceRequest,
        requester_id: i32,
    ) -> anyhow::Result<ServiceRequest> {
        let row = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO requests (title, description, budget, requester_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, budget, requester_id
            "#,
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.budget)
        .bind(requester_id)
        .fetch_one(&self.db)
        .await
        .context("insert request")?;
        Ok(row)
    }

    async fn delete_request(&self, id: i32) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM requests WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete request")?;
        Ok(res.rows_affected() > 0)
    }
}

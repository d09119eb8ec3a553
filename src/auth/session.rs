//! Server-side sessions keyed by an opaque cookie token.

use std::{sync::Arc, time::Duration};

use axum::http::HeaderMap;
use headers::{Cookie, HeaderMapExt};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{config::SessionConfig, state::AppState, storage::MarketStore};

pub const SESSION_COOKIE: &str = "loca.sid";
const TOKEN_LEN: usize = 48;

pub fn new_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Session token carried by the request's `Cookie` header, if any.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Cookie>()
        .and_then(|c| c.get(SESSION_COOKIE).map(str::to_owned))
        .filter(|t| !t.is_empty())
}

fn cookie(value: &str, max_age_secs: i64, cfg: &SessionConfig) -> String {
    let mut c = format!(
        "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if cfg.cookie_secure {
        c.push_str("; Secure");
    }
    c
}

pub fn session_cookie(token: &str, cfg: &SessionConfig) -> String {
    cookie(token, cfg.ttl().whole_seconds(), cfg)
}

pub fn cleared_cookie(cfg: &SessionConfig) -> String {
    cookie("", 0, cfg)
}

/// Stores a new session for `user_id` and returns the `Set-Cookie` value.
pub async fn start_session(state: &AppState, user_id: i32) -> anyhow::Result<String> {
    let cfg = &state.config.session;
    let token = new_token();
    let expires_at = OffsetDateTime::now_utc() + cfg.ttl();
    state
        .store
        .create_session(&token, user_id, expires_at)
        .await?;
    debug!(user_id, "session started");
    Ok(session_cookie(&token, cfg))
}

/// Periodically deletes expired sessions until the runtime shuts down.
pub fn spawn_sweeper(store: Arc<dyn MarketStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        loop {
            tick.tick().await;
            match store.purge_expired_sessions(OffsetDateTime::now_utc()).await {
                Ok(0) => {}
                Ok(n) => info!(purged = n, "expired sessions removed"),
                Err(e) => warn!(error = %e, "session sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn tokens_are_long_and_distinct() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn reads_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; loca.sid=abc123; lang=en".parse().unwrap());
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark".parse().unwrap());
        assert_eq!(token_from_headers(&headers), None);
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_attributes() {
        let mut cfg = SessionConfig::default();
        let c = session_cookie("tok", &cfg);
        assert!(c.starts_with("loca.sid=tok;"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("Max-Age=604800"));
        assert!(!c.contains("Secure"));

        cfg.cookie_secure = true;
        assert!(cleared_cookie(&cfg).contains("Max-Age=0"));
        assert!(cleared_cookie(&cfg).ends_with("; Secure"));
    }

    #[tokio::test]
    async fn started_session_resolves_to_user() {
        let state = AppState::fake();
        let user = state.store.create_user("demo", "hash").await.unwrap();
        let set_cookie = start_session(&state, user.id).await.unwrap();

        let token = set_cookie
            .strip_prefix("loca.sid=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();
        let found = state
            .store
            .session_user(token, OffsetDateTime::now_utc())
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn huge_ttl_is_capped() {
        let mut config = crate::config::AppConfig::default();
        config.session.ttl_hours = 100_000_000;
        let state = AppState::from_parts(
            Arc::new(crate::storage::MemoryStore::new()),
            Arc::new(config),
        );
        let user = state.store.create_user("demo", "hash").await.unwrap();

        let set_cookie = start_session(&state, user.id).await.unwrap();
        let max_age = crate::config::MAX_TTL_HOURS * 3600;
        assert!(set_cookie.contains(&format!("Max-Age={max_age}")));
    }
}

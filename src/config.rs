use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    pub sweep_minutes: u64,
    pub cookie_secure: bool,
}

/// Longest session lifetime accepted from the environment (ten years).
pub const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

impl SessionConfig {
    /// Session lifetime, kept within `1..=MAX_TTL_HOURS` hours.
    pub fn ttl(&self) -> time::Duration {
        time::Duration::hours(self.ttl_hours.clamp(1, MAX_TTL_HOURS))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API with credentials.
    pub cors_origins: Vec<String>,
    pub session: SessionConfig,
    pub seed_demo: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24 * 7,
            sweep_minutes: 30,
            cookie_secure: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 10,
            host: "0.0.0.0".into(),
            port: 8080,
            cors_origins: Vec::new(),
            session: SessionConfig::default(),
            seed_demo: true,
        }
    }
}

fn parse_var<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.trim().parse::<T>().ok())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`; unusable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let session = SessionConfig {
            ttl_hours: parse_var(lookup("SESSION_TTL_HOURS"))
                .filter(|h: &i64| (1..=MAX_TTL_HOURS).contains(h))
                .unwrap_or(defaults.session.ttl_hours),
            sweep_minutes: parse_var(lookup("SESSION_SWEEP_MINUTES"))
                .filter(|m: &u64| *m > 0)
                .unwrap_or(defaults.session.sweep_minutes),
            cookie_secure: parse_var(lookup("COOKIE_SECURE"))
                .unwrap_or(defaults.session.cookie_secure),
        };
        let config = Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            db_max_connections: parse_var(lookup("DB_MAX_CONNECTIONS"))
                .unwrap_or(defaults.db_max_connections),
            host: lookup("APP_HOST").unwrap_or(defaults.host),
            port: parse_var(lookup("APP_PORT")).unwrap_or(defaults.port),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            session,
            seed_demo: parse_var(lookup("SEED_DEMO")).unwrap_or(defaults.seed_demo),
        };
        config.bind_addr()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid APP_HOST {:?}", self.host))?;
        Ok(addr)
    }
}

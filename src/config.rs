use anyhow::Context;
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

/// Which repository implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Full connection string; takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database: DatabaseConfig,
    pub host: String,
    pub port: u16,
    /// Upper bound on handling one request, body read included.
    pub request_timeout: Duration,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return url.parse::<PgConnectOptions>().context("parse DATABASE_URL");
        }
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| lookup(key).with_context(|| format!("{} is not set", key));

        let store = match lookup("STORE").as_deref() {
            Some("memory") => StoreKind::Memory,
            Some("postgres") | None => StoreKind::Postgres,
            Some(other) => anyhow::bail!("unknown STORE {:?}", other),
        };

        let url = lookup("DATABASE_URL");
        // Individual parts are only mandatory when Postgres is used without a URL.
        let needs_parts = store == StoreKind::Postgres && url.is_none();
        let part = |key: &str| -> anyhow::Result<String> {
            if needs_parts {
                require(key)
            } else {
                Ok(lookup(key).unwrap_or_default())
            }
        };

        let production = lookup("ENVIRONMENT").as_deref() == Some("prod");
        let name = if production {
            part("DB_NAME")?
        } else {
            part("TEST_DB_NAME")?
        };

        let database = DatabaseConfig {
            url,
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or(&lookup, "DB_PORT", 5432)?,
            user: part("DB_USER")?,
            password: part("DB_PASSWORD")?,
            name,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
        };

        Ok(Self {
            store,
            database,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 9000)?,
            request_timeout: Duration::from_secs(parse_or(&lookup, "SERVER_TIMEOUT_SECS", 120)?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v.parse::<T>().with_context(|| format!("invalid {}", key)),
        None => Ok(default),
    }
}

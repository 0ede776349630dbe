use std::{env, str::FromStr, time::Duration};

use crate::retry::RetryPolicy;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// pulled into handlers via FromRef, like the repository handle.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection string. The file is created on first start.
    pub db_url: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls log format and required variables.
    pub env: Env,
    // Initial password for the provisioned `admin` account. Never overwrites an existing one.
    pub admin_default_password: String,
    // Attempts per contended write, including the first.
    pub write_max_attempts: u32,
    // Base backoff between attempts; attempt n waits n times this.
    pub write_backoff: Duration,
    // How long SQLite itself waits on a held lock before reporting busy.
    pub db_busy_timeout: Duration,
}

/// Env
///
/// Defines the runtime context: developer conveniences and readable logs locally,
/// strict configuration and JSON logs in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking AppConfig for test state scaffolding, pointing at an
    /// in-memory database.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            env: Env::Local,
            admin_default_password: "123456".to_string(),
            write_max_attempts: 3,
            write_backoff: Duration::from_millis(100),
            db_busy_timeout: Duration::from_millis(10_000),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables and fails fast.
    ///
    /// # Panics
    /// Panics in production if `DATABASE_URL` or `ADMIN_DEFAULT_PASSWORD` is missing,
    /// and in any environment if a numeric variable does not parse.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (db_url, admin_default_password) = match env {
            Env::Production => (
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                env::var("ADMIN_DEFAULT_PASSWORD")
                    .expect("FATAL: ADMIN_DEFAULT_PASSWORD required in prod"),
            ),
            Env::Local => (
                env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://portal.db?mode=rwc".to_string()),
                env::var("ADMIN_DEFAULT_PASSWORD").unwrap_or_else(|_| "123456".to_string()),
            ),
        };

        Self {
            db_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            env,
            admin_default_password,
            write_max_attempts: parsed_var("WRITE_MAX_ATTEMPTS", 3),
            write_backoff: Duration::from_millis(parsed_var("WRITE_BACKOFF_MS", 100)),
            db_busy_timeout: Duration::from_millis(parsed_var("DB_BUSY_TIMEOUT_MS", 10_000)),
        }
    }

    /// Contended-write policy derived from the configured bounds.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.write_max_attempts,
            base_backoff: self.write_backoff,
        }
    }
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {name} must be a number, got `{raw}`")),
        Err(_) => default,
    }
}

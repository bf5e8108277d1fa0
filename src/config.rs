use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub store_timeout: Duration,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://nodebucket.db".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let store_timeout_ms = parse_var("STORE_TIMEOUT_MS", 5000u64)?;
        if store_timeout_ms == 0 {
            return Err(AppError::Config("STORE_TIMEOUT_MS must be positive".to_string()));
        }

        let max_connections = parse_var("DB_MAX_CONNECTIONS", 5u32)?;
        if max_connections == 0 {
            return Err(AppError::Config("DB_MAX_CONNECTIONS must be positive".to_string()));
        }

        Ok(Self {
            database_url,
            bind_addr,
            store_timeout: Duration::from_millis(store_timeout_ms),
            max_connections,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{} is invalid: {}", key, e))),
        Err(_) => Ok(default),
    }
}

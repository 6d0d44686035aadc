use anyhow::{anyhow, Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub drive: DriveConfig,
    pub admin_setup_code: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub server: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow!("missing required environment variable {name}"))
}

impl AppConfig {
    /// Loads configuration from the environment. Every missing required
    /// variable aborts startup with a diagnostic naming the variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("SERVER_PORT must be a valid port number")?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            },
            drive: DriveConfig {
                server: required("DRIVE_SERVER")?,
                access_key: required("DRIVE_ACCESSKEY")?,
                secret_key: required("DRIVE_SECRET")?,
                bucket: required("DRIVE_BUCKET")?,
            },
            admin_setup_code: required("ADMIN_SETUP_CODE")?,
        })
    }
}

//! Configuration management for the directory server
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which hosted-backend client to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Redis,
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(BackendKind::Redis),
            "memory" => Ok(BackendKind::Memory),
            other => anyhow::bail!("Unknown BACKEND '{}' (expected redis or memory)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub api_host: String,

    /// API server port
    pub api_port: u16,

    /// Public origin used for canonical URLs, JSON-LD and sitemaps
    pub site_base_url: String,

    /// Site name shown in page titles
    pub site_name: String,

    pub backend: BackendKind,

    /// Redis connection URL (redis backend only)
    pub redis_url: String,

    /// External catalog file; the built-in table is used when unset
    pub catalog_path: Option<PathBuf>,

    /// Where unauthenticated users are sent to sign in
    pub sign_in_path: String,

    /// Session token seeded with a development user (memory backend only)
    pub dev_session_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid API_PORT")?,

            site_base_url: env::var("SITE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),

            site_name: env::var("SITE_NAME")
                .unwrap_or_else(|_| "Local Business Directory".to_string()),

            backend: env::var("BACKEND")
                .unwrap_or_else(|_| "memory".to_string())
                .parse()?,

            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),

            catalog_path: env::var("CATALOG_PATH").ok().map(PathBuf::from),

            sign_in_path: env::var("SIGN_IN_PATH").unwrap_or_else(|_| "/sign-in".to_string()),

            dev_session_token: env::var("DEV_SESSION_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.api_port == 0 {
            anyhow::bail!("API_PORT must be greater than 0");
        }

        if !(self.site_base_url.starts_with("http://") || self.site_base_url.starts_with("https://"))
        {
            anyhow::bail!("SITE_BASE_URL must start with http:// or https://");
        }

        if !self.sign_in_path.starts_with('/') {
            anyhow::bail!("SIGN_IN_PATH must be an absolute path");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

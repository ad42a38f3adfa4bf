use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::errors::DEFAULT_MAX_BODY_BYTES;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub instance_id: String,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_body_bytes: usize,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("API_PORT must be a valid port number")?,
                // Used only for debugging/observability. Falls back to HOSTNAME
                // (Docker/Kubernetes), otherwise "unknown".
                instance_id: env::var("INSTANCE_ID")
                    .or_else(|_| env::var("HOSTNAME"))
                    .unwrap_or_else(|_| "unknown".to_string()),
            },
            upstream: UpstreamConfig {
                base_url: env::var("UPSTREAM_URL")
                    .unwrap_or_else(|_| "http://localhost:9000".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout_seconds: env::var("UPSTREAM_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("UPSTREAM_TIMEOUT_SECONDS must be a valid number")?,
                max_body_bytes: env::var("UPSTREAM_MAX_BODY_BYTES")
                    .unwrap_or_else(|_| DEFAULT_MAX_BODY_BYTES.to_string())
                    .parse()
                    .context("UPSTREAM_MAX_BODY_BYTES must be a valid number")?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

//! Configuration management for the flow builder service
//!
//! Handles server binding and flow database location.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Flow storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding flows.db (default: "data")
    pub data_dir: String,
    /// Keep flows in process memory only; nothing survives a restart
    pub in_memory: bool,
}

impl DatabaseConfig {
    /// Full path of the SQLite flow database
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("flows.db")
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("ZONEFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("ZONEFLOW_PORT")
                    .unwrap_or_else(|_| "3004".to_string())
                    .parse()
                    .unwrap_or(3004),
            },
            database: DatabaseConfig {
                data_dir: std::env::var("ZONEFLOW_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
                in_memory: std::env::var("ZONEFLOW_IN_MEMORY")
                    .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
        }
    }
}

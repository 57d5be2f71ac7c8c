use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::remote::BotClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Remote bot instances this console can talk to.
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
}

impl ServerConfig {
    pub fn client(&self) -> BotClient {
        BotClient::new(
            self.base_url.clone(),
            self.api_key.clone(),
            self.secret_key.clone(),
        )
    }
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> String {
    "sqlite://strategy_console.db".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_path: default_database_path(),
            servers: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file; a missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!("Config file {} not found, using defaults", path);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
        let config = toml::from_str(&text).with_context(|| format!("parsing {}", path))?;
        Ok(config)
    }

    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|server| server.name == name)
    }
}

// src/core/config_manager.rs
//! Runtime configuration: config.yaml plus environment overrides.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::environment::EnvironmentConfig;
use crate::ledger::LedgerPolicy;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub server: ServerConfig,
    pub relayer: RelayerConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct RelayerConfig {
    pub url: Option<String>,
    pub timeout_seconds: u64,
    pub attempts: u32,
}

impl RelayerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ConfigManager {
    /// Load config.yaml for the active environment, then apply overrides.
    pub fn load() -> Result<Self> {
        let environment = EnvironmentConfig::load()?;
        Self::from_environment(environment, |key| std::env::var(key).ok())
    }

    /// Build from an already parsed file. `lookup` resolves override variables.
    pub fn from_environment<F>(environment: EnvironmentConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("ROCKET_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid ROCKET_PORT: {}", raw))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret =
            lookup("FHE_JUNCTION_JWT_SECRET").unwrap_or_else(|| environment.jwt_secret.clone());
        let relayer_url = lookup("RELAYER_URL").or_else(|| environment.relayer_url.clone());

        info!(
            "Configuration loaded: port {}, relayer {}",
            port,
            relayer_url.as_deref().unwrap_or("in-process")
        );

        Ok(Self {
            server: ServerConfig { port, jwt_secret },
            relayer: RelayerConfig {
                url: relayer_url,
                timeout_seconds: environment.decrypt_timeout_seconds,
                attempts: environment.decrypt_attempts.max(1),
            },
            environment,
        })
    }

    pub fn with_database_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.environment.database_path = path;
        }
        self
    }

    pub fn ledger_policy(&self) -> LedgerPolicy {
        LedgerPolicy {
            close_jobs_on_evaluation: self.environment.close_jobs_on_evaluation,
        }
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        self.environment.ensure_directories().await
    }
}

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordinator::RoutingPolicy;
use crate::task::PollPolicy;
use crate::{AdgeniusError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 300;

fn default_listen() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_task_ttl_secs() -> u64 {
    3_600
}

fn default_max_tasks() -> usize {
    1_024
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderAuth {
    /// Key sent in the provider's default header (`x-freepik-api-key`).
    #[serde(rename = "api_key_env", alias = "env", alias = "api_key")]
    ApiKeyEnv {
        #[serde(default)]
        keys: Vec<String>,
    },
    #[serde(alias = "header_env")]
    HttpHeaderEnv {
        header: String,
        #[serde(default)]
        keys: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub http_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub auth: Option<ProviderAuth>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Seconds an untouched task snapshot (pending or terminal) is kept.
    #[serde(default = "default_task_ttl_secs")]
    pub task_ttl_secs: u64,
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            task_ttl_secs: default_task_ttl_secs(),
            max_tasks: default_max_tasks(),
        }
    }
}

impl GatewaySettings {
    pub fn task_ttl(&self) -> Duration {
        Duration::from_secs(self.task_ttl_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mystic: ProviderConfig,
    #[serde(default)]
    pub imagen3: ProviderConfig,
    #[serde(default)]
    pub polling: PollPolicy,
    #[serde(default)]
    pub routing: RoutingPolicy,
    #[serde(default)]
    pub gateway: GatewaySettings,
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| AdgeniusError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            AdgeniusError::Config(format!("read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.polling.validate()?;
        for (name, provider) in [("mystic", &self.mystic), ("imagen3", &self.imagen3)] {
            if let Some(base_url) = provider.base_url.as_deref() {
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(AdgeniusError::Config(format!(
                        "{name}.base_url must be an http(s) url (got {base_url:?})"
                    )));
                }
            }
        }
        if self.gateway.listen.trim().is_empty() {
            return Err(AdgeniusError::Config(
                "gateway.listen must be non-empty".to_string(),
            ));
        }
        if self.gateway.task_ttl_secs == 0 || self.gateway.max_tasks == 0 {
            return Err(AdgeniusError::Config(
                "gateway.task_ttl_secs and gateway.max_tasks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

//! Configuration loading and persistence
//!
//! Settings live in a single TOML file. `${VAR}` references are expanded from
//! the environment before parsing; unset variables are left untouched.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::{IAM_TOKEN_ENV, resolve_credential};
use super::error::{ConfigError, Result};
use super::polling::PollingConfig;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// IAM token. Supports `${IAM_TOKEN}` expansion and the `keyring:` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_token: Option<String>,
    /// Cloud that receives folders, networks and databases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_id: Option<String>,
    /// Login domain appended to generated usernames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

/// Base URLs of the control-plane services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_organization_manager")]
    pub organization_manager: String,
    #[serde(default = "default_resource_manager")]
    pub resource_manager: String,
    #[serde(default = "default_vpc")]
    pub vpc: String,
    #[serde(default = "default_ydb")]
    pub ydb: String,
    #[serde(default = "default_operation")]
    pub operation: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            organization_manager: default_organization_manager(),
            resource_manager: default_resource_manager(),
            vpc: default_vpc(),
            ydb: default_ydb(),
            operation: default_operation(),
        }
    }
}

impl Endpoints {
    /// Point every service at one base URL (used against mock servers)
    pub fn all(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            organization_manager: base.clone(),
            resource_manager: base.clone(),
            vpc: base.clone(),
            ydb: base.clone(),
            operation: base,
        }
    }
}

/// Defaults for networks and dedicated databases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    #[serde(default = "default_zones")]
    pub zones: Vec<String>,
    /// One CIDR block per zone, in the same order
    #[serde(default = "default_cidr_blocks")]
    pub cidr_blocks: Vec<String>,
    #[serde(default = "default_resource_preset")]
    pub resource_preset: String,
    #[serde(default = "default_storage_type")]
    pub storage_type: String,
    #[serde(default = "default_one")]
    pub group_count: String,
    #[serde(default = "default_one")]
    pub scale_size: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            cidr_blocks: default_cidr_blocks(),
            resource_preset: default_resource_preset(),
            storage_type: default_storage_type(),
            group_count: default_one(),
            scale_size: default_one(),
        }
    }
}

impl ProvisioningConfig {
    /// Zones paired with their subnet CIDR blocks
    pub fn zone_subnets(&self) -> Result<Vec<(String, String)>> {
        if self.zones.len() != self.cidr_blocks.len() {
            return Err(ConfigError::InvalidValue {
                key: "provisioning.cidr_blocks".to_string(),
                message: format!(
                    "expected {} blocks (one per zone), found {}",
                    self.zones.len(),
                    self.cidr_blocks.len()
                ),
            });
        }
        Ok(self
            .zones
            .iter()
            .cloned()
            .zip(self.cidr_blocks.iter().cloned())
            .collect())
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path, defaulting when the file is absent
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;
        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    /// Platform config path, e.g. `~/.config/ycprov/config.toml` on Linux
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "ycprov", "ycprov").ok_or(ConfigError::ConfigDirError)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// IAM token from `IAM_TOKEN`, falling back to the config file
    pub fn resolve_iam_token(&self) -> Result<String> {
        resolve_credential(self.iam_token.as_deref(), Some(IAM_TOKEN_ENV))?.ok_or_else(|| {
            ConfigError::MissingToken {
                env_var: IAM_TOKEN_ENV.to_string(),
            }
        })
    }

    /// Cloud id, or an error naming the missing setting
    pub fn require_cloud_id(&self) -> Result<&str> {
        self.cloud_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "cloud_id".to_string(),
                message: "not configured".to_string(),
            })
    }

    fn expand_env_vars(content: &str) -> String {
        // Unset variables stay as-is instead of failing the whole file
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn default_organization_manager() -> String {
    "https://organization-manager.api.cloud.yandex.net/organization-manager/v1".to_string()
}

fn default_resource_manager() -> String {
    "https://resource-manager.api.cloud.yandex.net/resource-manager/v1".to_string()
}

fn default_vpc() -> String {
    "https://vpc.api.cloud.yandex.net/vpc/v1".to_string()
}

fn default_ydb() -> String {
    "https://ydb.api.cloud.yandex.net/ydb/v1".to_string()
}

fn default_operation() -> String {
    "https://operation.api.cloud.yandex.net".to_string()
}

fn default_zones() -> Vec<String> {
    ["ru-central1-a", "ru-central1-b", "ru-central1-d"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_cidr_blocks() -> Vec<String> {
    ["192.168.1.0/24", "192.168.2.0/24", "192.168.3.0/24"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_resource_preset() -> String {
    "small-m8".to_string()
}

fn default_storage_type() -> String {
    "ssd".to_string()
}

fn default_one() -> String {
    "1".to_string()
}

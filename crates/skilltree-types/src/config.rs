//! Global configuration types for SkillTree.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! API listener and hierarchy engine tuning.

use serde::{Deserialize, Serialize};

/// Top-level configuration for SkillTree.
///
/// Loaded from `~/.skilltree/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub hierarchy: HierarchyConfig,
}

/// Listener settings for `sktree serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Hierarchy engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// How many times a failed store operation is retried before the request
    /// fails with a storage error.
    #[serde(default = "default_storage_retries")]
    pub storage_retries: u32,
}

fn default_storage_retries() -> u32 {
    1
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            storage_retries: default_storage_retries(),
        }
    }
}

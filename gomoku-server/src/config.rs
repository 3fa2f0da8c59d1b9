//! 服务端配置
//!
//! 从 JSON 文件加载，文件不存在时使用默认值

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gomoku_ai::{AgentConfig, AiConfig};
use protocol::NetworkConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "GOMOKU_CONFIG";

/// 服务端配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub ai: AiConfig,
    pub agent: AgentConfig,
}

impl ServerConfig {
    /// 按 `$GOMOKU_CONFIG`、默认路径的顺序加载
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => PathBuf::from(path),
            None => default_config_path()?,
        };
        Self::load_from(&path)
    }

    /// 从指定文件加载，文件不存在时返回默认配置
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// 写入配置文件（自动创建目录）
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {:?}", path))
    }
}

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;

    Ok(config_dir.join("gomoku").join("server.json"))
}

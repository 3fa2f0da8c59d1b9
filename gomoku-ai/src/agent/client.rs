//! 智能体 HTTP 客户端

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::response::AgentDecision;

#[cfg(feature = "agent")]
use super::response::parse_response;
#[cfg(feature = "agent")]
use anyhow::Context;
#[cfg(feature = "agent")]
use protocol::Position;
#[cfg(feature = "agent")]
use tracing::{debug, info};

/// 智能体服务配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// 服务地址
    pub url: String,
    /// 玩家标识，服务端以「来源地址 + uid」区分对局
    pub uid: String,
    /// 智能体对局使用的棋盘尺寸
    pub board_size: usize,
    /// 请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5001/gomoku_server_ui/".to_string(),
            uid: ":1".to_string(),
            board_size: protocol::DEFAULT_BOARD_SIZE,
            timeout_secs: 30,
        }
    }
}

/// 请求参数：reset 携带搜索深度，step 携带玩家落子坐标
#[cfg(feature = "agent")]
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Argument {
    Depth(i32),
    Coord([usize; 2]),
}

/// 请求体
#[cfg(feature = "agent")]
#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    command: &'a str,
    argument: Argument,
    uid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<[usize; 2]>,
}

#[cfg(feature = "agent")]
impl<'a> AgentRequest<'a> {
    fn reset(uid: &'a str, depth: i32) -> Self {
        Self {
            command: "reset",
            argument: Argument::Depth(depth),
            uid,
            action: None,
        }
    }

    fn step(uid: &'a str, played: Position) -> Self {
        let coord = [played.row, played.col];
        Self {
            command: "step",
            argument: Argument::Coord(coord),
            uid,
            action: Some(coord),
        }
    }
}

/// 智能体客户端
#[cfg(feature = "agent")]
pub struct AgentClient {
    config: AgentConfig,
    client: reqwest::Client,
}

#[cfg(feature = "agent")]
impl AgentClient {
    /// 创建新的客户端
    pub fn new(config: AgentConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(AgentConfig::default())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// 开始新对局，返回智能体的首步
    pub async fn reset(&self, depth: i32) -> Result<AgentDecision> {
        info!("Resetting agent game at {}", self.config.url);
        self.post(AgentRequest::reset(&self.config.uid, depth)).await
    }

    /// 告知玩家落子，返回智能体的应对
    pub async fn step(&self, played: Position) -> Result<AgentDecision> {
        self.post(AgentRequest::step(&self.config.uid, played)).await
    }

    async fn post(&self, request: AgentRequest<'_>) -> Result<AgentDecision> {
        debug!("Agent request: command={} action={:?}", request.command, request.action);

        let resp = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Cannot reach agent service ({})", self.config.url))?;

        let status = resp.status();
        let body = resp.text().await.context("Failed to read agent response")?;
        if !status.is_success() {
            anyhow::bail!("Agent HTTP error {}: {}", status, body);
        }

        let decision = parse_response(&body, self.config.board_size)?;
        debug!("Agent decision: {:?}", decision);
        Ok(decision)
    }
}

/// 未启用 agent feature 时的占位实现
#[cfg(not(feature = "agent"))]
pub struct AgentClient {
    config: AgentConfig,
}

#[cfg(not(feature = "agent"))]
impl AgentClient {
    pub fn new(config: AgentConfig) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(AgentConfig::default())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub async fn reset(&self, _depth: i32) -> Result<AgentDecision> {
        anyhow::bail!("Agent support not enabled. Compile with --features agent")
    }

    pub async fn step(&self, _played: protocol::Position) -> Result<AgentDecision> {
        anyhow::bail!("Agent support not enabled. Compile with --features agent")
    }
}

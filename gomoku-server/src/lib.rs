//! 五子棋计算服务端
//!
//! 包含:
//! - 对局会话（本地搜索 / 远程智能体）
//! - 计算线程中继
//! - TCP 服务
//! - 配置加载

pub mod config;
pub mod relay;
pub mod server;
pub mod session;

pub use config::{default_config_path, ServerConfig, CONFIG_ENV};
pub use relay::Relay;
pub use server::GameServer;
pub use session::{AgentAdvisor, GameSession, MoveAdvisor};

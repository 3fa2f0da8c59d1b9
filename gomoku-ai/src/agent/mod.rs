//! 远程智能体
//!
//! 通过 HTTP 调用外部对弈服务，作为本地搜索之外的另一种落子来源。

mod client;
mod response;

pub use client::{AgentClient, AgentConfig};
pub use response::{parse_response, AgentDecision};

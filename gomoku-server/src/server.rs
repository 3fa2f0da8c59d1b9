//! 服务器主逻辑
//!
//! 依次服务每个连接，每个连接对应一局独立的会话。

use anyhow::{Context, Result};
use gomoku_ai::AgentClient;
use protocol::{ClientMessage, Connection, Listener, ProtocolError, TcpListener};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::relay::Relay;
use crate::session::{AgentAdvisor, GameSession};

/// 五子棋计算服务
pub struct GameServer {
    config: ServerConfig,
}

impl GameServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// 绑定配置中的地址并开始服务
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.network.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("Listening on {}", addr);

        self.run_on(listener).await
    }

    /// 在已有监听器上服务
    pub async fn run_on<L: Listener>(&self, mut listener: L) -> Result<()> {
        loop {
            let conn = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    continue;
                }
            };

            let peer = conn.peer_addr().unwrap_or_else(|| "unknown".to_string());
            info!("Client connected: {}", peer);
            match self.serve(conn).await {
                Ok(()) => info!("Client disconnected: {}", peer),
                Err(e) => warn!("Connection {} closed with error: {:#}", peer, e),
            }
        }
    }

    /// 服务单个连接，直到对端断开
    pub async fn serve<C: Connection>(&self, mut conn: C) -> Result<()> {
        let relay = Relay::spawn(self.new_session()?)?;

        let result = loop {
            let msg: ClientMessage = match conn.recv().await {
                Ok(msg) => msg,
                Err(ProtocolError::ConnectionClosed) => break Ok(()),
                Err(e) => break Err(e).context("Failed to read request"),
            };
            debug!("Request: {:?}", msg);

            let resp = match relay.call(msg).await {
                Ok(resp) => resp,
                Err(e) => break Err(e),
            };
            if let Err(e) = conn.send(&resp).await {
                break Err(e).context("Failed to send response");
            }
        };

        relay.shutdown().await?;
        result
    }

    fn new_session(&self) -> Result<GameSession> {
        let client = AgentClient::new(self.config.agent.clone())?;
        let advisor = AgentAdvisor::new(client, Handle::current());
        Ok(GameSession::new(self.config.ai.clone()).with_advisor(Box::new(advisor)))
    }
}

use anyhow::Result;
use gomoku_server::{GameServer, ServerConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("gomoku_server=debug".parse()?))
        .init();

    info!("五子棋服务端启动中...");

    let config = ServerConfig::load()?;
    GameServer::new(config).run().await
}

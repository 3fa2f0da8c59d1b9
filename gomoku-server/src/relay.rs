//! 计算线程中继
//!
//! 会话运行在独立线程上，网络侧通过通道逐条提交请求并等待应答。
//! 同一时刻只有一条请求在处理，搜索开始后不可取消。

use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use protocol::{ClientMessage, ServerMessage};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::session::GameSession;

/// 请求队列长度
const REQUEST_QUEUE: usize = 8;

struct Request {
    msg: ClientMessage,
    reply: oneshot::Sender<ServerMessage>,
}

/// 计算线程句柄
pub struct Relay {
    tx: mpsc::Sender<Request>,
    worker: Option<JoinHandle<()>>,
}

impl Relay {
    /// 启动计算线程，会话的所有权转移到该线程
    pub fn spawn(mut session: GameSession) -> Result<Self> {
        let (tx, mut rx) = mpsc::channel::<Request>(REQUEST_QUEUE);

        let worker = thread::Builder::new()
            .name("gomoku-compute".to_string())
            .spawn(move || {
                info!("Compute thread started");
                while let Some(Request { msg, reply }) = rx.blocking_recv() {
                    debug!("Compute request: {:?}", msg.command());
                    let resp = session.handle(msg);
                    // 请求方已放弃等待
                    let _ = reply.send(resp);
                }
                info!("Compute thread stopped");
            })
            .context("Failed to spawn compute thread")?;

        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    /// 提交请求并等待应答
    pub async fn call(&self, msg: ClientMessage) -> Result<ServerMessage> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { msg, reply })
            .await
            .map_err(|_| anyhow::anyhow!("Compute thread is gone"))?;

        rx.await.context("Compute thread dropped the request")
    }

    /// 关闭通道并等待计算线程退出
    pub async fn shutdown(mut self) -> Result<()> {
        let worker = self.worker.take();
        drop(self);

        if let Some(worker) = worker {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .context("Failed to join compute thread")?
                .map_err(|_| anyhow::anyhow!("Compute thread panicked"))?;
        }
        Ok(())
    }
}

//! 五子棋共享协议库
//!
//! 包含:
//! - 角色、坐标、落子记录等基础数据结构
//! - 消息类型定义 (ClientMessage, ServerMessage, GameSnapshot)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 帧编解码

mod constants;
mod error;
mod message;
mod piece;
mod record;
mod transport;

pub use constants::*;
pub use error::{GameError, ProtocolError, Result};
pub use message::{ClientMessage, Command, Difficulty, ErrorCode, GameSnapshot, ServerMessage};
pub use piece::{Position, Role};
pub use record::MoveRecord;
pub use transport::{
    duplex_pair, Connection, Connector, DuplexConnection, FrameHeader, FramedStream, Listener,
    NetworkConfig, TcpConnection, TcpConnector, TcpListener,
};

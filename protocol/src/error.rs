//! 错误类型定义

use thiserror::Error;

/// 对局规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// 坐标超出棋盘
    #[error("Invalid position: ({row}, {col})")]
    InvalidPosition { row: i32, col: i32 },

    /// 目标格已有棋子
    #[error("Position ({row}, {col}) is already occupied")]
    Occupied { row: usize, col: usize },

    /// 棋盘大小不受支持
    #[error("Unsupported board size: {size} (allowed: {min}..={max})")]
    InvalidBoardSize { size: usize, min: usize, max: usize },

    /// 没有可悔的棋
    #[error("Nothing to undo")]
    NothingToUndo,

    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,

    /// 尚未开始对局
    #[error("No game in progress")]
    NotStarted,

    /// 远程决策服务失败
    #[error("Remote agent failed: {reason}")]
    Agent { reason: String },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误（bincode）
    #[error("Bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;

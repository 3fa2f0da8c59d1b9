//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 默认棋盘大小（15 路）
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// 棋盘最小边长（小于五连长度无法分出胜负）
pub const MIN_BOARD_SIZE: usize = WIN_LENGTH;

/// 棋盘最大边长
pub const MAX_BOARD_SIZE: usize = 25;

/// 连成几子获胜
pub const WIN_LENGTH: usize = 5;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 9528;

/// 默认搜索深度（与前端一致）
pub const DEFAULT_DEPTH: u8 = 4;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

//! 消息类型定义
//!
//! 界面与计算线程之间严格一问一答：每个请求得到一个携带同名指令的响应

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DEPTH;
use crate::error::GameError;
use crate::piece::{Position, Role};
use crate::record::MoveRecord;

/// AI 难度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// 简单：depth=2
    Easy,
    /// 中等：depth=4
    #[default]
    Medium,
    /// 困难：depth=6
    Hard,
}

impl Difficulty {
    /// 对应的搜索深度
    pub fn depth(&self) -> u8 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => DEFAULT_DEPTH,
            Difficulty::Hard => 6,
        }
    }
}

/// 指令类型（用于响应回显）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Start,
    Move,
    Undo,
    End,
}

/// 客户端发往计算端的请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    /// 开始新对局
    ///
    /// `depth <= 0` 表示由远程决策服务代替本地搜索
    Start {
        board_size: usize,
        ai_first: bool,
        depth: i32,
    },
    /// 玩家落子，随后由 AI 应答一步
    Move { position: Position, depth: i32 },
    /// 悔棋（撤回玩家与 AI 各一步）
    Undo,
    /// 结束对局
    End,
}

impl ClientMessage {
    /// 获取指令类型
    pub fn command(&self) -> Command {
        match self {
            ClientMessage::Start { .. } => Command::Start,
            ClientMessage::Move { .. } => Command::Move,
            ClientMessage::Undo => Command::Undo,
            ClientMessage::End => Command::End,
        }
    }
}

/// 对局快照（每个指令处理完后返回给界面）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// 棋盘，按行存放：1 黑，-1 白，0 空
    pub board: Vec<Vec<i8>>,
    /// 胜者
    pub winner: Option<Role>,
    /// 当前走子方
    pub current_player: Role,
    /// 落子历史
    pub history: Vec<MoveRecord>,
    /// 棋盘大小
    pub size: usize,
    /// 最近一次搜索的评分
    pub score: i32,
    /// 最近一次搜索的主要变例
    pub best_path: Vec<Position>,
    /// 最近一次搜索实际到达的深度
    pub current_depth: u8,
}

impl GameSnapshot {
    /// 最近一步落子
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }
}

/// 计算端返回的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    /// 指令执行完成
    Snapshot {
        command: Command,
        snapshot: GameSnapshot,
    },
    /// 指令执行失败（状态未被修改）
    Error {
        command: Command,
        code: ErrorCode,
        message: String,
    },
}

impl ServerMessage {
    /// 获取回显的指令类型
    pub fn command(&self) -> Command {
        match self {
            ServerMessage::Snapshot { command, .. } | ServerMessage::Error { command, .. } => *command,
        }
    }

    /// 由错误构造响应
    pub fn from_error(command: Command, err: &GameError) -> Self {
        ServerMessage::Error {
            command,
            code: ErrorCode::from(err),
            message: err.to_string(),
        }
    }
}

/// 错误码定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // === 对局相关 (2xx) ===
    /// 无效落子
    InvalidMove = 201,
    /// 游戏未开始
    GameNotStarted = 202,
    /// 游戏已结束
    GameAlreadyOver = 203,
    /// 不允许悔棋
    UndoNotAllowed = 204,
    /// 参数无效
    InvalidArgument = 205,

    // === 系统相关 (5xx) ===
    /// 内部错误
    InternalError = 500,
    /// 远程服务不可用
    AgentUnavailable = 501,
}

impl From<&GameError> for ErrorCode {
    fn from(err: &GameError) -> Self {
        match err {
            GameError::InvalidPosition { .. } | GameError::Occupied { .. } => ErrorCode::InvalidMove,
            GameError::InvalidBoardSize { .. } => ErrorCode::InvalidArgument,
            GameError::NothingToUndo => ErrorCode::UndoNotAllowed,
            GameError::GameOver => ErrorCode::GameAlreadyOver,
            GameError::NotStarted => ErrorCode::GameNotStarted,
            GameError::Agent { .. } => ErrorCode::AgentUnavailable,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

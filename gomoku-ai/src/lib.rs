//! 五子棋 AI 引擎
//!
//! 包含:
//! - 棋盘状态（原地落子/悔棋、胜负判定）
//! - 增量棋型评估与候选点生成
//! - Negamax + Alpha-Beta 搜索
//! - Zobrist 哈希
//! - 置换缓存
//! - 远程智能体客户端

pub mod agent;
mod board;
mod evaluate;
mod moves;
mod search;
mod transposition;
mod zobrist;

pub use agent::{AgentClient, AgentConfig, AgentDecision};
pub use board::{BoardOptions, BoardState, ScopedMove};
pub use evaluate::{PatternEvaluator, Shape, DEFAULT_MAX_CANDIDATES, FIVE};
pub use moves::MoveGenerator;
pub use search::{AiConfig, AiEngine, Difficulty, SearchOutcome};
pub use transposition::{CacheStats, TranspositionCache, DEFAULT_CACHE_CAPACITY};
pub use zobrist::ZobristHasher;

//! 搜索引擎
//!
//! Negamax + Alpha-Beta 剪枝，深层只展开威胁走法

use std::time::Instant;

use protocol::{Position, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{BoardOptions, BoardState};
use crate::evaluate::{DEFAULT_MAX_CANDIDATES, FIVE};
use crate::moves::MoveGenerator;
use crate::transposition::DEFAULT_CACHE_CAPACITY;

// 重导出 Difficulty 以便外部使用
pub use protocol::Difficulty;

/// 搜索窗口边界，必须大于任何胜负分
const INFINITY: i32 = FIVE * 10;

/// AI 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub difficulty: Difficulty,
    pub max_depth: u8,
    /// 从该层（含）起只展开活三及以上的走法
    pub only_three_threshold: u8,
    /// 从该层（含）起只展开冲四及以上的走法
    pub only_four_threshold: u8,
    /// 每层候选点上限
    pub max_candidates: usize,
    /// 各缓存的条目上限
    pub cache_capacity: usize,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            max_depth: difficulty.depth(),
            only_three_threshold: 4,
            only_four_threshold: 6,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    /// 指定搜索深度，其余沿用当前配置
    pub fn with_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 创建棋盘时使用的参数
    pub fn board_options(&self) -> BoardOptions {
        BoardOptions {
            cache_capacity: self.cache_capacity,
            max_candidates: self.max_candidates,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::default())
    }
}

/// 搜索结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// 站在搜索方视角的分数
    pub score: i32,
    pub best_move: Option<Position>,
    /// 主变例，第一步即 best_move
    pub best_path: Vec<Position>,
    /// 主变例到达的层数
    pub depth_reached: u8,
}

/// 子树搜索结果
struct Line {
    score: i32,
    path: Vec<Position>,
    depth: u8,
}

impl Line {
    fn leaf(score: i32, ply: u8) -> Self {
        Self {
            score,
            path: Vec::new(),
            depth: ply,
        }
    }
}

/// AI 引擎
pub struct AiEngine {
    config: AiConfig,
    move_gen: MoveGenerator,
    nodes_searched: u64,
}

impl AiEngine {
    /// 创建新的 AI 引擎
    pub fn new(config: AiConfig) -> Self {
        let move_gen = MoveGenerator::new(config.cache_capacity);
        Self {
            config,
            move_gen,
            nodes_searched: 0,
        }
    }

    /// 从难度创建
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self::new(AiConfig::from_difficulty(difficulty))
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 清空候选走法缓存，换新棋盘时调用
    pub fn reset(&mut self) {
        self.move_gen.clear();
        self.nodes_searched = 0;
    }

    /// 为 role 搜索最佳走法
    ///
    /// 返回时棋盘恢复到调用前的状态。同分走法取最先搜索到的，结果完全确定。
    pub fn search(&mut self, board: &mut BoardState, role: Role, max_depth: u8) -> SearchOutcome {
        self.nodes_searched = 0;
        let started = Instant::now();

        let line = self.negamax(board, role, max_depth, 0, -INFINITY, INFINITY);

        let stats = self.move_gen.stats();
        debug!(
            "Search finished: role={:?} depth={} score={} nodes={} elapsed={:?} move_cache_hit={:.1}%",
            role,
            max_depth,
            line.score,
            self.nodes_searched,
            started.elapsed(),
            stats.hit_rate() * 100.0
        );

        SearchOutcome {
            score: line.score,
            best_move: line.path.first().copied(),
            best_path: line.path,
            depth_reached: line.depth,
        }
    }

    /// 上次搜索访问的节点数
    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    fn negamax(
        &mut self,
        board: &mut BoardState,
        role: Role,
        depth: u8,
        ply: u8,
        mut alpha: i32,
        beta: i32,
    ) -> Line {
        self.nodes_searched += 1;

        if depth == 0 || board.is_terminal() {
            return Line::leaf(mate_distance(board.evaluate(role), ply), ply);
        }

        let only_three = ply >= self.config.only_three_threshold;
        let only_four = ply >= self.config.only_four_threshold;
        let moves = self
            .move_gen
            .valuable_moves(board, role, ply, only_three, only_four);

        // 威胁模式下无可走：视为静态局面
        if moves.is_empty() {
            debug_assert!(
                only_three || only_four,
                "non-terminal position produced no candidates"
            );
            return Line::leaf(mate_distance(board.evaluate(role), ply), ply);
        }

        let mut best: Option<Line> = None;
        for mv in moves {
            let Some(mut scoped) = board.scoped_place(mv, role) else {
                continue;
            };
            let child = self.negamax(&mut scoped, -role, depth - 1, ply + 1, -beta, -alpha);
            drop(scoped);

            let score = -child.score;
            if best.as_ref().map_or(true, |b| score > b.score) {
                let mut path = Vec::with_capacity(child.path.len() + 1);
                path.push(mv);
                path.extend(child.path);
                best = Some(Line {
                    score,
                    path,
                    depth: child.depth,
                });
            }

            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        match best {
            Some(line) => line,
            None => Line::leaf(mate_distance(board.evaluate(role), ply), ply),
        }
    }
}

impl Default for AiEngine {
    fn default() -> Self {
        Self::new(AiConfig::default())
    }
}

/// 胜负分按层数衰减：越早取胜越好，越晚落败越好
fn mate_distance(score: i32, ply: u8) -> i32 {
    let ply = ply as i32;
    if score >= FIVE {
        score - ply
    } else if score <= -FIVE {
        score + ply
    } else {
        score
    }
}

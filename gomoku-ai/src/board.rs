//! 棋盘状态
//!
//! 落子与悔棋都是原地修改：同时维护 Zobrist 哈希并通知评估器。
//! 胜负、终局、评分结果按局面哈希缓存。

use std::ops::{Deref, DerefMut};

use protocol::{MoveRecord, Position, Role, DEFAULT_BOARD_SIZE, WIN_LENGTH};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::evaluate::{PatternEvaluator, DEFAULT_MAX_CANDIDATES, FIVE};
use crate::transposition::{CacheStats, TranspositionCache, DEFAULT_CACHE_CAPACITY};
use crate::zobrist::ZobristHasher;

/// 胜负扫描方向（行增量, 列增量），只向正方向延伸
const WIN_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// 棋盘可调参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardOptions {
    /// 每个缓存的条目上限
    pub cache_capacity: usize,
    /// 评估器返回的候选点上限
    pub max_candidates: usize,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// 棋盘状态
pub struct BoardState {
    size: usize,
    first_role: Role,
    options: BoardOptions,
    grid: Vec<Option<Role>>,
    /// 当前走子方
    role: Role,
    history: Vec<MoveRecord>,
    zobrist: ZobristHasher,
    evaluator: PatternEvaluator,
    winner_cache: TranspositionCache<u64, Option<Role>>,
    terminal_cache: TranspositionCache<u64, bool>,
    evaluate_cache: TranspositionCache<(u64, Role), i32>,
}

impl BoardState {
    /// 创建空棋盘
    pub fn new(size: usize, first_role: Role) -> Self {
        Self::with_options(size, first_role, BoardOptions::default())
    }

    pub fn with_options(size: usize, first_role: Role, options: BoardOptions) -> Self {
        Self {
            size,
            first_role,
            options,
            grid: vec![None; size * size],
            role: first_role,
            history: Vec::new(),
            zobrist: ZobristHasher::new(size),
            evaluator: PatternEvaluator::with_max_candidates(size, options.max_candidates),
            winner_cache: TranspositionCache::new(options.cache_capacity),
            terminal_cache: TranspositionCache::new(options.cache_capacity),
            evaluate_cache: TranspositionCache::new(options.cache_capacity),
        }
    }

    /// 以当前走子方落子
    pub fn place(&mut self, row: i32, col: i32) -> bool {
        self.place_as(row, col, self.role)
    }

    /// 以指定角色落子
    ///
    /// 坐标越界或目标格已有棋子时返回 false，棋盘不做任何修改
    pub fn place_as(&mut self, row: i32, col: i32, role: Role) -> bool {
        let Some(pos) = Position::new(row, col, self.size) else {
            debug!("Invalid move: ({}, {}) is outside the board", row, col);
            return false;
        };
        let idx = pos.to_index(self.size);
        if self.grid[idx].is_some() {
            debug!("Invalid move: {} is not empty", pos);
            return false;
        }

        self.grid[idx] = Some(role);
        self.history.push(MoveRecord::new(pos, role));
        self.zobrist.toggle(pos, role);
        self.evaluator.notify_placed(pos, role);
        self.role = self.role.opponent();
        true
    }

    /// 撤销最近一步
    pub fn undo(&mut self) -> bool {
        let Some(last) = self.history.pop() else {
            debug!("No moves to undo");
            return false;
        };

        let pos = last.position();
        self.grid[pos.to_index(self.size)] = None;
        // 恢复为该步的落子方，而不是简单翻转
        self.role = last.role;
        self.zobrist.toggle(pos, last.role);
        self.evaluator.notify_removed(pos);
        true
    }

    /// 落子并返回守卫，守卫离开作用域时自动悔棋
    pub fn scoped_place(&mut self, pos: Position, role: Role) -> Option<ScopedMove<'_>> {
        if self.place_as(pos.row as i32, pos.col as i32, role) {
            Some(ScopedMove {
                board: self,
                pos,
                role,
            })
        } else {
            None
        }
    }

    /// 是否终局（有人获胜或棋盘已满）
    pub fn is_terminal(&mut self) -> bool {
        let hash = self.hash();
        if let Some(&terminal) = self.terminal_cache.get(&hash) {
            return terminal;
        }

        let terminal = self.winner().is_some() || self.history.len() == self.grid.len();
        self.terminal_cache.put(hash, terminal);
        terminal
    }

    /// 胜者
    ///
    /// 按行优先扫描每个棋子，四个方向只向正方向数连子，首个达到五连的棋子颜色即胜者
    pub fn winner(&mut self) -> Option<Role> {
        let hash = self.hash();
        if let Some(&winner) = self.winner_cache.get(&hash) {
            return winner;
        }

        let winner = self.scan_winner();
        self.winner_cache.put(hash, winner);
        winner
    }

    fn scan_winner(&self) -> Option<Role> {
        for idx in 0..self.grid.len() {
            let Some(role) = self.grid[idx] else {
                continue;
            };
            let start = Position::new_unchecked(idx / self.size, idx % self.size);

            for &(dr, dc) in &WIN_DIRECTIONS {
                let mut count = 0;
                let mut cur = Some(start);
                while let Some(p) = cur {
                    if self.grid[p.to_index(self.size)] != Some(role) {
                        break;
                    }
                    count += 1;
                    cur = p.offset(dr, dc, self.size);
                }
                if count >= WIN_LENGTH {
                    return Some(role);
                }
            }
        }
        None
    }

    /// 所有空位（行优先）
    pub fn valid_moves(&self) -> Vec<Position> {
        (0..self.grid.len())
            .filter(|&idx| self.grid[idx].is_none())
            .map(|idx| Position::new_unchecked(idx / self.size, idx % self.size))
            .collect()
    }

    /// 对 role 的局面评分
    ///
    /// 已分胜负时返回 `FIVE * winner * role` 哨兵值，压过所有棋型分
    pub fn evaluate(&mut self, role: Role) -> i32 {
        let key = (self.hash(), role);
        if let Some(&score) = self.evaluate_cache.get(&key) {
            return score;
        }

        let score = match self.winner() {
            Some(winner) => FIVE * winner.sign() * role.sign(),
            None => self.evaluator.score(role),
        };
        self.evaluate_cache.put(key, score);
        score
    }

    /// 以对方视角重建棋盘：先手反转，历史中所有角色取反后重放
    pub fn mirror_for_opponent(&self) -> BoardState {
        let mut mirrored = BoardState::with_options(self.size, -self.first_role, self.options);
        for record in &self.history {
            mirrored.place_as(record.row as i32, record.col as i32, -record.role);
        }
        mirrored
    }

    /// 当前局面的指纹（棋子 + 走子方）
    #[inline]
    pub fn hash(&self) -> u64 {
        self.zobrist.current_hash() ^ self.zobrist.side_key(self.role)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 当前走子方
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn first_role(&self) -> Role {
        self.first_role
    }

    pub fn options(&self) -> BoardOptions {
        self.options
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// 最近一步
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }

    /// 指定格子上的棋子
    pub fn cell(&self, pos: Position) -> Option<Role> {
        self.grid.get(pos.to_index(self.size)).copied().flatten()
    }

    /// 天元
    pub fn center(&self) -> Position {
        Position::new_unchecked(self.size / 2, self.size / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn evaluator(&self) -> &PatternEvaluator {
        &self.evaluator
    }

    /// 一维下标转坐标
    pub fn position_to_coordinate(&self, position: usize) -> Option<Position> {
        Position::from_index(position, self.size)
    }

    /// 坐标转一维下标
    pub fn coordinate_to_position(&self, pos: Position) -> usize {
        pos.to_index(self.size)
    }

    /// 按行导出棋盘：1 黑，-1 白，0 空
    pub fn to_rows(&self) -> Vec<Vec<i8>> {
        self.grid
            .chunks(self.size)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map_or(0, |r| r.sign() as i8))
                    .collect()
            })
            .collect()
    }

    /// 文本棋盘，extra 中的点显示为 `?`
    pub fn display(&self, extra: &[Position]) -> String {
        let mut out = String::with_capacity(self.grid.len() * 2 + self.size);
        for row in 0..self.size {
            for col in 0..self.size {
                let pos = Position::new_unchecked(row, col);
                let ch = if extra.contains(&pos) {
                    '?'
                } else {
                    self.cell(pos).map_or('-', |r| r.display_char())
                };
                out.push(ch);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }

    /// 三个局面缓存的统计（胜负、终局、评分）
    pub fn cache_stats(&self) -> [CacheStats; 3] {
        [
            self.winner_cache.stats(),
            self.terminal_cache.stats(),
            self.evaluate_cache.stats(),
        ]
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE, Role::Black)
    }
}

impl std::fmt::Debug for BoardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardState")
            .field("size", &self.size)
            .field("role", &self.role)
            .field("moves", &self.history.len())
            .field("hash", &format_args!("{:#018x}", self.hash()))
            .finish()
    }
}

/// 临时落子守卫
///
/// 离开作用域（包括提前返回）时撤销这一步，保证递归搜索不会把棋盘留在中间状态
pub struct ScopedMove<'a> {
    board: &'a mut BoardState,
    pos: Position,
    role: Role,
}

impl ScopedMove<'_> {
    /// 守卫落下的位置
    pub fn position(&self) -> Position {
        self.pos
    }
}

impl Deref for ScopedMove<'_> {
    type Target = BoardState;

    fn deref(&self) -> &BoardState {
        self.board
    }
}

impl DerefMut for ScopedMove<'_> {
    fn deref_mut(&mut self) -> &mut BoardState {
        self.board
    }
}

impl Drop for ScopedMove<'_> {
    fn drop(&mut self) {
        // 守卫期间额外落的子必须先撤回
        if !std::thread::panicking() {
            debug_assert_eq!(
                self.board.last_move().copied(),
                Some(MoveRecord::new(self.pos, self.role)),
                "scoped move is no longer the last move"
            );
        }
        self.board.undo();
    }
}

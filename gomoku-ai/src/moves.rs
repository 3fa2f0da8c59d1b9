//! 候选走法生成
//!
//! 在评估器给出的候选点基础上补充天元和兜底空位，并按局面缓存结果。

use protocol::{Position, Role};

use crate::board::BoardState;
use crate::transposition::{CacheStats, TranspositionCache};

/// 缓存键：(局面哈希, 角色, 层数, 只看三, 只看四)
type MoveKey = (u64, Role, u8, bool, bool);

/// 候选走法生成器
pub struct MoveGenerator {
    cache: TranspositionCache<MoveKey, Vec<Position>>,
}

impl MoveGenerator {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: TranspositionCache::new(cache_capacity),
        }
    }

    /// 返回值得搜索的走法
    ///
    /// 非威胁模式下，天元为空时总会被加入；若仍为空且局面未满，退回全部空位。
    /// 威胁模式下可能返回空列表，由调用方按静态局面处理。
    pub fn valuable_moves(
        &mut self,
        board: &BoardState,
        role: Role,
        depth: u8,
        only_three: bool,
        only_four: bool,
    ) -> Vec<Position> {
        let key = (board.hash(), role, depth, only_three, only_four);
        if let Some(moves) = self.cache.get(&key) {
            return moves.clone();
        }

        let mut moves = board
            .evaluator()
            .candidate_moves(role, depth, only_three, only_four);

        if !only_three && !only_four {
            let center = board.center();
            if board.cell(center).is_none() && !moves.contains(&center) {
                moves.push(center);
            }
            if moves.is_empty() {
                moves = board.valid_moves();
            }
        }

        self.cache.put(key, moves.clone());
        moves
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transposition::DEFAULT_CACHE_CAPACITY;

    fn pos(row: usize, col: usize) -> Position {
        Position::new_unchecked(row, col)
    }

    #[test]
    fn test_empty_board_offers_center() {
        let mut gen = MoveGenerator::new(DEFAULT_CACHE_CAPACITY);
        let board = BoardState::default();
        assert_eq!(
            gen.valuable_moves(&board, Role::Black, 0, false, false),
            vec![pos(7, 7)]
        );
    }

    #[test]
    fn test_center_appended_once() {
        let mut gen = MoveGenerator::new(DEFAULT_CACHE_CAPACITY);
        let mut board = BoardState::default();
        assert!(board.place(6, 6));

        let moves = gen.valuable_moves(&board, Role::White, 0, false, false);
        assert_eq!(moves.iter().filter(|&&m| m == pos(7, 7)).count(), 1);
        assert!(moves.iter().all(|&m| board.cell(m).is_none()));
    }

    #[test]
    fn test_threat_mode_may_be_empty() {
        let mut gen = MoveGenerator::new(DEFAULT_CACHE_CAPACITY);
        let mut board = BoardState::default();
        assert!(board.place(7, 7));
        assert!(board.place(9, 9));

        assert!(gen.valuable_moves(&board, Role::Black, 4, false, true).is_empty());
        assert!(gen.valuable_moves(&board, Role::Black, 4, true, false).is_empty());
    }

    #[test]
    fn test_winning_move_is_exclusive() {
        let mut gen = MoveGenerator::new(DEFAULT_CACHE_CAPACITY);
        let mut board = BoardState::default();
        for c in 3..7 {
            assert!(board.place_as(7, c, Role::Black));
        }
        assert!(board.place_as(7, 2, Role::White));

        let moves = gen.valuable_moves(&board, Role::Black, 0, false, false);
        // 天元 (7,7) 本身就是唯一的成五点
        assert_eq!(moves, vec![pos(7, 7)]);
    }

    #[test]
    fn test_results_are_cached() {
        let mut gen = MoveGenerator::new(DEFAULT_CACHE_CAPACITY);
        let mut board = BoardState::default();
        assert!(board.place(7, 7));

        let first = gen.valuable_moves(&board, Role::White, 1, false, false);
        let second = gen.valuable_moves(&board, Role::White, 1, false, false);
        assert_eq!(first, second);

        let stats = gen.stats();
        assert_eq!(stats.probes, 2);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_full_board_yields_nothing() {
        let mut gen = MoveGenerator::new(16);
        let mut board = BoardState::new(5, Role::Black);
        let pattern = [
            [1, 1, -1, -1, 1],
            [-1, -1, 1, 1, -1],
            [1, 1, -1, -1, 1],
            [-1, -1, 1, 1, -1],
            [1, 1, -1, -1, 1],
        ];
        for (r, row) in pattern.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                assert!(board.place_as(r as i32, c as i32, Role::from_sign(v).unwrap()));
            }
        }
        assert!(gen.valuable_moves(&board, Role::Black, 0, false, false).is_empty());
    }
}

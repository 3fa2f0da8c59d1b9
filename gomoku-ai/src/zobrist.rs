//! Zobrist 哈希
//!
//! 为每个 (格子, 角色) 预先生成随机键，落子与悔棋各异或一次即可增量维护

use protocol::{Position, Role};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Zobrist 哈希器
///
/// 只持有一个累加值，不区分落子还是悔棋：同样的参数调用两次 `toggle` 等于没调用
#[derive(Debug, Clone)]
pub struct ZobristHasher {
    size: usize,
    /// 棋子键 [role][cell]
    keys: [Vec<u64>; 2],
    /// 白方走子时额外异或的键
    side_key: u64,
    hash: u64,
}

impl ZobristHasher {
    /// 创建指定棋盘大小的哈希器（固定种子保证确定性）
    pub fn new(size: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED_F1FE_600D_CAFE);

        let cells = size * size;
        let black: Vec<u64> = (0..cells).map(|_| rng.gen()).collect();
        let white: Vec<u64> = (0..cells).map(|_| rng.gen()).collect();

        Self {
            size,
            keys: [black, white],
            side_key: rng.gen(),
            hash: 0,
        }
    }

    /// 翻转 (pos, role) 对应的键
    #[inline]
    pub fn toggle(&mut self, pos: Position, role: Role) {
        self.hash ^= self.piece_key(pos, role);
    }

    /// 当前累加值（只含棋子）
    #[inline]
    pub fn current_hash(&self) -> u64 {
        self.hash
    }

    /// 获取棋子的键
    #[inline]
    pub fn piece_key(&self, pos: Position, role: Role) -> u64 {
        self.keys[role.index()][pos.to_index(self.size)]
    }

    /// 走子方的键（黑方为 0）
    #[inline]
    pub fn side_key(&self, role: Role) -> u64 {
        match role {
            Role::Black => 0,
            Role::White => self.side_key,
        }
    }
}

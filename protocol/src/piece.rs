//! 角色与坐标定义

use serde::{Deserialize, Serialize};

/// 对弈双方
///
/// 数值约定沿用棋盘编码：黑 = 1，白 = -1，空 = 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// 黑方（默认先手）
    #[default]
    Black,
    /// 白方
    White,
}

impl Role {
    /// 获取对方
    pub fn opponent(&self) -> Role {
        match self {
            Role::Black => Role::White,
            Role::White => Role::Black,
        }
    }

    /// 符号值：黑 1，白 -1
    #[inline]
    pub fn sign(&self) -> i32 {
        match self {
            Role::Black => 1,
            Role::White => -1,
        }
    }

    /// 从符号值解析，0 表示空
    pub fn from_sign(value: i32) -> Option<Role> {
        match value {
            1 => Some(Role::Black),
            -1 => Some(Role::White),
            _ => None,
        }
    }

    /// 数组下标（黑 0，白 1）
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Role::Black => 0,
            Role::White => 1,
        }
    }

    /// 棋盘显示字符
    pub fn display_char(&self) -> char {
        match self {
            Role::Black => 'O',
            Role::White => 'X',
        }
    }
}

impl std::ops::Neg for Role {
    type Output = Role;

    fn neg(self) -> Role {
        self.opponent()
    }
}

/// 棋盘坐标（行、列均从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 行
    pub row: usize,
    /// 列
    pub col: usize,
}

impl Position {
    /// 创建新位置（检查是否在 size×size 棋盘内）
    pub fn new(row: i32, col: i32, size: usize) -> Option<Self> {
        if row >= 0 && col >= 0 && (row as usize) < size && (col as usize) < size {
            Some(Self {
                row: row as usize,
                col: col as usize,
            })
        } else {
            None
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub const fn new_unchecked(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// 获取偏移后的位置
    pub fn offset(&self, dr: i32, dc: i32, size: usize) -> Option<Position> {
        Self::new(self.row as i32 + dr, self.col as i32 + dc, size)
    }

    /// 转换为一维下标
    #[inline]
    pub fn to_index(&self, size: usize) -> usize {
        self.row * size + self.col
    }

    /// 从一维下标转换
    pub fn from_index(index: usize, size: usize) -> Option<Self> {
        if index < size * size {
            Some(Self {
                row: index / size,
                col: index % size,
            })
        } else {
            None
        }
    }

    /// 两点之间的棋盘距离（切比雪夫距离）
    pub fn distance(&self, other: &Position) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

//! 落子记录

use serde::{Deserialize, Serialize};

use crate::piece::{Position, Role};

/// 一步落子
///
/// 序列化字段名沿用前端棋谱格式 `{ i, j, role }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 行
    #[serde(rename = "i")]
    pub row: usize,
    /// 列
    #[serde(rename = "j")]
    pub col: usize,
    /// 落子方（记录时确定，之后不再重算）
    pub role: Role,
}

impl MoveRecord {
    /// 创建新的落子记录
    pub fn new(pos: Position, role: Role) -> Self {
        Self {
            row: pos.row,
            col: pos.col,
            role,
        }
    }

    /// 获取落子位置
    pub fn position(&self) -> Position {
        Position::new_unchecked(self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_field_names() {
        let record = MoveRecord::new(Position::new_unchecked(7, 8), Role::White);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"i":7,"j":8,"role":"White"}"#);

        let parsed: MoveRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.position(), Position::new_unchecked(7, 8));
    }
}

//! 智能体响应解析

use anyhow::{anyhow, bail, Context, Result};
use protocol::Position;
use serde::Deserialize;

/// 智能体给出的决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDecision {
    /// 智能体落子；`None` 表示它没有走（对局已在服务端结束）
    pub action: Option<Position>,
    /// 服务端判定对局结束
    pub done: bool,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "statusCode")]
    status_code: u16,
    #[serde(default)]
    status: String,
    result: Option<Outcome>,
}

#[derive(Deserialize)]
struct Outcome {
    action: Action,
    #[serde(default)]
    done: bool,
}

/// reset 返回一维下标，step 返回坐标对象
#[derive(Deserialize)]
#[serde(untagged)]
enum Action {
    Coord { i: i32, j: i32 },
    Flat(i64),
}

/// 解析智能体的 JSON 响应
///
/// `statusCode` 非 200 时返回错误并带上服务端的 `status` 文本
pub fn parse_response(body: &str, board_size: usize) -> Result<AgentDecision> {
    let envelope: Envelope =
        serde_json::from_str(body).context("Malformed agent response")?;

    if envelope.status_code != 200 {
        bail!(
            "Agent returned status {}: {}",
            envelope.status_code,
            envelope.status
        );
    }

    let outcome = envelope
        .result
        .ok_or_else(|| anyhow!("Agent response has no result"))?;

    let (i, j) = match outcome.action {
        Action::Coord { i, j } => (i, j),
        Action::Flat(index) if index < 0 => (-1, -1),
        Action::Flat(index) => {
            let size = board_size as i64;
            ((index / size) as i32, (index % size) as i32)
        }
    };

    let action = if i < 0 || j < 0 {
        None
    } else {
        Some(
            Position::new(i, j, board_size)
                .ok_or_else(|| anyhow!("Agent move ({}, {}) is outside the board", i, j))?,
        )
    };

    Ok(AgentDecision {
        action,
        done: outcome.done,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_response() {
        let body = r#"{"statusCode":200,"status":"Execution action",
            "result":{"board":null,"action":{"i":7,"j":8},"done":false}}"#;
        let decision = parse_response(body, 15).unwrap();
        assert_eq!(decision.action, Some(Position::new_unchecked(7, 8)));
        assert!(!decision.done);
    }

    #[test]
    fn test_reset_response_flat_index() {
        let body = r#"{"statusCode":200,"status":"Execution action",
            "result":{"board":[],"action":112,"done":false,"info":null}}"#;
        let decision = parse_response(body, 15).unwrap();
        assert_eq!(decision.action, Some(Position::new_unchecked(7, 7)));
    }

    #[test]
    fn test_no_move_when_done() {
        let body = r#"{"statusCode":200,"status":"Execution action",
            "result":{"action":{"i":-1,"j":-1},"done":true}}"#;
        let decision = parse_response(body, 15).unwrap();
        assert_eq!(decision.action, None);
        assert!(decision.done);
    }

    #[test]
    fn test_error_status() {
        let body = r#"{"statusCode":501,"status":"No enough env resource, please wait a moment"}"#;
        let err = parse_response(body, 15).unwrap_err();
        assert!(err.to_string().contains("No enough env resource"));
    }

    #[test]
    fn test_out_of_board_move() {
        let body = r#"{"statusCode":200,"status":"ok","result":{"action":{"i":20,"j":0}}}"#;
        assert!(parse_response(body, 15).is_err());
    }

    #[test]
    fn test_malformed_body() {
        assert!(parse_response("not json", 15).is_err());
    }
}

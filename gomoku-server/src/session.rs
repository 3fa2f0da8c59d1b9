//! 对局会话
//!
//! 每局一个会话对象，独占棋盘、搜索引擎和缓存。
//! 正深度走本地搜索，非正深度交给远程决策服务。

use anyhow::Result;
use gomoku_ai::{AgentClient, AiConfig, AiEngine, BoardState};
use protocol::{
    ClientMessage, GameError, GameSnapshot, Position, Role, ServerMessage,
    MAX_BOARD_SIZE, MIN_BOARD_SIZE,
};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// 外部落子来源
///
/// 调用是阻塞的；会话在结果返回前不会修改棋盘
pub trait MoveAdvisor: Send {
    /// 开始新对局，返回对方的首步（如有）
    fn reset(&mut self, depth: i32) -> Result<Option<Position>>;

    /// 告知玩家的落子，返回对方的应对（如有）
    fn step(&mut self, played: Position) -> Result<Option<Position>>;
}

/// 基于 HTTP 智能体的落子来源
pub struct AgentAdvisor {
    client: AgentClient,
    runtime: Handle,
}

impl AgentAdvisor {
    /// `runtime` 必须来自计算线程之外的运行时
    pub fn new(client: AgentClient, runtime: Handle) -> Self {
        Self { client, runtime }
    }
}

impl MoveAdvisor for AgentAdvisor {
    fn reset(&mut self, depth: i32) -> Result<Option<Position>> {
        let decision = self.runtime.block_on(self.client.reset(depth))?;
        Ok(decision.action)
    }

    fn step(&mut self, played: Position) -> Result<Option<Position>> {
        let decision = self.runtime.block_on(self.client.step(played))?;
        Ok(decision.action)
    }
}

/// 最近一次搜索的摘要
#[derive(Debug, Clone, Default)]
struct SearchSummary {
    score: i32,
    best_path: Vec<Position>,
    depth: u8,
}

type GameResult<T> = std::result::Result<T, GameError>;

/// 对局会话
pub struct GameSession {
    config: AiConfig,
    engine: AiEngine,
    board: Option<BoardState>,
    /// 玩家执子颜色，由 `ai_first` 决定
    player: Role,
    advisor: Option<Box<dyn MoveAdvisor>>,
    last_search: SearchSummary,
}

impl GameSession {
    pub fn new(config: AiConfig) -> Self {
        Self {
            engine: AiEngine::new(config.clone()),
            config,
            board: None,
            player: Role::Black,
            advisor: None,
            last_search: SearchSummary::default(),
        }
    }

    /// 设置远程落子来源
    pub fn with_advisor(mut self, advisor: Box<dyn MoveAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// 处理一条请求，总是返回一条响应
    pub fn handle(&mut self, msg: ClientMessage) -> ServerMessage {
        let command = msg.command();
        let result = match msg {
            ClientMessage::Start {
                board_size,
                ai_first,
                depth,
            } => self.start(board_size, ai_first, depth),
            ClientMessage::Move { position, depth } => self.play(position, depth),
            ClientMessage::Undo => self.undo(),
            ClientMessage::End => self.end(),
        };

        match result {
            Ok(snapshot) => ServerMessage::Snapshot { command, snapshot },
            Err(e) => {
                warn!("{:?} rejected: {}", command, e);
                ServerMessage::from_error(command, &e)
            }
        }
    }

    /// 开始新对局
    ///
    /// 黑方先行；`ai_first` 时 AI 执黑并立即落子。失败时保留原有对局。
    pub fn start(&mut self, board_size: usize, ai_first: bool, depth: i32) -> GameResult<GameSnapshot> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&board_size) {
            return Err(GameError::InvalidBoardSize {
                size: board_size,
                min: MIN_BOARD_SIZE,
                max: MAX_BOARD_SIZE,
            });
        }

        info!("Starting game: size={} ai_first={} depth={}", board_size, ai_first, depth);
        let mut board = BoardState::with_options(board_size, Role::Black, self.config.board_options());
        self.engine.reset();
        let mut summary = SearchSummary::default();

        if ai_first {
            let reply = if depth > 0 {
                let role = board.role();
                let outcome = self.engine.search(&mut board, role, search_depth(depth));
                summary = SearchSummary {
                    score: outcome.score,
                    best_path: outcome.best_path,
                    depth: outcome.depth_reached,
                };
                outcome.best_move
            } else {
                self.advisor_mut()?.reset(depth).map_err(agent_error)?
            };

            if let Some(pos) = reply {
                if !board.place(pos.row as i32, pos.col as i32) {
                    return Err(GameError::Agent {
                        reason: format!("opening move {} is not playable", pos),
                    });
                }
            }
        }

        self.board = Some(board);
        self.player = if ai_first { Role::White } else { Role::Black };
        self.last_search = summary;
        self.snapshot()
    }

    /// 玩家落子，随后 AI 应答
    pub fn play(&mut self, position: Position, depth: i32) -> GameResult<GameSnapshot> {
        let board = self.board.as_mut().ok_or(GameError::NotStarted)?;
        if board.is_terminal() {
            return Err(GameError::GameOver);
        }
        let size = board.size();
        if position.row >= size || position.col >= size {
            return Err(GameError::InvalidPosition {
                row: position.row as i32,
                col: position.col as i32,
            });
        }
        if board.cell(position).is_some() {
            return Err(GameError::Occupied {
                row: position.row,
                col: position.col,
            });
        }

        if depth > 0 {
            self.play_local(position, search_depth(depth))
        } else {
            self.play_remote(position)
        }
    }

    fn play_local(&mut self, position: Position, depth: u8) -> GameResult<GameSnapshot> {
        let board = self.board.as_mut().ok_or(GameError::NotStarted)?;
        board.place(position.row as i32, position.col as i32);

        if !board.is_terminal() {
            let role = board.role();
            let outcome = self.engine.search(board, role, depth);
            if let Some(reply) = outcome.best_move {
                board.place(reply.row as i32, reply.col as i32);
            }
            self.last_search = SearchSummary {
                score: outcome.score,
                best_path: outcome.best_path,
                depth: outcome.depth_reached,
            };
        }

        self.snapshot()
    }

    fn play_remote(&mut self, position: Position) -> GameResult<GameSnapshot> {
        // 先拿到远程结果再动棋盘
        let reply = self.advisor_mut()?.step(position).map_err(agent_error)?;

        let board = self.board.as_mut().ok_or(GameError::NotStarted)?;
        board.place(position.row as i32, position.col as i32);

        if let Some(reply) = reply {
            if !board.is_terminal() && !board.place(reply.row as i32, reply.col as i32) {
                board.undo();
                return Err(GameError::Agent {
                    reason: format!("reply {} is not playable", reply),
                });
            }
        }

        self.snapshot()
    }

    /// 悔棋：撤回到玩家最近一步之前，之后仍由玩家落子
    ///
    /// AI 已应答时撤两步，玩家一步制胜时只撤一步；
    /// 只剩 AI 开局首子时没有可悔的棋。
    pub fn undo(&mut self) -> GameResult<GameSnapshot> {
        let player = self.player;
        let board = self.board.as_mut().ok_or(GameError::NotStarted)?;

        let count = board
            .history()
            .iter()
            .rev()
            .position(|record| record.role == player)
            .map(|ai_moves| ai_moves + 1)
            .ok_or(GameError::NothingToUndo)?;

        for _ in 0..count {
            board.undo();
        }
        debug_assert_eq!(board.role(), player);
        self.snapshot()
    }

    /// 玩家执子颜色
    pub fn player(&self) -> Role {
        self.player
    }

    /// 结束对局，返回终局快照
    pub fn end(&mut self) -> GameResult<GameSnapshot> {
        let snapshot = self.snapshot()?;
        info!("Game ended after {} moves", snapshot.history.len());
        self.board = None;
        self.last_search = SearchSummary::default();
        Ok(snapshot)
    }

    /// 当前对局快照
    pub fn snapshot(&mut self) -> GameResult<GameSnapshot> {
        let board = self.board.as_mut().ok_or(GameError::NotStarted)?;
        Ok(GameSnapshot {
            board: board.to_rows(),
            winner: board.winner(),
            current_player: board.role(),
            history: board.history().to_vec(),
            size: board.size(),
            score: self.last_search.score,
            best_path: self.last_search.best_path.clone(),
            current_depth: self.last_search.depth,
        })
    }

    pub fn is_active(&self) -> bool {
        self.board.is_some()
    }

    fn advisor_mut(&mut self) -> GameResult<&mut Box<dyn MoveAdvisor>> {
        self.advisor.as_mut().ok_or_else(|| GameError::Agent {
            reason: "no remote agent configured".to_string(),
        })
    }
}

fn search_depth(depth: i32) -> u8 {
    depth.clamp(1, u8::MAX as i32) as u8
}

fn agent_error(e: anyhow::Error) -> GameError {
    warn!("Remote agent failed: {:#}", e);
    GameError::Agent {
        reason: format!("{:#}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{Command, ErrorCode};
    use std::collections::VecDeque;

    fn pos(row: usize, col: usize) -> Position {
        Position::new_unchecked(row, col)
    }

    fn stones(snapshot: &GameSnapshot) -> usize {
        snapshot.board.iter().flatten().filter(|&&v| v != 0).count()
    }

    /// 按预设脚本应答的落子来源
    struct ScriptedAdvisor {
        replies: VecDeque<Result<Option<Position>>>,
    }

    impl ScriptedAdvisor {
        fn boxed(replies: Vec<Result<Option<Position>>>) -> Box<dyn MoveAdvisor> {
            Box::new(Self {
                replies: replies.into(),
            })
        }

        fn next(&mut self) -> Result<Option<Position>> {
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
        }
    }

    impl MoveAdvisor for ScriptedAdvisor {
        fn reset(&mut self, _depth: i32) -> Result<Option<Position>> {
            self.next()
        }

        fn step(&mut self, _played: Position) -> Result<Option<Position>> {
            self.next()
        }
    }

    #[test]
    fn test_start_player_first() {
        let mut session = GameSession::new(AiConfig::default());
        let snapshot = session.start(15, false, 2).unwrap();
        assert_eq!(stones(&snapshot), 0);
        assert_eq!(snapshot.current_player, Role::Black);
        assert_eq!(snapshot.size, 15);
    }

    #[test]
    fn test_start_ai_first_takes_center() {
        let mut session = GameSession::new(AiConfig::default());
        let snapshot = session.start(15, true, 2).unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.last_move().unwrap().position(), pos(7, 7));
        assert_eq!(snapshot.current_player, Role::White);
    }

    #[test]
    fn test_invalid_board_size() {
        let mut session = GameSession::new(AiConfig::default());
        assert!(matches!(
            session.start(3, false, 2),
            Err(GameError::InvalidBoardSize { size: 3, .. })
        ));
        assert!(!session.is_active());
    }

    #[test]
    fn test_play_gets_reply() {
        let mut session = GameSession::new(AiConfig::default());
        session.start(15, false, 2).unwrap();

        let snapshot = session.play(pos(7, 7), 2).unwrap();
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.board[7][7], 1);
        assert_eq!(snapshot.current_player, Role::Black);
        assert!(!snapshot.best_path.is_empty());
        assert_eq!(snapshot.best_path[0], snapshot.last_move().unwrap().position());
    }

    #[test]
    fn test_play_rejects_bad_moves() {
        let mut session = GameSession::new(AiConfig::default());
        assert_eq!(session.play(pos(7, 7), 2), Err(GameError::NotStarted));

        session.start(15, false, 2).unwrap();
        session.play(pos(7, 7), 2).unwrap();

        assert_eq!(
            session.play(pos(7, 7), 2),
            Err(GameError::Occupied { row: 7, col: 7 })
        );
        assert_eq!(
            session.play(pos(15, 0), 2),
            Err(GameError::InvalidPosition { row: 15, col: 0 })
        );
        assert_eq!(session.snapshot().unwrap().history.len(), 2);
    }

    #[test]
    fn test_undo_takes_back_both_moves() {
        let mut session = GameSession::new(AiConfig::default());
        session.start(15, false, 2).unwrap();
        session.play(pos(7, 7), 2).unwrap();

        let snapshot = session.undo().unwrap();
        assert_eq!(stones(&snapshot), 0);
        assert_eq!(snapshot.current_player, Role::Black);
        assert_eq!(session.undo(), Err(GameError::NothingToUndo));
    }

    #[test]
    fn test_undo_after_winning_move_keeps_player_colour() {
        let mut session = GameSession::new(AiConfig::default());
        session.start(15, false, 2).unwrap();
        // 黑方（玩家）四连，白方散落，最后一步由玩家成五
        let board = session.board.as_mut().unwrap();
        for c in 0..4 {
            assert!(board.place(3, c));
            assert!(board.place(10, 2 * c));
        }
        assert!(board.place(3, 4));
        assert_eq!(session.snapshot().unwrap().winner, Some(Role::Black));

        let snapshot = session.undo().unwrap();
        assert_eq!(snapshot.history.len(), 8);
        assert_eq!(snapshot.winner, None);
        assert_eq!(snapshot.current_player, Role::Black);

        let snapshot = session.play(pos(7, 7), 2).unwrap();
        let mine = snapshot
            .history
            .iter()
            .find(|r| r.position() == pos(7, 7))
            .unwrap();
        assert_eq!(mine.role, Role::Black);
    }

    #[test]
    fn test_undo_keeps_ai_opening() {
        let mut session = GameSession::new(AiConfig::default());
        session.start(15, true, 2).unwrap();
        assert_eq!(session.player(), Role::White);

        assert_eq!(session.undo(), Err(GameError::NothingToUndo));
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.current_player, Role::White);

        let snapshot = session.play(pos(0, 0), 2).unwrap();
        assert_eq!(snapshot.history[1].role, Role::White);

        // AI 应答后撤回两步，回到只剩开局首子
        let snapshot = session.undo().unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.current_player, Role::White);
    }

    #[test]
    fn test_game_over_rejects_moves() {
        let mut session = GameSession::new(AiConfig::default());
        session.start(15, false, 2).unwrap();
        // 直接在会话的棋盘上摆出黑方五连
        let board = session.board.as_mut().unwrap();
        for c in 0..5 {
            assert!(board.place_as(0, c, Role::Black));
        }

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.winner, Some(Role::Black));
        assert_eq!(session.play(pos(7, 7), 2), Err(GameError::GameOver));
    }

    #[test]
    fn test_end_clears_session() {
        let mut session = GameSession::new(AiConfig::default());
        session.start(15, true, 2).unwrap();

        let snapshot = session.end().unwrap();
        assert_eq!(snapshot.history.len(), 1);
        assert!(!session.is_active());
        assert_eq!(session.end(), Err(GameError::NotStarted));
    }

    #[test]
    fn test_remote_round() {
        let advisor = ScriptedAdvisor::boxed(vec![Ok(Some(pos(7, 7))), Ok(Some(pos(6, 6)))]);
        let mut session = GameSession::new(AiConfig::default()).with_advisor(advisor);

        let snapshot = session.start(15, true, 0).unwrap();
        assert_eq!(snapshot.history.len(), 1);

        let snapshot = session.play(pos(8, 8), 0).unwrap();
        assert_eq!(snapshot.history.len(), 3);
        assert_eq!(snapshot.last_move().unwrap().position(), pos(6, 6));
        assert_eq!(snapshot.last_move().unwrap().role, Role::Black);
    }

    #[test]
    fn test_remote_failure_leaves_board_untouched() {
        let advisor = ScriptedAdvisor::boxed(vec![
            Err(anyhow::anyhow!("connection refused")),
            Ok(Some(pos(6, 6))),
        ]);
        let mut session = GameSession::new(AiConfig::default()).with_advisor(advisor);
        session.start(15, false, 0).unwrap();

        let err = session.play(pos(7, 7), 0).unwrap_err();
        assert!(matches!(err, GameError::Agent { .. }));
        assert_eq!(session.snapshot().unwrap().history.len(), 0);

        // 同一局面可以直接重试
        let snapshot = session.play(pos(7, 7), 0).unwrap();
        assert_eq!(snapshot.history.len(), 2);
    }

    #[test]
    fn test_remote_illegal_reply_rolls_back() {
        let advisor = ScriptedAdvisor::boxed(vec![Ok(Some(pos(7, 7)))]);
        let mut session = GameSession::new(AiConfig::default()).with_advisor(advisor);
        session.start(15, false, 0).unwrap();

        assert!(matches!(
            session.play(pos(7, 7), 0),
            Err(GameError::Agent { .. })
        ));
        assert_eq!(session.snapshot().unwrap().history.len(), 0);
    }

    #[test]
    fn test_remote_without_advisor() {
        let mut session = GameSession::new(AiConfig::default());
        let snapshot = session.start(15, false, 0).unwrap();
        assert_eq!(snapshot.history.len(), 0);

        match session.handle(ClientMessage::Move {
            position: pos(7, 7),
            depth: 0,
        }) {
            ServerMessage::Error { command, code, .. } => {
                assert_eq!(command, Command::Move);
                assert_eq!(code, ErrorCode::AgentUnavailable);
            }
            other => panic!("Unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_handle_echoes_command() {
        let mut session = GameSession::new(AiConfig::default());
        let resp = session.handle(ClientMessage::Start {
            board_size: 15,
            ai_first: false,
            depth: 2,
        });
        assert_eq!(resp.command(), Command::Start);

        let resp = session.handle(ClientMessage::Undo);
        assert!(matches!(
            resp,
            ServerMessage::Error {
                command: Command::Undo,
                code: ErrorCode::UndoNotAllowed,
                ..
            }
        ));
    }
}

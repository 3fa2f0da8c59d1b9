//! 棋型评估
//!
//! 评估器自己维护一份棋盘副本，并在每次落子/悔棋时增量更新：
//! - 每条线（行、列、两条对角线）上双方的棋型分
//! - 每个空点在四个方向上"假如落子"能形成的棋型（用于候选点生成）
//! - 每个格子周围的棋子数（用于限定候选范围）
//!
//! 因此 `score` 与 `candidate_moves` 都不需要全盘重扫。

use protocol::{Position, Role, WIN_LENGTH};

/// 成五分值（同时作为终局哨兵）
pub const FIVE: i32 = 10_000_000;

/// 默认候选点上限
pub const DEFAULT_MAX_CANDIDATES: usize = 20;

/// 深层节点的候选点下限
const MIN_DEEP_CANDIDATES: usize = 8;

/// 候选点的邻域半径
const NEIGHBOR_RADIUS: i32 = 2;

/// 四个方向：横、竖、主对角线、副对角线
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// 单方向棋型，按价值从低到高排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Shape {
    #[default]
    None,
    /// 眠二
    BlockedTwo,
    /// 眠三
    BlockedThree,
    /// 活二
    OpenTwo,
    /// 活三
    OpenThree,
    /// 冲四
    BlockedFour,
    /// 活四
    OpenFour,
    /// 成五
    Five,
}

impl Shape {
    /// 棋型分值
    pub fn score(&self) -> i32 {
        match self {
            Shape::None => 0,
            Shape::BlockedTwo => 50,
            Shape::BlockedThree => 200,
            Shape::OpenTwo => 500,
            Shape::OpenThree => 8_000,
            Shape::BlockedFour => 10_000,
            Shape::OpenFour => 100_000,
            Shape::Five => FIVE,
        }
    }

    /// 根据连子数、是否跳连以及两端是否开放判定棋型
    fn classify(count: usize, gapped: bool, left_open: bool, right_open: bool) -> Shape {
        let opens = left_open as u8 + right_open as u8;
        match (count, gapped) {
            (c, false) if c >= WIN_LENGTH => Shape::Five,
            (4, false) => match opens {
                2 => Shape::OpenFour,
                1 => Shape::BlockedFour,
                _ => Shape::None,
            },
            // 跳四：补上空位即成五
            (4, true) => Shape::BlockedFour,
            (3, _) => match opens {
                2 => Shape::OpenThree,
                1 => Shape::BlockedThree,
                _ => Shape::None,
            },
            (2, _) => match opens {
                2 => Shape::OpenTwo,
                1 => Shape::BlockedTwo,
                _ => Shape::None,
            },
            _ => Shape::None,
        }
    }
}

/// 假设落子时单方向窗口里的格子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Mine,
    Empty,
    /// 对方棋子或棋盘外
    Blocked,
}

/// 以中心为 4 的 9 格窗口
type Window = [Cell; 9];

const CENTER: usize = 4;

/// 候选点及其评分
#[derive(Debug, Clone, Copy)]
struct Candidate {
    pos: Position,
    mine: Shape,
    theirs: Shape,
    value: i32,
}

/// 棋型评估器
#[derive(Debug, Clone, PartialEq)]
pub struct PatternEvaluator {
    size: usize,
    max_candidates: usize,
    grid: Vec<Option<Role>>,
    /// 所有线，每条线是格子下标序列
    lines: Vec<Vec<usize>>,
    /// 每个格子在四个方向上所属的线
    line_of: Vec<[usize; 4]>,
    /// 每条线上的棋型分 [role][line]
    line_values: [Vec<i32>; 2],
    /// 双方棋型总分
    totals: [i32; 2],
    /// 空点假设落子后的棋型 [role][cell][direction]
    shapes: [Vec<[Shape; 4]>; 2],
    /// 邻域内的棋子数
    neighbors: Vec<u16>,
}

impl PatternEvaluator {
    /// 为空棋盘创建评估器
    pub fn new(size: usize) -> Self {
        Self::with_max_candidates(size, DEFAULT_MAX_CANDIDATES)
    }

    pub fn with_max_candidates(size: usize, max_candidates: usize) -> Self {
        let cells = size * size;
        let mut lines: Vec<Vec<usize>> = Vec::new();
        let mut line_of = vec![[0usize; 4]; cells];

        let starts = |dir: usize| -> Vec<(usize, usize)> {
            match dir {
                0 => (0..size).map(|r| (r, 0)).collect(),
                1 => (0..size).map(|c| (0, c)).collect(),
                2 => (0..size).map(|r| (r, 0)).chain((1..size).map(|c| (0, c))).collect(),
                _ => (0..size)
                    .map(|c| (0, c))
                    .chain((1..size).map(|r| (r, size - 1)))
                    .collect(),
            }
        };

        for (dir, &(dr, dc)) in DIRECTIONS.iter().enumerate() {
            for (r0, c0) in starts(dir) {
                let id = lines.len();
                let mut line = Vec::new();
                let mut pos = Some(Position::new_unchecked(r0, c0));
                while let Some(p) = pos {
                    let idx = p.to_index(size);
                    line_of[idx][dir] = id;
                    line.push(idx);
                    pos = p.offset(dr, dc, size);
                }
                lines.push(line);
            }
        }

        let line_count = lines.len();
        Self {
            size,
            max_candidates: max_candidates.max(1),
            grid: vec![None; cells],
            lines,
            line_of,
            line_values: [vec![0; line_count], vec![0; line_count]],
            totals: [0, 0],
            shapes: [vec![[Shape::None; 4]; cells], vec![[Shape::None; 4]; cells]],
            neighbors: vec![0; cells],
        }
    }

    /// 落子通知
    pub fn notify_placed(&mut self, pos: Position, role: Role) {
        self.grid[pos.to_index(self.size)] = Some(role);
        self.adjust_neighbors(pos, 1);
        self.refresh(pos);
    }

    /// 提子（悔棋）通知
    pub fn notify_removed(&mut self, pos: Position) {
        self.grid[pos.to_index(self.size)] = None;
        self.adjust_neighbors(pos, -1);
        self.refresh(pos);
    }

    /// 局面评分（对 role 而言），满足 score(role) == -score(-role)
    pub fn score(&self, role: Role) -> i32 {
        self.totals[role.index()] - self.totals[role.opponent().index()]
    }

    /// role 在 pos 落子后能形成的最好棋型（pos 非空时为 None）
    pub fn shape_at(&self, pos: Position, role: Role) -> Shape {
        self.shapes[role.index()][pos.to_index(self.size)]
            .iter()
            .copied()
            .max()
            .unwrap_or_default()
    }

    /// 生成值得搜索的候选点
    ///
    /// - 两个标志都为 false：返回邻近已有棋子的空点，按价值排序并截断
    /// - `only_four`：只返回己方成四（或必须应对）的点
    /// - `only_three`：只返回能形成或阻挡活三/四的点
    ///
    /// 任何情况下，己方成五点、必须封堵的对方成五点优先且独占。
    pub fn candidate_moves(
        &self,
        role: Role,
        depth: u8,
        only_three: bool,
        only_four: bool,
    ) -> Vec<Position> {
        let mut candidates = self.collect_candidates(role);

        // 价值高的在前，同分保持行优先顺序
        candidates.sort_by(|a, b| b.value.cmp(&a.value));

        let pick = |pred: &dyn Fn(&Candidate) -> bool| -> Vec<Position> {
            candidates.iter().filter(|c| pred(c)).map(|c| c.pos).collect()
        };

        let wins = pick(&|c| c.mine == Shape::Five);
        if !wins.is_empty() {
            return wins;
        }

        let blocks = pick(&|c| c.theirs == Shape::Five);
        if !blocks.is_empty() {
            return blocks;
        }

        let open_fours = pick(&|c| c.mine == Shape::OpenFour);
        if !open_fours.is_empty() {
            return open_fours;
        }

        if only_four {
            return pick(&|c| c.mine >= Shape::BlockedFour);
        }

        // 对方下一手能成活四：只能冲四或封堵
        if candidates.iter().any(|c| c.theirs == Shape::OpenFour) {
            return pick(&|c| c.mine >= Shape::BlockedFour || c.theirs == Shape::OpenFour);
        }

        if only_three {
            return pick(&|c| c.mine >= Shape::OpenThree || c.theirs >= Shape::OpenThree);
        }

        let limit = if depth > 2 {
            (self.max_candidates / 2).max(MIN_DEEP_CANDIDATES)
        } else {
            self.max_candidates
        };
        candidates.into_iter().take(limit).map(|c| c.pos).collect()
    }

    fn collect_candidates(&self, role: Role) -> Vec<Candidate> {
        let mine_idx = role.index();
        let theirs_idx = role.opponent().index();

        (0..self.size * self.size)
            .filter(|&idx| self.grid[idx].is_none() && self.neighbors[idx] > 0)
            .map(|idx| {
                let mine = &self.shapes[mine_idx][idx];
                let theirs = &self.shapes[theirs_idx][idx];
                let value = mine.iter().chain(theirs.iter()).map(Shape::score).sum();
                Candidate {
                    pos: Position::new_unchecked(idx / self.size, idx % self.size),
                    mine: mine.iter().copied().max().unwrap_or_default(),
                    theirs: theirs.iter().copied().max().unwrap_or_default(),
                    value,
                }
            })
            .collect()
    }

    fn adjust_neighbors(&mut self, pos: Position, delta: i32) {
        for dr in -NEIGHBOR_RADIUS..=NEIGHBOR_RADIUS {
            for dc in -NEIGHBOR_RADIUS..=NEIGHBOR_RADIUS {
                if let Some(q) = pos.offset(dr, dc, self.size) {
                    let n = &mut self.neighbors[q.to_index(self.size)];
                    *n = (*n as i32 + delta).max(0) as u16;
                }
            }
        }
    }

    /// 重新计算经过 pos 的四条线，以及这些线上受影响空点的棋型
    fn refresh(&mut self, pos: Position) {
        let idx = pos.to_index(self.size);

        for dir in 0..DIRECTIONS.len() {
            let line_id = self.line_of[idx][dir];
            for role in [Role::Black, Role::White] {
                let cells: Vec<Option<Role>> =
                    self.lines[line_id].iter().map(|&i| self.grid[i]).collect();
                let value = line_value(&cells, role);
                let slot = &mut self.line_values[role.index()][line_id];
                self.totals[role.index()] += value - *slot;
                *slot = value;
            }

            let (dr, dc) = DIRECTIONS[dir];
            for off in -4..=4 {
                let Some(q) = pos.offset(dr * off, dc * off, self.size) else {
                    continue;
                };
                let q_idx = q.to_index(self.size);
                for role in [Role::Black, Role::White] {
                    let shape = if self.grid[q_idx].is_some() {
                        Shape::None
                    } else {
                        self.point_shape(q, dir, role)
                    };
                    self.shapes[role.index()][q_idx][dir] = shape;
                }
            }
        }
    }

    /// role 假设落在空点 pos 时，dir 方向上的棋型
    fn point_shape(&self, pos: Position, dir: usize, role: Role) -> Shape {
        let (dr, dc) = DIRECTIONS[dir];
        let mut window: Window = [Cell::Blocked; 9];
        for (k, cell) in window.iter_mut().enumerate() {
            let off = k as i32 - CENTER as i32;
            *cell = if off == 0 {
                Cell::Mine
            } else {
                match pos.offset(dr * off, dc * off, self.size) {
                    None => Cell::Blocked,
                    Some(q) => match self.grid[q.to_index(self.size)] {
                        None => Cell::Empty,
                        Some(r) if r == role => Cell::Mine,
                        Some(_) => Cell::Blocked,
                    },
                }
            };
        }
        window_shape(&window)
    }
}

/// 穿过中心的连续子数及两端是否为空
fn center_run(window: &Window) -> (usize, bool, bool) {
    let mut lo = CENTER;
    while lo > 0 && window[lo - 1] == Cell::Mine {
        lo -= 1;
    }
    let mut hi = CENTER;
    while hi + 1 < window.len() && window[hi + 1] == Cell::Mine {
        hi += 1;
    }
    let left_open = lo > 0 && window[lo - 1] == Cell::Empty;
    let right_open = hi + 1 < window.len() && window[hi + 1] == Cell::Empty;
    (hi - lo + 1, left_open, right_open)
}

fn window_shape(window: &Window) -> Shape {
    let (count, left_open, right_open) = center_run(window);
    if count >= WIN_LENGTH {
        return Shape::Five;
    }
    if count == 4 && left_open && right_open {
        return Shape::OpenFour;
    }

    // 包含中心、且没有阻挡的五格区间里己方棋子的最大数量
    let best_span = (0..=CENTER)
        .map(|start| &window[start..start + WIN_LENGTH])
        .filter(|span| !span.contains(&Cell::Blocked))
        .map(|span| span.iter().filter(|&&c| c == Cell::Mine).count())
        .max()
        .unwrap_or(0);

    if best_span >= 4 {
        return Shape::BlockedFour;
    }

    // 再补一子即可成活四
    let makes_open_four = (0..window.len())
        .filter(|&k| window[k] == Cell::Empty)
        .any(|k| {
            let mut next = *window;
            next[k] = Cell::Mine;
            let (c, l, r) = center_run(&next);
            c == 4 && l && r
        });
    if makes_open_four {
        return Shape::OpenThree;
    }

    match best_span {
        3 => Shape::BlockedThree,
        2 if left_open && right_open => Shape::OpenTwo,
        2 => Shape::BlockedTwo,
        _ => Shape::None,
    }
}

/// 一条线上 role 的棋型总分
fn line_value(cells: &[Option<Role>], role: Role) -> i32 {
    let n = cells.len();
    let me = Some(role);
    let them = Some(role.opponent());
    let mut total = 0;
    let mut i = 0;

    while i < n {
        if cells[i] != me {
            i += 1;
            continue;
        }

        let start = i;
        while i < n && cells[i] == me {
            i += 1;
        }
        let mut end = i;
        let mut count = end - start;
        let mut gapped = false;

        // 跳一格的连子合并计算（如 XX_X）
        if count < WIN_LENGTH && end + 1 < n && cells[end].is_none() && cells[end + 1] == me {
            let mut j = end + 1;
            while j < n && cells[j] == me {
                j += 1;
            }
            let merged = count + (j - end - 1);
            if merged < WIN_LENGTH {
                count = merged;
                gapped = true;
                end = j;
            }
        }

        let left_open = start > 0 && cells[start - 1].is_none();
        let right_open = end < n && cells[end].is_none();

        // 两侧到对方棋子或边界之间不足五格，永远成不了五
        let mut lo = start;
        while lo > 0 && cells[lo - 1] != them {
            lo -= 1;
        }
        let mut hi = end;
        while hi < n && cells[hi] != them {
            hi += 1;
        }
        if hi - lo >= WIN_LENGTH {
            total += Shape::classify(count, gapped, left_open, right_open).score();
        }

        i = end;
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new_unchecked(row, col)
    }

    fn row_of(stones: &str) -> Vec<Option<Role>> {
        stones
            .chars()
            .map(|c| match c {
                'O' => Some(Role::Black),
                'X' => Some(Role::White),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_shape_ordering() {
        assert!(Shape::Five.score() > Shape::OpenFour.score());
        assert!(Shape::OpenFour.score() > Shape::BlockedFour.score());
        assert!(Shape::BlockedFour.score() >= Shape::OpenThree.score());
        assert!(Shape::OpenThree.score() > Shape::OpenTwo.score());
        assert!(Shape::OpenTwo.score() > Shape::BlockedThree.score());
        assert!(Shape::BlockedThree.score() > Shape::BlockedTwo.score());
        assert!(Shape::BlockedTwo.score() > Shape::None.score());
    }

    #[test]
    fn test_line_value_shapes() {
        let b = Role::Black;
        assert_eq!(line_value(&row_of("__OOOOO__"), b), Shape::Five.score());
        assert_eq!(line_value(&row_of("__OOOO___"), b), Shape::OpenFour.score());
        assert_eq!(line_value(&row_of("XOOOO____"), b), Shape::BlockedFour.score());
        assert_eq!(line_value(&row_of("__OO_OO__"), b), Shape::BlockedFour.score());
        assert_eq!(line_value(&row_of("___OOO___"), b), Shape::OpenThree.score());
        assert_eq!(line_value(&row_of("___O_OO__"), b), Shape::OpenThree.score());
        assert_eq!(line_value(&row_of("XOOO_____"), b), Shape::BlockedThree.score());
        assert_eq!(line_value(&row_of("___OO____"), b), Shape::OpenTwo.score());
        // 被夹死的三子没有价值
        assert_eq!(line_value(&row_of("XOOOX____"), b), 0);
    }

    #[test]
    fn test_score_antisymmetric() {
        let mut eval = PatternEvaluator::new(15);
        eval.notify_placed(pos(7, 7), Role::Black);
        eval.notify_placed(pos(7, 8), Role::Black);
        eval.notify_placed(pos(8, 8), Role::White);

        assert_eq!(eval.score(Role::Black), -eval.score(Role::White));
        assert!(eval.score(Role::Black) > 0);
    }

    #[test]
    fn test_incremental_matches_rebuild() {
        let moves = [
            (pos(7, 7), Role::Black),
            (pos(7, 8), Role::White),
            (pos(8, 8), Role::Black),
            (pos(6, 6), Role::White),
            (pos(9, 9), Role::Black),
        ];

        let mut eval = PatternEvaluator::new(15);
        for &(p, r) in &moves {
            eval.notify_placed(p, r);
        }
        // 撤回最后一步再落回去，分数应一致
        let before = eval.score(Role::Black);
        eval.notify_removed(pos(9, 9));
        eval.notify_placed(pos(9, 9), Role::Black);
        assert_eq!(eval.score(Role::Black), before);

        let mut fresh = PatternEvaluator::new(15);
        for &(p, r) in &moves {
            fresh.notify_placed(p, r);
        }
        assert_eq!(fresh.score(Role::Black), eval.score(Role::Black));
    }

    #[test]
    fn test_remove_restores_empty_score() {
        let mut eval = PatternEvaluator::new(15);
        eval.notify_placed(pos(7, 7), Role::Black);
        eval.notify_placed(pos(7, 8), Role::Black);
        eval.notify_removed(pos(7, 8));
        eval.notify_removed(pos(7, 7));

        assert_eq!(eval.score(Role::Black), 0);
        assert!(eval.candidate_moves(Role::Black, 0, false, false).is_empty());
    }

    #[test]
    fn test_shape_at_detects_threats() {
        let mut eval = PatternEvaluator::new(15);
        for c in 5..9 {
            eval.notify_placed(pos(7, c), Role::Black);
        }
        assert_eq!(eval.shape_at(pos(7, 9), Role::Black), Shape::Five);
        assert_eq!(eval.shape_at(pos(7, 4), Role::Black), Shape::Five);
        // 已有棋子的点没有棋型
        assert_eq!(eval.shape_at(pos(7, 5), Role::Black), Shape::None);
    }

    #[test]
    fn test_candidates_prefer_winning_move() {
        let mut eval = PatternEvaluator::new(15);
        for c in 5..9 {
            eval.notify_placed(pos(7, c), Role::Black);
        }
        eval.notify_placed(pos(7, 4), Role::White);

        let moves = eval.candidate_moves(Role::Black, 0, false, false);
        assert_eq!(moves, vec![pos(7, 9)]);

        // 白方必须封堵
        let moves = eval.candidate_moves(Role::White, 0, false, false);
        assert_eq!(moves, vec![pos(7, 9)]);
    }

    #[test]
    fn test_candidates_answer_open_three() {
        let mut eval = PatternEvaluator::new(15);
        for c in 6..9 {
            eval.notify_placed(pos(7, c), Role::Black);
        }
        eval.notify_placed(pos(0, 0), Role::White);

        let moves = eval.candidate_moves(Role::White, 0, false, false);
        assert!(!moves.is_empty());
        assert!(moves.contains(&pos(7, 5)));
        assert!(moves.contains(&pos(7, 9)));
        for m in &moves {
            assert!(eval.shape_at(*m, Role::Black) == Shape::OpenFour);
        }
    }

    #[test]
    fn test_candidates_limited_to_neighborhood() {
        let mut eval = PatternEvaluator::with_max_candidates(15, 100);
        eval.notify_placed(pos(7, 7), Role::Black);

        let moves = eval.candidate_moves(Role::White, 0, false, false);
        assert_eq!(moves.len(), 24);
        assert!(moves.iter().all(|m| m.distance(&pos(7, 7)) <= 2));
    }

    #[test]
    fn test_only_four_filters_quiet_moves() {
        let mut eval = PatternEvaluator::new(15);
        eval.notify_placed(pos(7, 7), Role::Black);
        eval.notify_placed(pos(8, 8), Role::White);

        assert!(eval.candidate_moves(Role::Black, 4, false, true).is_empty());
        assert!(eval.candidate_moves(Role::Black, 4, true, false).is_empty());
    }
}

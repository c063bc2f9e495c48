//! 走法排序：置换表走法、MVV-LVA 吃子、升变、杀手走法、历史表

use crate::board::Board;
use crate::types::{Move, PieceKind};

pub const MAX_PLY: usize = 128;

const TT_MOVE_SCORE: i32 = 1_000_000;
const CAPTURE_SCORE: i32 = 100_000;
const PROMOTION_SCORE: i32 = 90_000;
const KILLER_SCORES: [i32; 2] = [80_000, 70_000];
/// 历史分超过此值时整表减半，保证排在杀手走法之后
const HISTORY_LIMIT: i32 = 60_000;

/// 是否吃子（含吃过路兵）
#[inline]
pub fn is_capture(board: &Board, mv: &Move) -> bool {
    let Some(mover) = board.get_square(mv.from) else {
        return false;
    };
    match board.get_square(mv.to) {
        Some(target) => target.color != mover.color,
        None => mover.kind == PieceKind::Pawn && mv.from.col != mv.to.col,
    }
}

/// MVV-LVA 评分
#[inline]
pub fn mvv_lva(board: &Board, mv: &Move) -> i32 {
    let victim = board
        .get_square(mv.to)
        .map_or(PieceKind::Pawn.value(), |p| p.value());
    let attacker = board.get_square(mv.from).map_or(0, |p| p.value());
    victim * 10 - attacker
}

pub struct MoveOrderer {
    /// [ply][slot]，slot 0 是最近的
    killers: Vec<[Option<Move>; 2]>,
    /// [from][to]
    history: Vec<[i32; 64]>,
}

impl Default for MoveOrderer {
    fn default() -> Self {
        MoveOrderer::new()
    }
}

impl MoveOrderer {
    pub fn new() -> Self {
        MoveOrderer {
            killers: vec![[None; 2]; MAX_PLY],
            history: vec![[0; 64]; 64],
        }
    }

    /// 每次顶层搜索前清空
    pub fn clear(&mut self) {
        self.killers.fill([None; 2]);
        for row in self.history.iter_mut() {
            row.fill(0);
        }
    }

    pub fn killers(&self, ply: usize) -> [Option<Move>; 2] {
        self.killers.get(ply).copied().unwrap_or([None; 2])
    }

    pub fn history(&self, mv: &Move) -> i32 {
        self.history[mv.from.to_index()][mv.to.to_index()]
    }

    /// 非吃子走法产生截断时调用
    pub fn record_cutoff(&mut self, mv: Move, ply: usize, depth: i32) {
        if let Some(slots) = self.killers.get_mut(ply) {
            if slots[0] != Some(mv) {
                slots[1] = slots[0];
                slots[0] = Some(mv);
            }
        }

        let entry = &mut self.history[mv.from.to_index()][mv.to.to_index()];
        *entry += depth * depth;

        // 衰减
        if *entry > HISTORY_LIMIT {
            for row in self.history.iter_mut() {
                for v in row.iter_mut() {
                    *v /= 2;
                }
            }
        }
    }

    /// 单个走法的排序分
    pub fn score(&self, board: &Board, mv: &Move, ply: usize, tt_move: Option<Move>) -> i32 {
        if tt_move == Some(*mv) {
            return TT_MOVE_SCORE;
        }
        if is_capture(board, mv) {
            return CAPTURE_SCORE + mvv_lva(board, mv);
        }
        if let Some(kind) = mv.promotion {
            return PROMOTION_SCORE + kind.value();
        }
        let killers = self.killers(ply);
        for (slot, killer) in killers.iter().enumerate() {
            if *killer == Some(*mv) {
                return KILLER_SCORES[slot];
            }
        }
        self.history(mv)
    }

    /// 原地排序（选择排序，走法数少时比快排快）
    pub fn order_moves(&self, board: &Board, moves: &mut [Move], ply: usize, tt_move: Option<Move>) {
        let mut scores: Vec<i32> = moves
            .iter()
            .map(|mv| self.score(board, mv, ply, tt_move))
            .collect();

        for i in 0..moves.len() {
            let mut best_idx = i;
            for j in (i + 1)..moves.len() {
                if scores[j] > scores[best_idx] {
                    best_idx = j;
                }
            }
            if best_idx != i {
                moves.swap(i, best_idx);
                scores.swap(i, best_idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions;
    use crate::types::{Color, Square};

    fn mv(uci: &str) -> Move {
        Move::from_uci(uci).unwrap()
    }

    #[test]
    fn test_mvv_lva() {
        let board = Board::from_fen("4k3/8/8/3q4/2P5/8/3R4/4K3 w - - 0 1").unwrap();
        // 兵吃后优于车吃后
        assert!(mvv_lva(&board, &mv("c4d5")) > mvv_lva(&board, &mv("d2d5")));
        assert!(is_capture(&board, &mv("c4d5")));
        assert!(!is_capture(&board, &mv("c4c5")));
    }

    #[test]
    fn test_en_passant_is_capture() {
        let mut board = Board::from_fen(test_positions::EN_PASSANT_READY).unwrap();
        board.move_piece(
            Square::from_algebraic("d7").unwrap(),
            Square::from_algebraic("d5").unwrap(),
            None,
        );
        assert!(is_capture(&board, &mv("e5d6")));
    }

    #[test]
    fn test_order_priorities() {
        let mut board = Board::from_fen("4k3/P7/8/3q4/2P5/8/3R4/4K3 w - - 0 1").unwrap();
        let mut orderer = MoveOrderer::new();
        orderer.record_cutoff(mv("e1f1"), 0, 3);
        orderer.record_cutoff(mv("e1f2"), 0, 3);
        orderer.record_cutoff(mv("d2d3"), 5, 8);

        let mut moves = board.legal_moves(Color::White);
        let tt_move = mv("d2h2");
        orderer.order_moves(&board, &mut moves, 0, Some(tt_move));

        assert_eq!(moves[0], tt_move);
        assert_eq!(moves[1], mv("c4d5"));
        assert_eq!(moves[2], mv("d2d5"));
        assert_eq!(moves[3], mv("a7a8q"));
        // 升变之后是杀手走法（最近的在前）
        let killer_pos = moves.iter().position(|m| *m == mv("e1f2")).unwrap();
        let older_pos = moves.iter().position(|m| *m == mv("e1f1")).unwrap();
        assert_eq!(killer_pos, 7);
        assert_eq!(older_pos, 8);
        // 历史分排在普通走法前
        assert_eq!(moves[9], mv("d2d3"));
    }

    #[test]
    fn test_history_decay() {
        let mut orderer = MoveOrderer::new();
        let m = mv("e2e4");
        for _ in 0..1000 {
            orderer.record_cutoff(m, 1, 10);
        }
        assert!(orderer.history(&m) <= HISTORY_LIMIT);
        assert!(orderer.history(&m) > 0);

        orderer.clear();
        assert_eq!(orderer.history(&m), 0);
        assert_eq!(orderer.killers(1), [None, None]);
    }

    #[test]
    fn test_killer_slots() {
        let mut orderer = MoveOrderer::new();
        orderer.record_cutoff(mv("a2a3"), 2, 1);
        orderer.record_cutoff(mv("a2a3"), 2, 1);
        assert_eq!(orderer.killers(2), [Some(mv("a2a3")), None]);
        orderer.record_cutoff(mv("b2b3"), 2, 1);
        assert_eq!(orderer.killers(2), [Some(mv("b2b3")), Some(mv("a2a3"))]);
        // 超出范围的层数忽略杀手表
        orderer.record_cutoff(mv("c2c3"), MAX_PLY + 5, 1);
        assert_eq!(orderer.killers(MAX_PLY + 5), [None, None]);
    }
}

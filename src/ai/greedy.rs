//! 贪婪 AI 策略（难度 2-4）
//!
//! 每个走法按它满足的最高一级规则打分，难度越高可用的规则越多：
//! - 难度 4：不亏的吃子，或吃完不会被反吃
//! - 难度 3：把受攻击的棋子走到安全的格子
//! - 难度 2：吃子，其次将军
//! - 都不满足时随机

use super::ordering::is_capture;
use super::{AIConfig, AIStrategy, ScoredMove};
use crate::board::Board;
use crate::types::{Move, PieceKind};
use rand::prelude::*;

const SAFE_CAPTURE_TIER: i32 = 40_000;
const ESCAPE_TIER: i32 = 30_000;
const CAPTURE_TIER: i32 = 20_000;
const CHECK_TIER: i32 = 10_000;

/// 贪婪 AI - 按规则层级选择走法
pub struct GreedyAI {
    level: u8,
    rng: StdRng,
    randomness: f64,
}

impl GreedyAI {
    pub fn new(level: u8, config: &AIConfig) -> Self {
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        GreedyAI {
            level: level.clamp(2, 4),
            rng,
            randomness: config.randomness,
        }
    }

    /// 评估单个走法（会在 `board` 上模拟后撤销）
    fn evaluate_move(&self, board: &mut Board, mv: Move) -> i32 {
        let color = board.turn();
        let Some(mover) = board.get_square(mv.from).copied() else {
            return 0;
        };
        let capture = is_capture(board, &mv);
        let victim_value = if capture {
            board
                .get_square(mv.to)
                .map_or(PieceKind::Pawn.value(), |p| p.value())
        } else {
            0
        };
        let was_attacked = board.is_piece_attacked(mv.from);

        let Some(undo) = board.make_move(mv) else {
            return 0;
        };
        let safe_after = !board.is_piece_attacked(mv.to);
        let gives_check = board.is_in_check(color.opposite());
        board.unmake_move(undo);

        if self.level >= 4 && capture && (victim_value >= mover.value() || safe_after) {
            return SAFE_CAPTURE_TIER + victim_value;
        }
        if self.level >= 3 && was_attacked && safe_after {
            return ESCAPE_TIER + mover.value();
        }
        if capture {
            return CAPTURE_TIER + victim_value;
        }
        if gives_check {
            return CHECK_TIER;
        }
        0
    }
}

impl AIStrategy for GreedyAI {
    fn select_moves(&mut self, board: &Board, n: usize) -> Vec<ScoredMove> {
        let mut sim = board.detached();
        let moves = sim.legal_moves(board.turn());

        let mut scored = Vec::with_capacity(moves.len());
        for mv in moves {
            let base = self.evaluate_move(&mut sim, mv);
            // 同级走法之间随机
            let noise = (self.rng.gen::<f64>() * (1.0 + self.randomness) * 100.0) as i32;
            scored.push(ScoredMove {
                mv,
                score: base + noise,
            });
        }

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(n);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions;

    fn config() -> AIConfig {
        AIConfig {
            seed: Some(3),
            ..Default::default()
        }
    }

    fn best(level: u8, fen: &str) -> String {
        let board = Board::from_fen(fen).unwrap();
        GreedyAI::new(level, &config())
            .select_best_move(&board)
            .unwrap()
            .to_uci()
    }

    #[test]
    fn test_level2_prefers_capture() {
        assert_eq!(best(2, test_positions::HANGING_QUEEN), "d2d5");
    }

    #[test]
    fn test_level2_gives_check() {
        // 没有吃子时优先将军（车到 e 列或第 8 横排）
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let mv = GreedyAI::new(2, &config()).select_best_move(&board).unwrap();
        board.move_piece(mv.from, mv.to, mv.promotion);
        assert!(board.is_in_check(crate::types::Color::Black));
    }

    #[test]
    fn test_level3_escapes_attack() {
        let mut board = Board::from_fen(test_positions::KNIGHT_ATTACKED).unwrap();
        let mv = GreedyAI::new(3, &config()).select_best_move(&board).unwrap();
        assert_eq!(mv.from, crate::types::Square::from_algebraic("d5").unwrap());
        board.move_piece(mv.from, mv.to, mv.promotion);
        assert!(!board.is_piece_attacked(mv.to));
    }

    #[test]
    fn test_level4_prefers_safe_capture() {
        // 车白吃马，后吃 g6 兵也安全，后吃 d5 兵会被反吃
        let fen = "4k3/7n/2p3p1/3p4/8/3Q4/7R/4K3 w - - 0 1";
        assert_eq!(best(4, fen), "h2h7");
        assert_eq!(best(2, fen), "h2h7");
    }

    #[test]
    fn test_level4_avoids_losing_capture() {
        // 后吃 d7 车会被王反吃；难度 2 只看被吃子的价值
        let fen = "4k3/3r4/8/p7/8/8/8/R2Q2K1 w - - 0 1";
        assert_eq!(best(4, fen), "a1a5");
        assert_eq!(best(2, fen), "d1d7");
    }
}

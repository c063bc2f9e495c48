//! 随机 AI 策略（难度 1）

use super::{AIStrategy, ScoredMove};
use crate::board::Board;
use rand::prelude::*;

/// 随机 AI - 随机选择合法走法
pub struct RandomAI {
    rng: StdRng,
}

impl RandomAI {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        RandomAI { rng }
    }
}

impl AIStrategy for RandomAI {
    fn select_moves(&mut self, board: &Board, n: usize) -> Vec<ScoredMove> {
        let mut sim = board.detached();
        let mut moves = sim.legal_moves(board.turn());
        moves.shuffle(&mut self.rng);
        moves.truncate(n);
        moves
            .into_iter()
            .map(|mv| ScoredMove { mv, score: 0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_random_moves_are_legal() {
        let mut board = Board::standard();
        let legal = board.legal_moves(Color::White);
        let mut ai = RandomAI::new(Some(42));
        let moves = ai.select_moves(&board, 5);
        assert_eq!(moves.len(), 5);
        for sm in &moves {
            assert!(legal.contains(&sm.mv));
        }
    }

    #[test]
    fn test_random_seeded() {
        let board = Board::standard();
        let a = RandomAI::new(Some(7)).select_best_move(&board);
        let b = RandomAI::new(Some(7)).select_best_move(&board);
        assert_eq!(a, b);
    }
}

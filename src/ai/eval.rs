//! 局面评估
//!
//! 分数单位为厘兵，正数表示白方占优。
//! 基础项：子力 + 位置表（王分中局/残局两张表）。
//! 扩展项（兵形、王的安全、机动性）默认关闭。

use crate::board::{Board, Piece};
use crate::pieces;
use crate::types::{Color, PieceKind};
use serde::{Deserialize, Serialize};

/// 非王子力总和低于此值视为残局
pub const ENDGAME_MATERIAL: i32 = 2000;

const DOUBLED_PAWN_PENALTY: i32 = 10;
const ISOLATED_PAWN_PENALTY: i32 = 15;
const PASSED_PAWN_BONUS: i32 = 20;
const PASSED_PAWN_RANK_BONUS: i32 = 10;
const PAWN_SHIELD_BONUS: i32 = 10;
const MOBILITY_WEIGHT: i32 = 2;

// 位置表按白方视角书写，第一行是第 8 横排
// 白子在 row 处查 table[7 - row]，黑子查 table[row]

#[rustfmt::skip]
const PAWN_TABLE: [[i32; 8]; 8] = [
    [  0,  0,  0,  0,  0,  0,  0,  0],
    [ 50, 50, 50, 50, 50, 50, 50, 50],
    [ 10, 10, 20, 30, 30, 20, 10, 10],
    [  5,  5, 10, 25, 25, 10,  5,  5],
    [  0,  0,  0, 20, 20,  0,  0,  0],
    [  5, -5,-10,  0,  0,-10, -5,  5],
    [  5, 10, 10,-20,-20, 10, 10,  5],
    [  0,  0,  0,  0,  0,  0,  0,  0],
];

#[rustfmt::skip]
const KNIGHT_TABLE: [[i32; 8]; 8] = [
    [-50,-40,-30,-30,-30,-30,-40,-50],
    [-40,-20,  0,  0,  0,  0,-20,-40],
    [-30,  0, 10, 15, 15, 10,  0,-30],
    [-30,  5, 15, 20, 20, 15,  5,-30],
    [-30,  0, 15, 20, 20, 15,  0,-30],
    [-30,  5, 10, 15, 15, 10,  5,-30],
    [-40,-20,  0,  5,  5,  0,-20,-40],
    [-50,-40,-30,-30,-30,-30,-40,-50],
];

#[rustfmt::skip]
const BISHOP_TABLE: [[i32; 8]; 8] = [
    [-20,-10,-10,-10,-10,-10,-10,-20],
    [-10,  0,  0,  0,  0,  0,  0,-10],
    [-10,  0,  5, 10, 10,  5,  0,-10],
    [-10,  5,  5, 10, 10,  5,  5,-10],
    [-10,  0, 10, 10, 10, 10,  0,-10],
    [-10, 10, 10, 10, 10, 10, 10,-10],
    [-10,  5,  0,  0,  0,  0,  5,-10],
    [-20,-10,-10,-10,-10,-10,-10,-20],
];

#[rustfmt::skip]
const ROOK_TABLE: [[i32; 8]; 8] = [
    [  0,  0,  0,  0,  0,  0,  0,  0],
    [  5, 10, 10, 10, 10, 10, 10,  5],
    [ -5,  0,  0,  0,  0,  0,  0, -5],
    [ -5,  0,  0,  0,  0,  0,  0, -5],
    [ -5,  0,  0,  0,  0,  0,  0, -5],
    [ -5,  0,  0,  0,  0,  0,  0, -5],
    [ -5,  0,  0,  0,  0,  0,  0, -5],
    [  0,  0,  0,  5,  5,  0,  0,  0],
];

#[rustfmt::skip]
const QUEEN_TABLE: [[i32; 8]; 8] = [
    [-20,-10,-10, -5, -5,-10,-10,-20],
    [-10,  0,  0,  0,  0,  0,  0,-10],
    [-10,  0,  5,  5,  5,  5,  0,-10],
    [ -5,  0,  5,  5,  5,  5,  0, -5],
    [  0,  0,  5,  5,  5,  5,  0, -5],
    [-10,  5,  5,  5,  5,  5,  0,-10],
    [-10,  0,  5,  0,  0,  0,  0,-10],
    [-20,-10,-10, -5, -5,-10,-10,-20],
];

#[rustfmt::skip]
const KING_MIDDLEGAME_TABLE: [[i32; 8]; 8] = [
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-20,-30,-30,-40,-40,-30,-30,-20],
    [-10,-20,-20,-20,-20,-20,-20,-10],
    [ 20, 20,  0,  0,  0,  0, 20, 20],
    [ 20, 30, 10,  0,  0, 10, 30, 20],
];

#[rustfmt::skip]
const KING_ENDGAME_TABLE: [[i32; 8]; 8] = [
    [-50,-40,-30,-20,-20,-30,-40,-50],
    [-30,-20,-10,  0,  0,-10,-20,-30],
    [-30,-10, 20, 30, 30, 20,-10,-30],
    [-30,-10, 30, 40, 40, 30,-10,-30],
    [-30,-10, 30, 40, 40, 30,-10,-30],
    [-30,-10, 20, 30, 30, 20,-10,-30],
    [-30,-30,  0,  0,  0,  0,-30,-30],
    [-50,-30,-30,-30,-30,-30,-30,-50],
];

/// 可选评估项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalTerms {
    /// 叠兵、孤兵、通路兵
    pub pawn_structure: bool,
    /// 中局王前兵盾
    pub king_safety: bool,
    /// 伪合法走法数量差
    pub mobility: bool,
}

impl EvalTerms {
    pub fn all() -> Self {
        EvalTerms {
            pawn_structure: true,
            king_safety: true,
            mobility: true,
        }
    }
}

/// 评估器
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    terms: EvalTerms,
}

impl Evaluator {
    pub fn new(terms: EvalTerms) -> Self {
        Evaluator { terms }
    }

    pub fn terms(&self) -> EvalTerms {
        self.terms
    }

    /// 白方视角分数
    pub fn evaluate(&self, board: &Board) -> i32 {
        let endgame = is_endgame(board);
        let mut score = 0;

        for piece in board.all_pieces() {
            let value = if piece.kind == PieceKind::King {
                0
            } else {
                piece.value()
            } + piece_square_value(piece, endgame);
            score += sign(piece.color) * value;
        }

        if self.terms.pawn_structure {
            score += pawn_structure(board, Color::White) - pawn_structure(board, Color::Black);
        }
        if self.terms.king_safety && !endgame {
            score += king_safety(board, Color::White) - king_safety(board, Color::Black);
        }
        if self.terms.mobility {
            score += MOBILITY_WEIGHT * (mobility(board, Color::White) - mobility(board, Color::Black));
        }

        score
    }

    /// 指定方视角分数（negamax 用）
    #[inline]
    pub fn evaluate_for(&self, board: &Board, color: Color) -> i32 {
        sign(color) * self.evaluate(board)
    }
}

#[inline]
fn sign(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

/// 非王子力总和低于阈值
pub fn is_endgame(board: &Board) -> bool {
    let material: i32 = board
        .all_pieces()
        .filter(|p| p.kind != PieceKind::King)
        .map(|p| p.value())
        .sum();
    material < ENDGAME_MATERIAL
}

/// 位置表分数（棋子自身视角）
pub fn piece_square_value(piece: &Piece, endgame: bool) -> i32 {
    let table = match piece.kind {
        PieceKind::Pawn => &PAWN_TABLE,
        PieceKind::Knight => &KNIGHT_TABLE,
        PieceKind::Bishop => &BISHOP_TABLE,
        PieceKind::Rook => &ROOK_TABLE,
        PieceKind::Queen => &QUEEN_TABLE,
        PieceKind::King if endgame => &KING_ENDGAME_TABLE,
        PieceKind::King => &KING_MIDDLEGAME_TABLE,
    };
    let row = match piece.color {
        Color::White => 7 - piece.square.row,
        Color::Black => piece.square.row,
    };
    table[row as usize][piece.square.col as usize]
}

fn pawn_structure(board: &Board, color: Color) -> i32 {
    let mut own_files = [0i32; 8];
    for p in board.pieces(color).filter(|p| p.kind == PieceKind::Pawn) {
        own_files[p.square.col as usize] += 1;
    }

    let mut score = 0;
    for count in own_files.iter() {
        if *count > 1 {
            score -= DOUBLED_PAWN_PENALTY * (count - 1);
        }
    }

    let enemy = color.opposite();
    for pawn in board.pieces(color).filter(|p| p.kind == PieceKind::Pawn) {
        let col = pawn.square.col;
        let left = if col > 0 { own_files[col as usize - 1] } else { 0 };
        let right = if col < 7 { own_files[col as usize + 1] } else { 0 };
        if left == 0 && right == 0 {
            score -= ISOLATED_PAWN_PENALTY;
        }

        // 通路兵：前方本列和相邻列没有对方兵
        let blocked = board.pieces(enemy).any(|e| {
            e.kind == PieceKind::Pawn
                && (e.square.col - col).abs() <= 1
                && (e.square.row - pawn.square.row) * color.forward() > 0
        });
        if !blocked {
            let advanced = ((pawn.square.row - (color.back_rank() + color.forward())) * color.forward()) as i32;
            score += PASSED_PAWN_BONUS + PASSED_PAWN_RANK_BONUS * advanced;
        }
    }

    score
}

fn king_safety(board: &Board, color: Color) -> i32 {
    let Some(king) = board.get_king(color) else {
        return 0;
    };
    let mut shield = 0;
    for dr in 1..=2 {
        for dc in -1..=1 {
            let sq = king.square.offset(dr * color.forward(), dc);
            if matches!(board.get_square(sq), Some(p) if p.color == color && p.kind == PieceKind::Pawn) {
                shield += 1;
            }
        }
    }
    PAWN_SHIELD_BONUS * shield
}

fn mobility(board: &Board, color: Color) -> i32 {
    board
        .pieces(color)
        .map(|p| pieces::mobility(board, p) as i32)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions;
    use crate::types::Square;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn test_start_position_balanced() {
        let board = Board::standard();
        assert_eq!(Evaluator::default().evaluate(&board), 0);
        assert_eq!(Evaluator::new(EvalTerms::all()).evaluate(&board), 0);
        assert!(!is_endgame(&board));
    }

    #[test]
    fn test_material_advantage() {
        let board = Board::from_fen(test_positions::HANGING_QUEEN).unwrap();
        let eval = Evaluator::default();
        // 黑方多一个后换一个车
        assert!(eval.evaluate(&board) < -300);
        assert_eq!(
            eval.evaluate_for(&board, Color::Black),
            -eval.evaluate(&board)
        );
    }

    #[test]
    fn test_piece_square_orientation() {
        // 白兵在第 7 横排、黑兵在第 2 横排都是即将升变，应得到相同的高分
        let board = Board::from_fen("4k3/P7/8/8/8/8/p7/4K3 w - - 0 1").unwrap();
        let white = board.get_square(sq("a7")).unwrap();
        let black = board.get_square(sq("a2")).unwrap();
        assert_eq!(piece_square_value(white, false), 50);
        assert_eq!(piece_square_value(black, false), 50);

        // 中心马比边马好
        let board = Board::from_fen("4k3/8/8/8/3N4/8/8/N3K3 w - - 0 1").unwrap();
        let center = board.get_square(sq("d4")).unwrap();
        let corner = board.get_square(sq("a1")).unwrap();
        assert!(piece_square_value(center, false) > piece_square_value(corner, false));
    }

    #[test]
    fn test_king_table_switches_in_endgame() {
        let board = Board::from_fen("4k3/8/8/8/3K4/8/8/8 w - - 0 1").unwrap();
        assert!(is_endgame(&board));
        let king = board.get_square(sq("d4")).unwrap();
        assert_eq!(piece_square_value(king, true), 40);
        assert_eq!(piece_square_value(king, false), -40);
    }

    #[test]
    fn test_mirror_symmetry() {
        // 颜色互换且上下翻转后分数取反
        let a = Board::from_fen("4k3/pp6/8/8/4N3/8/5PPP/4K2R w - - 0 1").unwrap();
        let b = Board::from_fen("4k2r/5ppp/8/4n3/8/8/PP6/4K3 w - - 0 1").unwrap();
        let eval = Evaluator::new(EvalTerms::all());
        assert_eq!(eval.evaluate(&a), -eval.evaluate(&b));
    }

    #[test]
    fn test_pawn_structure_terms() {
        // 白方叠兵且孤兵，黑方 h 兵是通路兵
        let board = Board::from_fen("4k3/2p5/8/8/8/2P5/2P4p/4K3 w - - 0 1").unwrap();
        assert!(pawn_structure(&board, Color::White) < 0);
        assert!(pawn_structure(&board, Color::Black) > 0);
    }

    #[test]
    fn test_king_shield() {
        let board = Board::from_fen("4k3/8/8/8/8/8/5PPP/6K1 w - - 0 1").unwrap();
        assert_eq!(king_safety(&board, Color::White), 30);
        assert_eq!(king_safety(&board, Color::Black), 0);
    }
}

//! 棋子走法规则
//!
//! 只判断棋子本身的走法几何（含路径阻挡、易位和过路兵条件），
//! 不检查走后己方王是否被将军，那一步由 `Board::verify_move` 完成。

use crate::board::{Board, Piece};
use crate::types::{PieceKind, Square};

pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

pub const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

pub const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

pub const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// 棋子走到 `to` 是否符合走法规则
pub fn is_valid_move(board: &Board, piece: &Piece, to: Square) -> bool {
    if !to.is_valid() || to == piece.square {
        return false;
    }
    if let Some(target) = board.get_square(to) {
        if target.color == piece.color {
            return false;
        }
    }

    match piece.kind {
        PieceKind::Pawn => is_valid_pawn_move(board, piece, to),
        PieceKind::Knight => {
            let dr = (to.row - piece.square.row).abs();
            let dc = (to.col - piece.square.col).abs();
            (dr == 1 && dc == 2) || (dr == 2 && dc == 1)
        }
        PieceKind::Bishop => is_valid_slide(board, piece.square, to, true, false),
        PieceKind::Rook => is_valid_slide(board, piece.square, to, false, true),
        PieceKind::Queen => is_valid_slide(board, piece.square, to, true, true),
        PieceKind::King => {
            let dr = (to.row - piece.square.row).abs();
            let dc = (to.col - piece.square.col).abs();
            if dr <= 1 && dc <= 1 {
                true
            } else {
                dr == 0 && dc == 2 && is_valid_castle(board, piece, to)
            }
        }
    }
}

fn is_valid_pawn_move(board: &Board, pawn: &Piece, to: Square) -> bool {
    let forward = pawn.color.forward();
    let from = pawn.square;
    let dr = to.row - from.row;
    let dc = to.col - from.col;
    let target = board.get_square(to);

    // 直进
    if dc == 0 {
        if target.is_some() {
            return false;
        }
        if dr == forward {
            return true;
        }
        return dr == 2 * forward
            && !pawn.has_moved
            && board.get_square(from.offset(forward, 0)).is_none();
    }

    if dc.abs() != 1 || dr != forward {
        return false;
    }

    // 斜吃
    if target.is_some() {
        return true;
    }

    // 吃过路兵：旁边是刚走了两格的对方兵
    match board.en_passant_pawn() {
        Some(ep) => ep.color != pawn.color && ep.square == Square::new(from.row, to.col),
        None => false,
    }
}

/// 直线/斜线滑行：方向匹配且中间无子
fn is_valid_slide(board: &Board, from: Square, to: Square, diagonal: bool, straight: bool) -> bool {
    let dr = to.row - from.row;
    let dc = to.col - from.col;
    let on_diagonal = dr.abs() == dc.abs();
    let on_line = dr == 0 || dc == 0;
    if !((diagonal && on_diagonal) || (straight && on_line)) {
        return false;
    }

    let (step_r, step_c) = (dr.signum(), dc.signum());
    let mut sq = from.offset(step_r, step_c);
    while sq != to {
        if board.get_square(sq).is_some() {
            return false;
        }
        sq = sq.offset(step_r, step_c);
    }
    true
}

/// 易位：王车都未动过、中间无子、王不在将军中且途经格与落点不受攻击
fn is_valid_castle(board: &Board, king: &Piece, to: Square) -> bool {
    let row = king.square.row;
    if king.has_moved || row != king.color.back_rank() || king.square.col != 4 {
        return false;
    }

    let step = (to.col - king.square.col).signum();
    let rook_col = if step > 0 { 7 } else { 0 };
    match board.get_square(Square::new(row, rook_col)) {
        Some(rook) if rook.kind == PieceKind::Rook && rook.color == king.color && !rook.has_moved => {}
        _ => return false,
    }

    let (low, high) = if step > 0 {
        (king.square.col + 1, rook_col)
    } else {
        (rook_col + 1, king.square.col)
    };
    if (low..high).any(|col| board.get_square(Square::new(row, col)).is_some()) {
        return false;
    }

    let enemy = king.color.opposite();
    if board.is_square_attacked(king.square, enemy) {
        return false;
    }
    (1..=2).all(|i| !board.is_square_attacked(Square::new(row, king.square.col + step * i), enemy))
}

/// 候选落点：只按几何生成（不看棋盘），结果是合法落点的超集
pub fn candidate_targets(piece: &Piece) -> Vec<Square> {
    let from = piece.square;
    let mut targets = Vec::with_capacity(28);

    match piece.kind {
        PieceKind::Pawn => {
            let f = piece.color.forward();
            for (dr, dc) in [(f, 0), (2 * f, 0), (f, -1), (f, 1)] {
                targets.push(from.offset(dr, dc));
            }
        }
        PieceKind::Knight => {
            for (dr, dc) in KNIGHT_OFFSETS {
                targets.push(from.offset(dr, dc));
            }
        }
        PieceKind::King => {
            for (dr, dc) in KING_OFFSETS {
                targets.push(from.offset(dr, dc));
            }
            targets.push(from.offset(0, 2));
            targets.push(from.offset(0, -2));
        }
        PieceKind::Bishop => push_rays(from, &BISHOP_DIRECTIONS, &mut targets),
        PieceKind::Rook => push_rays(from, &ROOK_DIRECTIONS, &mut targets),
        PieceKind::Queen => {
            push_rays(from, &ROOK_DIRECTIONS, &mut targets);
            push_rays(from, &BISHOP_DIRECTIONS, &mut targets);
        }
    }

    targets.retain(|sq| sq.is_valid());
    targets
}

fn push_rays(from: Square, directions: &[(i8, i8)], targets: &mut Vec<Square>) {
    for &(dr, dc) in directions {
        let mut sq = from.offset(dr, dc);
        while sq.is_valid() {
            targets.push(sq);
            sq = sq.offset(dr, dc);
        }
    }
}

/// 伪合法走法数量（不检查王的安全），用于机动性评估
pub fn mobility(board: &Board, piece: &Piece) -> usize {
    candidate_targets(piece)
        .into_iter()
        .filter(|&to| is_valid_move(board, piece, to))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn piece_at(board: &Board, s: &str) -> Piece {
        *board.get_square(sq(s)).unwrap()
    }

    #[test]
    fn test_knight_moves() {
        let board = Board::standard();
        let knight = piece_at(&board, "g1");
        assert!(is_valid_move(&board, &knight, sq("f3")));
        assert!(is_valid_move(&board, &knight, sq("h3")));
        // e2 是己方兵
        assert!(!is_valid_move(&board, &knight, sq("e2")));
        assert!(!is_valid_move(&board, &knight, sq("g3")));
        assert_eq!(mobility(&board, &knight), 2);
    }

    #[test]
    fn test_sliders_blocked() {
        let board = Board::standard();
        let rook = piece_at(&board, "a1");
        let bishop = piece_at(&board, "c1");
        let queen = piece_at(&board, "d1");
        assert!(!is_valid_move(&board, &rook, sq("a3")));
        assert!(!is_valid_move(&board, &bishop, sq("e3")));
        assert!(!is_valid_move(&board, &queen, sq("d3")));
        assert_eq!(mobility(&board, &queen), 0);
    }

    #[test]
    fn test_queen_geometry() {
        let mut board = Board::new();
        board.place_piece(sq("d4"), Color::White, PieceKind::Queen, true);
        let queen = piece_at(&board, "d4");
        assert!(is_valid_move(&board, &queen, sq("d8")));
        assert!(is_valid_move(&board, &queen, sq("h8")));
        assert!(is_valid_move(&board, &queen, sq("a1")));
        assert!(!is_valid_move(&board, &queen, sq("e6")));
        assert_eq!(mobility(&board, &queen), 27);
    }

    #[test]
    fn test_pawn_moves() {
        let board = Board::from_fen("4k3/8/8/8/8/2p5/1P6/4K3 w - - 0 1").unwrap();
        let pawn = piece_at(&board, "b2");
        assert!(is_valid_move(&board, &pawn, sq("b3")));
        assert!(is_valid_move(&board, &pawn, sq("b4")));
        assert!(is_valid_move(&board, &pawn, sq("c3")));
        // 没有子可吃时不能斜走
        assert!(!is_valid_move(&board, &pawn, sq("a3")));
        // 不能后退
        assert!(!is_valid_move(&board, &pawn, sq("b1")));

        let black = piece_at(&board, "c3");
        assert!(is_valid_move(&board, &black, sq("c2")));
        assert!(is_valid_move(&board, &black, sq("b2")));
        // 已经走过，不能再走两格
        assert!(!is_valid_move(&board, &black, sq("c1")));
    }

    #[test]
    fn test_candidate_targets_superset() {
        let board = Board::from_fen(crate::test_positions::KIWIPETE).unwrap();
        for piece in board.all_pieces() {
            let candidates = candidate_targets(piece);
            for to in Square::all() {
                if is_valid_move(&board, piece, to) {
                    assert!(candidates.contains(&to), "{:?} -> {} missing", piece, to);
                }
            }
        }
    }
}

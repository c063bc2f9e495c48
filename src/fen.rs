//! FEN 解析和生成
//!
//! 格式: `<棋盘> <行棋方> <易位权> <过路兵目标格> [<半回合> <回合数>]`
//!
//! 棋盘符号：
//! - 白方：K Q R B N P
//! - 黑方：k q r b n p
//! - 空格：数字 (1-8)
//!
//! 棋盘本身不保存易位权和过路兵目标格，而是保存棋子的 `has_moved`
//! 和"刚走两格的兵"，这里负责两种表示之间的换算。

use crate::board::{Board, CastlingRights};
use crate::error::{ChessError, ChessResult};
use crate::types::{Color, Move, PieceKind, Square};

/// FEN 中的棋子
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenPiece {
    pub square: Square,
    pub color: Color,
    pub kind: PieceKind,
}

/// FEN 解析后的状态
#[derive(Debug, Clone)]
pub struct FenState {
    pub pieces: Vec<FenPiece>,
    pub turn: Color,
    pub castling: CastlingRights,
    /// 过路兵目标格（被越过的那一格）
    pub en_passant: Option<Square>,
    pub halfmove: u32,
    pub fullmove: u32,
}

/// 解析 FEN 字符串
pub fn parse_fen(fen: &str) -> ChessResult<FenState> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() != 4 && parts.len() != 6 {
        return Err(ChessError::InvalidFen(format!(
            "expected 4 or 6 fields, got {}: {}",
            parts.len(),
            fen
        )));
    }

    let pieces = parse_board(parts[0])?;

    let mut turn_chars = parts[1].chars();
    let turn = match (turn_chars.next(), turn_chars.next()) {
        (Some(c), None) => Color::from_fen_char(c),
        _ => None,
    }
    .ok_or_else(|| ChessError::InvalidFen(format!("invalid side to move: {}", parts[1])))?;

    let castling = parse_castling(parts[2])?;

    let en_passant = match parts[3] {
        "-" => None,
        s => Some(Square::from_algebraic(s).ok_or_else(|| {
            ChessError::InvalidFen(format!("invalid en passant square: {}", s))
        })?),
    };

    let (halfmove, fullmove) = if parts.len() == 6 {
        let halfmove = parts[4]
            .parse()
            .map_err(|_| ChessError::InvalidFen(format!("invalid halfmove clock: {}", parts[4])))?;
        let fullmove = parts[5]
            .parse()
            .map_err(|_| ChessError::InvalidFen(format!("invalid fullmove number: {}", parts[5])))?;
        (halfmove, fullmove)
    } else {
        (0, 1)
    };

    Ok(FenState {
        pieces,
        turn,
        castling,
        en_passant,
        halfmove,
        fullmove,
    })
}

/// 解析棋盘字符串
fn parse_board(board_str: &str) -> ChessResult<Vec<FenPiece>> {
    let rows: Vec<&str> = board_str.split('/').collect();
    if rows.len() != 8 {
        return Err(ChessError::InvalidFen(format!(
            "expected 8 ranks, got {}",
            rows.len()
        )));
    }

    let mut pieces = Vec::new();

    for (row_idx, row_str) in rows.iter().enumerate() {
        // FEN 从上往下是第 8 横排到第 1 横排
        let row = (7 - row_idx) as i8;
        let mut col: i8 = 0;

        for ch in row_str.chars() {
            if let Some(skip) = ch.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(ChessError::InvalidFen(format!("invalid empty count: {}", ch)));
                }
                col += skip as i8;
                if col > 8 {
                    return Err(ChessError::InvalidFen(format!(
                        "rank {} has more than 8 files",
                        row + 1
                    )));
                }
            } else {
                let kind = PieceKind::from_fen_char(ch)
                    .ok_or_else(|| ChessError::InvalidFen(format!("invalid piece char: {}", ch)))?;
                if col >= 8 {
                    return Err(ChessError::InvalidFen(format!(
                        "rank {} has more than 8 files",
                        row + 1
                    )));
                }
                let color = if ch.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                pieces.push(FenPiece {
                    square: Square::new(row, col),
                    color,
                    kind,
                });
                col += 1;
            }
        }

        if col != 8 {
            return Err(ChessError::InvalidFen(format!(
                "rank {} has {} files, expected 8",
                row + 1,
                col
            )));
        }
    }

    Ok(pieces)
}

fn parse_castling(s: &str) -> ChessResult<CastlingRights> {
    if s == "-" {
        return Ok(CastlingRights::default());
    }
    let mut bits = 0;
    for ch in s.chars() {
        bits |= match ch {
            'K' => CastlingRights::WHITE_KINGSIDE,
            'Q' => CastlingRights::WHITE_QUEENSIDE,
            'k' => CastlingRights::BLACK_KINGSIDE,
            'q' => CastlingRights::BLACK_QUEENSIDE,
            _ => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid castling rights: {}",
                    s
                )))
            }
        };
    }
    Ok(CastlingRights::from_bits(bits))
}

fn castling_to_string(rights: CastlingRights) -> String {
    let mut s = String::new();
    for (flag, ch) in [
        (CastlingRights::WHITE_KINGSIDE, 'K'),
        (CastlingRights::WHITE_QUEENSIDE, 'Q'),
        (CastlingRights::BLACK_KINGSIDE, 'k'),
        (CastlingRights::BLACK_QUEENSIDE, 'q'),
    ] {
        if rights.has(flag) {
            s.push(ch);
        }
    }
    if s.is_empty() {
        s.push('-');
    }
    s
}

/// 根据 FEN 信息推导棋子是否走过
fn initial_has_moved(piece: &FenPiece, castling: CastlingRights) -> bool {
    let back_rank = piece.color.back_rank();
    match piece.kind {
        PieceKind::Pawn => {
            let start_row = back_rank + piece.color.forward();
            piece.square.row != start_row
        }
        PieceKind::King => {
            let home = piece.square == Square::new(back_rank, 4);
            let any_right = castling.has(CastlingRights::flag(piece.color, true))
                || castling.has(CastlingRights::flag(piece.color, false));
            !(home && any_right)
        }
        PieceKind::Rook => {
            let right = if piece.square == Square::new(back_rank, 7) {
                castling.has(CastlingRights::flag(piece.color, true))
            } else if piece.square == Square::new(back_rank, 0) {
                castling.has(CastlingRights::flag(piece.color, false))
            } else {
                false
            };
            !right
        }
        _ => false,
    }
}

impl Board {
    /// 从 FEN 构建棋盘（不做布局校验，需要时调用 `validate_setup`）
    pub fn from_fen(fen: &str) -> ChessResult<Board> {
        let state = parse_fen(fen)?;
        let mut board = Board::new();

        for piece in &state.pieces {
            let has_moved = initial_has_moved(piece, state.castling);
            board.place_piece(piece.square, piece.color, piece.kind, has_moved);
        }
        board.set_turn(state.turn);

        if let Some(target) = state.en_passant {
            // 目标格前方一格是刚走两格的对方兵
            let mover = state.turn.opposite();
            let pawn_sq = target.offset(mover.forward(), 0);
            let is_pawn = matches!(
                board.get_square(pawn_sq),
                Some(p) if p.kind == PieceKind::Pawn && p.color == mover
            );
            if !is_pawn {
                return Err(ChessError::InvalidFen(format!(
                    "no {} pawn in front of en passant square {}",
                    mover, target
                )));
            }
            board.set_en_passant_pawn(Some(pawn_sq));
        }

        Ok(board)
    }

    /// 生成 FEN 字符串（不记录半回合计数，固定输出 "0 1"）
    pub fn to_fen(&self) -> String {
        let pieces: Vec<FenPiece> = self
            .all_pieces()
            .map(|p| FenPiece {
                square: p.square,
                color: p.color,
                kind: p.kind,
            })
            .collect();

        let en_passant = self
            .en_passant_pawn()
            .map(|p| p.square.offset(-p.color.forward(), 0));

        pieces_to_fen(&pieces, self.turn(), self.castling_rights(), en_passant)
    }
}

/// 从棋子列表生成 FEN 字符串
pub fn pieces_to_fen(
    pieces: &[FenPiece],
    turn: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
) -> String {
    let mut grid: [[Option<&FenPiece>; 8]; 8] = [[None; 8]; 8];
    for piece in pieces {
        if piece.square.is_valid() {
            grid[piece.square.row as usize][piece.square.col as usize] = Some(piece);
        }
    }

    let mut rows = Vec::with_capacity(8);
    for row in grid.iter().rev() {
        let mut row_str = String::new();
        let mut empty_count = 0;

        for cell in row {
            match cell {
                Some(piece) => {
                    if empty_count > 0 {
                        row_str.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    let ch = piece.kind.to_fen_char();
                    row_str.push(match piece.color {
                        Color::White => ch.to_ascii_uppercase(),
                        Color::Black => ch,
                    });
                }
                None => empty_count += 1,
            }
        }

        if empty_count > 0 {
            row_str.push_str(&empty_count.to_string());
        }
        rows.push(row_str);
    }

    let en_passant_str = en_passant
        .map(|sq| sq.to_algebraic())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} {} {} 0 1",
        rows.join("/"),
        turn.to_fen_char(),
        castling_to_string(castling),
        en_passant_str
    )
}

/// 在 FEN 上执行一步走法，返回新的 FEN（走法必须合法）
pub fn apply_move_to_fen(fen: &str, move_str: &str) -> ChessResult<String> {
    let mut board = Board::from_fen(fen)?;
    let mv = Move::from_uci(move_str)
        .ok_or_else(|| ChessError::InvalidMove(move_str.to_string()))?;
    let color = board.turn();
    if !board.verify_move(mv.from, mv.to, color, mv.promotion) {
        return Err(ChessError::IllegalMove(format!("{} in {}", move_str, fen)));
    }
    board.move_piece(mv.from, mv.to, mv.promotion);
    Ok(board.to_fen())
}

/// 从 FEN 获取当前走子方的合法走法（UCI 格式）
pub fn legal_moves_from_fen(fen: &str) -> ChessResult<Vec<String>> {
    let mut board = Board::from_fen(fen)?;
    let color = board.turn();
    Ok(board
        .legal_moves(color)
        .into_iter()
        .map(|mv| mv.to_uci())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions;

    #[test]
    fn test_parse_initial_fen() {
        let state = parse_fen(test_positions::START).unwrap();
        assert_eq!(state.pieces.len(), 32);
        assert_eq!(state.turn, Color::White);
        assert_eq!(state.castling.bits(), 0x0f);
        assert!(state.en_passant.is_none());
        assert_eq!(state.fullmove, 1);
    }

    #[test]
    fn test_legal_moves_from_fen() {
        let moves = legal_moves_from_fen(test_positions::START).unwrap();
        assert_eq!(moves.len(), 20);
        assert!(moves.contains(&"e2e4".to_string()));
        assert!(legal_moves_from_fen("bad fen").is_err());
    }

    #[test]
    fn test_fen_roundtrip() {
        for fen in [
            test_positions::START,
            test_positions::KIWIPETE,
            test_positions::CASTLING_READY,
            test_positions::STALEMATE,
        ] {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(board.to_fen(), fen);
        }
    }

    #[test]
    fn test_standard_matches_start_fen() {
        assert_eq!(Board::standard().to_fen(), test_positions::START);
    }

    #[test]
    fn test_has_moved_from_fen() {
        // 只有后翼易位权
        let board = Board::from_fen("r3k2r/8/8/8/8/8/4P3/R3K2R w Q - 0 1").unwrap();
        let at = |s: &str| *board.get_square(Square::from_algebraic(s).unwrap()).unwrap();
        assert!(!at("e1").has_moved);
        assert!(!at("a1").has_moved);
        assert!(at("h1").has_moved);
        assert!(at("e8").has_moved);
        assert!(!at("e2").has_moved);
    }

    #[test]
    fn test_en_passant_field() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(
            board.en_passant_pawn().unwrap().square,
            Square::from_algebraic("d5").unwrap()
        );
        assert_eq!(board.to_fen(), fen);

        // 目标格前方没有兵
        assert!(Board::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1").is_err());
    }

    #[test]
    fn test_invalid_fen() {
        assert!(parse_fen("").is_err());
        assert!(parse_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(parse_fen("9/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(parse_fen("8/8/8/8/8/8/8/7x w - - 0 1").is_err());
        // 空格数累加超过 8 列
        assert!(parse_fen("54/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(parse_fen(&format!("{}/8/8/8/8/8/8/4K2k w - - 0 1", "8".repeat(16))).is_err());
        assert!(parse_fen(&format!("{}/8/8/8/8/8/8/4K2k w - - 0 1", "8".repeat(33))).is_err());
        assert!(parse_fen("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
        assert!(parse_fen("8/8/8/8/8/8/8/8 w KX - 0 1").is_err());
        assert!(parse_fen("8/8/8/8/8/8/8/8 w - - a 1").is_err());
        // 省略回合计数也可以
        assert!(parse_fen("8/8/8/8/8/8/8/8 w - -").is_ok());
    }

    #[test]
    fn test_apply_move() {
        let new_fen = apply_move_to_fen(test_positions::START, "e2e4").unwrap();
        assert_eq!(
            new_fen,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        assert!(apply_move_to_fen(test_positions::START, "e2e5").is_err());
        assert!(apply_move_to_fen(test_positions::START, "zz").is_err());
    }
}

//! 国际象棋核心类型定义
//!
//! 定义棋盘坐标、棋子种类、阵营与走法等基础数据类型

use serde::Serialize;
use std::fmt;

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// 获取对方阵营
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// 数组下标：White=0, Black=1
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// 兵的前进方向（行增量）
    #[inline]
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// 底线所在行
    #[inline]
    pub fn back_rank(&self) -> i8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// 转换为 FEN 字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// 棋子种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// 升变可选的棋子（按常用程度排序）
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// 数组下标 0-5
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        }
    }

    /// 从 FEN 字符解析（大小写不敏感）
    pub fn from_fen_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// 转换为 FEN 字符（小写）
    pub fn to_fen_char(&self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// 棋子价值（厘兵）
    pub fn value(&self) -> i32 {
        match self {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 20000,
        }
    }

    /// 是否是合法的升变目标
    #[inline]
    pub fn is_promotion_target(&self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        )
    }

    /// 是否是滑行棋子（象/车/后）
    #[inline]
    pub fn is_slider(&self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "Pawn",
            PieceKind::Knight => "Knight",
            PieceKind::Bishop => "Bishop",
            PieceKind::Rook => "Rook",
            PieceKind::Queen => "Queen",
            PieceKind::King => "King",
        };
        write!(f, "{}", name)
    }
}

/// 棋盘坐标 (row, col)
///
/// row: 0-7 (0 是白方底线，即第 1 横排)
/// col: 0-7 (0 是 a 列)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub row: i8,
    pub col: i8,
}

impl Square {
    pub fn new(row: i8, col: i8) -> Self {
        Square { row, col }
    }

    /// 检查坐标是否在棋盘范围内
    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..8).contains(&self.row) && (0..8).contains(&self.col)
    }

    /// 坐标加偏移量（可能越界，调用方用 is_valid 检查）
    #[inline]
    pub fn offset(&self, row_delta: i8, col_delta: i8) -> Square {
        Square {
            row: self.row + row_delta,
            col: self.col + col_delta,
        }
    }

    /// 转换为 0-63 的数组下标
    #[inline]
    pub fn to_index(&self) -> usize {
        (self.row as usize) * 8 + self.col as usize
    }

    /// 从数组下标还原坐标
    #[inline]
    pub fn from_index(index: usize) -> Square {
        Square {
            row: (index / 8) as i8,
            col: (index % 8) as i8,
        }
    }

    /// 遍历全部 64 个格子
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square::from_index)
    }

    /// 从代数坐标解析（如 "e4"）
    pub fn from_algebraic(s: &str) -> Option<Square> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let col = match bytes[0] {
            b'a'..=b'h' => (bytes[0] - b'a') as i8,
            _ => return None,
        };
        let row = match bytes[1] {
            b'1'..=b'8' => (bytes[1] - b'1') as i8,
            _ => return None,
        };
        Some(Square { row, col })
    }

    /// 转换为代数坐标（如 "e4"）
    pub fn to_algebraic(&self) -> String {
        let col_char = (b'a' + self.col as u8) as char;
        format!("{}{}", col_char, self.row + 1)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.to_algebraic())
        } else {
            write!(f, "({},{})", self.row, self.col)
        }
    }
}

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    /// 升变目标，None 表示不升变（或由执行方默认升后）
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// 创建普通走法
    pub fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    /// 创建升变走法
    pub fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Move {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// 从 UCI 字符串解析（如 "e2e4"、"e7e8q"）
    ///
    /// 第五个字符不是合法升变棋子时按后处理。
    pub fn from_uci(s: &str) -> Option<Move> {
        let s = s.trim();
        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = s[4..].chars().next().map(promotion_from_char);
        Some(Move {
            from,
            to,
            promotion,
        })
    }

    /// 转换为 UCI 字符串
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(kind) => format!(
                "{}{}{}",
                self.from.to_algebraic(),
                self.to.to_algebraic(),
                kind.to_fen_char()
            ),
            None => format!("{}{}", self.from.to_algebraic(), self.to.to_algebraic()),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// 把升变字符解释为棋子种类，非法字符默认升后
pub fn promotion_from_char(c: char) -> PieceKind {
    match PieceKind::from_fen_char(c) {
        Some(kind) if kind.is_promotion_target() => kind,
        Some(PieceKind::King) => {
            log::warn!("cannot promote pawn to king, promoting to queen");
            PieceKind::Queen
        }
        _ => PieceKind::Queen,
    }
}

/// 游戏结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameResult {
    Ongoing,
    WhiteWin,
    BlackWin,
    Draw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_from_algebraic() {
        assert_eq!(Square::from_algebraic("a1"), Some(Square::new(0, 0)));
        assert_eq!(Square::from_algebraic("e4"), Some(Square::new(3, 4)));
        assert_eq!(Square::from_algebraic("h8"), Some(Square::new(7, 7)));
        assert_eq!(Square::from_algebraic("i1"), None);
        assert_eq!(Square::from_algebraic("a9"), None);
    }

    #[test]
    fn test_square_index() {
        for sq in Square::all() {
            assert!(sq.is_valid());
            assert_eq!(Square::from_index(sq.to_index()), sq);
        }
        assert!(!Square::new(8, 0).is_valid());
        assert!(!Square::new(0, -1).is_valid());
    }

    #[test]
    fn test_move_from_uci() {
        let m = Move::from_uci("e2e4").unwrap();
        assert_eq!(m.from, Square::new(1, 4));
        assert_eq!(m.to, Square::new(3, 4));
        assert!(m.promotion.is_none());

        let m = Move::from_uci("a7a8n").unwrap();
        assert_eq!(m.promotion, Some(PieceKind::Knight));
        assert_eq!(m.to_uci(), "a7a8n");

        // 非法升变字符按后处理
        let m = Move::from_uci("a7a8k").unwrap();
        assert_eq!(m.promotion, Some(PieceKind::Queen));

        assert!(Move::from_uci("e2").is_none());
        assert!(Move::from_uci("z2e4").is_none());
    }

    #[test]
    fn test_color_helpers() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.forward(), -1);
        assert_eq!(Color::Black.back_rank(), 7);
        assert_eq!(Color::from_fen_char('w'), Some(Color::White));
        assert_eq!(Color::from_fen_char('x'), None);
    }
}

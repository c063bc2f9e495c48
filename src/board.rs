//! 国际象棋棋盘（数组 + 棋子仓库）
//!
//! 棋子统一存放在 `arena` 中，64 格数组与双方名册只保存下标。
//! 搜索与合法性检查使用 `make_move` / `unmake_move` 就地模拟，不复制棋盘。

use crate::error::SetupError;
use crate::pieces::{self, BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS, ROOK_DIRECTIONS};
use crate::types::{Color, GameResult, Move, PieceKind, Square};
use log::warn;
use std::fmt;
use std::sync::Arc;

/// 棋子在仓库中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId(u16);

impl PieceId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
    pub has_moved: bool,
}

impl Piece {
    /// 棋子价值（厘兵）
    #[inline]
    pub fn value(&self) -> i32 {
        self.kind.value()
    }
}

/// 易位权（由王和车的 has_moved 推导）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;

    pub fn from_bits(bits: u8) -> Self {
        CastlingRights(bits & 0x0f)
    }

    #[inline]
    pub fn bits(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn has(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// 某方某侧的标志位
    pub fn flag(color: Color, kingside: bool) -> u8 {
        match (color, kingside) {
            (Color::White, true) => Self::WHITE_KINGSIDE,
            (Color::White, false) => Self::WHITE_QUEENSIDE,
            (Color::Black, true) => Self::BLACK_KINGSIDE,
            (Color::Black, false) => Self::BLACK_QUEENSIDE,
        }
    }
}

/// 棋盘变更事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Placed(Square),
    Removed(Square),
    Moved(Move),
    Cleared,
    TurnChanged(Color),
    EnPassantChanged(Option<Square>),
}

/// 外部注册的变更监听器
pub type BoardListener = Arc<dyn Fn(&BoardEvent) + Send + Sync>;

/// 走法撤销记录
#[derive(Debug, Clone, Copy)]
pub struct Undo {
    mv: Move,
    mover: PieceId,
    mover_had_moved: bool,
    captured: Option<PieceId>,
    /// 易位时的车：(车, 原位置, 新位置, 原 has_moved)
    castle_rook: Option<(PieceId, Square, Square, bool)>,
    promoted: bool,
    prev_en_passant: Option<PieceId>,
    prev_turn: Color,
}

impl Undo {
    /// 被撤销的走法
    pub fn mv(&self) -> Move {
        self.mv
    }

    /// 该走法是否吃子（含吃过路兵）
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

/// 空着（null move）撤销记录
#[derive(Debug, Clone, Copy)]
pub struct NullUndo {
    prev_en_passant: Option<PieceId>,
    prev_turn: Color,
}

/// 棋盘
#[derive(Clone)]
pub struct Board {
    /// 棋子仓库，被吃的棋子在撤销前保留原槽位
    arena: Vec<Piece>,
    free: Vec<PieceId>,
    grid: [Option<PieceId>; 64],
    /// 双方名册 [White, Black]
    rosters: [Vec<PieceId>; 2],
    /// 刚走了两格的兵（只在下一步有效）
    en_passant: Option<PieceId>,
    turn: Color,
    listeners: Vec<BoardListener>,
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    /// 创建空棋盘
    pub fn new() -> Self {
        Board {
            arena: Vec::with_capacity(32),
            free: Vec::new(),
            grid: [None; 64],
            rosters: [Vec::with_capacity(16), Vec::with_capacity(16)],
            en_passant: None,
            turn: Color::White,
            listeners: Vec::new(),
        }
    }

    /// 创建带监听器的空棋盘
    pub fn with_listener(listener: BoardListener) -> Self {
        let mut board = Board::new();
        board.listeners.push(listener);
        board
    }

    /// 标准初始局面
    pub fn standard() -> Self {
        let mut board = Board::new();
        board.setup_standard();
        board
    }

    /// 清空并摆出标准初始局面
    pub fn setup_standard(&mut self) {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        self.clear();
        for (col, kind) in BACK_RANK.iter().enumerate() {
            let col = col as i8;
            self.place_piece(Square::new(0, col), Color::White, *kind, false);
            self.place_piece(Square::new(1, col), Color::White, PieceKind::Pawn, false);
            self.place_piece(Square::new(6, col), Color::Black, PieceKind::Pawn, false);
            self.place_piece(Square::new(7, col), Color::Black, *kind, false);
        }
        self.turn = Color::White;
    }

    /// 注册监听器
    pub fn subscribe(&mut self, listener: BoardListener) {
        self.listeners.push(listener);
    }

    /// 复制一份不带监听器的棋盘（用于搜索）
    pub fn detached(&self) -> Board {
        let mut board = self.clone();
        board.listeners.clear();
        board
    }

    fn notify(&self, event: BoardEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    // ------------------------------------------------------------------
    // 查询
    // ------------------------------------------------------------------

    /// 获取某格的棋子，越界返回 None
    #[inline]
    pub fn get_square(&self, sq: Square) -> Option<&Piece> {
        if !sq.is_valid() {
            return None;
        }
        self.grid[sq.to_index()].map(|id| &self.arena[id.index()])
    }

    /// 当前行棋方
    #[inline]
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// 设置行棋方（布局用）
    #[inline]
    pub fn set_turn(&mut self, color: Color) {
        self.turn = color;
        self.notify(BoardEvent::TurnChanged(color));
    }

    /// 某方的全部棋子
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = &Piece> + '_ {
        self.rosters[color.index()]
            .iter()
            .map(move |id| &self.arena[id.index()])
    }

    /// 双方全部棋子
    pub fn all_pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces(Color::White).chain(self.pieces(Color::Black))
    }

    /// 获取某方的王
    pub fn get_king(&self, color: Color) -> Option<&Piece> {
        self.pieces(color).find(|p| p.kind == PieceKind::King)
    }

    /// 某方王的数量（布局校验用）
    pub fn num_kings(&self, color: Color) -> usize {
        self.pieces(color)
            .filter(|p| p.kind == PieceKind::King)
            .count()
    }

    /// 可被吃过路兵的兵
    pub fn en_passant_pawn(&self) -> Option<&Piece> {
        self.en_passant.map(|id| &self.arena[id.index()])
    }

    /// 设置可被吃过路兵的兵；该格不是兵时清除并返回 false
    pub fn set_en_passant_pawn(&mut self, sq: Option<Square>) -> bool {
        self.en_passant = match sq {
            Some(sq) if sq.is_valid() => match self.grid[sq.to_index()] {
                Some(id) if self.arena[id.index()].kind == PieceKind::Pawn => Some(id),
                _ => None,
            },
            _ => None,
        };
        let current = self.en_passant.map(|id| self.arena[id.index()].square);
        self.notify(BoardEvent::EnPassantChanged(current));
        current == sq
    }

    /// 当前易位权
    pub fn castling_rights(&self) -> CastlingRights {
        let mut bits = 0;
        for color in [Color::White, Color::Black] {
            let row = color.back_rank();
            let king_home = matches!(
                self.get_square(Square::new(row, 4)),
                Some(p) if p.kind == PieceKind::King && p.color == color && !p.has_moved
            );
            if !king_home {
                continue;
            }
            for (col, kingside) in [(7, true), (0, false)] {
                let rook_home = matches!(
                    self.get_square(Square::new(row, col)),
                    Some(p) if p.kind == PieceKind::Rook && p.color == color && !p.has_moved
                );
                if rook_home {
                    bits |= CastlingRights::flag(color, kingside);
                }
            }
        }
        CastlingRights(bits)
    }

    // ------------------------------------------------------------------
    // 布局与执行
    // ------------------------------------------------------------------

    fn link(&mut self, id: PieceId) {
        let piece = self.arena[id.index()];
        self.grid[piece.square.to_index()] = Some(id);
        self.rosters[piece.color.index()].push(id);
    }

    fn unlink(&mut self, id: PieceId) {
        let piece = self.arena[id.index()];
        self.grid[piece.square.to_index()] = None;
        let roster = &mut self.rosters[piece.color.index()];
        if let Some(pos) = roster.iter().position(|&other| other == id) {
            roster.swap_remove(pos);
        }
    }

    fn relocate(&mut self, id: PieceId, to: Square) {
        let from = self.arena[id.index()].square;
        self.grid[from.to_index()] = None;
        self.grid[to.to_index()] = Some(id);
        self.arena[id.index()].square = to;
    }

    fn remove_at(&mut self, sq: Square) -> bool {
        let Some(id) = self.grid[sq.to_index()] else {
            return false;
        };
        self.unlink(id);
        if self.en_passant == Some(id) {
            self.en_passant = None;
        }
        self.free.push(id);
        true
    }

    /// 放置棋子（覆盖原有棋子，不做合法性检查）
    pub fn place_piece(&mut self, sq: Square, color: Color, kind: PieceKind, has_moved: bool) {
        if !sq.is_valid() {
            warn!("place_piece ignored: square {} is off the board", sq);
            return;
        }
        self.remove_at(sq);

        let piece = Piece {
            kind,
            color,
            square: sq,
            has_moved,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.arena[id.index()] = piece;
                id
            }
            None => {
                self.arena.push(piece);
                PieceId((self.arena.len() - 1) as u16)
            }
        };
        self.link(id);
        self.notify(BoardEvent::Placed(sq));
    }

    /// 移除棋子，空格不做任何事
    pub fn remove_piece(&mut self, sq: Square) {
        if sq.is_valid() && self.remove_at(sq) {
            self.notify(BoardEvent::Removed(sq));
        }
    }

    /// 移除全部棋子
    pub fn clear(&mut self) {
        self.arena.clear();
        self.free.clear();
        self.grid = [None; 64];
        self.rosters[0].clear();
        self.rosters[1].clear();
        self.en_passant = None;
        self.notify(BoardEvent::Cleared);
    }

    /// 无条件执行走法（调用方需保证合法）
    ///
    /// `promotion` 为 None 或非法棋子时升后。
    pub fn move_piece(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) {
        let mv = Move {
            from,
            to,
            promotion,
        };
        if let Some(undo) = self.make_move(mv) {
            if let Some(id) = undo.captured {
                self.free.push(id);
            }
            self.notify(BoardEvent::Moved(mv));
        }
    }

    /// 执行走法并返回撤销记录；起点无子或坐标越界时返回 None
    ///
    /// 顺序：过路兵标记 → 易位移车 → 吃过路兵 → 吃目标格 → 移动 → 升变。
    /// 必须与 `unmake_move` 成对使用：被吃棋子的槽位留在 `Undo` 里，
    /// 丢弃记录会泄漏槽位。外部调用走 `move_piece`。
    pub(crate) fn make_move(&mut self, mv: Move) -> Option<Undo> {
        if !mv.from.is_valid() || !mv.to.is_valid() || mv.from == mv.to {
            return None;
        }
        let mover = self.grid[mv.from.to_index()]?;
        let piece = self.arena[mover.index()];
        let prev_en_passant = self.en_passant;
        let prev_turn = self.turn;
        let dr = mv.to.row - mv.from.row;
        let dc = mv.to.col - mv.from.col;

        self.en_passant = if piece.kind == PieceKind::Pawn && dr.abs() == 2 {
            Some(mover)
        } else {
            None
        };

        let mut castle_rook = None;
        if piece.kind == PieceKind::King && dr == 0 && dc.abs() == 2 {
            let rook_from = Square::new(mv.from.row, if dc > 0 { 7 } else { 0 });
            let rook_to = Square::new(mv.from.row, mv.from.col + dc / 2);
            if let Some(rook) = self.grid[rook_from.to_index()] {
                if self.grid[rook_to.to_index()].is_none() {
                    let had_moved = self.arena[rook.index()].has_moved;
                    self.relocate(rook, rook_to);
                    self.arena[rook.index()].has_moved = true;
                    castle_rook = Some((rook, rook_from, rook_to, had_moved));
                }
            }
        }

        let mut captured = None;
        if piece.kind == PieceKind::Pawn && dc != 0 && self.grid[mv.to.to_index()].is_none() {
            let victim_sq = Square::new(mv.from.row, mv.to.col);
            if let Some(victim) = self.grid[victim_sq.to_index()] {
                if self.arena[victim.index()].color != piece.color {
                    self.unlink(victim);
                    captured = Some(victim);
                }
            }
        }

        if let Some(victim) = self.grid[mv.to.to_index()] {
            self.unlink(victim);
            captured = Some(victim);
        }

        self.relocate(mover, mv.to);
        self.arena[mover.index()].has_moved = true;

        let mut promoted = false;
        if piece.kind == PieceKind::Pawn && (mv.to.row == 0 || mv.to.row == 7) {
            let kind = match mv.promotion {
                Some(kind) if kind.is_promotion_target() => kind,
                Some(kind) => {
                    warn!("cannot promote pawn to {}, promoting to queen", kind);
                    PieceKind::Queen
                }
                None => PieceKind::Queen,
            };
            self.arena[mover.index()].kind = kind;
            promoted = true;
        }

        self.turn = piece.color.opposite();

        Some(Undo {
            mv,
            mover,
            mover_had_moved: piece.has_moved,
            captured,
            castle_rook,
            promoted,
            prev_en_passant,
            prev_turn,
        })
    }

    /// 撤销 `make_move`（必须按后进先出顺序调用）
    pub(crate) fn unmake_move(&mut self, undo: Undo) {
        let mover = undo.mover;
        if undo.promoted {
            self.arena[mover.index()].kind = PieceKind::Pawn;
        }
        self.relocate(mover, undo.mv.from);
        self.arena[mover.index()].has_moved = undo.mover_had_moved;

        if let Some(victim) = undo.captured {
            self.link(victim);
        }

        if let Some((rook, rook_from, _, had_moved)) = undo.castle_rook {
            self.relocate(rook, rook_from);
            self.arena[rook.index()].has_moved = had_moved;
        }

        self.en_passant = undo.prev_en_passant;
        self.turn = undo.prev_turn;
    }

    /// 空着：只交换行棋方并清除过路兵
    pub(crate) fn make_null_move(&mut self) -> NullUndo {
        let undo = NullUndo {
            prev_en_passant: self.en_passant,
            prev_turn: self.turn,
        };
        self.en_passant = None;
        self.turn = self.turn.opposite();
        undo
    }

    pub(crate) fn unmake_null_move(&mut self, undo: NullUndo) {
        self.en_passant = undo.prev_en_passant;
        self.turn = undo.prev_turn;
    }

    // ------------------------------------------------------------------
    // 攻击检测
    // ------------------------------------------------------------------

    #[inline]
    fn is_piece_of(&self, sq: Square, color: Color, kind: PieceKind) -> bool {
        matches!(self.get_square(sq), Some(p) if p.color == color && p.kind == kind)
    }

    /// 沿方向找到第一个棋子
    fn ray_first(&self, from: Square, (dr, dc): (i8, i8)) -> Option<&Piece> {
        let mut sq = from.offset(dr, dc);
        while sq.is_valid() {
            if let Some(piece) = self.get_square(sq) {
                return Some(piece);
            }
            sq = sq.offset(dr, dc);
        }
        None
    }

    /// 某格是否被某方攻击
    pub fn is_square_attacked(&self, target: Square, attacker: Color) -> bool {
        // 兵从目标格后方一行的两个斜格攻击
        let pawn_row = target.row - attacker.forward();
        for dc in [-1, 1] {
            if self.is_piece_of(Square::new(pawn_row, target.col + dc), attacker, PieceKind::Pawn) {
                return true;
            }
        }

        for (dr, dc) in KNIGHT_OFFSETS {
            if self.is_piece_of(target.offset(dr, dc), attacker, PieceKind::Knight) {
                return true;
            }
        }

        for (dr, dc) in KING_OFFSETS {
            if self.is_piece_of(target.offset(dr, dc), attacker, PieceKind::King) {
                return true;
            }
        }

        for dir in ROOK_DIRECTIONS {
            if let Some(p) = self.ray_first(target, dir) {
                if p.color == attacker && matches!(p.kind, PieceKind::Rook | PieceKind::Queen) {
                    return true;
                }
            }
        }

        for dir in BISHOP_DIRECTIONS {
            if let Some(p) = self.ray_first(target, dir) {
                if p.color == attacker && matches!(p.kind, PieceKind::Bishop | PieceKind::Queen) {
                    return true;
                }
            }
        }

        false
    }

    /// 某格上的棋子是否受对方攻击（含过路兵被吃的情况）
    pub fn is_piece_attacked(&self, sq: Square) -> bool {
        let Some(piece) = self.get_square(sq) else {
            return false;
        };
        let enemy = piece.color.opposite();
        if self.is_square_attacked(sq, enemy) {
            return true;
        }

        let is_en_passant_target = self.en_passant.is_some() && self.grid[sq.to_index()] == self.en_passant;
        is_en_passant_target
            && [-1, 1]
                .iter()
                .any(|&dc| self.is_piece_of(sq.offset(0, dc), enemy, PieceKind::Pawn))
    }

    /// 某方的王当前是否被将军（没有王时返回 false）
    pub fn is_in_check(&self, color: Color) -> bool {
        match self.get_king(color) {
            Some(king) => self.is_square_attacked(king.square, color.opposite()),
            None => false,
        }
    }

    /// 检查王是否被将军；提供假设走法时先模拟该走法再检查
    pub fn check_if_king_is_in_check(&mut self, color: Color, hypothetical: Option<Move>) -> bool {
        let Some(mv) = hypothetical else {
            return self.is_in_check(color);
        };
        match self.make_move(mv) {
            Some(undo) => {
                let in_check = self.is_in_check(color);
                self.unmake_move(undo);
                in_check
            }
            None => self.is_in_check(color),
        }
    }

    // ------------------------------------------------------------------
    // 合法性
    // ------------------------------------------------------------------

    /// 验证走法：棋子规则 + 走后己方王不被将军
    pub fn verify_move(
        &mut self,
        from: Square,
        to: Square,
        color: Color,
        promotion: Option<PieceKind>,
    ) -> bool {
        if !from.is_valid() || !to.is_valid() {
            return false;
        }
        let piece = match self.get_square(from) {
            Some(p) if p.color == color => *p,
            _ => return false,
        };
        if let Some(kind) = promotion {
            if !kind.is_promotion_target() {
                warn!("rejected promotion to {} for {}{}", kind, from, to);
                return false;
            }
        }
        if !pieces::is_valid_move(self, &piece, to) {
            return false;
        }
        !self.check_if_king_is_in_check(color, Some(Move { from, to, promotion }))
    }

    /// 某方全部合法走法（兵到底线展开为四种升变）
    pub fn legal_moves(&mut self, color: Color) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        let ids = self.rosters[color.index()].clone();

        for id in ids {
            let piece = self.arena[id.index()];
            for to in pieces::candidate_targets(&piece) {
                if !self.verify_move(piece.square, to, color, None) {
                    continue;
                }
                if piece.kind == PieceKind::Pawn && (to.row == 0 || to.row == 7) {
                    for kind in PieceKind::PROMOTIONS {
                        moves.push(Move::with_promotion(piece.square, to, kind));
                    }
                } else {
                    moves.push(Move::new(piece.square, to));
                }
            }
        }

        moves
    }

    /// 某方是否至少有一个合法走法
    pub fn has_legal_moves(&mut self, color: Color) -> bool {
        let ids = self.rosters[color.index()].clone();
        for id in ids {
            let piece = self.arena[id.index()];
            for to in pieces::candidate_targets(&piece) {
                if self.verify_move(piece.square, to, color, None) {
                    return true;
                }
            }
        }
        false
    }

    /// 将死：无合法走法且被将军
    pub fn is_checkmate(&mut self, color: Color) -> bool {
        !self.has_legal_moves(color) && self.is_in_check(color)
    }

    /// 无合法走法（不区分是否被将军，需先判断将死）
    pub fn is_stalemate(&mut self, color: Color) -> bool {
        !self.has_legal_moves(color)
    }

    /// 当前行棋方视角的对局结果
    pub fn game_result(&mut self) -> GameResult {
        let color = self.turn;
        if self.is_checkmate(color) {
            return match color {
                Color::White => GameResult::BlackWin,
                Color::Black => GameResult::WhiteWin,
            };
        }
        if self.is_stalemate(color) {
            return GameResult::Draw;
        }
        GameResult::Ongoing
    }

    /// 第一或第八横排是否有兵
    pub fn pawns_on_last_rank(&self) -> bool {
        self.first_pawn_on_last_rank().is_some()
    }

    fn first_pawn_on_last_rank(&self) -> Option<Square> {
        self.all_pieces()
            .find(|p| p.kind == PieceKind::Pawn && (p.square.row == 0 || p.square.row == 7))
            .map(|p| p.square)
    }

    /// 布局校验：双方各一个王、双方都未被将军、底线无兵
    pub fn validate_setup(&self) -> Result<(), SetupError> {
        for color in [Color::White, Color::Black] {
            let count = self.num_kings(color);
            if count != 1 {
                return Err(SetupError::WrongKingCount { color, count });
            }
        }
        for color in [Color::White, Color::Black] {
            if self.is_in_check(color) {
                return Err(SetupError::KingInCheck(color));
            }
        }
        if let Some(sq) = self.first_pawn_on_last_rank() {
            return Err(SetupError::PawnOnLastRank(sq));
        }
        Ok(())
    }

    /// perft：统计指定深度的叶子节点数
    pub fn perft(&mut self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.legal_moves(self.turn);
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut nodes = 0;
        for mv in moves {
            if let Some(undo) = self.make_move(mv) {
                nodes += self.perft(depth - 1);
                self.unmake_move(undo);
            }
        }
        nodes
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("fen", &self.to_fen())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

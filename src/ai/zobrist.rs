//! Zobrist Hashing
//!
//! 键表由调用方显式构建后注入（通常包在 `Arc` 里共享），没有全局状态。
//! 哈希覆盖完整局面：棋子、行棋方、易位权、过路兵所在列。

use crate::board::Board;
use crate::types::{Color, PieceKind};
use rand::prelude::*;
use std::sync::Arc;

/// 默认种子，保证不同进程生成相同的键
pub const DEFAULT_SEED: u64 = 0x5EED_C0DE_CAFE_F00D;

/// Zobrist 键表
#[derive(Debug, Clone)]
pub struct ZobristKeys {
    /// [square][color * 6 + kind]
    pieces: [[u64; 12]; 64],
    side: u64,
    castling: [u64; 4],
    en_passant: [u64; 8],
}

impl ZobristKeys {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pieces = [[0u64; 12]; 64];
        for square in pieces.iter_mut() {
            for key in square.iter_mut() {
                *key = rng.gen();
            }
        }

        let side = rng.gen();
        let mut castling = [0u64; 4];
        for key in castling.iter_mut() {
            *key = rng.gen();
        }
        let mut en_passant = [0u64; 8];
        for key in en_passant.iter_mut() {
            *key = rng.gen();
        }

        ZobristKeys {
            pieces,
            side,
            castling,
            en_passant,
        }
    }

    /// 用默认种子构建并包装成 `Arc`
    pub fn shared() -> Arc<ZobristKeys> {
        Arc::new(ZobristKeys::new(DEFAULT_SEED))
    }

    #[inline]
    fn piece_key(&self, square: usize, color: Color, kind: PieceKind) -> u64 {
        self.pieces[square][color.index() * 6 + kind.index()]
    }

    /// 计算棋盘的 Zobrist 哈希
    pub fn hash(&self, board: &Board) -> u64 {
        let mut hash = 0u64;

        for piece in board.all_pieces() {
            hash ^= self.piece_key(piece.square.to_index(), piece.color, piece.kind);
        }

        if board.turn() == Color::Black {
            hash ^= self.side;
        }

        let rights = board.castling_rights();
        for (i, key) in self.castling.iter().enumerate() {
            if rights.has(1 << i) {
                hash ^= key;
            }
        }

        if let Some(pawn) = board.en_passant_pawn() {
            hash ^= self.en_passant[pawn.square.col as usize];
        }

        hash
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        ZobristKeys::new(DEFAULT_SEED)
    }
}

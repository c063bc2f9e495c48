//! 错误类型
//!
//! 棋盘查询一律"失败即 false"，不返回错误；只有解析、布局校验和
//! 策略构建会返回 `ChessError`。

use crate::types::{Color, Square};
use thiserror::Error;

/// 布局校验失败的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// 某方的王数量不是 1
    #[error("invalid board setup: {color} has {count} kings")]
    WrongKingCount { color: Color, count: usize },

    /// 开局前某方已被将军
    #[error("invalid board setup: {0} king is in check")]
    KingInCheck(Color),

    /// 兵位于第一或第八横排
    #[error("invalid board setup: pawn on last rank at {0}")]
    PawnOnLastRank(Square),
}

/// 引擎错误
#[derive(Error, Debug)]
pub enum ChessError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("invalid move string: {0}")]
    InvalidMove(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("unknown strategy: {0}. Available: random, greedy, search")]
    UnknownStrategy(String),

    #[error("invalid difficulty level {0} (expected 1-8)")]
    InvalidDifficulty(u8),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// 结果类型别名
pub type ChessResult<T> = Result<T, ChessError>;

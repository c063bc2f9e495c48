//! Chess AI Engine
//!
//! 国际象棋规则引擎 + alpha-beta 搜索 AI - 支持 FEN 输入输出

pub mod ai;
pub mod board;
pub mod error;
pub mod fen;
pub mod pieces;
pub mod test_positions;
pub mod types;

pub use ai::{
    difficulty_description, AIConfig, AIEngine, AIStrategy, ComputerPlayer, EvalTerms, Evaluator,
    HashMapBook, OpeningBook, Player, ScoredMove, SearchEngine, SearchResult, SearchStats,
    ZobristKeys, AVAILABLE_STRATEGIES,
};
pub use board::{Board, BoardEvent, BoardListener, CastlingRights, Piece};
pub use error::{ChessError, ChessResult, SetupError};
pub use fen::{apply_move_to_fen, legal_moves_from_fen, parse_fen, pieces_to_fen, FenState};
pub use types::{Color, GameResult, Move, PieceKind, Square};

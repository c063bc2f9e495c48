//! AI 策略模块
//!
//! 难度 1 随机，难度 2-4 按规则贪婪选择，难度 5-8 使用 alpha-beta 搜索。
//! `ComputerPlayer` 把策略和开局库包装成可以直接在棋盘上走棋的玩家。

mod book;
mod eval;
mod greedy;
mod ordering;
mod random;
mod search;
mod tt;
mod zobrist;

pub use book::{HashMapBook, OpeningBook};
pub use eval::{is_endgame, piece_square_value, EvalTerms, Evaluator, ENDGAME_MATERIAL};
pub use greedy::GreedyAI;
pub use ordering::{is_capture, mvv_lva, MoveOrderer, MAX_PLY};
pub use random::RandomAI;
pub use search::{SearchAI, SearchEngine, SearchResult, SearchStats, MATE_BOUND, MATE_SCORE};
pub use tt::{TTEntry, TTFlag, TranspositionTable, DEFAULT_TT_CAPACITY};
pub use zobrist::{ZobristKeys, DEFAULT_SEED};

use crate::board::Board;
use crate::error::{ChessError, ChessResult};
use crate::types::Move;
use log::{debug, info};
use rand::prelude::*;
use serde::Serialize;
use std::sync::Arc;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 8;

/// AI 配置
#[derive(Debug, Clone)]
pub struct AIConfig {
    /// 最大搜索深度
    pub depth: u32,
    /// 随机性（0.0-1.0）
    pub randomness: f64,
    /// 随机种子
    pub seed: Option<u64>,
    /// 时间限制（秒）
    pub time_limit: Option<f64>,
    pub iterative_deepening: bool,
    pub transposition_table: bool,
    pub null_move_pruning: bool,
    pub quiescence: bool,
    pub pvs: bool,
    /// 置换表条目数（向下取 2 的幂）
    pub tt_capacity: usize,
    /// 评估扩展项
    pub eval: EvalTerms,
}

impl Default for AIConfig {
    fn default() -> Self {
        AIConfig {
            depth: 4,
            randomness: 0.0,
            seed: None,
            time_limit: None,
            iterative_deepening: true,
            transposition_table: true,
            null_move_pruning: true,
            quiescence: true,
            pvs: true,
            tt_capacity: 1 << 18,
            eval: EvalTerms::default(),
        }
    }
}

impl AIConfig {
    /// 难度 5-8 的搜索配置
    pub fn for_difficulty(level: u8) -> ChessResult<AIConfig> {
        let base = AIConfig {
            iterative_deepening: true,
            transposition_table: true,
            null_move_pruning: false,
            quiescence: false,
            pvs: false,
            tt_capacity: DEFAULT_TT_CAPACITY,
            ..Default::default()
        };
        let config = match level {
            5 => AIConfig {
                depth: 6,
                time_limit: Some(2.0),
                ..base
            },
            6 => AIConfig {
                depth: 8,
                time_limit: Some(5.0),
                quiescence: true,
                null_move_pruning: true,
                ..base
            },
            7 => AIConfig {
                depth: 10,
                time_limit: Some(10.0),
                quiescence: true,
                null_move_pruning: true,
                pvs: true,
                ..base
            },
            8 => AIConfig {
                depth: 12,
                time_limit: Some(30.0),
                quiescence: true,
                null_move_pruning: true,
                pvs: true,
                eval: EvalTerms::all(),
                ..base
            },
            _ => return Err(ChessError::InvalidDifficulty(level)),
        };
        Ok(config)
    }
}

/// 难度说明
pub fn difficulty_description(level: u8) -> &'static str {
    match level {
        1 => "Beginner: Random move selection, no strategy",
        2 => "Novice: Basic captures and checks",
        3 => "Intermediate: Tactical awareness, piece safety",
        4 => "Advanced: Material evaluation, simple tactics",
        5 => "Expert: Minimax search (6-ply), transposition tables, basic evaluation",
        6 => "Master: Deep search (8-ply), quiescence search, null move pruning",
        7 => "Grandmaster: Advanced search (10-ply), PVS, iterative deepening",
        8 => "Super-GM: Maximum strength (12-ply), all advanced algorithms enabled",
        _ => "Unknown difficulty level",
    }
}

/// 走法评分（厘兵，对走子方而言）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredMove {
    #[serde(rename = "move", serialize_with = "serialize_uci")]
    pub mv: Move,
    pub score: i32,
}

fn serialize_uci<S: serde::Serializer>(mv: &Move, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&mv.to_uci())
}

/// AI 策略接口
pub trait AIStrategy {
    /// 选择走法（返回按分数降序的前 n 个）
    fn select_moves(&mut self, board: &Board, n: usize) -> Vec<ScoredMove>;

    /// 选择最佳走法
    fn select_best_move(&mut self, board: &Board) -> Option<Move> {
        self.select_moves(board, 1).first().map(|sm| sm.mv)
    }

    /// 最近一次搜索的统计（只有搜索类策略有）
    fn last_stats(&self) -> Option<&SearchStats> {
        None
    }
}

pub const AVAILABLE_STRATEGIES: &[&str] = &["random", "greedy", "search"];

/// AI 引擎 - 统一的 AI 接口
pub struct AIEngine {
    strategy: Box<dyn AIStrategy>,
}

impl AIEngine {
    /// 创建随机 AI
    pub fn random(seed: Option<u64>) -> Self {
        AIEngine {
            strategy: Box::new(RandomAI::new(seed)),
        }
    }

    /// 创建贪婪 AI（level 取 2-4）
    pub fn greedy(level: u8, config: &AIConfig) -> Self {
        AIEngine {
            strategy: Box::new(GreedyAI::new(level, config)),
        }
    }

    /// 创建搜索 AI
    pub fn search(config: &AIConfig, keys: Arc<ZobristKeys>) -> Self {
        AIEngine {
            strategy: Box::new(SearchAI::new(config, keys)),
        }
    }

    /// 从策略名称创建
    pub fn from_strategy(name: &str, config: &AIConfig, keys: Arc<ZobristKeys>) -> ChessResult<Self> {
        match name.to_lowercase().as_str() {
            "random" => Ok(Self::random(config.seed)),
            "greedy" => Ok(Self::greedy(4, config)),
            "search" | "alphabeta" => Ok(Self::search(config, keys)),
            _ => Err(ChessError::UnknownStrategy(name.to_string())),
        }
    }

    /// 按难度 1-8 创建
    pub fn from_difficulty(level: u8, seed: Option<u64>, keys: Arc<ZobristKeys>) -> ChessResult<Self> {
        debug!("difficulty {}: {}", level, difficulty_description(level));
        match level {
            1 => Ok(Self::random(seed)),
            2..=4 => {
                let config = AIConfig {
                    seed,
                    ..Default::default()
                };
                Ok(Self::greedy(level, &config))
            }
            _ => {
                let config = AIConfig {
                    seed,
                    ..AIConfig::for_difficulty(level)?
                };
                Ok(Self::search(&config, keys))
            }
        }
    }

    pub fn select_moves(&mut self, board: &Board, n: usize) -> Vec<ScoredMove> {
        self.strategy.select_moves(board, n)
    }

    pub fn select_best_move(&mut self, board: &Board) -> Option<Move> {
        self.strategy.select_best_move(board)
    }

    pub fn last_stats(&self) -> Option<&SearchStats> {
        self.strategy.last_stats()
    }

    /// 从 FEN 选择走法（返回带评分的走法字符串）
    pub fn select_moves_fen(&mut self, fen: &str, n: usize) -> ChessResult<Vec<(String, i32)>> {
        let board = Board::from_fen(fen)?;
        Ok(self
            .strategy
            .select_moves(&board, n)
            .into_iter()
            .map(|sm| (sm.mv.to_uci(), sm.score))
            .collect())
    }

    /// 从 FEN 选择最佳走法
    pub fn select_best_move_fen(&mut self, fen: &str) -> ChessResult<Option<String>> {
        let board = Board::from_fen(fen)?;
        Ok(self.strategy.select_best_move(&board).map(|m| m.to_uci()))
    }
}

/// 玩家接口
pub trait Player {
    /// 为当前走子方走一步；没有可走的棋时返回 false
    fn make_move(&mut self, board: &mut Board) -> bool;
}

/// 电脑玩家：先查开局库，再搜索
pub struct ComputerPlayer {
    engine: AIEngine,
    book: Option<Box<dyn OpeningBook>>,
    keys: Arc<ZobristKeys>,
    rng: StdRng,
}

impl ComputerPlayer {
    pub fn new(engine: AIEngine, keys: Arc<ZobristKeys>) -> Self {
        ComputerPlayer {
            engine,
            book: None,
            keys,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_difficulty(level: u8, seed: Option<u64>, keys: Arc<ZobristKeys>) -> ChessResult<Self> {
        let engine = AIEngine::from_difficulty(level, seed, keys.clone())?;
        let mut player = ComputerPlayer::new(engine, keys);
        if let Some(s) = seed {
            player.rng = StdRng::seed_from_u64(s);
        }
        Ok(player)
    }

    pub fn with_book(mut self, book: Box<dyn OpeningBook>) -> Self {
        self.book = Some(book);
        self
    }

    pub fn engine(&self) -> &AIEngine {
        &self.engine
    }

    /// 随机取一个经过校验的开局库走法
    fn book_move(&mut self, board: &mut Board) -> Option<Move> {
        let book = self.book.as_ref()?;
        let color = board.turn();
        let candidates: Vec<Move> = book
            .lookup(self.keys.hash(board))
            .into_iter()
            .filter(|mv| board.verify_move(mv.from, mv.to, color, mv.promotion))
            .collect();
        candidates.choose(&mut self.rng).copied()
    }
}

impl Player for ComputerPlayer {
    fn make_move(&mut self, board: &mut Board) -> bool {
        if let Some(mv) = self.book_move(board) {
            debug!("book move {}", mv);
            board.move_piece(mv.from, mv.to, mv.promotion);
            return true;
        }

        let Some(mv) = self.engine.select_best_move(board) else {
            info!("{} has no legal move", board.turn());
            return false;
        };
        board.move_piece(mv.from, mv.to, mv.promotion);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions;
    use crate::types::Color;

    fn keys() -> Arc<ZobristKeys> {
        ZobristKeys::shared()
    }

    #[test]
    fn test_random_ai() {
        let mut ai = AIEngine::random(Some(42));
        let moves = ai.select_moves_fen(test_positions::START, 5).unwrap();
        assert_eq!(moves.len(), 5);
    }

    #[test]
    fn test_capture_preference() {
        let mut ai = AIEngine::greedy(2, &AIConfig::default());
        let best = ai.select_best_move_fen(test_positions::HANGING_QUEEN).unwrap();
        assert_eq!(best.as_deref(), Some("d2d5"));
    }

    #[test]
    fn test_all_strategies_from_name() {
        let config = AIConfig {
            depth: 1,
            ..Default::default()
        };
        for name in AVAILABLE_STRATEGIES {
            let result = AIEngine::from_strategy(name, &config, keys());
            assert!(result.is_ok(), "Failed to create strategy: {}", name);
        }
        assert!(matches!(
            AIEngine::from_strategy("mcts", &config, keys()),
            Err(ChessError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_difficulty_table() {
        let c5 = AIConfig::for_difficulty(5).unwrap();
        assert_eq!(c5.depth, 6);
        assert_eq!(c5.time_limit, Some(2.0));
        assert!(c5.transposition_table && c5.iterative_deepening);
        assert!(!c5.quiescence && !c5.null_move_pruning && !c5.pvs);

        let c6 = AIConfig::for_difficulty(6).unwrap();
        assert_eq!(c6.depth, 8);
        assert!(c6.quiescence && c6.null_move_pruning && !c6.pvs);

        let c7 = AIConfig::for_difficulty(7).unwrap();
        assert_eq!(c7.depth, 10);
        assert!(c7.pvs);

        let c8 = AIConfig::for_difficulty(8).unwrap();
        assert_eq!(c8.depth, 12);
        assert_eq!(c8.time_limit, Some(30.0));
        assert_eq!(c8.eval, EvalTerms::all());

        assert!(matches!(
            AIConfig::for_difficulty(4),
            Err(ChessError::InvalidDifficulty(4))
        ));
    }

    #[test]
    fn test_from_difficulty() {
        for level in MIN_DIFFICULTY..=MAX_DIFFICULTY {
            assert!(AIEngine::from_difficulty(level, Some(1), keys()).is_ok());
            assert_ne!(difficulty_description(level), "Unknown difficulty level");
        }
        assert!(AIEngine::from_difficulty(0, None, keys()).is_err());
        assert!(AIEngine::from_difficulty(9, None, keys()).is_err());
        assert_eq!(difficulty_description(9), "Unknown difficulty level");
    }

    #[test]
    fn test_search_engine_reports_stats() {
        let config = AIConfig {
            depth: 2,
            ..Default::default()
        };
        let mut ai = AIEngine::search(&config, keys());
        assert!(ai.last_stats().is_none());
        let best = ai.select_best_move_fen(test_positions::HANGING_QUEEN).unwrap();
        assert_eq!(best.as_deref(), Some("d2d5"));
        assert!(ai.last_stats().unwrap().nodes > 0);
    }

    #[test]
    fn test_computer_player_moves() {
        let mut board = Board::standard();
        let mut player = ComputerPlayer::with_difficulty(1, Some(5), keys()).unwrap();
        assert!(player.make_move(&mut board));
        assert_eq!(board.turn(), Color::Black);
        assert!(player.make_move(&mut board));
        assert_eq!(board.turn(), Color::White);
    }

    #[test]
    fn test_computer_player_uses_book() {
        let keys = keys();
        let book = HashMapBook::from_lines(&keys, &["g1f3"]);
        // 难度 1 随机走，只有开局库能保证走 g1f3
        let mut player = ComputerPlayer::with_difficulty(1, Some(9), keys)
            .unwrap()
            .with_book(Box::new(book));
        let mut board = Board::standard();
        assert!(player.make_move(&mut board));
        let knight = board
            .get_square(crate::types::Square::from_algebraic("f3").unwrap())
            .unwrap();
        assert_eq!(knight.kind, crate::types::PieceKind::Knight);
    }

    #[test]
    fn test_computer_player_no_moves() {
        let mut board = Board::from_fen(test_positions::STALEMATE).unwrap();
        let config = AIConfig {
            depth: 2,
            ..Default::default()
        };
        let mut player = ComputerPlayer::new(AIEngine::search(&config, keys()), keys());
        assert!(!player.make_move(&mut board));
    }
}

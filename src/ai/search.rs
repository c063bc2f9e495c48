//! PVS (Principal Variation Search) 搜索引擎
//!
//! - negamax + alpha-beta，PVS 零窗口试探后按需重搜
//! - 迭代加深，只采用完整完成的迭代结果
//! - 静态搜索（只搜吃子）、空着裁剪
//! - Zobrist 置换表、杀手走法、历史表
//! - 节点计数 + 定期检查时间，超时返回已完成的最好结果
//!
//! 每个功能都可以通过 `AIConfig` 单独开关。

use super::eval::Evaluator;
use super::ordering::{is_capture, mvv_lva, MoveOrderer, MAX_PLY};
use super::tt::{TTFlag, TranspositionTable};
use super::zobrist::ZobristKeys;
use super::{AIConfig, AIStrategy, ScoredMove};
use crate::board::Board;
use crate::types::{Color, Move, PieceKind};
use log::{debug, info};
use rand::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const MATE_SCORE: i32 = 100_000;
/// 超过此值的分数表示已找到杀棋
pub const MATE_BOUND: i32 = MATE_SCORE - 1_000;
const INFINITY: i32 = MATE_SCORE + 1;

const NULL_MOVE_REDUCTION: i32 = 2;
const NULL_MOVE_DEPTH_LIMIT: i32 = 3;
const TIME_CHECK_INTERVAL: u64 = 1024;

/// 搜索统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_hits: u64,
    pub cutoffs: u64,
    pub depth_reached: u32,
    pub elapsed_ms: u64,
}

/// 搜索结果
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    /// 行棋方视角分数
    pub score: i32,
    /// 根节点各走法分数（降序，非最佳走法的分数是上界）
    pub scored_moves: Vec<(Move, i32)>,
    pub stats: SearchStats,
}

/// 单次搜索的状态
struct SearchContext {
    start: Instant,
    limit: Option<Duration>,
    ticks: u64,
    stopped: bool,
    stats: SearchStats,
}

impl SearchContext {
    fn new(time_limit: Option<f64>) -> Self {
        SearchContext {
            start: Instant::now(),
            // NaN 或超出 Duration 范围的预算视为不限时
            limit: time_limit
                .filter(|secs| !secs.is_nan())
                .and_then(|secs| Duration::try_from_secs_f64(secs.max(0.0)).ok()),
            ticks: 0,
            stopped: false,
            stats: SearchStats::default(),
        }
    }

    #[inline]
    fn time_up(&self) -> bool {
        match self.limit {
            Some(limit) => self.start.elapsed() >= limit,
            None => false,
        }
    }

    /// 每 TIME_CHECK_INTERVAL 个节点检查一次时间
    #[inline]
    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        self.ticks += 1;
        if self.ticks % TIME_CHECK_INTERVAL == 0 && self.time_up() {
            self.stopped = true;
        }
        self.stopped
    }
}

/// 行棋方是否还有兵以外的子力（空着裁剪在纯兵残局中不可靠）
fn has_non_pawn_material(board: &Board, color: Color) -> bool {
    board
        .pieces(color)
        .any(|p| !matches!(p.kind, PieceKind::Pawn | PieceKind::King))
}

pub struct SearchEngine {
    config: AIConfig,
    keys: Arc<ZobristKeys>,
    tt: TranspositionTable,
    orderer: MoveOrderer,
    evaluator: Evaluator,
}

impl SearchEngine {
    pub fn new(config: &AIConfig, keys: Arc<ZobristKeys>) -> Self {
        let tt_capacity = if config.transposition_table {
            config.tt_capacity
        } else {
            1
        };
        SearchEngine {
            config: config.clone(),
            keys,
            tt: TranspositionTable::new(tt_capacity),
            orderer: MoveOrderer::new(),
            evaluator: Evaluator::new(config.eval),
        }
    }

    pub fn config(&self) -> &AIConfig {
        &self.config
    }

    /// 清空置换表（新对局时调用）
    pub fn reset(&mut self) {
        self.tt.clear();
        self.orderer.clear();
    }

    /// 为当前行棋方搜索最佳走法
    pub fn search(&mut self, board: &Board) -> SearchResult {
        let mut board = board.detached();
        let color = board.turn();
        let mut ctx = SearchContext::new(self.config.time_limit);
        let max_depth = self.config.depth.max(1);

        self.orderer.clear();
        self.tt.new_search();

        let mut moves = board.legal_moves(color);
        if moves.is_empty() {
            let score = if board.is_in_check(color) {
                -MATE_SCORE
            } else {
                0
            };
            return SearchResult {
                best_move: None,
                score,
                scored_moves: Vec::new(),
                stats: ctx.stats,
            };
        }
        self.orderer.order_moves(&board, &mut moves, 0, None);

        let first_depth = if self.config.iterative_deepening {
            1
        } else {
            max_depth
        };
        let mut completed: Option<Vec<(Move, i32)>> = None;

        for depth in first_depth..=max_depth {
            let (results, finished) = self.search_root(&mut board, &moves, depth as i32, &mut ctx);

            if !finished {
                // 未完成的迭代只在还没有任何结果时使用
                if completed.is_none() && !results.is_empty() {
                    completed = Some(results);
                }
                debug!("depth {} interrupted after {} nodes", depth, ctx.stats.nodes);
                break;
            }

            ctx.stats.depth_reached = depth;
            if let Some(&(best, score)) = results.first() {
                debug!(
                    "depth {} best {} score {} nodes {} time {}ms",
                    depth,
                    best,
                    score,
                    ctx.stats.nodes,
                    ctx.start.elapsed().as_millis()
                );
            }

            // 下一轮按本轮结果排序
            moves = results.iter().map(|&(mv, _)| mv).collect();
            let found_mate = results.first().map_or(false, |&(_, s)| s.abs() > MATE_BOUND);
            completed = Some(results);

            if found_mate || ctx.time_up() {
                break;
            }
        }

        ctx.stats.elapsed_ms = ctx.start.elapsed().as_millis() as u64;

        let scored_moves = match completed {
            Some(results) => results,
            // 时间耗尽且一个走法都没搜完：用排序后的第一个走法
            None => vec![(moves[0], self.evaluator.evaluate_for(&board, color))],
        };
        let (best_move, score) = scored_moves[0];

        info!(
            "search done: best {} score {} depth {} nodes {} qnodes {} tt_hits {} cutoffs {} time {}ms",
            best_move,
            score,
            ctx.stats.depth_reached,
            ctx.stats.nodes,
            ctx.stats.qnodes,
            ctx.stats.tt_hits,
            ctx.stats.cutoffs,
            ctx.stats.elapsed_ms
        );

        SearchResult {
            best_move: Some(best_move),
            score,
            scored_moves,
            stats: ctx.stats,
        }
    }

    /// 根节点搜索，返回 (按分数降序的走法, 是否完整完成)
    fn search_root(
        &mut self,
        board: &mut Board,
        moves: &[Move],
        depth: i32,
        ctx: &mut SearchContext,
    ) -> (Vec<(Move, i32)>, bool) {
        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut results: Vec<(Move, i32)> = Vec::with_capacity(moves.len());

        for (i, &mv) in moves.iter().enumerate() {
            let Some(undo) = board.make_move(mv) else {
                continue;
            };
            let score = self.search_child(board, depth - 1, alpha, beta, 1, true, i == 0, ctx);
            board.unmake_move(undo);

            if ctx.stopped {
                results.sort_by(|a, b| b.1.cmp(&a.1));
                return (results, false);
            }

            results.push((mv, score));
            if score > alpha {
                alpha = score;
            }
        }

        // 稳定排序：同分时保留先搜到的走法
        results.sort_by(|a, b| b.1.cmp(&a.1));
        (results, true)
    }

    /// 搜索一个子节点（已走子），PVS 时非首个走法先用零窗口
    #[allow(clippy::too_many_arguments)]
    fn search_child(
        &mut self,
        board: &mut Board,
        depth: i32,
        alpha: i32,
        beta: i32,
        ply: i32,
        is_pv: bool,
        first: bool,
        ctx: &mut SearchContext,
    ) -> i32 {
        if first || !self.config.pvs {
            return -self.negamax(board, depth, -beta, -alpha, ply, is_pv, ctx);
        }

        let score = -self.negamax(board, depth, -alpha - 1, -alpha, ply, false, ctx);
        if score > alpha && score < beta && !ctx.stopped {
            -self.negamax(board, depth, -beta, -alpha, ply, is_pv, ctx)
        } else {
            score
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn negamax(
        &mut self,
        board: &mut Board,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        ply: i32,
        is_pv: bool,
        ctx: &mut SearchContext,
    ) -> i32 {
        ctx.stats.nodes += 1;
        let color = board.turn();
        if ctx.should_stop() {
            return self.evaluator.evaluate_for(board, color);
        }

        let alpha_orig = alpha;
        let hash = if self.config.transposition_table {
            Some(self.keys.hash(board))
        } else {
            None
        };

        // TT 查找（PV 节点不直接截断）
        let mut tt_move = None;
        if let Some(entry) = hash.and_then(|h| self.tt.probe(h, ply)) {
            ctx.stats.tt_hits += 1;
            tt_move = entry.best_move;
            if !is_pv {
                if let Some(score) = entry.cutoff(depth.max(0), alpha, beta) {
                    return score;
                }
            }
        }

        if depth <= 0 {
            return if self.config.quiescence {
                self.quiesce(board, alpha, beta, ply, ctx)
            } else {
                self.evaluator.evaluate_for(board, color)
            };
        }

        let in_check = board.is_in_check(color);

        // Null Move Pruning
        if self.null_move_allowed(board, depth, beta, is_pv, in_check) {
            let undo = board.make_null_move();
            let null_score = -self.negamax(
                board,
                depth - 1 - NULL_MOVE_REDUCTION,
                -beta,
                -beta + 1,
                ply + 1,
                false,
                ctx,
            );
            board.unmake_null_move(undo);

            if ctx.stopped {
                return alpha;
            }
            if null_score >= beta {
                ctx.stats.cutoffs += 1;
                return beta;
            }
        }

        let mut moves = board.legal_moves(color);
        if moves.is_empty() {
            // 越快将死分数越高
            return if in_check { -(MATE_SCORE - ply) } else { 0 };
        }
        self.orderer
            .order_moves(board, &mut moves, ply as usize, tt_move);

        let mut best_score = -INFINITY;
        let mut best_move = None;

        for (i, &mv) in moves.iter().enumerate() {
            let capture = is_capture(board, &mv);
            let Some(undo) = board.make_move(mv) else {
                continue;
            };
            let score = self.search_child(board, depth - 1, alpha, beta, ply + 1, is_pv, i == 0, ctx);
            board.unmake_move(undo);

            if ctx.stopped {
                return alpha;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                ctx.stats.cutoffs += 1;
                if !capture && mv.promotion.is_none() {
                    self.orderer.record_cutoff(mv, ply as usize, depth);
                }
                break;
            }
        }

        if let Some(h) = hash {
            let flag = if best_score <= alpha_orig {
                TTFlag::UpperBound
            } else if best_score >= beta {
                TTFlag::LowerBound
            } else {
                TTFlag::Exact
            };
            self.tt.store(h, depth, best_score, flag, best_move, ply);
        }

        best_score
    }

    /// 空着裁剪条件：被将军、PV 节点、深度不足、接近杀棋分数或只剩兵时不用
    fn null_move_allowed(
        &self,
        board: &Board,
        depth: i32,
        beta: i32,
        is_pv: bool,
        in_check: bool,
    ) -> bool {
        self.config.null_move_pruning
            && !is_pv
            && !in_check
            && depth >= NULL_MOVE_DEPTH_LIMIT
            && beta.abs() < MATE_BOUND
            && has_non_pawn_material(board, board.turn())
    }

    /// 静态搜索：只搜吃子，直到局面平静
    fn quiesce(
        &mut self,
        board: &mut Board,
        mut alpha: i32,
        beta: i32,
        ply: i32,
        ctx: &mut SearchContext,
    ) -> i32 {
        ctx.stats.qnodes += 1;
        let color = board.turn();
        let stand_pat = self.evaluator.evaluate_for(board, color);
        if ctx.should_stop() {
            return stand_pat;
        }

        if stand_pat >= beta {
            return stand_pat;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        if ply as usize >= MAX_PLY {
            return stand_pat;
        }

        let moves = board.legal_moves(color);
        let mut captures: Vec<(i32, Move)> = moves
            .into_iter()
            .filter(|mv| is_capture(board, mv))
            .map(|mv| (mvv_lva(board, &mv), mv))
            .collect();
        captures.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, mv) in captures {
            let Some(undo) = board.make_move(mv) else {
                continue;
            };
            let score = -self.quiesce(board, -beta, -alpha, ply + 1, ctx);
            board.unmake_move(undo);

            if ctx.stopped {
                return alpha;
            }
            if score >= beta {
                return score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

// ============================================================================
// 搜索策略
// ============================================================================

/// 基于 `SearchEngine` 的 AI 策略
pub struct SearchAI {
    engine: SearchEngine,
    rng: StdRng,
    randomness: f64,
    last_stats: Option<SearchStats>,
}

impl SearchAI {
    pub fn new(config: &AIConfig, keys: Arc<ZobristKeys>) -> Self {
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        SearchAI {
            engine: SearchEngine::new(config, keys),
            rng,
            randomness: config.randomness,
            last_stats: None,
        }
    }

    pub fn engine_mut(&mut self) -> &mut SearchEngine {
        &mut self.engine
    }
}

impl AIStrategy for SearchAI {
    fn select_moves(&mut self, board: &Board, n: usize) -> Vec<ScoredMove> {
        let result = self.engine.search(board);
        self.last_stats = Some(result.stats);

        let mut scored: Vec<ScoredMove> = result
            .scored_moves
            .into_iter()
            .map(|(mv, score)| {
                let noise = if self.randomness > 0.0 {
                    (self.rng.gen::<f64>() * self.randomness * 100.0) as i32
                } else {
                    0
                };
                ScoredMove {
                    mv,
                    score: score + noise,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(n);
        scored
    }

    fn last_stats(&self) -> Option<&SearchStats> {
        self.last_stats.as_ref()
    }
}

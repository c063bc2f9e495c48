//! Chess AI CLI
//!
//! 命令行界面，用于测试 AI
//!
//! 支持两种模式：
//! 1. 单次命令模式：每次执行一个命令
//! 2. Server 模式：长驻进程，通过 stdin/stdout 通信

use chess_ai::test_positions;
use chess_ai::{
    apply_move_to_fen, difficulty_description, legal_moves_from_fen, AIConfig, AIEngine, Board,
    ChessResult, Color, ComputerPlayer, EvalTerms, Evaluator, GameResult, Player, SearchStats,
    ZobristKeys,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "chess-ai")]
#[command(about = "Chess AI Engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 获取合法走法
    Moves {
        /// FEN 字符串
        #[arg(long)]
        fen: String,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 选择最佳走法
    Best {
        /// FEN 字符串
        #[arg(long)]
        fen: String,

        /// AI 策略 (random, greedy, search)
        #[arg(long, default_value = "search")]
        strategy: String,

        /// 难度 1-8（指定后忽略 strategy/depth）
        #[arg(long)]
        level: Option<u8>,

        /// 搜索深度
        #[arg(long, default_value = "4")]
        depth: u32,

        /// 时间限制（秒）
        #[arg(long)]
        time_limit: Option<f64>,

        /// 随机种子
        #[arg(long)]
        seed: Option<u64>,

        /// 返回的走法数量
        #[arg(long, default_value = "1")]
        n: usize,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 评估局面分数
    Eval {
        /// FEN 字符串
        #[arg(long)]
        fen: String,

        /// 启用全部扩展评估项
        #[arg(long)]
        full: bool,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 统计走法树节点数（规则校验）
    Perft {
        /// FEN 字符串
        #[arg(long, default_value = test_positions::START)]
        fen: String,

        #[arg(long, default_value = "3")]
        depth: u32,
    },

    /// 电脑自对弈
    Play {
        #[arg(long, default_value = test_positions::START)]
        fen: String,

        /// 白方难度
        #[arg(long, default_value = "5")]
        white: u8,

        /// 黑方难度
        #[arg(long, default_value = "5")]
        black: u8,

        /// 最多走多少步（半回合）
        #[arg(long, default_value = "40")]
        max_plies: u32,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// 启动 server 模式（stdin/stdout 通信）
    Server,
}

#[derive(Serialize, Deserialize)]
struct MoveResult {
    #[serde(rename = "move")]
    mv: String,
    score: i32,
}

#[derive(Serialize)]
struct MovesResponse {
    moves: Vec<MoveResult>,
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<SearchStats>,
}

// Server 模式的请求和响应结构
#[derive(Deserialize)]
struct ServerRequest {
    cmd: String,
    #[serde(default)]
    fen: String,
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    level: Option<u8>,
    #[serde(default)]
    time_limit: Option<f64>,
    #[serde(default)]
    n: Option<usize>,
    #[serde(default)]
    depth: Option<u32>,
    #[serde(default, rename = "move")]
    mv: Option<String>,
}

#[derive(Serialize, Default)]
struct ServerResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    moves: Option<Vec<MoveResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_moves: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<SearchStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    // eval 命令的字段
    #[serde(skip_serializing_if = "Option::is_none")]
    eval: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<GameResult>,
}

impl ServerResponse {
    fn success_moves(moves: Vec<MoveResult>, stats: Option<SearchStats>, elapsed_ms: f64) -> Self {
        Self {
            ok: true,
            moves: Some(moves),
            stats,
            elapsed_ms: Some(elapsed_ms),
            ..Default::default()
        }
    }

    fn success_legal_moves(legal_moves: Vec<String>) -> Self {
        Self {
            ok: true,
            legal_moves: Some(legal_moves),
            ..Default::default()
        }
    }

    fn success_eval(eval_score: i32, color: Color) -> Self {
        Self {
            ok: true,
            eval: Some(eval_score),
            color: Some(color_to_str(color).to_string()),
            ..Default::default()
        }
    }

    fn success_apply(fen: String, result: GameResult) -> Self {
        Self {
            ok: true,
            fen: Some(fen),
            result: Some(result),
            ..Default::default()
        }
    }

    fn success_perft(nodes: u64, elapsed_ms: f64) -> Self {
        Self {
            ok: true,
            nodes: Some(nodes),
            elapsed_ms: Some(elapsed_ms),
            ..Default::default()
        }
    }

    fn error(msg: &str) -> Self {
        Self {
            ok: false,
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

fn color_to_str(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    out.unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"serialize: {}\"}}", e))
}

fn exit_with(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", err);
    std::process::exit(1);
}

/// 按难度或策略名创建 AI
fn build_engine(
    keys: &Arc<ZobristKeys>,
    level: Option<u8>,
    strategy: &str,
    depth: u32,
    time_limit: Option<f64>,
    seed: Option<u64>,
) -> ChessResult<AIEngine> {
    if let Some(level) = level {
        return AIEngine::from_difficulty(level, seed, keys.clone());
    }
    let config = AIConfig {
        depth,
        seed,
        time_limit,
        ..Default::default()
    };
    AIEngine::from_strategy(strategy, &config, keys.clone())
}

/// 搜索并返回 (走法, 统计, 耗时毫秒)
fn run_best(
    engine: &mut AIEngine,
    fen: &str,
    n: usize,
) -> ChessResult<(Vec<MoveResult>, Option<SearchStats>, f64)> {
    let start = Instant::now();
    let moves = engine.select_moves_fen(fen, n)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let moves = moves
        .into_iter()
        .map(|(mv, score)| MoveResult { mv, score })
        .collect();
    Ok((moves, engine.last_stats().cloned(), elapsed_ms))
}

fn evaluate_fen(fen: &str, full: bool) -> ChessResult<(i32, Color)> {
    let board = Board::from_fen(fen)?;
    let terms = if full { EvalTerms::all() } else { EvalTerms::default() };
    let color = board.turn();
    Ok((Evaluator::new(terms).evaluate_for(&board, color), color))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let keys = ZobristKeys::shared();

    match cli.command {
        Commands::Moves { fen, json } => match legal_moves_from_fen(&fen) {
            Ok(moves) => {
                if json {
                    println!("{}", to_json(&moves, true));
                } else {
                    println!("Legal moves ({}):", moves.len());
                    for mv in &moves {
                        println!("  {}", mv);
                    }
                }
            }
            Err(e) => exit_with(e),
        },

        Commands::Best {
            fen,
            strategy,
            level,
            depth,
            time_limit,
            seed,
            n,
            json,
        } => {
            let mut engine = build_engine(&keys, level, &strategy, depth, time_limit, seed)
                .unwrap_or_else(|e| exit_with(e));
            let (moves, stats, elapsed_ms) =
                run_best(&mut engine, &fen, n).unwrap_or_else(|e| exit_with(e));

            if json {
                let response = MovesResponse {
                    total: moves.len(),
                    moves,
                    stats,
                };
                println!("{}", to_json(&response, true));
            } else {
                match level {
                    Some(l) => println!("Best moves (level {}: {}):", l, difficulty_description(l)),
                    None => println!("Best moves (strategy={}):", strategy),
                }
                for m in &moves {
                    println!("  {} (score: {})", m.mv, m.score);
                }
                if let Some(s) = stats {
                    println!(
                        "\nStats: depth={}, nodes={}, qnodes={}, tt_hits={}, cutoffs={}",
                        s.depth_reached, s.nodes, s.qnodes, s.tt_hits, s.cutoffs
                    );
                }
                println!("Time: {:.1} ms", elapsed_ms);
            }
        }

        Commands::Eval { fen, full, json } => match evaluate_fen(&fen, full) {
            Ok((score, color)) => {
                if json {
                    println!("{}", to_json(&ServerResponse::success_eval(score, color), true));
                } else {
                    println!("Evaluation ({} to move): {}", color_to_str(color), score);
                }
            }
            Err(e) => exit_with(e),
        },

        Commands::Perft { fen, depth } => {
            let mut board = Board::from_fen(&fen).unwrap_or_else(|e| exit_with(e));
            let start = Instant::now();
            let nodes = board.perft(depth);
            println!(
                "perft({}) = {} ({:.1} ms)",
                depth,
                nodes,
                start.elapsed().as_secs_f64() * 1000.0
            );
        }

        Commands::Play {
            fen,
            white,
            black,
            max_plies,
            seed,
        } => {
            let mut board = Board::from_fen(&fen).unwrap_or_else(|e| exit_with(e));
            let mut players = [white, black].map(|level| {
                ComputerPlayer::with_difficulty(level, seed, keys.clone())
                    .unwrap_or_else(|e| exit_with(e))
            });
            for ply in 0..max_plies {
                let side = board.turn();
                if !players[side.index()].make_move(&mut board) {
                    break;
                }
                println!("{:>3}. {} {}", ply + 1, side, board.to_fen());
            }
            println!("Result: {:?}", board.game_result());
        }

        Commands::Server => run_server(&keys),
    }
}

/// Server 模式主循环
/// 从 stdin 读取 JSON 请求，返回 JSON 响应到 stdout
fn run_server(keys: &Arc<ZobristKeys>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        // 空行跳过
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ServerRequest>(&line) {
            Ok(request) => match request.cmd.as_str() {
                "best" => handle_best_request(keys, &request),
                "moves" => handle_moves_request(&request),
                "eval" => handle_eval_request(&request),
                "apply" => handle_apply_request(&request),
                "perft" => handle_perft_request(&request),
                "quit" => break,
                _ => ServerResponse::error(&format!("Unknown command: {}", request.cmd)),
            },
            Err(e) => ServerResponse::error(&format!("Invalid JSON: {}", e)),
        };

        println!("{}", to_json(&response, false));
        let _ = stdout.flush();
    }
}

/// 处理 best 命令
fn handle_best_request(keys: &Arc<ZobristKeys>, request: &ServerRequest) -> ServerResponse {
    let strategy = request.strategy.as_deref().unwrap_or("search");
    let depth = request.depth.unwrap_or(4);
    let n = request.n.unwrap_or(5);

    let mut engine = match build_engine(keys, request.level, strategy, depth, request.time_limit, None) {
        Ok(e) => e,
        Err(e) => return ServerResponse::error(&e.to_string()),
    };

    match run_best(&mut engine, &request.fen, n) {
        Ok((moves, stats, elapsed_ms)) => ServerResponse::success_moves(moves, stats, elapsed_ms),
        Err(e) => ServerResponse::error(&format!("AI error: {}", e)),
    }
}

/// 处理 moves 命令
fn handle_moves_request(request: &ServerRequest) -> ServerResponse {
    match legal_moves_from_fen(&request.fen) {
        Ok(moves) => ServerResponse::success_legal_moves(moves),
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}

/// 处理 eval 命令（静态评估）
fn handle_eval_request(request: &ServerRequest) -> ServerResponse {
    match evaluate_fen(&request.fen, false) {
        Ok((score, color)) => ServerResponse::success_eval(score, color),
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}

/// 处理 apply 命令（执行走法，返回新 FEN 和对局状态）
fn handle_apply_request(request: &ServerRequest) -> ServerResponse {
    let Some(mv) = request.mv.as_deref() else {
        return ServerResponse::error("missing field: move");
    };
    let result = apply_move_to_fen(&request.fen, mv).and_then(|fen| {
        let mut board = Board::from_fen(&fen)?;
        Ok((fen, board.game_result()))
    });
    match result {
        Ok((fen, result)) => ServerResponse::success_apply(fen, result),
        Err(e) => ServerResponse::error(&e.to_string()),
    }
}

/// 处理 perft 命令
fn handle_perft_request(request: &ServerRequest) -> ServerResponse {
    let mut board = match Board::from_fen(&request.fen) {
        Ok(b) => b,
        Err(e) => return ServerResponse::error(&e.to_string()),
    };
    let start = Instant::now();
    let nodes = board.perft(request.depth.unwrap_or(1));
    ServerResponse::success_perft(nodes, start.elapsed().as_secs_f64() * 1000.0)
}

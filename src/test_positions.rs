//! 国际象棋测试局面库
//!
//! 提供命名的 FEN 测试局面，方便测试、调试和基准测试
//!
//! 命名规范:
//! - START: 初始局面
//! - *_READY: 某条特殊规则即将可用的局面
//! - *_MATE_*: 杀棋测试
//! - 其余为 perft / 搜索用的经典局面

// =============================================================================
// 开局
// =============================================================================

/// 初始局面
pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// 1. e4 之后
pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

// =============================================================================
// 特殊规则
// =============================================================================

/// 双方都能易位
pub const CASTLING_READY: &str = "r3k2r/p6p/8/8/8/8/P6P/R3K2R w KQkq - 0 1";

/// 黑方 d7-d5 后白方 e5 兵可以吃过路兵
pub const EN_PASSANT_READY: &str = "4k3/3p3p/8/4P3/8/8/7P/4K3 b - - 0 1";

/// 白方 a7 兵即将升变
pub const PROMOTION_READY: &str = "8/P6k/8/8/8/8/8/4K3 w - - 0 1";

// =============================================================================
// 杀棋 / 和棋
// =============================================================================

/// 白方 Ra8# 底线杀
pub const BACK_RANK_MATE_IN_ONE: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";

/// 黑方无子可动且未被将军
pub const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

// =============================================================================
// 战术
// =============================================================================

/// 白车可以白吃黑后
pub const HANGING_QUEEN: &str = "4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1";

/// 黑马被白兵攻击，应当逃走
pub const KNIGHT_ATTACKED: &str = "4k3/8/8/3n4/4P3/8/8/4K3 b - - 0 1";

// =============================================================================
// perft 经典局面
// =============================================================================

/// Kiwipete：易位、过路兵、升变都会出现
pub const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// 残局：大量牵制与过路兵
pub const ROOK_ENDGAME_PINS: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

// =============================================================================
// 局面集合
// =============================================================================

/// (局面, 深度, 叶子数)
pub const PERFT_CASES: [(&str, u32, u64); 7] = [
    (START, 1, 20),
    (START, 2, 400),
    (START, 3, 8902),
    (KIWIPETE, 1, 48),
    (KIWIPETE, 2, 2039),
    (ROOK_ENDGAME_PINS, 2, 191),
    (ROOK_ENDGAME_PINS, 3, 2812),
];

/// 所有命名局面
pub const ALL_POSITIONS: [&str; 11] = [
    START,
    AFTER_E4,
    CASTLING_READY,
    EN_PASSANT_READY,
    PROMOTION_READY,
    BACK_RANK_MATE_IN_ONE,
    STALEMATE,
    HANGING_QUEEN,
    KNIGHT_ATTACKED,
    KIWIPETE,
    ROOK_ENDGAME_PINS,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Board;

    #[test]
    fn test_all_positions_valid() {
        for (i, fen) in ALL_POSITIONS.iter().enumerate() {
            let board = Board::from_fen(fen);
            assert!(board.is_ok(), "position {} invalid: {:?}", i, board.err());
            let board = board.unwrap();
            assert!(board.validate_setup().is_ok(), "position {} fails setup check", fen);
        }
    }

    #[test]
    fn test_perft_cases() {
        for (fen, depth, expected) in PERFT_CASES {
            let mut board = Board::from_fen(fen).unwrap();
            assert_eq!(board.perft(depth), expected, "perft({}) of {}", depth, fen);
        }
    }
}

//! 开局库：局面哈希 -> 候选走法
//!
//! 只负责查询。`HashMapBook::from_lines` 从 UCI 走法序列建库，
//! 每条序列从初始局面开始；非法走法会截断该序列。

use super::zobrist::ZobristKeys;
use crate::board::Board;
use crate::types::Move;
use log::warn;
use std::collections::HashMap;

/// 开局库接口
pub trait OpeningBook: Send {
    /// 查询局面的候选走法（重复出现表示权重更高）
    fn lookup(&self, hash: u64) -> Vec<Move>;
}

/// 基于 HashMap 的开局库
#[derive(Debug, Default, Clone)]
pub struct HashMapBook {
    entries: HashMap<u64, Vec<Move>>,
}

impl HashMapBook {
    pub fn new() -> Self {
        HashMapBook::default()
    }

    pub fn insert(&mut self, hash: u64, mv: Move) {
        self.entries.entry(hash).or_default().push(mv);
    }

    /// 从若干条 UCI 走法序列建库（如 "e2e4 e7e5 g1f3"）
    pub fn from_lines(keys: &ZobristKeys, lines: &[&str]) -> Self {
        let mut book = HashMapBook::new();
        for line in lines {
            let mut board = Board::standard();
            for token in line.split_whitespace() {
                let Some(mv) = Move::from_uci(token) else {
                    warn!("opening line '{}': bad move '{}'", line, token);
                    break;
                };
                let color = board.turn();
                if !board.verify_move(mv.from, mv.to, color, mv.promotion) {
                    warn!("opening line '{}': illegal move '{}'", line, token);
                    break;
                }
                book.insert(keys.hash(&board), mv);
                board.move_piece(mv.from, mv.to, mv.promotion);
            }
        }
        book
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OpeningBook for HashMapBook {
    fn lookup(&self, hash: u64) -> Vec<Move> {
        self.entries.get(&hash).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines() {
        let keys = ZobristKeys::default();
        let book = HashMapBook::from_lines(&keys, &["e2e4 e7e5 g1f3", "e2e4 c7c5", "d2d4"]);

        let start = keys.hash(&Board::standard());
        let moves = book.lookup(start);
        assert_eq!(moves.len(), 3);
        assert_eq!(moves.iter().filter(|m| m.to_uci() == "e2e4").count(), 2);

        let mut board = Board::standard();
        let e4 = Move::from_uci("e2e4").unwrap();
        board.move_piece(e4.from, e4.to, None);
        let replies: Vec<String> = book.lookup(keys.hash(&board)).iter().map(|m| m.to_uci()).collect();
        assert_eq!(replies, vec!["e7e5", "c7c5"]);
    }

    #[test]
    fn test_illegal_line_truncated() {
        let keys = ZobristKeys::default();
        let book = HashMapBook::from_lines(&keys, &["e2e4 e2e4 g1f3", "zz"]);
        // 只收录了第一步
        assert_eq!(book.len(), 1);
        assert!(book.lookup(12345).is_empty());
    }
}

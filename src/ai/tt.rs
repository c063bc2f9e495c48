//! 置换表（数组实现）
//!
//! 容量固定为 2 的幂，按哈希低位直接寻址。
//! 替换策略：同一局面总是覆盖；不同局面时新条目深度不小于旧条目、
//! 或旧条目来自更早的搜索才替换。从不整表清空。

use super::search::MATE_BOUND;
use crate::types::Move;

/// 默认条目数
pub const DEFAULT_TT_CAPACITY: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TTFlag {
    None = 0,
    Exact = 1,
    LowerBound = 2,
    UpperBound = 3,
}

#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub hash: u64,
    pub score: i32,
    pub depth: i8,
    pub flag: TTFlag,
    pub best_move: Option<Move>,
    age: u8,
}

impl Default for TTEntry {
    fn default() -> Self {
        TTEntry {
            hash: 0,
            score: 0,
            depth: -1,
            flag: TTFlag::None,
            best_move: None,
            age: 0,
        }
    }
}

impl TTEntry {
    /// 深度足够且界限覆盖窗口时返回可直接使用的分数
    #[inline]
    pub fn cutoff(&self, depth: i32, alpha: i32, beta: i32) -> Option<i32> {
        if (self.depth as i32) < depth {
            return None;
        }
        match self.flag {
            TTFlag::Exact => Some(self.score),
            TTFlag::LowerBound if self.score >= beta => Some(self.score),
            TTFlag::UpperBound if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

/// 杀棋分数存表时换成"距当前节点"的距离，读出时再换回来
#[inline]
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score > MATE_BOUND {
        score + ply
    } else if score < -MATE_BOUND {
        score - ply
    } else {
        score
    }
}

#[inline]
fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score > MATE_BOUND {
        score - ply
    } else if score < -MATE_BOUND {
        score + ply
    } else {
        score
    }
}

pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    mask: usize,
    age: u8,
    used: usize,
}

impl TranspositionTable {
    /// 创建置换表，容量向下取整到 2 的幂（至少 1）
    pub fn new(capacity: usize) -> Self {
        let size = if capacity.is_power_of_two() {
            capacity
        } else {
            (capacity.next_power_of_two() / 2).max(1)
        };
        TranspositionTable {
            entries: vec![TTEntry::default(); size],
            mask: size - 1,
            age: 0,
            used: 0,
        }
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// 查找条目，分数已按 `ply` 还原
    #[inline]
    pub fn probe(&self, hash: u64, ply: i32) -> Option<TTEntry> {
        let entry = &self.entries[self.index(hash)];
        if entry.hash == hash && entry.flag != TTFlag::None {
            let mut found = *entry;
            found.score = score_from_tt(entry.score, ply);
            Some(found)
        } else {
            None
        }
    }

    #[inline]
    pub fn store(
        &mut self,
        hash: u64,
        depth: i32,
        score: i32,
        flag: TTFlag,
        best_move: Option<Move>,
        ply: i32,
    ) {
        let idx = self.index(hash);
        let age = self.age;
        let entry = &mut self.entries[idx];

        let empty = entry.flag == TTFlag::None;
        let replace = empty || entry.hash == hash || entry.age != age || depth >= entry.depth as i32;
        if !replace {
            return;
        }
        if empty {
            self.used += 1;
        }

        // 同一局面的新结果没有走法时保留旧的最佳走法
        let best_move = if entry.hash == hash && best_move.is_none() {
            entry.best_move
        } else {
            best_move
        };

        *entry = TTEntry {
            hash,
            score: score_to_tt(score, ply),
            depth: depth.clamp(-1, i8::MAX as i32) as i8,
            flag,
            best_move,
            age,
        };
    }

    /// 开始新搜索（旧条目变为可替换）
    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.entries.fill(TTEntry::default());
        self.age = 0;
        self.used = 0;
    }

    /// 已占用的槽位数
    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_TT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::search::MATE_SCORE;
    use crate::types::Square;

    fn some_move() -> Move {
        Move::new(Square::new(1, 4), Square::new(3, 4))
    }

    #[test]
    fn test_exact_roundtrip() {
        let mut tt = TranspositionTable::new(1024);
        tt.store(0xABCD, 5, 42, TTFlag::Exact, Some(some_move()), 0);

        for depth in 0..=5 {
            let entry = tt.probe(0xABCD, 0).unwrap();
            assert_eq!(entry.cutoff(depth, -1000, 1000), Some(42));
            assert_eq!(entry.best_move, Some(some_move()));
        }
        // 深度不够
        assert_eq!(tt.probe(0xABCD, 0).unwrap().cutoff(6, -1000, 1000), None);
        assert!(tt.probe(0x1234, 0).is_none());
    }

    #[test]
    fn test_bounds() {
        let mut tt = TranspositionTable::new(1024);
        tt.store(1, 3, 100, TTFlag::LowerBound, None, 0);
        tt.store(2, 3, -100, TTFlag::UpperBound, None, 0);

        let lower = tt.probe(1, 0).unwrap();
        assert_eq!(lower.cutoff(3, 0, 50), Some(100));
        assert_eq!(lower.cutoff(3, 0, 200), None);

        let upper = tt.probe(2, 0).unwrap();
        assert_eq!(upper.cutoff(3, -50, 0), Some(-100));
        assert_eq!(upper.cutoff(3, -200, 0), None);
    }

    #[test]
    fn test_capacity_power_of_two() {
        assert_eq!(TranspositionTable::new(1000).capacity(), 512);
        assert_eq!(TranspositionTable::new(1024).capacity(), 1024);
        assert_eq!(TranspositionTable::new(0).capacity(), 1);
    }

    #[test]
    fn test_replacement_prefers_depth() {
        let mut tt = TranspositionTable::new(16);
        // 1 和 17 落在同一个槽位
        tt.store(1, 6, 10, TTFlag::Exact, None, 0);
        tt.store(17, 2, 20, TTFlag::Exact, None, 0);
        assert!(tt.probe(1, 0).is_some());
        assert!(tt.probe(17, 0).is_none());

        // 新一轮搜索后旧条目可被替换
        tt.new_search();
        tt.store(17, 2, 20, TTFlag::Exact, None, 0);
        assert!(tt.probe(1, 0).is_none());
        assert_eq!(tt.probe(17, 0).unwrap().score, 20);
        assert_eq!(tt.len(), 1);
    }

    #[test]
    fn test_same_hash_always_overwrites() {
        let mut tt = TranspositionTable::new(16);
        tt.store(5, 8, 10, TTFlag::Exact, Some(some_move()), 0);
        tt.store(5, 1, -30, TTFlag::UpperBound, None, 0);
        let entry = tt.probe(5, 0).unwrap();
        assert_eq!(entry.score, -30);
        assert_eq!(entry.depth, 1);
        assert_eq!(entry.best_move, Some(some_move()));
    }

    #[test]
    fn test_mate_score_adjusted_by_ply() {
        let mut tt = TranspositionTable::new(16);
        // 在第 3 层发现 2 步后将死对方
        tt.store(9, 4, MATE_SCORE - 5, TTFlag::Exact, None, 3);
        // 在第 1 层读到时距离将死更远
        assert_eq!(tt.probe(9, 1).unwrap().score, MATE_SCORE - 3);
    }

    #[test]
    fn test_clear() {
        let mut tt = TranspositionTable::new(16);
        tt.store(3, 1, 0, TTFlag::Exact, None, 0);
        assert!(!tt.is_empty());
        tt.clear();
        assert!(tt.is_empty());
        assert!(tt.probe(3, 0).is_none());
    }
}

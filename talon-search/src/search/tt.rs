//! Lockless transposition table using atomic XOR-based torn-write detection.
//!
//! Two `AtomicU64` words per entry (16 bytes — one cache line holds four slots).
//!
//! ## Bit layout
//!
//! ```text
//! word0 (AtomicU64):
//!   bits 63-32: key       (upper 32 bits of the Zobrist hash)
//!   bits 31-26: age       (6 bits, wraps at 64)
//!   bits 25-24: bound     (2 bits)
//!   bits 23-17: depth     (7 bits, 0..=127)
//!   bit  16:    reserved
//!   bits 15-0:  move      (16 bits)
//!
//! word1 (AtomicU64):
//!   bits 63-32: check     = key XOR (word0 & 0xFFFF_FFFF)
//!   bits 31-16: score     (i16 as u16)
//!   bits 15-0:  reserved
//! ```
//!
//! ## Torn-write detection
//!
//! On probe: `check_expected = (w0 >> 32) ^ (w0 & 0xFFFF_FFFF)`.
//! If `check_expected != (w1 >> 32)` the entry was written by another thread
//! mid-write and we return `None` rather than using garbage data.
//!
//! All atomic accesses use `Relaxed` ordering.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use talon_core::Move;

use crate::search::negamax::MATE_IN_MAX_PLY;

const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn check() {
        assert_send_sync::<TranspositionTable>();
    }
    let _ = check;
};

/// Bound type stored in a TT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// No bound information (empty entry).
    None = 0,
    /// The stored score is exact (PV node).
    Exact = 1,
    /// The stored score is a lower bound (failed high / beta cutoff).
    LowerBound = 2,
    /// The stored score is an upper bound (failed low / all-node).
    UpperBound = 3,
}

impl Bound {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            1 => Bound::Exact,
            2 => Bound::LowerBound,
            3 => Bound::UpperBound,
            _ => Bound::None,
        }
    }
}

/// Result of a successful TT probe.
#[derive(Debug, Clone)]
pub struct TtProbeResult {
    /// Best move from a previous search of this position.
    pub best_move: Move,
    /// Search depth of the stored entry.
    pub depth: u8,
    /// Bound type (exact, lower, or upper).
    pub bound: Bound,
    /// Score, already adjusted from TT-relative back to root-relative.
    pub score: i32,
}

/// Convert a search score to TT-storable form.
///
/// Mate scores are path-dependent: `MATE - ply` changes with the
/// search path that found them. Store them as distance-from-node instead
/// of distance-from-root, so the same mate is path-independent in the table.
pub fn score_to_tt(score: i32, ply: u8) -> i16 {
    let adjusted = if score > MATE_IN_MAX_PLY {
        score + ply as i32
    } else if score < -MATE_IN_MAX_PLY {
        score - ply as i32
    } else {
        score
    };
    adjusted as i16
}

/// Reverse the mate-distance adjustment applied by [`score_to_tt`].
pub fn score_from_tt(score: i16, ply: u8) -> i32 {
    let score = score as i32;
    if score > MATE_IN_MAX_PLY {
        score - ply as i32
    } else if score < -MATE_IN_MAX_PLY {
        score + ply as i32
    } else {
        score
    }
}

/// Fibonacci hashing constant: the odd integer nearest `2^64 / phi`.
const FIBONACCI_HASH: u64 = 0x9E37_79B9_7F4A_7C15;

struct AtomicEntry {
    word0: AtomicU64,
    word1: AtomicU64,
}

impl AtomicEntry {
    const fn new() -> Self {
        Self {
            word0: AtomicU64::new(0),
            word1: AtomicU64::new(0),
        }
    }

    /// Layout: `[63:32] key | [31:26] age | [25:24] bound | [23:17] depth | [16] reserved | [15:0] mv`.
    fn pack_word0(key32: u32, age: u8, bound: Bound, depth: u8, mv: Move) -> u64 {
        let key_bits = (key32 as u64) << 32;
        let age_bits = ((age & 0x3F) as u64) << 26;
        let bound_bits = ((bound as u8) as u64) << 24;
        let depth_bits = ((depth & 0x7F) as u64) << 17;
        let mv_bits = mv.raw() as u64;
        key_bits | age_bits | bound_bits | depth_bits | mv_bits
    }

    /// Layout: `[63:32] check (key XOR lower32 of word0) | [31:16] score | [15:0] reserved`.
    fn pack_word1(w0: u64, score: i16) -> u64 {
        let key32 = (w0 >> 32) as u32;
        let data_lower = (w0 & 0xFFFF_FFFF) as u32;
        let check = (key32 ^ data_lower) as u64;
        (check << 32) | (((score as u16) as u64) << 16)
    }

    fn decode_w0(w0: u64) -> (u8, Bound, u8, Move) {
        let age = ((w0 >> 26) & 0x3F) as u8;
        let bound = Bound::from_bits(((w0 >> 24) & 0x03) as u8);
        let depth = ((w0 >> 17) & 0x7F) as u8;
        let mv = Move::from_raw((w0 & 0xFFFF) as u16);
        (age, bound, depth, mv)
    }

    /// Load and verify the entry for `hash`. `None` on key mismatch or a torn write.
    fn load(&self, hash: u64) -> Option<(Bound, u8, Move, u64)> {
        let w0 = self.word0.load(Ordering::Relaxed);
        let w1 = self.word1.load(Ordering::Relaxed);

        let key32_w0 = (w0 >> 32) as u32;
        let data_lower = (w0 & 0xFFFF_FFFF) as u32;
        let check_expected = key32_w0 ^ data_lower;
        let check_stored = (w1 >> 32) as u32;
        if check_expected != check_stored {
            return None;
        }

        let key32 = (hash >> 32) as u32;
        if key32_w0 != key32 {
            return None;
        }

        let (_, bound, depth, mv) = Self::decode_w0(w0);
        Some((bound, depth, mv, w1))
    }

    fn store(&self, w0: u64, w1: u64) {
        self.word0.store(w0, Ordering::Relaxed);
        self.word1.store(w1, Ordering::Relaxed);
    }

    fn peek_w0(&self) -> u64 {
        self.word0.load(Ordering::Relaxed)
    }

    fn is_occupied(&self) -> bool {
        let (_, bound, _, _) = Self::decode_w0(self.peek_w0());
        bound != Bound::None
    }
}

/// Lockless transposition table, shared across Lazy-SMP worker threads.
///
/// All method receivers are `&self` — safe to share behind a plain reference
/// or `Arc`, no locking required.
pub struct TranspositionTable {
    entries: Box<[AtomicEntry]>,
    /// `64 - log2(entries.len())`, the Fibonacci-hashing shift.
    shift: u32,
    age: AtomicU8,
}

impl TranspositionTable {
    /// Create a table sized to `mb` megabytes, rounded down to a power of two entries.
    pub fn new(mb: usize) -> Self {
        let bytes = mb.max(1) * 1024 * 1024;
        let entry_size = std::mem::size_of::<AtomicEntry>();
        let num_entries = (bytes / entry_size).next_power_of_two().max(1);

        let entries: Box<[AtomicEntry]> = (0..num_entries).map(|_| AtomicEntry::new()).collect();

        Self {
            entries,
            shift: 64 - num_entries.trailing_zeros(),
            age: AtomicU8::new(0),
        }
    }

    fn index(&self, hash: u64) -> usize {
        (hash.wrapping_mul(FIBONACCI_HASH) >> self.shift) as usize
    }

    /// Resize the table in place, discarding all entries.
    pub fn resize(&mut self, mb: usize) {
        *self = Self::new(mb);
    }

    /// Clear every entry and reset the age counter.
    pub fn clear(&self) {
        for entry in self.entries.iter() {
            entry.word0.store(0, Ordering::Relaxed);
            entry.word1.store(0, Ordering::Relaxed);
        }
        self.age.store(0, Ordering::Relaxed);
    }

    /// Advance the age counter. Call once per new search (not per iteration).
    pub fn new_search(&self) {
        let current = self.age.load(Ordering::Relaxed);
        self.age.store(current.wrapping_add(1) & 0x3F, Ordering::Relaxed);
    }

    /// Probe the table for `hash`. `None` on a miss, key mismatch, or torn write.
    pub fn probe(&self, hash: u64, ply: u8) -> Option<TtProbeResult> {
        let entry = &self.entries[self.index(hash)];
        let (bound, depth, mv, w1) = entry.load(hash)?;

        if bound == Bound::None {
            return None;
        }

        let score_raw = ((w1 >> 16) & 0xFFFF) as u16 as i16;

        Some(TtProbeResult {
            best_move: mv,
            depth,
            bound,
            score: score_from_tt(score_raw, ply),
        })
    }

    /// Store a position. An empty slot is always taken. A slot holding the
    /// same position (key match) is replaced when the new entry is at least
    /// as deep or is an exact bound. A slot from a different position
    /// (collision) is kept unless it's stale (a different search age) or
    /// shallower than the new entry by more than 3 plies.
    pub fn store(&self, hash: u64, depth: u8, score: i32, best_move: Move, bound: Bound, ply: u8) {
        let entry = &self.entries[self.index(hash)];
        let age = self.age.load(Ordering::Relaxed);
        let key32 = (hash >> 32) as u32;

        let w0_existing = entry.peek_w0();
        let (existing_age, existing_bound, existing_depth, _) = AtomicEntry::decode_w0(w0_existing);
        let existing_key32 = (w0_existing >> 32) as u32;

        let replace = if existing_bound == Bound::None {
            true
        } else if existing_key32 == key32 {
            depth >= existing_depth || bound == Bound::Exact
        } else {
            existing_age != age || existing_depth > depth + 3
        };

        if !replace {
            return;
        }

        let w0 = AtomicEntry::pack_word0(key32, age, bound, depth, best_move);
        let w1 = AtomicEntry::pack_word1(w0, score_to_tt(score, ply));
        entry.store(w0, w1);
    }

    /// Permille of entries occupied by the current search's age, for UCI-style `hashfull`.
    pub fn hashfull(&self) -> u32 {
        let age = self.age.load(Ordering::Relaxed);
        let sample = self.entries.len().min(1000);
        let occupied = self.entries[..sample]
            .iter()
            .filter(|e| {
                let (entry_age, bound, _, _) = AtomicEntry::decode_w0(e.peek_w0());
                bound != Bound::None && entry_age == age
            })
            .count();
        ((occupied * 1000) / sample.max(1)) as u32
    }

    /// Whether every entry in the table is empty.
    pub fn is_empty(&self) -> bool {
        !self.entries.iter().any(AtomicEntry::is_occupied)
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("entries", &self.entries.len())
            .field("age", &self.age.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talon_core::Square;

    #[test]
    fn atomic_entry_is_16_bytes() {
        assert_eq!(std::mem::size_of::<AtomicEntry>(), 16);
    }

    #[test]
    fn store_and_probe_roundtrip() {
        let tt = TranspositionTable::new(1);
        let hash: u64 = 0xDEAD_BEEF_1234_5678;
        let mv = Move::new(Square::E2, Square::E4);

        tt.store(hash, 5, 100, mv, Bound::Exact, 0);

        let result = tt.probe(hash, 0).expect("should find stored entry");
        assert_eq!(result.best_move, mv);
        assert_eq!(result.depth, 5);
        assert_eq!(result.bound, Bound::Exact);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn probe_miss_returns_none() {
        let tt = TranspositionTable::new(1);
        assert!(tt.probe(0x1234_5678_9ABC_DEF0, 0).is_none());
    }

    #[test]
    fn mate_score_adjustment_roundtrip_at_arbitrary_ply() {
        for ply in [0u8, 1, 5, 17, 63, 127] {
            let mate_score = MATE_IN_MAX_PLY + 50;
            let tt_score = score_to_tt(mate_score, ply);
            assert_eq!(score_from_tt(tt_score, ply), mate_score);

            let mated_score = -(MATE_IN_MAX_PLY + 50);
            let tt_score = score_to_tt(mated_score, ply);
            assert_eq!(score_from_tt(tt_score, ply), mated_score);
        }
    }

    #[test]
    fn normal_score_not_adjusted() {
        let score = 150;
        let ply: u8 = 10;
        let tt_score = score_to_tt(score, ply);
        assert_eq!(score_from_tt(tt_score, ply), score);
    }

    #[test]
    fn same_key_shallower_does_not_replace_even_after_new_search() {
        let tt = TranspositionTable::new(1);
        let hash: u64 = 0xAAAA_BBBB_CCCC_DDDD;
        let mv1 = Move::new(Square::E2, Square::E4);
        let mv2 = Move::new(Square::D2, Square::D4);

        tt.store(hash, 10, 100, mv1, Bound::LowerBound, 0);
        tt.new_search();
        // Same key: a shallower, non-exact entry never replaces, age aside.
        tt.store(hash, 1, 200, mv2, Bound::LowerBound, 0);

        let result = tt.probe(hash, 0).unwrap();
        assert_eq!(result.best_move, mv1);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn shallower_same_age_does_not_replace() {
        let tt = TranspositionTable::new(1);
        let hash: u64 = 0x1111_2222_3333_4444;
        let mv1 = Move::new(Square::E2, Square::E4);
        let mv2 = Move::new(Square::D2, Square::D4);

        tt.store(hash, 5, 100, mv1, Bound::LowerBound, 0);
        tt.store(hash, 3, 200, mv2, Bound::LowerBound, 0);

        let result = tt.probe(hash, 0).unwrap();
        assert_eq!(result.best_move, mv1);
    }

    #[test]
    fn colliding_key_replaces_when_stale() {
        let tt = TranspositionTable::new(1);
        let hash: u64 = 0x2222_2222_3333_4444;
        let index = tt.index(hash);
        let mv2 = Move::new(Square::D2, Square::D4);

        // Plant a deep entry for an unrelated key at the slot `hash` maps to,
        // tagged with age 0, simulating a collision from an older search.
        let foreign_key32 = (hash >> 32) as u32 ^ 0xFFFF_FFFF;
        let w0 = AtomicEntry::pack_word0(foreign_key32, 0, Bound::LowerBound, 10, Move::NULL);
        let w1 = AtomicEntry::pack_word1(w0, score_to_tt(100, 0));
        tt.entries[index].store(w0, w1);

        tt.new_search(); // age is now 1; the planted entry is stale.
        tt.store(hash, 1, 200, mv2, Bound::LowerBound, 0);

        let result = tt.probe(hash, 0).unwrap();
        assert_eq!(result.best_move, mv2);
    }

    #[test]
    fn colliding_key_keeps_much_deeper_entry_when_not_stale() {
        let tt = TranspositionTable::new(1);
        let hash: u64 = 0x2222_2222_3333_4444;
        let index = tt.index(hash);
        let mv2 = Move::new(Square::D2, Square::D4);

        // Same age as the table's current age (0), so only the depth margin applies.
        let foreign_key32 = (hash >> 32) as u32 ^ 0xFFFF_FFFF;
        let w0 = AtomicEntry::pack_word0(foreign_key32, 0, Bound::LowerBound, 10, Move::NULL);
        let w1 = AtomicEntry::pack_word1(w0, score_to_tt(100, 0));
        tt.entries[index].store(w0, w1);

        // 10 > 1 + 3, so the new, shallower colliding entry is rejected.
        tt.store(hash, 1, 200, mv2, Bound::LowerBound, 0);

        assert!(tt.probe(hash, 0).is_none());
    }

    #[test]
    fn exact_bound_always_replaces() {
        let tt = TranspositionTable::new(1);
        let hash: u64 = 0x5555_6666_7777_8888;
        let mv1 = Move::new(Square::E2, Square::E4);
        let mv2 = Move::new(Square::D2, Square::D4);

        tt.store(hash, 10, 100, mv1, Bound::LowerBound, 0);
        tt.store(hash, 2, 50, mv2, Bound::Exact, 0);

        let result = tt.probe(hash, 0).unwrap();
        assert_eq!(result.best_move, mv2);
        assert_eq!(result.bound, Bound::Exact);
    }

    #[test]
    fn clear_removes_all_entries() {
        let tt = TranspositionTable::new(1);
        let hash: u64 = 0xAAAA_BBBB_CCCC_DDDD;
        let mv = Move::new(Square::E2, Square::E4);

        tt.store(hash, 5, 100, mv, Bound::Exact, 0);
        assert!(tt.probe(hash, 0).is_some());

        tt.clear();
        assert!(tt.probe(hash, 0).is_none());
        assert!(tt.is_empty());
    }

    #[test]
    fn xor_integrity_detects_torn_write() {
        let tt = TranspositionTable::new(1);
        let hash: u64 = 0xDEAD_BEEF_1234_5678;
        let mv = Move::new(Square::E2, Square::E4);

        tt.store(hash, 5, 100, mv, Bound::Exact, 0);
        assert!(tt.probe(hash, 0).is_some());

        let index = tt.index(hash);
        let entry = &tt.entries[index];
        let w1 = entry.word1.load(Ordering::Relaxed);
        let corrupted_w1 = w1 ^ 0xFFFF_FFFF_0000_0000;
        entry.word1.store(corrupted_w1, Ordering::Relaxed);

        assert!(tt.probe(hash, 0).is_none());
    }

    #[test]
    fn concurrent_stress_no_panics() {
        use std::thread;

        let tt = std::sync::Arc::new(TranspositionTable::new(4));

        thread::scope(|s| {
            for t in 0..8u64 {
                let tt = std::sync::Arc::clone(&tt);
                s.spawn(move || {
                    let mv = Move::new(Square::E2, Square::E4);
                    for i in 0u64..10_000 {
                        let hash = (t.wrapping_mul(6364136223846793005))
                            .wrapping_add(i.wrapping_mul(2862933555777941757))
                            ^ 0xDEAD_BEEF_CAFE_F00D;
                        tt.store(hash, 5, 100, mv, Bound::Exact, 0);
                        let _ = tt.probe(hash, 0);
                    }
                });
            }
        });
    }
}

//! Lazy SMP thread pool for parallel search.

use std::sync::atomic::{AtomicU64, Ordering};

use talon_core::{Board, Move};

use crate::search::SearchResult;
use crate::search::control::SearchControl;
use crate::search::heuristics::{CounterMoveTable, HistoryTable, KillerTable};
use crate::search::negamax::{INFINITY, PvTable, SearchContext, WorkerSkew, aspiration_search};
use crate::search::tt::TranspositionTable;

/// Lazy SMP thread pool — owns the shared transposition table.
///
/// Workers explore the same root with the same limits but diverge through
/// per-thread "skew" ([`WorkerSkew`]): different starting depths, aspiration
/// widths, and pruning/ordering parameters. Only worker 0 ("main")
/// publishes iteration results; helpers 1..N contribute to the shared TT
/// and history/counter-move tables.
pub struct ThreadPool {
    tt: TranspositionTable,
    num_threads: usize,
}

impl ThreadPool {
    /// Create a new thread pool with `hash_mb` MB transposition table.
    pub fn new(hash_mb: usize) -> Self {
        Self {
            tt: TranspositionTable::new(hash_mb),
            num_threads: 1,
        }
    }

    /// Set the number of search threads, clamped to `[1, 512]`.
    pub fn set_num_threads(&mut self, n: usize) {
        self.num_threads = n.clamp(1, 512);
    }

    /// Number of configured search threads.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Resize the transposition table. Discards all prior contents.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::new(mb);
    }

    /// Clear the transposition table (preserving the allocation).
    pub fn clear_tt(&self) {
        self.tt.clear();
    }

    /// Permille occupancy of the transposition table.
    pub fn hashfull(&self) -> u32 {
        self.tt.hashfull()
    }

    /// Best move recorded for `hash`, if the transposition table has one.
    ///
    /// Used as a last-resort fallback when a search is stopped before
    /// completing its first iteration.
    pub fn tt_move(&self, hash: u64) -> Move {
        self.tt.probe(hash, 0).map(|entry| entry.best_move).unwrap_or(Move::NULL)
    }

    /// Run a Lazy SMP search.
    ///
    /// Worker 0 runs iterative deepening with the `on_iter` callback for
    /// progress reporting. Workers 1..N run silent iterative deepening,
    /// contributing only to the shared TT and heuristic tables. Uses
    /// `std::thread::scope` — no `Arc` needed around the TT reference.
    pub fn search<F>(
        &self,
        board: &Board,
        max_depth: u8,
        control: &SearchControl,
        position_history: &[u64],
        mut on_iter: F,
    ) -> SearchResult
    where
        F: FnMut(u8, u8, i32, u64, &[Move]),
    {
        self.tt.new_search();

        if self.num_threads <= 1 {
            let (result, nodes) =
                run_worker(0, &self.tt, board, max_depth, control, position_history, Some(&mut on_iter));
            let mut result = result;
            result.nodes = nodes;
            return result;
        }

        let node_counters: Vec<AtomicU64> =
            (0..self.num_threads).map(|_| AtomicU64::new(0)).collect();

        let mut result = SearchResult {
            best_move: Move::NULL,
            ponder_move: None,
            pv: vec![Move::NULL],
            score: -INFINITY,
            nodes: 0,
            depth: 0,
            seldepth: 0,
        };

        std::thread::scope(|s| {
            for (thread_id, node_counter) in node_counters.iter().enumerate().skip(1) {
                let tt = &self.tt;
                s.spawn(move || {
                    let (_, nodes) =
                        run_worker::<fn(u8, u8, i32, u64, &[Move])>(
                            thread_id, tt, board, max_depth, control, position_history, None,
                        );
                    node_counter.store(nodes, Ordering::Relaxed);
                });
            }

            let (main_result, main_nodes) =
                run_worker(0, &self.tt, board, max_depth, control, position_history, Some(&mut on_iter));
            node_counters[0].store(main_nodes, Ordering::Relaxed);
            result = main_result;
        });

        result.nodes = node_counters.iter().map(|c| c.load(Ordering::Relaxed)).sum();
        result
    }
}

/// Run iterative deepening for one worker thread.
///
/// `thread_id == 0` is the main thread: it starts at depth 1 and, when
/// `on_iter` is `Some`, reports every completed iteration. Helper threads
/// (`thread_id > 0`) start at `1 + (thread_id % 2)` and run silently.
fn run_worker<F>(
    thread_id: usize,
    tt: &TranspositionTable,
    board: &Board,
    max_depth: u8,
    control: &SearchControl,
    position_history: &[u64],
    mut on_iter: Option<&mut F>,
) -> (SearchResult, u64)
where
    F: FnMut(u8, u8, i32, u64, &[Move]),
{
    let skew = if thread_id == 0 { WorkerSkew::main() } else { WorkerSkew::for_worker(thread_id) };
    let start_depth: u8 = if thread_id == 0 { 1 } else { 1 + (thread_id % 2) as u8 };

    let mut ctx = SearchContext {
        nodes: 0,
        seldepth: 0,
        tt,
        pv: PvTable::new(),
        control,
        killers: KillerTable::new(),
        history: HistoryTable::new(),
        counter_moves: CounterMoveTable::new(),
        position_history: position_history.to_vec(),
        move_stack: [Move::NULL; crate::search::negamax::MAX_PLY],
        skew,
    };

    let mut completed_move = Move::NULL;
    let mut completed_score = -INFINITY;
    let mut completed_depth: u8 = 0;
    let mut completed_pv: Vec<Move> = Vec::new();
    let mut prev_score: i32 = 0;

    for depth in start_depth..=max_depth {
        if control.should_stop_iterating() {
            break;
        }

        let score = aspiration_search(board, depth, prev_score, &mut ctx);

        if control.should_stop(ctx.nodes) {
            break;
        }

        prev_score = score;

        let pv = ctx.pv.root_pv();
        if !pv.is_empty() && !pv[0].is_null() {
            completed_move = pv[0];
        }
        completed_score = score;
        completed_depth = depth;
        completed_pv = pv.iter().copied().filter(|m| !m.is_null()).collect();

        if let Some(cb) = on_iter.as_deref_mut() {
            cb(depth, ctx.seldepth, score, ctx.nodes, &completed_pv);
        }

        if score.abs() >= crate::search::negamax::MATE_IN_MAX_PLY {
            break;
        }
    }

    let ponder_move = if completed_pv.len() > 1 { Some(completed_pv[1]) } else { None };

    let result = SearchResult {
        best_move: completed_move,
        ponder_move,
        pv: if completed_pv.is_empty() { vec![completed_move] } else { completed_pv },
        score: completed_score,
        nodes: ctx.nodes,
        depth: completed_depth,
        seldepth: ctx.seldepth,
    };

    (result, ctx.nodes)
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("tt", &self.tt)
            .field("num_threads", &self.num_threads)
            .finish()
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new(16)
    }
}

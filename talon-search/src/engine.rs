//! Public engine facade: the single entry point external callers use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use talon_core::{Board, Move, generate_legal_moves};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::search::control::SearchControl;
use crate::search::pool::ThreadPool;
use crate::time::limits_from_go;

/// Deepest iterative-deepening ply the engine will attempt.
const MAX_SEARCH_DEPTH: u8 = crate::search::negamax::MAX_DEPTH;

/// Time/depth constraints for one search, mirroring UCI `go` parameters.
///
/// A limit of `None` means "not specified by the caller", not zero —
/// e.g. `depth: None` searches to [`MAX_SEARCH_DEPTH`], not depth zero.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub depth: Option<u8>,
    pub movetime: Option<Duration>,
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    pub infinite: bool,
}

/// A snapshot of search progress, published once per completed iteration.
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: u8,
    pub seldepth: u8,
    pub score: i32,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub pv: Vec<Move>,
}

type ProgressCallback = Box<dyn FnMut(&SearchInfo) + Send>;

/// The engine's single public entry point.
///
/// Wraps a [`ThreadPool`] with the bookkeeping a host application needs:
/// a stoppable, non-blocking `stop()` while `start_search` blocks the
/// caller's thread, and a guard that refuses to resize the transposition
/// table mid-search rather than racing the search threads.
pub struct Engine {
    pool: ThreadPool,
    searching: AtomicBool,
    current_stop: Mutex<Option<Arc<AtomicBool>>>,
    on_progress: Mutex<Option<ProgressCallback>>,
}

impl Engine {
    /// Build an engine with `tt_mb` megabytes of transposition table and
    /// `threads` Lazy SMP workers (clamped to `[1, 512]`).
    pub fn new(tt_mb: usize, threads: usize) -> Self {
        let mut pool = ThreadPool::new(tt_mb);
        pool.set_num_threads(threads);
        Self {
            pool,
            searching: AtomicBool::new(false),
            current_stop: Mutex::new(None),
            on_progress: Mutex::new(None),
        }
    }

    /// Change the worker count. Takes effect on the next `start_search`;
    /// does not interrupt a search already running.
    pub fn set_thread_count(&mut self, n: usize) {
        self.pool.set_num_threads(n);
        info!(threads = self.pool.num_threads(), "thread count updated");
    }

    /// Number of configured Lazy SMP workers.
    pub fn thread_count(&self) -> usize {
        self.pool.num_threads()
    }

    /// Reallocate the transposition table to `mb` megabytes, discarding its
    /// contents. Refuses while a search is in progress.
    pub fn resize_tt(&mut self, mb: usize) -> Result<(), EngineError> {
        if self.searching.load(Ordering::Acquire) {
            return Err(EngineError::SearchInProgress);
        }
        self.pool.resize_tt(mb);
        info!(mb, "transposition table resized");
        Ok(())
    }

    /// Permille occupancy of the transposition table.
    pub fn hashfull(&self) -> u32 {
        self.pool.hashfull()
    }

    /// Register a callback invoked after each completed iterative-deepening
    /// iteration. Replaces any previously registered callback. The callback
    /// runs on the searching thread and must not block.
    pub fn subscribe_progress<F>(&self, callback: F)
    where
        F: FnMut(&SearchInfo) + Send + 'static,
    {
        *self.on_progress.lock().expect("progress callback mutex poisoned") = Some(Box::new(callback));
    }

    /// Request the running search stop as soon as the next node check fires.
    /// Non-blocking; a no-op if no search is in progress.
    pub fn stop(&self) {
        if let Some(flag) = self.current_stop.lock().expect("stop flag mutex poisoned").as_ref() {
            debug!("stop requested");
            flag.store(true, Ordering::Release);
        }
    }

    /// Run a blocking search from `board` and return the chosen move.
    ///
    /// `position_history` supplies prior position hashes (oldest first) so
    /// repetition detection can see across the game, not just the search
    /// tree. Returns [`EngineError::InvalidPosition`] if `board` has no
    /// legal moves.
    pub fn start_search(
        &self,
        board: &Board,
        limits: SearchLimits,
        position_history: &[u64],
    ) -> Result<Move, EngineError> {
        let legal = generate_legal_moves(board);
        if legal.is_empty() {
            return Err(EngineError::InvalidPosition);
        }

        let stopped = Arc::new(AtomicBool::new(false));
        *self.current_stop.lock().expect("stop flag mutex poisoned") = Some(Arc::clone(&stopped));
        self.searching.store(true, Ordering::Release);

        let control = build_control(&limits, board.side_to_move(), Arc::clone(&stopped));
        let max_depth = limits.depth.unwrap_or(MAX_SEARCH_DEPTH).min(MAX_SEARCH_DEPTH);
        let start = Instant::now();

        let result = self.pool.search(
            board,
            max_depth,
            &control,
            position_history,
            |depth, seldepth, score, nodes, pv| {
                let elapsed = start.elapsed();
                self.report_progress(depth, seldepth, score, nodes, pv, elapsed);
            },
        );

        self.searching.store(false, Ordering::Release);
        *self.current_stop.lock().expect("stop flag mutex poisoned") = None;

        let best = if !result.best_move.is_null() {
            result.best_move
        } else {
            let tt_move = self.pool.tt_move(board.hash());
            if !tt_move.is_null() { tt_move } else { legal.as_slice()[0] }
        };

        Ok(best)
    }

    fn report_progress(
        &self,
        depth: u8,
        seldepth: u8,
        score: i32,
        nodes: u64,
        pv: &[Move],
        elapsed: Duration,
    ) {
        let mut guard = self.on_progress.lock().expect("progress callback mutex poisoned");
        if guard.is_none() {
            return;
        }

        let nps = if elapsed.as_secs_f64() > 0.0 { (nodes as f64 / elapsed.as_secs_f64()) as u64 } else { 0 };
        let info = SearchInfo {
            depth,
            seldepth,
            score,
            nodes,
            nps,
            time_ms: elapsed.as_millis() as u64,
            pv: pv.to_vec(),
        };
        debug!(depth, score, nodes, nps, "iteration complete");

        if let Some(cb) = guard.as_mut() {
            cb(&info);
        }
    }
}

fn build_control(limits: &SearchLimits, side: talon_core::Color, stopped: Arc<AtomicBool>) -> SearchControl {
    if limits.infinite {
        return SearchControl::new_infinite(stopped);
    }
    if let Some(movetime) = limits.movetime {
        return SearchControl::new_timed(stopped, movetime);
    }
    if limits.wtime.is_some() || limits.btime.is_some() {
        return limits_from_go(
            limits.wtime,
            limits.btime,
            limits.winc,
            limits.binc,
            limits.movestogo,
            None,
            false,
            side,
            stopped,
        );
    }
    SearchControl::new_infinite(stopped)
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(16, 1)
    }
}

//! Error types surfaced by the fallible [`Engine`](crate::engine::Engine) methods.

/// Recoverable runtime conditions from the engine's public surface.
///
/// Internal search-tree conditions (a malformed TT move, depth overflow,
/// the stop flag) never escape as a `Result` — they're handled in-band
/// inside `negamax`/`qsearch`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// `start_search` was given a position with no legal moves.
    #[error("position has no legal moves")]
    InvalidPosition,
    /// `resize_tt` was called while a search was running.
    #[error("cannot resize the transposition table during an active search")]
    SearchInProgress,
    /// The transposition table could not be allocated at the requested size.
    #[error("failed to allocate {requested_mb} MB transposition table")]
    TtAllocation {
        /// The size, in megabytes, that failed to allocate.
        requested_mb: usize,
    },
}

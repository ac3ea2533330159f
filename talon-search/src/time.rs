//! Time management — convert clock parameters to a search budget.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use talon_core::Color;

use crate::search::control::SearchControl;

/// Allocate a time budget for one search.
///
/// `allocate = min(time_left - 50, time_left / mtg + 3 * inc / 4)`, floored
/// at 100ms. `mtg` defaults to 40 when the GUI doesn't report moves-to-go.
pub fn allocate_time(time_left: Duration, increment: Duration, moves_to_go: Option<u32>) -> Duration {
    let time_left_ms = time_left.as_millis() as i64;
    if time_left_ms <= 0 {
        return Duration::from_millis(100);
    }

    let mtg = moves_to_go.filter(|&m| m > 0).unwrap_or(40) as i64;
    let inc_ms = increment.as_millis() as i64;

    let overhead_budget = time_left_ms - 50;
    let per_move_budget = time_left_ms / mtg + 3 * inc_ms / 4;

    let allocated_ms = overhead_budget.min(per_move_budget).max(100);
    Duration::from_millis(allocated_ms as u64)
}

/// Build a [`SearchControl`] from `go` parameters and the side to move.
///
/// Priority: `movetime` overrides everything; `infinite` or a depth-only
/// search runs with no time budget; otherwise the clock/increment/movestogo
/// for the side to move feed [`allocate_time`].
#[allow(clippy::too_many_arguments)]
pub fn limits_from_go(
    wtime: Option<Duration>,
    btime: Option<Duration>,
    winc: Option<Duration>,
    binc: Option<Duration>,
    movestogo: Option<u32>,
    movetime: Option<Duration>,
    infinite: bool,
    side: Color,
    stopped: Arc<AtomicBool>,
) -> SearchControl {
    if infinite {
        return SearchControl::new_infinite(stopped);
    }

    if let Some(mt) = movetime {
        return SearchControl::new_timed(stopped, mt);
    }

    let (remaining, increment) = match side {
        Color::White => (wtime, winc),
        Color::Black => (btime, binc),
    };

    if let Some(rem) = remaining {
        let inc = increment.unwrap_or(Duration::ZERO);
        let budget = allocate_time(rem, inc, movestogo);
        return SearchControl::new_timed(stopped, budget);
    }

    SearchControl::new_infinite(stopped)
}

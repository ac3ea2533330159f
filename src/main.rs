//! Command-line front door: perft counting, a fixed-depth benchmark suite,
//! and one-shot search, in lieu of a full protocol loop.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use talon_core::{Board, STARTING_FEN, divide, perft};
use talon_search::{Engine, SearchLimits};
use tracing::info;

#[derive(Parser)]
#[command(name = "talon", version, about = "Search-core exerciser for the talon chess engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count leaf nodes reachable in `depth` plies from a position.
    Perft {
        #[arg(long, default_value_t = 5)]
        depth: usize,
        #[arg(long)]
        fen: Option<String>,
        /// Print the per-root-move breakdown instead of just the total.
        #[arg(long)]
        divide: bool,
    },
    /// Run a fixed depth search over a small suite of benchmark positions.
    Bench {
        #[arg(long, default_value_t = 8)]
        depth: u8,
        #[arg(long, default_value_t = 1)]
        threads: usize,
    },
    /// Search one position and print the chosen move.
    Search {
        #[arg(long)]
        fen: Option<String>,
        #[arg(long)]
        depth: Option<u8>,
        #[arg(long)]
        movetime_ms: Option<u64>,
        #[arg(long, default_value_t = 1)]
        threads: usize,
        #[arg(long, default_value_t = 64)]
        hash_mb: usize,
    },
}

const BENCH_POSITIONS: &[&str] = &[
    STARTING_FEN,
    "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
    "rnbqkb1r/pp1p1ppp/4pn2/2p5/2P5/2N5/PP1PPPPP/R1BQKBNR w KQkq - 0 4",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
];

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Perft { depth, fen, divide: want_divide } => run_perft(depth, fen, want_divide)?,
        Command::Bench { depth, threads } => run_bench(depth, threads)?,
        Command::Search { fen, depth, movetime_ms, threads, hash_mb } => {
            run_search(fen, depth, movetime_ms, threads, hash_mb)?
        }
    }

    Ok(())
}

fn parse_board(fen: Option<String>) -> Result<Board> {
    match fen {
        Some(fen) => fen.parse::<Board>().with_context(|| format!("invalid FEN: {fen}")),
        None => Ok(Board::starting_position()),
    }
}

fn run_perft(depth: usize, fen: Option<String>, want_divide: bool) -> Result<()> {
    let board = parse_board(fen)?;

    if want_divide {
        let breakdown = divide(&board, depth);
        let mut total = 0u64;
        for (mv, count) in &breakdown {
            println!("{mv}: {count}");
            total += count;
        }
        println!("\ntotal: {total}");
        return Ok(());
    }

    let start = Instant::now();
    let nodes = perft(&board, depth);
    let elapsed = start.elapsed();
    let nps = if elapsed.as_secs_f64() > 0.0 { nodes as f64 / elapsed.as_secs_f64() } else { 0.0 };
    println!("depth {depth}: {nodes} nodes in {:.3}s ({:.0} nps)", elapsed.as_secs_f64(), nps);
    Ok(())
}

fn run_bench(depth: u8, threads: usize) -> Result<()> {
    let start = Instant::now();

    for fen in BENCH_POSITIONS {
        let board: Board = fen.parse().with_context(|| format!("invalid bench FEN: {fen}"))?;
        let engine = Engine::new(64, threads);
        let limits = SearchLimits { depth: Some(depth), ..Default::default() };
        let mv = engine.start_search(&board, limits, &[])?;
        info!(%fen, best_move = %mv.to_uci(), "bench position complete");
    }

    let elapsed = start.elapsed();
    println!(
        "bench: {} positions at depth {depth} in {:.3}s",
        BENCH_POSITIONS.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}

fn run_search(
    fen: Option<String>,
    depth: Option<u8>,
    movetime_ms: Option<u64>,
    threads: usize,
    hash_mb: usize,
) -> Result<()> {
    let board = parse_board(fen)?;
    let engine = Engine::new(hash_mb, threads);

    engine.subscribe_progress(|info| {
        let pv: Vec<String> = info.pv.iter().map(|mv| mv.to_uci()).collect();
        println!(
            "info depth {} seldepth {} score cp {} nodes {} nps {} time {} pv {}",
            info.depth,
            info.seldepth,
            info.score,
            info.nodes,
            info.nps,
            info.time_ms,
            pv.join(" "),
        );
    });

    let limits = SearchLimits {
        depth,
        movetime: movetime_ms.map(std::time::Duration::from_millis),
        ..Default::default()
    };

    let best_move = engine.start_search(&board, limits, &[])?;
    println!("bestmove {}", best_move.to_uci());
    Ok(())
}

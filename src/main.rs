//! Gomoku-MCTS: a Monte Carlo Tree Search Gomoku engine.
//!
//! ## Usage
//!
//! - `gomoku-mcts` - Play against the engine in the terminal
//! - `gomoku-mcts protocol` - Speak the Gomocup protocol on stdin/stdout
//! - `gomoku-mcts demo` - Watch a short engine-vs-engine game

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use gomoku_mcts::board::{Board, Outcome, Player, format_point, parse_point};
use gomoku_mcts::config::EngineConfig;
use gomoku_mcts::constants::{
    DEFAULT_DIMENSION, DEMO_DIMENSION, DEMO_ITERATIONS, MARK_EMPTY, N_ITERATIONS,
};
use gomoku_mcts::protocol::ProtocolEngine;
use gomoku_mcts::session::{GameSession, iteration_budget};

/// Gomoku-MCTS: a Monte Carlo Tree Search Gomoku engine
#[derive(Parser)]
#[command(name = "gomoku-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Board size (NxN)
    #[arg(long, global = true)]
    size: Option<usize>,

    /// Base number of search iterations per engine move
    #[arg(long, global = true)]
    iterations: Option<usize>,

    /// Seed for the playout RNG (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Widen the move search radius after this many moves
    #[arg(long, global = true)]
    closeby_move_limit: Option<usize>,

    /// Keep every search node for the whole game
    #[arg(long, global = true)]
    no_prune: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the engine in the terminal
    Play {
        /// Let the engine make the first move
        #[arg(long)]
        engine_first: bool,
    },
    /// Speak the Gomocup protocol on stdin/stdout
    Protocol,
    /// Run a short engine-vs-engine game
    Demo,
}

impl Cli {
    fn engine_config(&self, default_dimension: usize) -> EngineConfig {
        let mut config = EngineConfig::default()
            .with_dimension(self.size.unwrap_or(default_dimension))
            .with_pruning(!self.no_prune);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(limit) = self.closeby_move_limit {
            config = config.with_closeby_move_limit(limit);
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Some(Commands::Protocol) => {
            let mut engine = ProtocolEngine::new(
                cli.engine_config(DEFAULT_DIMENSION),
                cli.iterations.unwrap_or(N_ITERATIONS),
            );
            engine.run(io::stdin().lock(), io::stdout().lock())
        }
        Some(Commands::Demo) => run_demo(
            GameSession::with_config(cli.engine_config(DEMO_DIMENSION))?,
            cli.iterations.unwrap_or(DEMO_ITERATIONS),
        ),
        Some(Commands::Play { engine_first }) => run_play(
            GameSession::with_config(cli.engine_config(DEFAULT_DIMENSION))?,
            cli.iterations.unwrap_or(N_ITERATIONS),
            engine_first,
        ),
        None => run_play(
            GameSession::with_config(cli.engine_config(DEFAULT_DIMENSION))?,
            cli.iterations.unwrap_or(N_ITERATIONS),
            false,
        ),
    }
}

/// Log to stderr so stdout stays free for the protocol.
fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run_play(mut session: GameSession, iterations: usize, engine_first: bool) -> Result<()> {
    println!("Gomoku-MCTS: five in a row wins\n");
    println!("Enter moves like h8. Other commands: go (engine moves), new, nodes, quit\n");

    let mut human = Player::Black;
    if engine_first {
        human = Player::White;
        engine_turn(&mut session, iterations)?;
    } else {
        println!("{}", labeled(session.board()));
    }

    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        match line.trim() {
            "" => {}
            "quit" | "q" => break,
            "new" => {
                session.restart();
                human = Player::Black;
                println!("{}", labeled(session.board()));
            }
            "nodes" => session.store().dump_nodes(10),
            "go" if !session.is_over() => {
                human = session.turn().next();
                engine_turn(&mut session, iterations)?;
                report_end(&session, human);
            }
            _ if session.is_over() => println!("Game over. Type new to play again."),
            input => match parse_point(input, session.board().dimension()) {
                None => println!("Cannot parse move {input:?}"),
                Some(index) => match session.commit_move(index) {
                    Err(e) => println!("{e}"),
                    Ok(_) => {
                        if !session.is_over() {
                            engine_turn(&mut session, iterations)?;
                        } else {
                            println!("{}", labeled(session.board()));
                        }
                        report_end(&session, human);
                    }
                },
            },
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush().context("failed to flush stdout")
}

/// Think, play the engine's move and show the result.
fn engine_turn(session: &mut GameSession, iterations: usize) -> Result<()> {
    let budget = iteration_budget(iterations, session.moves_made());
    session.think(budget)?;
    let choice = session.engine_move()?;

    let point = format_point(choice.index, session.board().dimension());
    match choice.win_probability {
        Some(p) => println!("Computer plays {point} (win probability {:.0}%)", p * 100.0),
        None => println!("Computer plays {point}"),
    }
    println!("{}", labeled(session.board()));
    Ok(())
}

fn report_end(session: &GameSession, human: Player) {
    if session.is_over() {
        info!(result = %session.result(), moves = session.moves_made(), "game over");
        println!("{}", end_message(session.result(), human));
    }
}

fn end_message(result: Outcome, human: Player) -> &'static str {
    match result {
        Outcome::Win(winner) if winner == human => "You won!",
        Outcome::Win(_) => "Computer won!",
        Outcome::Draw => "You drew!",
        Outcome::Undetermined => "",
    }
}

/// Board with column letters and row numbers, matching move input.
fn labeled(board: &Board) -> String {
    let dimension = board.dimension();
    let mut out = String::from("   ");
    for col in 0..dimension {
        out.push((b'A' + col as u8) as char);
        out.push(' ');
    }
    out.push('\n');
    for row in 0..dimension {
        out.push_str(&format!("{:>2} ", row + 1));
        for col in 0..dimension {
            out.push(board.at(row, col).map_or(MARK_EMPTY, Player::mark));
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

fn run_demo(mut session: GameSession, iterations: usize) -> Result<()> {
    println!("Gomoku-MCTS: engine vs engine\n");
    while !session.is_over() {
        let mover = session.turn();
        let budget = iteration_budget(iterations, session.moves_made());
        session.think(budget)?;
        let choice = session.engine_move()?;
        println!(
            "{mover} plays {} ({:?})",
            format_point(choice.index, session.board().dimension()),
            choice.kind
        );
    }
    println!("{}", labeled(session.board()));
    println!("Result: {} after {} moves", session.result(), session.moves_made());
    Ok(())
}

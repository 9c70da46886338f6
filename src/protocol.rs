//! Gomocup text protocol.
//!
//! The protocol used by Gomoku tournament managers and GUIs such as
//! Piskvork. The manager writes one command per line and the engine answers
//! on stdout; coordinates are `x,y` with `x` the column and `y` the row,
//! both starting at 0.
//!
//! ## Supported Commands
//!
//! - `START <size>` - Start a game on a `size x size` board
//! - `RESTART` - Start a new game on the current board
//! - `BEGIN` - The engine plays the opening move
//! - `TURN <x>,<y>` - The opponent played `x,y`; the engine replies
//! - `BOARD` ... `DONE` - Set up a position, one `x,y,who` line per stone
//!   (`1` engine, `2` opponent) in the order they were played; the engine
//!   then replies
//! - `INFO <key> <value>` - Tournament settings, accepted and ignored
//! - `ABOUT` - Engine name and version
//! - `END` - Exit the program

use std::io::{BufRead, Write};

use anyhow::{Context, anyhow, bail};
use tracing::{debug, info, warn};

use crate::board::Player;
use crate::config::EngineConfig;
use crate::session::{GameSession, iteration_budget};

/// What to send back for one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Write this line.
    Line(String),
    /// Nothing to write.
    Silent,
    /// Stop reading input.
    Quit,
}

/// Stone owner in a `BOARD` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Engine,
    Opponent,
}

/// Protocol engine state.
pub struct ProtocolEngine {
    config: EngineConfig,
    session: Option<GameSession>,
    /// Base iterations per move, scaled by [`iteration_budget`]
    iterations: usize,
    /// Stones collected between `BOARD` and `DONE`
    pending_board: Option<Vec<(usize, usize, Owner)>>,
}

impl ProtocolEngine {
    /// Create an engine. No game runs until the manager sends `START`.
    pub fn new(config: EngineConfig, iterations: usize) -> Self {
        Self {
            config,
            session: None,
            iterations,
            pending_board: None,
        }
    }

    /// Run the command loop until `END` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read protocol input")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.execute(line) {
                Reply::Line(reply) => {
                    writeln!(output, "{reply}").context("failed to write protocol reply")?;
                    output.flush().context("failed to flush protocol output")?;
                }
                Reply::Silent => {}
                Reply::Quit => break,
            }
        }
        Ok(())
    }

    /// The running game, if any.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Execute one input line.
    pub fn execute(&mut self, line: &str) -> Reply {
        if self.pending_board.is_some() {
            return self.board_line(line);
        }

        let (command, args) = match line.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (line, ""),
        };
        debug!(command, args, "protocol command");

        match command.to_ascii_uppercase().as_str() {
            "START" => match args.parse::<usize>() {
                Ok(size) => self.start(size),
                Err(_) => error_reply(format!("invalid board size {args:?}")),
            },

            "RESTART" => self.start(self.config.dimension),

            "BEGIN" => match self.session.as_ref().map(GameSession::moves_made) {
                Some(0) => self.engine_reply(),
                Some(_) => error_reply("BEGIN only allowed on an empty board"),
                None => error_reply("no game started"),
            },

            "TURN" => {
                let Some(session) = self.session.as_mut() else {
                    return error_reply("no game started");
                };
                let Some((x, y)) = parse_xy(args) else {
                    return error_reply(format!("invalid coordinates {args:?}"));
                };
                let Some(index) = session.board().index(y, x) else {
                    return error_reply(format!("coordinates {x},{y} off board"));
                };
                if let Err(e) = session.commit_move(index) {
                    return error_reply(e);
                }
                self.engine_reply()
            }

            "BOARD" => {
                if self.session.is_none() {
                    return error_reply("no game started");
                }
                self.pending_board = Some(Vec::new());
                Reply::Silent
            }

            "INFO" => Reply::Silent,

            "ABOUT" => Reply::Line(format!(
                "name=\"{}\", version=\"{}\"",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            )),

            "END" => Reply::Quit,

            _ => Reply::Line(format!("UNKNOWN command {command}")),
        }
    }

    fn start(&mut self, size: usize) -> Reply {
        match GameSession::with_config(self.config.clone().with_dimension(size)) {
            Ok(session) => {
                info!(size, "new game");
                self.config.dimension = size;
                self.session = Some(session);
                Reply::Line("OK".to_string())
            }
            Err(e) => error_reply(e),
        }
    }

    /// One line inside a `BOARD` block.
    fn board_line(&mut self, line: &str) -> Reply {
        if line.eq_ignore_ascii_case("DONE") {
            let stones = self.pending_board.take().unwrap_or_default();
            return match self.setup_position(&stones) {
                Ok(()) => self.engine_reply(),
                Err(e) => {
                    if let Some(session) = self.session.as_mut() {
                        session.restart();
                    }
                    error_reply(e)
                }
            };
        }

        let parsed = line.rsplit_once(',').and_then(|(xy, who)| {
            let (x, y) = parse_xy(xy)?;
            let owner = match who.trim() {
                "1" => Owner::Engine,
                "2" => Owner::Opponent,
                _ => return None,
            };
            Some((x, y, owner))
        });
        match (parsed, self.pending_board.as_mut()) {
            (Some(stone), Some(stones)) => {
                stones.push(stone);
                Reply::Silent
            }
            _ => {
                self.pending_board = None;
                error_reply(format!("invalid board line {line:?}"))
            }
        }
    }

    /// Replay `stones` on a fresh board. Stones must alternate, ending with
    /// the engine to move.
    fn setup_position(&mut self, stones: &[(usize, usize, Owner)]) -> anyhow::Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("no game started"))?;
        session.restart();
        let engine = Player::from_index(stones.len());

        for &(x, y, owner) in stones {
            let expected = if session.turn() == engine {
                Owner::Engine
            } else {
                Owner::Opponent
            };
            if owner != expected {
                bail!("stone {x},{y} breaks the move order");
            }
            let index = session
                .board()
                .index(y, x)
                .ok_or_else(|| anyhow!("coordinates {x},{y} off board"))?;
            session.commit_move(index)?;
        }
        Ok(())
    }

    /// Think for the current move budget and play the engine's move.
    fn engine_reply(&mut self) -> Reply {
        let Some(session) = self.session.as_mut() else {
            return error_reply("no game started");
        };
        let budget = iteration_budget(self.iterations, session.moves_made());
        let choice = match session.think(budget).and_then(|_| session.engine_move()) {
            Ok(choice) => choice,
            Err(e) => return error_reply(e),
        };

        let dimension = session.board().dimension();
        let (y, x) = (choice.index / dimension, choice.index % dimension);
        match choice.win_probability {
            Some(p) => info!(x, y, budget, win_probability = p, "engine move"),
            None => info!(x, y, budget, kind = ?choice.kind, "engine move"),
        }
        if session.is_over() {
            info!(result = %session.result(), "game over");
        }
        Reply::Line(format!("{x},{y}"))
    }
}

fn error_reply(message: impl std::fmt::Display) -> Reply {
    warn!(%message, "protocol error");
    Reply::Line(format!("ERROR {message}"))
}

/// Parse `"x,y"` into (column, row).
pub fn parse_xy(s: &str) -> Option<(usize, usize)> {
    let (x, y) = s.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

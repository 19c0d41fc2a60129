use std::collections::VecDeque;
use std::str::FromStr;

use shakmaty::Square;
use thiserror::Error;

use crate::moves::Move;
use crate::multiverse::{Branch, Multiverse, MultiverseError};

/// Error when parsing a command or command script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid command: '{0}'")]
pub struct ParseError(String);

/// One user instruction to the multiverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `e2e4`: play a move in every universe.
    Move(Move),
    /// `q`, `q e2` or `q e2e4 g1f3`: fork on all moves, moves from a
    /// square, or the listed moves.
    Branch(Branch),
    /// `cull`: merge universes with identical boards.
    Cull,
    /// `exit`
    Exit,
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError(s.trim().to_string());
        let tokens: Vec<&str> = s.split_whitespace().collect();

        match tokens.as_slice() {
            ["q" | "branch"] => Ok(Command::Branch(Branch::All)),
            ["q" | "branch", square] if square.len() == 2 => square
                .parse::<Square>()
                .map(|sq| Command::Branch(Branch::From(sq)))
                .map_err(|_| err()),
            ["q" | "branch", moves @ ..] => moves
                .iter()
                .map(|m| m.parse::<Move>())
                .collect::<Result<Vec<_>, _>>()
                .map(|moves| Command::Branch(Branch::Moves(moves)))
                .map_err(|_| err()),
            ["cull"] => Ok(Command::Cull),
            ["exit" | "quit"] => Ok(Command::Exit),
            [notation] => notation.parse().map(Command::Move).map_err(|_| err()),
            _ => Err(err()),
        }
    }
}

/// Apply one command. `Exit` is a no-op here; callers stop on it.
pub fn execute(multiverse: &mut Multiverse, command: &Command) -> Result<usize, MultiverseError> {
    match command {
        Command::Move(mv) => multiverse.apply_move(*mv),
        Command::Branch(source) => multiverse.branch(source),
        Command::Cull => {
            multiverse.cull_duplicates();
            Ok(multiverse.len())
        }
        Command::Exit => Ok(multiverse.len()),
    }
}

/// Parse a script into commands.
///
/// Format:
/// - Commands are separated by periods (". ") or newlines
/// - Blank commands are skipped
///
/// Example: `"q e2. e7e5. cull."`
pub fn parse_script(script: &str) -> Result<Vec<Command>, ParseError> {
    script
        .split(['.', '\n'])
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::parse)
        .collect()
}

/// A multiverse driven by queued commands.
///
/// New script can be appended at any time; each `tick` runs one command.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGame {
    multiverse: Multiverse,
    pending: VecDeque<Command>,
}

impl ScriptedGame {
    /// Start from a single universe at the initial position.
    pub fn new() -> Self {
        Self::from_multiverse(Multiverse::new())
    }

    pub fn from_multiverse(multiverse: Multiverse) -> Self {
        Self {
            multiverse,
            pending: VecDeque::new(),
        }
    }

    #[inline]
    pub fn multiverse(&self) -> &Multiverse {
        &self.multiverse
    }

    /// Number of queued commands.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Parse and queue additional script. Nothing is queued on error.
    pub fn push_script(&mut self, script: &str) -> Result<(), ParseError> {
        let commands = parse_script(script)?;
        self.pending.extend(commands);
        Ok(())
    }

    /// Execute the next queued command.
    ///
    /// Returns `None` when nothing is queued or an `exit` was reached, which
    /// also discards the rest of the queue.
    pub fn tick(&mut self) -> Option<(Command, Result<usize, MultiverseError>)> {
        let command = self.pending.pop_front()?;
        if command == Command::Exit {
            self.pending.clear();
            return None;
        }
        let outcome = execute(&mut self.multiverse, &command);
        Some((command, outcome))
    }

    /// Execute all queued commands, calling `on_tick` after each.
    pub fn drain<F>(&mut self, mut on_tick: F)
    where
        F: FnMut(&Command, &Result<usize, MultiverseError>),
    {
        while let Some((command, outcome)) = self.tick() {
            on_tick(&command, &outcome);
        }
    }
}

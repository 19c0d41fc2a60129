//! A chess variant where every position can split into parallel universes.
//!
//! A [`Multiverse`] holds one or more [`Timeline`]s. A move is played in
//! every timeline where it is legal, and a branch forks each timeline on a
//! set of candidate moves. Timelines that reach the same board are merged.

pub mod board;
pub mod legality;
pub mod moves;
pub mod multiverse;
pub mod superposition;
pub mod terminal;
pub mod timeline;

pub use board::Board;
pub use moves::{Move, MoveRecord};
pub use multiverse::{Branch, Multiverse, MultiverseError};
pub use timeline::{Status, Timeline};

/// Trait for showing the state of a multiverse to the player.
///
/// Implementations decide how superposed squares and checked kings are
/// drawn (terminal colors, a GUI, etc.).
pub trait MultiverseDisplay {
    /// Error type for display update failures.
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Show the given superposition of all universes.
    fn show(&mut self, view: &superposition::SuperpositionView) -> Result<(), Self::Error>;
}

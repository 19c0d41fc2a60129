use std::collections::HashSet;
use std::fmt;

use rayon::prelude::*;
use shakmaty::Square;
use thiserror::Error;

use crate::board::Board;
use crate::moves::Move;
use crate::timeline::{Status, Timeline};

/// Which moves a [`Multiverse::branch`] call forks on, per timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    /// Every legal move of the piece on this square.
    From(Square),
    /// Every legal move of the side to move.
    All,
    /// An explicit candidate set; candidates illegal in a timeline are skipped.
    Moves(Vec<Move>),
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::From(square) => write!(f, "moves from {square}"),
            Branch::All => write!(f, "all moves"),
            Branch::Moves(moves) => {
                let moves: Vec<String> = moves.iter().map(Move::to_string).collect();
                write!(f, "moves [{}]", moves.join(" "))
            }
        }
    }
}

/// A multiverse operation that left the timeline set unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultiverseError {
    #[error("move {0} is not legal in any universe")]
    IllegalEverywhere(Move),
    #[error("no legal branches for {0} in any universe")]
    NoBranches(Branch),
}

/// Every live timeline of one game.
///
/// Never empty, and no two timelines share a board layout once an operation
/// returns. Operations are all-or-nothing: on error the set is exactly what
/// it was before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multiverse {
    timelines: Vec<Timeline>,
}

impl Default for Multiverse {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiverse {
    /// A single timeline at the initial position.
    pub fn new() -> Self {
        Self::from_timeline(Timeline::new())
    }

    pub fn from_timeline(timeline: Timeline) -> Self {
        Self {
            timelines: vec![timeline],
        }
    }

    #[inline]
    pub fn timelines(&self) -> &[Timeline] {
        &self.timelines
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    /// Always `false` for a multiverse that came out of a public operation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Timeline> {
        self.timelines.iter()
    }

    pub fn boards(&self) -> impl Iterator<Item = &Board> + '_ {
        self.timelines.iter().map(Timeline::board)
    }

    /// Play `mv` in every timeline, dropping the ones where it is illegal.
    ///
    /// Returns the number of timelines after deduplication.
    pub fn apply_move(&mut self, mv: Move) -> Result<usize, MultiverseError> {
        let survivors: Vec<Timeline> = self
            .timelines
            .par_iter()
            .filter_map(|timeline| {
                let mut next = timeline.clone();
                next.try_move(mv).then_some(next)
            })
            .collect();

        if survivors.is_empty() {
            log::debug!("move {mv} rejected in all {} universes", self.len());
            return Err(MultiverseError::IllegalEverywhere(mv));
        }

        log::debug!(
            "move {mv} kept {} of {} universes",
            survivors.len(),
            self.len()
        );
        self.timelines = survivors;
        self.cull_duplicates();
        Ok(self.len())
    }

    /// Fork every timeline on each candidate move that is legal in it.
    ///
    /// Timelines without a single legal candidate have no descendants.
    /// Returns the number of timelines after deduplication.
    pub fn branch(&mut self, source: &Branch) -> Result<usize, MultiverseError> {
        let next: Vec<Timeline> = self
            .timelines
            .par_iter()
            .flat_map_iter(|timeline| fork(timeline, source))
            .collect();

        if next.is_empty() {
            log::debug!("{source} produced no branches in {} universes", self.len());
            return Err(MultiverseError::NoBranches(source.clone()));
        }

        log::debug!(
            "{source} forked {} universes into {}",
            self.len(),
            next.len()
        );
        self.timelines = next;
        self.cull_duplicates();
        Ok(self.len())
    }

    /// Keep the first timeline of each group with equal boards.
    ///
    /// Returns how many timelines were removed.
    pub fn cull_duplicates(&mut self) -> usize {
        let before = self.timelines.len();
        let mut seen = HashSet::with_capacity(before);
        self.timelines.retain(|timeline| seen.insert(*timeline.board()));

        let removed = before - self.timelines.len();
        if removed > 0 {
            log::debug!("culled {removed} duplicate universes, {} remain", self.len());
        }
        removed
    }

    /// Terminal condition of every timeline, in order.
    pub fn statuses(&self) -> Vec<Status> {
        self.timelines.par_iter().map(Timeline::status).collect()
    }

    /// Number of timelines whose side to move is in check.
    pub fn count_in_check(&self) -> usize {
        self.timelines
            .par_iter()
            .filter(|timeline| timeline.is_check())
            .count()
    }
}

impl<'a> IntoIterator for &'a Multiverse {
    type Item = &'a Timeline;
    type IntoIter = std::slice::Iter<'a, Timeline>;

    fn into_iter(self) -> Self::IntoIter {
        self.timelines.iter()
    }
}

fn fork(timeline: &Timeline, source: &Branch) -> Vec<Timeline> {
    match source {
        Branch::From(square) => timeline
            .legal_moves_from(*square)
            .into_iter()
            .map(|mv| timeline.forked(mv))
            .collect(),
        Branch::All => timeline
            .legal_moves()
            .into_iter()
            .map(|mv| timeline.forked(mv))
            .collect(),
        Branch::Moves(candidates) => candidates
            .iter()
            .filter_map(|&mv| {
                let mut next = timeline.clone();
                next.try_move(mv).then_some(next)
            })
            .collect(),
    }
}

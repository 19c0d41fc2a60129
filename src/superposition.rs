use shakmaty::{Piece, Square};

use crate::board::{Board, NUM_SQUARES};
use crate::legality;
use crate::multiverse::Multiverse;

/// What a single square holds across every universe.
///
/// Outcomes are kept in first-seen order with the number of universes
/// showing each one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Occupancy {
    outcomes: Vec<(Option<Piece>, usize)>,
}

impl Occupancy {
    fn record(&mut self, occupant: Option<Piece>) {
        match self.outcomes.iter_mut().find(|(seen, _)| *seen == occupant) {
            Some((_, count)) => *count += 1,
            None => self.outcomes.push((occupant, 1)),
        }
    }

    /// Distinct occupants (`None` = empty) and their universe counts.
    #[inline]
    pub fn outcomes(&self) -> &[(Option<Piece>, usize)] {
        &self.outcomes
    }

    /// Distinct pieces that stand here in at least one universe.
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.outcomes.iter().filter_map(|(piece, _)| *piece)
    }

    /// The square differs between universes.
    #[inline]
    pub fn is_superposed(&self) -> bool {
        self.outcomes.len() > 1
    }

    /// The occupant shared by every universe, if the square is settled.
    pub fn settled(&self) -> Option<Option<Piece>> {
        match self.outcomes.as_slice() {
            [(occupant, _)] => Some(*occupant),
            _ => None,
        }
    }
}

/// Per-square summary of a set of boards for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperpositionView {
    squares: Vec<Occupancy>,
    universes: usize,
    checked_kings: Vec<Square>,
}

impl SuperpositionView {
    #[inline]
    pub fn get(&self, square: Square) -> &Occupancy {
        &self.squares[usize::from(square)]
    }

    /// Number of boards summarised.
    #[inline]
    pub fn universes(&self) -> usize {
        self.universes
    }

    /// Squares where the side to move has its king in check in at least
    /// one universe.
    #[inline]
    pub fn checked_kings(&self) -> &[Square] {
        &self.checked_kings
    }

    /// Squares that differ between universes.
    pub fn superposed(&self) -> impl Iterator<Item = Square> + '_ {
        Square::ALL
            .into_iter()
            .filter(|&square| self.get(square).is_superposed())
    }
}

/// Boards a view can be computed from.
pub trait SuperpositionSource {
    fn boards(&self) -> impl Iterator<Item = &Board>;
}

impl SuperpositionSource for Multiverse {
    fn boards(&self) -> impl Iterator<Item = &Board> {
        Multiverse::boards(self)
    }
}

impl SuperpositionSource for [Board] {
    fn boards(&self) -> impl Iterator<Item = &Board> {
        self.iter()
    }
}

/// Summarise every board of `source` square by square.
pub fn compute_superposition<S: SuperpositionSource + ?Sized>(source: &S) -> SuperpositionView {
    let mut squares = vec![Occupancy::default(); NUM_SQUARES];
    let mut checked_kings = Vec::new();
    let mut universes = 0;

    for board in source.boards() {
        universes += 1;
        for square in Square::ALL {
            squares[usize::from(square)].record(board.piece_at(square));
        }

        let turn = board.turn();
        if let Some(king) = board.king_square(turn) {
            if !checked_kings.contains(&king) && legality::is_in_check(board, turn) {
                checked_kings.push(king);
            }
        }
    }

    SuperpositionView {
        squares,
        universes,
        checked_kings,
    }
}

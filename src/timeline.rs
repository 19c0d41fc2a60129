use shakmaty::{Color, Square};

use crate::board::Board;
use crate::legality::{self, Flags};
use crate::moves::{Move, MoveRecord};

/// Terminal condition of a single timeline, from the side to move's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ongoing,
    /// In check with at least one legal reply.
    Check,
    Checkmate,
    Stalemate,
}

/// One universe: a move record and the board it has been replayed to.
///
/// `board` always equals `origin` with the first `applied()` entries of
/// `record` played on it. Entries past that point are pending until
/// [`Timeline::apply_recorded`] runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    record: MoveRecord,
    origin: Board,
    board: Board,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// A fresh game from the initial position.
    #[inline]
    pub fn new() -> Self {
        Self::from_board(Board::new())
    }

    /// A game starting from an arbitrary board with an empty record.
    pub fn from_board(board: Board) -> Self {
        Self::with_record(board, MoveRecord::new())
    }

    /// A game whose record has not been replayed yet.
    pub fn with_record(origin: Board, record: MoveRecord) -> Self {
        Self {
            record,
            origin,
            board: origin,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn origin(&self) -> &Board {
        &self.origin
    }

    #[inline]
    pub fn record(&self) -> &MoveRecord {
        &self.record
    }

    /// Number of record entries already played on the board.
    #[inline]
    pub fn applied(&self) -> usize {
        (self.board.ply() - self.origin.ply()) as usize
    }

    /// Number of record entries waiting to be replayed.
    #[inline]
    pub fn pending(&self) -> usize {
        self.record.len() - self.applied()
    }

    /// The moves that produced the current board.
    pub fn history(&self) -> MoveRecord {
        self.record.truncated(self.applied())
    }

    #[inline]
    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    /// Append a move without validating or applying it.
    pub fn log_move(&mut self, mv: Move) {
        self.record.push(mv);
    }

    /// Replay pending record entries onto the board.
    ///
    /// With `enforce_legality`, stops at the first illegal entry and returns
    /// `false`; moves applied before it stay applied.
    pub fn apply_recorded(&mut self, enforce_legality: bool) -> bool {
        let applied = self.applied();
        let pending = self.record.to_vec().split_off(applied);

        for (offset, mv) in pending.into_iter().enumerate() {
            if enforce_legality {
                let history = self.record.truncated(applied + offset);
                if let Err(reason) = legality::validate(&self.board, mv, Some(&history), Flags::STRICT) {
                    log::trace!("recorded move {mv} rejected: {reason}");
                    return false;
                }
            }
            self.board.play_unchecked(mv);
        }
        true
    }

    /// Validate `mv` against the current board and history, then record and
    /// apply it. On failure the timeline is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the record has pending entries; callers must replay them
    /// first.
    pub fn try_move(&mut self, mv: Move) -> bool {
        assert_eq!(
            self.pending(),
            0,
            "timeline has unapplied record entries"
        );

        match legality::validate(&self.board, mv, Some(&self.record), Flags::STRICT) {
            Ok(()) => {
                self.log_move(mv);
                self.apply_recorded(false)
            }
            Err(reason) => {
                log::trace!("move {mv} rejected: {reason}");
                false
            }
        }
    }

    /// Copy of this timeline with an already validated move played.
    pub(crate) fn forked(&self, mv: Move) -> Timeline {
        let mut next = self.clone();
        next.log_move(mv);
        next.board.play_unchecked(mv);
        next
    }

    /// Legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        legality::legal_moves(&self.board, Some(&self.history()))
    }

    /// Legal moves of the piece on `from`.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        legality::legal_moves_from(&self.board, from, Some(&self.history()))
    }

    /// Is the side to move in check?
    pub fn is_check(&self) -> bool {
        legality::is_in_check(&self.board, self.turn())
    }

    /// Checkmate, stalemate or check for the side to move.
    pub fn status(&self) -> Status {
        let check = self.is_check();
        let stuck = self.legal_moves().is_empty();
        match (check, stuck) {
            (true, true) => Status::Checkmate,
            (false, true) => Status::Stalemate,
            (true, false) => Status::Check,
            (false, false) => Status::Ongoing,
        }
    }
}

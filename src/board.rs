use std::fmt;
use std::hash::{Hash, Hasher};

use shakmaty::{Color, File, Piece, Position, Rank, Role, Square};

use crate::moves::Move;

/// Number of squares on the board
pub const NUM_SQUARES: usize = 64;

const BACK_RANK: [Role; 8] = [
    Role::Rook,
    Role::Knight,
    Role::Bishop,
    Role::Queen,
    Role::King,
    Role::Bishop,
    Role::Knight,
    Role::Rook,
];

/// Signed `(file, rank)` coordinates of a square, each in `0..8`.
#[inline]
pub(crate) fn coords(square: Square) -> (i32, i32) {
    (
        u32::from(square.file()) as i32,
        u32::from(square.rank()) as i32,
    )
}

/// Square at signed coordinates, or `None` when off the board.
#[inline]
pub(crate) fn square_at(file: i32, rank: i32) -> Option<Square> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::from_coords(
            File::new(file as u32),
            Rank::new(rank as u32),
        ))
    } else {
        None
    }
}

/// An 8×8 grid of optional pieces plus a ply counter.
///
/// `ply` starts at −1 before any move; white moves when it is odd, black
/// when it is even. Equality and hashing look at the piece layout only, so
/// two boards reached through different histories (or with a different
/// side to move) compare equal.
#[derive(Clone, Copy)]
pub struct Board {
    squares: [Option<Piece>; NUM_SQUARES],
    ply: i32,
}

impl Default for Board {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard initial position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for (index, role) in BACK_RANK.into_iter().enumerate() {
            let file = File::new(index as u32);
            let pawn = Role::Pawn;
            board.place(file, Rank::First, Color::White, role);
            board.place(file, Rank::Second, Color::White, pawn);
            board.place(file, Rank::Seventh, Color::Black, pawn);
            board.place(file, Rank::Eighth, Color::Black, role);
        }
        board
    }

    /// A board with no pieces, white to move.
    pub const fn empty() -> Self {
        Self {
            squares: [None; NUM_SQUARES],
            ply: -1,
        }
    }

    /// Copy the piece layout and side to move of a shakmaty position.
    ///
    /// Castling rights and the en passant square are not carried over; they
    /// are derived from move history here.
    pub fn from_position(pos: &impl Position) -> Self {
        let mut board = Self::empty();
        for square in Square::ALL {
            board.squares[usize::from(square)] = pos.board().piece_at(square);
        }
        board.ply = match pos.turn() {
            Color::White => -1,
            Color::Black => 0,
        };
        board
    }

    fn place(&mut self, file: File, rank: Rank, color: Color, role: Role) {
        self.set_piece_at(Square::from_coords(file, rank), Some(Piece { color, role }));
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[usize::from(square)]
    }

    #[inline]
    pub fn set_piece_at(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[usize::from(square)] = piece;
    }

    #[inline]
    pub fn ply(&self) -> i32 {
        self.ply
    }

    #[inline]
    pub fn advance_ply(&mut self) {
        self.ply += 1;
    }

    /// Side to move.
    #[inline]
    pub fn turn(&self) -> Color {
        if self.ply.rem_euclid(2) == 1 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// All occupied squares, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::ALL
            .into_iter()
            .filter_map(|square| self.piece_at(square).map(|piece| (square, piece)))
    }

    /// First square holding the king of `color`, if any.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece {
            color,
            role: Role::King,
        };
        self.pieces()
            .find(|(_, piece)| *piece == king)
            .map(|(square, _)| square)
    }

    /// Apply a move without any legality checks.
    ///
    /// In order: removes an en passant victim if a pawn moves diagonally
    /// onto an empty square, relocates the rook if a king moves two files,
    /// moves the piece, then advances the ply.
    pub fn play_unchecked(&mut self, mv: Move) {
        let moving = self.piece_at(mv.from);
        let (from_file, from_rank) = coords(mv.from);
        let (to_file, _) = coords(mv.to);

        if let Some(piece) = moving {
            if piece.role == Role::Pawn && from_file != to_file && self.piece_at(mv.to).is_none() {
                if let Some(victim) = square_at(to_file, from_rank) {
                    self.set_piece_at(victim, None);
                }
            }

            if piece.role == Role::King && (to_file - from_file).abs() == 2 {
                let (corner_file, landing_file) = if to_file > from_file {
                    (7, to_file - 1)
                } else {
                    (0, to_file + 1)
                };
                if let (Some(corner), Some(landing)) = (
                    square_at(corner_file, from_rank),
                    square_at(landing_file, from_rank),
                ) {
                    let rook = self.piece_at(corner);
                    self.set_piece_at(corner, None);
                    self.set_piece_at(landing, rook);
                }
            }
        }

        self.set_piece_at(mv.to, moving);
        self.set_piece_at(mv.from, None);
        self.advance_ply();
    }

    /// Piece placement in FEN notation, rank 8 first.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for rank in Rank::ALL.iter().rev() {
            let mut gap = 0;
            for file in File::ALL {
                match self.piece_at(Square::from_coords(file, *rank)) {
                    Some(piece) => {
                        if gap > 0 {
                            out.push_str(&gap.to_string());
                            gap = 0;
                        }
                        out.push(piece.char());
                    }
                    None => gap += 1,
                }
            }
            if gap > 0 {
                out.push_str(&gap.to_string());
            }
            if *rank != Rank::First {
                out.push('/');
            }
        }
        out
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.squares == other.squares
    }
}

impl Eq for Board {}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.squares.hash(state);
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("placement", &format_args!("{}", self.placement()))
            .field("ply", &self.ply)
            .finish()
    }
}

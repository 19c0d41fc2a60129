//! Move legality for a single board.
//!
//! One function, [`validate`], holds every movement rule. Check detection
//! and castling-through-check call back into it with relaxed [`Flags`]
//! instead of keeping a second attack generator, so the recursion is at most
//! castle → transit square → king-safety probe.

use shakmaty::{Color, Piece, Role, Square};
use thiserror::Error;

use crate::board::{Board, coords, square_at};
use crate::moves::{Move, MoveRecord};

/// Rule relaxations for internal probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    /// Accept moves by the side that is not to move.
    pub allow_out_of_turn: bool,
    /// Skip the "own king is safe afterwards" test.
    pub skip_check_validation: bool,
}

impl Flags {
    /// Full rules: turn order enforced, king safety validated.
    pub const STRICT: Flags = Flags {
        allow_out_of_turn: false,
        skip_check_validation: false,
    };

    /// Attack probe: could the piece reach the square if it were its turn?
    pub const PROBE: Flags = Flags {
        allow_out_of_turn: true,
        skip_check_validation: true,
    };
}

/// Why a move was rejected.
///
/// Advisory only; callers decide on [`is_legal`] or `is_ok()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Illegal {
    #[error("start square {0} is empty")]
    EmptyOrigin(Square),
    #[error("{0:?} cannot move out of turn")]
    OutOfTurn(Color),
    #[error("a piece cannot move to the square it is on")]
    NullMove,
    #[error("pieces cannot capture their own color")]
    OwnCapture,
    #[error("pawns can't move like that")]
    PawnShape,
    #[error("pawns cannot jump pieces")]
    PawnBlocked,
    #[error("pawns cannot capture forwards")]
    PawnForwardCapture,
    #[error("pawns can only move diagonally when capturing")]
    DiagonalWithoutCapture,
    #[error("en passant only works immediately after a two-square pawn advance")]
    EnPassantExpired,
    #[error("knights can't move like that")]
    KnightShape,
    #[error("bishops must move diagonally")]
    BishopShape,
    #[error("rooks must move along a rank or file")]
    RookShape,
    #[error("queens must move along a rank, file, or diagonal")]
    QueenShape,
    #[error("kings can only move one square at a time")]
    KingShape,
    #[error("{0} blocks the path")]
    PathBlocked(Square),
    #[error("castles cannot occur out of check")]
    CastleOutOfCheck,
    #[error("there's a piece in the way of the castle")]
    CastleBlocked,
    #[error("kings cannot castle through check")]
    CastleThroughCheck,
    #[error("there is no rook to castle with")]
    CastleWithoutRook,
    #[error("the king has already moved and cannot castle")]
    CastleKingMoved,
    #[error("the rook involved in the castle has already moved")]
    CastleRookMoved,
    #[error("{0:?}'s king would be in check")]
    KingInCheck(Color),
}

/// Decide whether `mv` is legal on `board`.
///
/// `history` holds the moves already played to reach `board`, oldest first.
/// When it is `None`, castling does not look for earlier king or rook moves
/// and en passant is accepted without a preceding double advance.
///
/// Never mutates `board`.
pub fn validate(
    board: &Board,
    mv: Move,
    history: Option<&MoveRecord>,
    flags: Flags,
) -> Result<(), Illegal> {
    let piece = board.piece_at(mv.from).ok_or(Illegal::EmptyOrigin(mv.from))?;

    if !flags.allow_out_of_turn && piece.color != board.turn() {
        return Err(Illegal::OutOfTurn(piece.color));
    }
    if mv.from == mv.to {
        return Err(Illegal::NullMove);
    }
    let target = board.piece_at(mv.to);
    if target.is_some_and(|t| t.color == piece.color) {
        return Err(Illegal::OwnCapture);
    }

    let (df, dr) = delta(mv);
    let (adf, adr) = (df.abs(), dr.abs());

    match piece.role {
        Role::Pawn => validate_pawn(board, piece.color, mv, target, history)?,
        Role::Knight => {
            if !matches!((adf, adr), (1, 2) | (2, 1)) {
                return Err(Illegal::KnightShape);
            }
        }
        Role::Bishop => {
            if adf != adr {
                return Err(Illegal::BishopShape);
            }
            path_clear(board, mv)?;
        }
        Role::Rook => {
            if (adf == 0) == (adr == 0) {
                return Err(Illegal::RookShape);
            }
            path_clear(board, mv)?;
        }
        Role::Queen => {
            if adf != adr && (adf == 0) == (adr == 0) {
                return Err(Illegal::QueenShape);
            }
            path_clear(board, mv)?;
        }
        Role::King => {
            if adr == 0 && adf == 2 && matches!(coords(mv.to).0, 2 | 6) {
                validate_castle(board, piece.color, mv, history, flags)?;
            } else if adf.max(adr) > 1 {
                return Err(Illegal::KingShape);
            }
        }
    }

    if flags.skip_check_validation {
        return Ok(());
    }

    let mut scratch = *board;
    scratch.play_unchecked(mv);
    if is_in_check(&scratch, piece.color) {
        return Err(Illegal::KingInCheck(piece.color));
    }
    Ok(())
}

/// Boolean form of [`validate`].
#[inline]
pub fn is_legal(board: &Board, mv: Move, history: Option<&MoveRecord>, flags: Flags) -> bool {
    validate(board, mv, history, flags).is_ok()
}

/// Is the king of `color` attacked on `board`?
///
/// Every square is probed for a move onto the king, ignoring whose turn it
/// is. A side without a king is never in check.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    let Some(king) = board.king_square(color) else {
        return false;
    };
    Square::ALL
        .into_iter()
        .any(|square| is_legal(board, Move::new(square, king), None, Flags::PROBE))
}

/// Squares holding pieces that give check to the king of `color`.
pub fn checkers(board: &Board, color: Color) -> Vec<Square> {
    let Some(king) = board.king_square(color) else {
        return Vec::new();
    };
    Square::ALL
        .into_iter()
        .filter(|&square| is_legal(board, Move::new(square, king), None, Flags::PROBE))
        .collect()
}

/// Every legal move for the side to move, ordered by origin then target.
pub fn legal_moves(board: &Board, history: Option<&MoveRecord>) -> Vec<Move> {
    let turn = board.turn();
    board
        .pieces()
        .filter(|(_, piece)| piece.color == turn)
        .flat_map(|(from, _)| legal_moves_from(board, from, history))
        .collect()
}

/// Legal moves of the piece standing on `from`.
pub fn legal_moves_from(board: &Board, from: Square, history: Option<&MoveRecord>) -> Vec<Move> {
    Square::ALL
        .into_iter()
        .map(|to| Move::new(from, to))
        .filter(|&mv| is_legal(board, mv, history, Flags::STRICT))
        .collect()
}

fn delta(mv: Move) -> (i32, i32) {
    let (ff, fr) = coords(mv.from);
    let (tf, tr) = coords(mv.to);
    (tf - ff, tr - fr)
}

#[inline]
fn forward(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

#[inline]
fn home_rank(color: Color) -> i32 {
    match color {
        Color::White => 0,
        Color::Black => 7,
    }
}

fn validate_pawn(
    board: &Board,
    color: Color,
    mv: Move,
    target: Option<Piece>,
    history: Option<&MoveRecord>,
) -> Result<(), Illegal> {
    let dir = forward(color);
    let (df, dr) = delta(mv);
    let (from_file, from_rank) = coords(mv.from);
    let (to_file, to_rank) = coords(mv.to);
    let advance = dr * dir;

    match df.abs() {
        0 => {
            let start_rank = home_rank(color) + dir;
            match advance {
                1 => {}
                2 if from_rank == start_rank => {
                    let between = square_at(from_file, from_rank + dir).ok_or(Illegal::PawnShape)?;
                    if board.piece_at(between).is_some() {
                        return Err(Illegal::PawnBlocked);
                    }
                }
                _ => return Err(Illegal::PawnShape),
            }
            if target.is_some() {
                return Err(Illegal::PawnForwardCapture);
            }
            Ok(())
        }
        1 => {
            if advance != 1 {
                return Err(Illegal::PawnShape);
            }
            if target.is_some() {
                return Ok(());
            }

            // En passant: the victim sits beside the pawn and the target is
            // the square it skipped.
            let victim = Piece {
                color: !color,
                role: Role::Pawn,
            };
            let victim_square = square_at(to_file, from_rank);
            let capturable = to_rank == home_rank(color) + 5 * dir
                && victim_square.is_some_and(|sq| board.piece_at(sq) == Some(victim));
            if !capturable {
                return Err(Illegal::DiagonalWithoutCapture);
            }

            if let (Some(history), Some(landing)) = (history, victim_square) {
                let double_advance = square_at(to_file, to_rank + dir)
                    .map(|origin| Move::new(origin, landing));
                match (history.last(), double_advance) {
                    (Some(last), Some(expected)) if last == expected => {}
                    _ => return Err(Illegal::EnPassantExpired),
                }
            }
            Ok(())
        }
        _ => Err(Illegal::PawnShape),
    }
}

fn path_clear(board: &Board, mv: Move) -> Result<(), Illegal> {
    let (df, dr) = delta(mv);
    let (step_file, step_rank) = (df.signum(), dr.signum());
    let (mut file, mut rank) = coords(mv.from);
    let distance = df.abs().max(dr.abs());

    for _ in 1..distance {
        file += step_file;
        rank += step_rank;
        if let Some(square) = square_at(file, rank) {
            if board.piece_at(square).is_some() {
                return Err(Illegal::PathBlocked(square));
            }
        }
    }
    Ok(())
}

fn validate_castle(
    board: &Board,
    color: Color,
    mv: Move,
    history: Option<&MoveRecord>,
    flags: Flags,
) -> Result<(), Illegal> {
    let rank = home_rank(color);
    let (from_file, from_rank) = coords(mv.from);
    if from_file != 4 || from_rank != rank {
        return Err(Illegal::KingShape);
    }

    let (to_file, _) = coords(mv.to);
    let (corner_file, step) = if to_file == 6 { (7, 1) } else { (0, -1) };
    let corner = square_at(corner_file, rank).ok_or(Illegal::CastleWithoutRook)?;
    let rook = Piece {
        color,
        role: Role::Rook,
    };
    if board.piece_at(corner) != Some(rook) {
        return Err(Illegal::CastleWithoutRook);
    }

    let mut file = from_file + step;
    while file != corner_file {
        if square_at(file, rank).is_some_and(|sq| board.piece_at(sq).is_some()) {
            return Err(Illegal::CastleBlocked);
        }
        file += step;
    }

    if let Some(history) = history {
        for earlier in history.iter() {
            if earlier.from == mv.from {
                return Err(Illegal::CastleKingMoved);
            }
            if earlier.from == corner {
                return Err(Illegal::CastleRookMoved);
            }
        }
    }

    if is_in_check(board, color) {
        return Err(Illegal::CastleOutOfCheck);
    }

    let transit = square_at(from_file + step, rank).ok_or(Illegal::CastleBlocked)?;
    let full = Flags {
        allow_out_of_turn: flags.allow_out_of_turn,
        skip_check_validation: false,
    };
    if !is_legal(board, Move::new(mv.from, transit), history, full) {
        return Err(Illegal::CastleThroughCheck);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{CastlingMode, Chess, Position, fen::Fen};
    use test_case::test_case;

    fn position(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .expect("invalid FEN")
            .into_position(CastlingMode::Standard)
            .expect("invalid position")
    }

    fn board(fen: &str) -> Board {
        Board::from_position(&position(fen))
    }

    fn mv(notation: &str) -> Move {
        notation.parse().expect("asserted move is invalid")
    }

    fn history(moves: &[&str]) -> MoveRecord {
        moves.iter().map(|m| mv(m)).collect()
    }

    /// Play `moves` from the initial position, returning board and history.
    fn played(moves: &[&str]) -> (Board, MoveRecord) {
        let mut board = Board::new();
        let mut record = MoveRecord::new();
        for m in moves {
            let m = mv(m);
            assert!(
                is_legal(&board, m, Some(&record), Flags::STRICT),
                "setup move {m} should be legal"
            );
            board.play_unchecked(m);
            record.push(m);
        }
        (board, record)
    }

    #[test]
    fn test_initial_position_has_twenty_moves() {
        let board = Board::new();
        assert_eq!(legal_moves(&board, Some(&MoveRecord::new())).len(), 20);
    }

    #[test_case("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"; "initial")]
    #[test_case("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"; "after e4")]
    #[test_case("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"; "kiwipete")]
    #[test_case("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"; "rook endgame")]
    #[test_case("rnbqkbnr/pppp2pp/8/4pp1Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 0 1"; "black in check")]
    #[test_case("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1"; "bare castling")]
    #[test_case("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1"; "bare castling black")]
    #[test_case("4k3/8/8/8/8/8/8/r3K2R w K - 0 1"; "check along first rank")]
    fn test_move_count_matches_reference(fen: &str) {
        let pos = position(fen);
        let expected = pos
            .legal_moves()
            .iter()
            .filter(|m| m.promotion().is_none())
            .count();

        let board = Board::from_position(&pos);
        assert_eq!(legal_moves(&board, Some(&MoveRecord::new())).len(), expected);
    }

    #[test_case("e2e3")]
    #[test_case("e2e4")]
    #[test_case("g1f3")]
    #[test_case("b1a3")]
    fn test_opening_moves_legal(notation: &str) {
        assert_eq!(validate(&Board::new(), mv(notation), None, Flags::STRICT), Ok(()));
    }

    #[test_case("e2e5", Illegal::PawnShape)]
    #[test_case("e2d3", Illegal::DiagonalWithoutCapture)]
    #[test_case("e7e5", Illegal::OutOfTurn(Color::Black))]
    #[test_case("e4e5", Illegal::EmptyOrigin(Square::E4))]
    #[test_case("e2e2", Illegal::NullMove)]
    #[test_case("a1a2", Illegal::OwnCapture)]
    #[test_case("a1a3", Illegal::PathBlocked(Square::A2); "rook blocked by own pawn")]
    #[test_case("f1c4", Illegal::PathBlocked(Square::E2))]
    #[test_case("g1g3", Illegal::KnightShape)]
    #[test_case("e1e2", Illegal::OwnCapture; "king onto own pawn")]
    fn test_opening_moves_rejected(notation: &str, reason: Illegal) {
        assert_eq!(validate(&Board::new(), mv(notation), None, Flags::STRICT), Err(reason));
    }

    #[test]
    fn test_out_of_turn_allowed_by_flag() {
        let flags = Flags {
            allow_out_of_turn: true,
            ..Flags::STRICT
        };
        assert!(is_legal(&Board::new(), mv("e7e5"), None, flags));
    }

    #[test]
    fn test_pawn_double_advance_blocked() {
        let board = board("rnbqkbnr/pppp1ppp/8/8/8/4p3/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(
            validate(&board, mv("e2e4"), None, Flags::STRICT),
            Err(Illegal::PawnBlocked)
        );
        assert_eq!(
            validate(&board, mv("e2e3"), None, Flags::STRICT),
            Err(Illegal::PawnForwardCapture)
        );
        assert!(is_legal(&board, mv("d2e3"), None, Flags::STRICT));
    }

    #[test]
    fn test_pawn_double_advance_only_from_home_rank() {
        let (board, record) = played(&["e2e3", "a7a6"]);
        assert_eq!(
            validate(&board, mv("e3e5"), Some(&record), Flags::STRICT),
            Err(Illegal::PawnShape)
        );
    }

    #[test_case("e5d6", true; "captures d5 after double advance")]
    #[test_case("e5f6", false; "no victim beside")]
    fn test_en_passant_after_double_advance(notation: &str, legal: bool) {
        let (board, record) = played(&["e2e4", "a7a6", "e4e5", "d7d5"]);
        assert_eq!(is_legal(&board, mv(notation), Some(&record), Flags::STRICT), legal);
    }

    #[test]
    fn test_en_passant_expires_after_one_move() {
        let (board, record) = played(&["e2e4", "d7d5", "e4e5", "a7a6"]);
        // Victim on d5 advanced two squares, but not immediately before.
        assert_eq!(
            validate(&board, mv("e5d6"), Some(&record), Flags::STRICT),
            Err(Illegal::EnPassantExpired)
        );
    }

    #[test]
    fn test_en_passant_rejects_single_step_arrival() {
        let (board, record) = played(&["e2e4", "d7d6", "e4e5", "a7a6", "a2a3", "d6d5"]);
        assert_eq!(
            validate(&board, mv("e5d6"), Some(&record), Flags::STRICT),
            Err(Illegal::EnPassantExpired)
        );
    }

    #[test]
    fn test_en_passant_without_history_is_accepted() {
        let board = board("rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 1");
        assert!(is_legal(&board, mv("e5d6"), None, Flags::STRICT));
        assert!(!is_legal(&board, mv("e5d6"), Some(&MoveRecord::new()), Flags::STRICT));
    }

    #[test]
    fn test_black_en_passant() {
        let (board, record) = played(&["a2a3", "d7d5", "a3a4", "d5d4", "e2e4"]);
        assert!(is_legal(&board, mv("d4e3"), Some(&record), Flags::STRICT));

        let mut after = board;
        after.play_unchecked(mv("d4e3"));
        assert_eq!(after.piece_at(Square::E4), None);
    }

    #[test]
    fn test_sliders_blocked_and_free() {
        let (board, record) = played(&["e2e4", "e7e5"]);
        assert!(is_legal(&board, mv("f1c4"), Some(&record), Flags::STRICT));
        assert!(is_legal(&board, mv("d1h5"), Some(&record), Flags::STRICT));
        assert_eq!(
            validate(&board, mv("d1d3"), Some(&record), Flags::STRICT),
            Err(Illegal::PathBlocked(Square::D2))
        );
        assert_eq!(
            validate(&board, mv("d1e3"), Some(&record), Flags::STRICT),
            Err(Illegal::QueenShape)
        );
    }

    const CASTLING: &str = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";

    #[test_case("e1g1")]
    #[test_case("e1c1")]
    fn test_castling_legal(notation: &str) {
        let board = board(CASTLING);
        assert!(is_legal(&board, mv(notation), Some(&MoveRecord::new()), Flags::STRICT));
    }

    #[test_case(&["e1f1", "a7a6", "f1e1", "a6a5"], Illegal::CastleKingMoved; "king moved and returned")]
    #[test_case(&["h1g1", "a7a6", "g1h1", "a6a5"], Illegal::CastleRookMoved; "rook moved and returned")]
    fn test_castling_history(moves: &[&str], reason: Illegal) {
        let mut board = board(CASTLING);
        let record = history(moves);
        for m in record.to_vec() {
            board.play_unchecked(m);
        }
        assert_eq!(board.turn(), Color::White);
        assert_eq!(validate(&board, mv("e1g1"), Some(&record), Flags::STRICT), Err(reason));
    }

    #[test]
    fn test_castling_other_side_after_rook_moves() {
        let mut board = board(CASTLING);
        let record = history(&["h1g1", "a7a6", "g1h1", "a6a5"]);
        for m in record.to_vec() {
            board.play_unchecked(m);
        }
        assert!(is_legal(&board, mv("e1c1"), Some(&record), Flags::STRICT));
    }

    #[test_case("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3KB1R w KQkq - 0 1", "e1g1"; "bishop on f1")]
    #[test_case("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/RN2K2R w KQkq - 0 1", "e1c1"; "knight on b1")]
    fn test_castling_blocked(fen: &str, notation: &str) {
        assert_eq!(
            validate(&board(fen), mv(notation), None, Flags::STRICT),
            Err(Illegal::CastleBlocked)
        );
    }

    #[test]
    fn test_castling_out_of_check() {
        // Black queen on e7 checks down the open e-file.
        let board = board("r3k2r/ppppqppp/8/8/8/8/PPPP1PPP/R3K2R w KQkq - 0 1");
        assert_eq!(
            validate(&board, mv("e1g1"), None, Flags::STRICT),
            Err(Illegal::CastleOutOfCheck)
        );
        assert_eq!(
            validate(&board, mv("e1c1"), None, Flags::STRICT),
            Err(Illegal::CastleOutOfCheck)
        );
    }

    #[test]
    fn test_castling_through_check() {
        // Black rook on f8 covers f1.
        let board = board("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(
            validate(&board, mv("e1g1"), None, Flags::STRICT),
            Err(Illegal::CastleThroughCheck)
        );
        assert!(is_legal(&board, mv("e1c1"), None, Flags::STRICT));
    }

    #[test]
    fn test_castling_into_check() {
        // Black rook on g8 covers g1 but not f1.
        let board = board("4k1r1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert_eq!(
            validate(&board, mv("e1g1"), None, Flags::STRICT),
            Err(Illegal::KingInCheck(Color::White))
        );
    }

    #[test]
    fn test_castling_without_rook() {
        let board = board("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert_eq!(
            validate(&board, mv("e1g1"), None, Flags::STRICT),
            Err(Illegal::CastleWithoutRook)
        );
    }

    #[test]
    fn test_king_two_files_off_home_is_not_castling() {
        let board = board("4k3/8/8/8/8/8/8/R2K3R w - - 0 1");
        assert_eq!(
            validate(&board, mv("d1f1"), None, Flags::STRICT),
            Err(Illegal::KingShape)
        );
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        // White knight on e2 pinned by the rook on e8.
        let board = board("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert_eq!(
            validate(&board, mv("e2c3"), None, Flags::STRICT),
            Err(Illegal::KingInCheck(Color::White))
        );
        assert!(is_legal(&board, mv("e2c3"), None, Flags::PROBE));
    }

    #[test]
    fn test_check_detection() {
        let board = board("rnbqkbnr/pppp2pp/8/4pp1Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 0 1");
        assert!(is_in_check(&board, Color::Black));
        assert!(!is_in_check(&board, Color::White));
        assert_eq!(checkers(&board, Color::Black), vec![Square::H5]);
    }

    #[test]
    fn test_no_king_never_in_check() {
        let board = board("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1");
        let mut kingless = board;
        kingless.set_piece_at(Square::E8, None);
        assert!(!is_in_check(&kingless, Color::Black));
    }

    #[test]
    fn test_validate_does_not_mutate_board() {
        let board = board(CASTLING);
        let before = board;
        let ply = board.ply();
        let _ = validate(&board, mv("e1g1"), None, Flags::STRICT);
        assert_eq!(board, before);
        assert_eq!(board.ply(), ply);
    }

    #[test]
    fn test_legal_moves_from_square() {
        let moves = legal_moves_from(&Board::new(), Square::E2, None);
        assert_eq!(moves, vec![mv("e2e3"), mv("e2e4")]);
        assert!(legal_moves_from(&Board::new(), Square::E1, None).is_empty());
        assert!(legal_moves_from(&Board::new(), Square::E4, None).is_empty());
    }
}

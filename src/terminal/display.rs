use std::io::{self, Write};

use shakmaty::{File, Rank, Square};

use crate::MultiverseDisplay;
use crate::superposition::SuperpositionView;

/// Pieces shown per superposed square before truncating.
const MAX_CANDIDATES: usize = 2;

/// Terminal-based multiverse display.
///
/// Renders a [`SuperpositionView`] as an 8×8 grid. Settled squares show
/// their piece, superposed squares list candidate pieces on magenta, and a
/// king in check in any universe is shown on red.
#[derive(Debug, Default)]
pub struct TerminalDisplay;

impl TerminalDisplay {
    /// Create a new terminal display.
    pub fn new() -> Self {
        Self
    }
}

/// Error type for terminal display operations.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

impl MultiverseDisplay for TerminalDisplay {
    type Error = DisplayError;

    fn show(&mut self, view: &SuperpositionView) -> Result<(), Self::Error> {
        render_superposition(&mut io::stdout(), view)
    }
}

/// Render a view to any writer. Extracted for testability.
pub(crate) fn render_superposition(
    w: &mut impl Write,
    view: &SuperpositionView,
) -> Result<(), DisplayError> {
    for rank in Rank::ALL.iter().rev() {
        write!(w, " {} ", rank.char())?;
        for file in File::ALL {
            let square = Square::from_coords(file, *rank);
            write!(w, "{}", format_square(view, square))?;
        }
        writeln!(w)?;
    }
    writeln!(w, "    a  b  c  d  e  f  g  h")?;
    w.flush()?;
    Ok(())
}

/// Three-column cell for one square, ANSI-colored when it needs attention.
fn format_square(view: &SuperpositionView, square: Square) -> String {
    let occupancy = view.get(square);

    if occupancy.is_superposed() {
        let mut cell: String = occupancy
            .pieces()
            .take(MAX_CANDIDATES)
            .map(|piece| piece.char())
            .collect();
        while cell.chars().count() < 3 {
            cell.push(' ');
        }
        return format!("\x1b[45m{cell}\x1b[0m");
    }

    let symbol = match occupancy.settled().flatten() {
        Some(piece) => piece.char(),
        None => '·',
    };
    if view.checked_kings().contains(&square) {
        format!("\x1b[41m {symbol} \x1b[0m")
    } else {
        format!(" {symbol} ")
    }
}

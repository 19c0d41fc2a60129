use std::io::{self, Write};

use super::script::{Command, execute};
use super::TerminalDisplay;
use crate::MultiverseDisplay;
use crate::multiverse::Multiverse;
use crate::superposition::compute_superposition;

/// Clears the screen and moves cursor to top-left.
#[inline]
fn clear_screen() {
    print!("\x1B[2J\x1B[H");
}

/// Runs an interactive terminal session over a fresh multiverse.
///
/// Every command is played in all universes at once; the board shown is the
/// superposition of all of them.
pub fn run_interactive_terminal() {
    let mut multiverse = Multiverse::new();
    let mut display = TerminalDisplay::new();

    clear_screen();
    draw_interface(&mut display, &multiverse);

    loop {
        print!("> ");
        if let Err(e) = io::stdout().flush() {
            eprintln!("Failed to flush stdout: {}", e);
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                break;
            }
        }

        if input.trim().is_empty() {
            continue;
        }

        let command = match input.parse::<Command>() {
            Ok(Command::Exit) => break,
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let outcome = execute(&mut multiverse, &command);
        clear_screen();
        draw_interface(&mut display, &multiverse);
        if let Err(e) = outcome {
            println!("\n❌ {e}");
        }
    }
}

/// Draws help text, the superposed board and universe counts.
fn draw_interface(display: &mut TerminalDisplay, multiverse: &Multiverse) {
    println!("♟️  Multiverse Chess");
    println!();
    println!("Commands: e2e4 (move) | q e2 (branch square) | q (branch all) | cull | exit");
    println!();

    let view = compute_superposition(multiverse);
    if let Err(e) = display.show(&view) {
        eprintln!("Failed to draw board: {}", e);
    }

    println!();
    println!("{} universes currently in superposition", view.universes());
    println!("{} universes in check", multiverse.count_in_check());
}

mod display;
mod script;
mod session;

pub use display::{DisplayError, TerminalDisplay};
pub use script::{Command, ParseError, ScriptedGame, execute, parse_script};
pub use session::run_interactive_terminal;

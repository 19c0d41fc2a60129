fn main() {
    multiverse_chess::terminal::run_interactive_terminal();
}

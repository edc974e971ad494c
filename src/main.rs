use triquote::Repl;

fn main() {
    Repl::default().run();
}

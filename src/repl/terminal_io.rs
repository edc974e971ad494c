use std::{
    fmt::Display,
    io::{self, Write},
};

use crossterm::{
    event::{self, Event},
    terminal,
};

pub trait TerminalIO {
    fn is_real_terminal(&self) -> bool;
    fn read_event(&mut self) -> Result<Event, io::Error>;
    fn write<T: Display>(&mut self, output: T) -> io::Result<()>;
    fn writeln<T: Display>(&mut self, output: T) -> io::Result<()>;

    /// Move to the start of the next line, as if the user hit Enter.
    fn enter(&mut self) -> io::Result<()> {
        self.write("\n")
    }
}

pub struct CrosstermIO;

impl TerminalIO for CrosstermIO {
    fn is_real_terminal(&self) -> bool {
        true
    }

    fn read_event(&mut self) -> Result<Event, io::Error> {
        event::read()
    }

    fn write<T: Display>(&mut self, output: T) -> io::Result<()> {
        print!("{}", raw_safe(output));
        io::stdout().flush()
    }

    fn writeln<T: Display>(&mut self, output: T) -> io::Result<()> {
        self.write(format!("{}\n", output))
    }
}

/// In raw mode a newline does not imply a carriage return, so emit one explicitly after each
/// newline before it hits the terminal.
fn raw_safe<T: Display>(val: T) -> String {
    let formatted = format!("{}", val);
    if terminal::is_raw_mode_enabled().expect("Failed to query terminal raw mode") {
        formatted.replace('\n', "\n\r")
    } else {
        formatted
    }
}

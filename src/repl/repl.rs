use std::{io, panic, process};

use crossterm::{
    cursor,
    event::{Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType},
};

use crate::{
    compat::check_legacy_ambiguity,
    normalizer::normalize,
    repl::{CrosstermIO, TerminalIO},
    scanner::{RawQuoteBlock, ScanProgress, Scanner},
};

type ExitCode = i32;

enum ReplControl {
    Continue,
    Exit(ExitCode),
}

/// Install a panic hook to ensure raw mode is disabled on panic. Without this, an unexpected
/// panic leaves the shell unusable.
fn install_custom_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let _ = terminal::disable_raw_mode();

        if let Some(s) = info.payload().downcast_ref::<&str>() {
            eprintln!("\nPanic: {s:?}");
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            eprintln!("\nPanic: {s:?}");
        } else {
            eprintln!("\nPanic occurred!");
        }

        process::exit(1);
    }));
}

/// An interactive loop for trying out multi-line literals: each completed block is scanned,
/// normalized, and echoed back with its newlines and indentation resolved. While a block is
/// still open, an unterminated scan becomes a continuation prompt instead of an error.
#[derive(Default)]
pub struct Repl {
    /// Diagnostics seen so far, kept so we can emit a useful exit code.
    errors: Vec<String>,

    /// The current line being manipulated by the user.
    line: String,

    /// The current cursor position on the current line. This _excludes_ the prompt.
    line_index: usize,

    /// The scanner for the block currently being captured, if one is open.
    scanner: Option<Scanner>,
}

impl Repl {
    /// The primary entrypoint, which uses a real terminal in raw mode and exits the process when
    /// terminated. For virtual terminals, use `run_inner`.
    pub fn run(&mut self) {
        let terminal_io = &mut CrosstermIO;
        let _ = terminal_io.writeln(format!(
            "triquote {} REPL (Type 'exit()' to quit)",
            env!("CARGO_PKG_VERSION")
        ));

        install_custom_panic_hook();
        let _ = terminal::enable_raw_mode();
        self.initialize_prompt(terminal_io);

        let exit_code = self.run_inner(terminal_io);

        let _ = terminal::disable_raw_mode();
        let _ = panic::take_hook();

        process::exit(exit_code);
    }

    fn run_inner<T: TerminalIO>(&mut self, terminal_io: &mut T) -> ExitCode {
        loop {
            match terminal_io.read_event() {
                Ok(Event::Key(event)) => match self.handle_key_event(terminal_io, event) {
                    ReplControl::Continue => {}
                    ReplControl::Exit(code) => break code,
                },
                Ok(_) => {}
                Err(_) => break 1,
            }
        }
    }

    fn handle_key_event<T: TerminalIO>(
        &mut self,
        terminal_io: &mut T,
        event: KeyEvent,
    ) -> ReplControl {
        match (event.code, event.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                // Abandon any block under capture, which is all the cancellation this pipeline
                // ever needs.
                self.scanner = None;
                let _ = terminal_io.enter();
                self.initialize_prompt(terminal_io);
                return ReplControl::Continue;
            }
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                let _ = terminal_io.enter();
                return ReplControl::Exit(0);
            }
            _ => {}
        }

        match event.code {
            KeyCode::Char(c) => {
                self.line.insert(self.line_index, c);
                self.line_index += 1;
                self.redraw_and_position(terminal_io);
            }
            KeyCode::Backspace => {
                if self.line_index > 0 {
                    self.line_index -= 1;
                    self.line.remove(self.line_index);
                    self.redraw_and_position(terminal_io);
                }
            }
            KeyCode::Enter => {
                // We must virtually hit Enter before processing the line so any results will be
                // displayed on the next line.
                let _ = terminal_io.enter();
                let control = self.process_line(terminal_io, &self.line.clone());
                if matches!(control, ReplControl::Exit(_)) {
                    return control;
                }

                self.initialize_prompt(terminal_io);
            }
            KeyCode::Right => {
                if self.line_index < self.line.len() {
                    self.line_index += 1;
                    self.redraw_and_position(terminal_io);
                }
            }
            KeyCode::Left => {
                if self.line_index > 0 {
                    self.line_index -= 1;
                    self.redraw_and_position(terminal_io);
                }
            }
            _ => {}
        }

        ReplControl::Continue
    }

    /// The indicator for the start of the next line: a continuation marker while a block is still
    /// being captured.
    fn prompt(&self) -> &str {
        match self.scanner.is_some() {
            false => ">>> ",
            true => "... ",
        }
    }

    /// Clear the REPL prompt to prepare for user input.
    fn initialize_prompt<T: TerminalIO>(&mut self, terminal_io: &mut T) {
        self.line.clear();
        self.line_index = 0;
        let _ = terminal_io.write(format!("\r{}", self.prompt()));
    }

    /// Clear the current input, redraw it, and align the cursor to the proper column.
    fn redraw_and_position<T: TerminalIO>(&self, terminal_io: &mut T) {
        if terminal_io.is_real_terminal() {
            execute!(io::stdout(), Clear(ClearType::CurrentLine)).unwrap();
            let _ = terminal_io.write(format!("\r{}{}", self.prompt(), self.line));

            let cursor_col = (self.line_index + self.prompt().len()) as u16;
            execute!(io::stdout(), cursor::MoveToColumn(cursor_col)).unwrap();
        } else {
            // Simpler fallback for tests
            let _ = terminal_io.write(format!("{}{}", self.prompt(), self.line));
        }
    }

    /// Feed the provided line into the open block, or open one if the line begins with a marker.
    fn process_line<T: TerminalIO>(&mut self, terminal_io: &mut T, line: &str) -> ReplControl {
        if self.scanner.is_none() {
            if line.trim_end() == "exit()" {
                let code = if self.errors.is_empty() { 0 } else { 1 };
                return ReplControl::Exit(code);
            }

            match opens_block(line) {
                Some(quote_char) => self.scanner = Some(Scanner::new(quote_char)),
                None => {
                    let _ = terminal_io
                        .writeln("Expected a line opening a multi-line literal, e.g. \"\"\"");
                    return ReplControl::Continue;
                }
            }
        }

        let mut scanner = self.scanner.take().expect("Scanner must be active here.");
        match scanner.add_line(&format!("{line}\n")) {
            Ok(ScanProgress::NeedMoreInput) => self.scanner = Some(scanner),
            Ok(ScanProgress::Complete(block)) => self.finish_block(terminal_io, block),
            Err(err) => self.report(terminal_io, err.to_string()),
        }

        ReplControl::Continue
    }

    /// Normalize a completed block and echo the value. The compatibility check runs against the
    /// captured block before normalization consumes it, but its warning is only surfaced once the
    /// value has been produced.
    fn finish_block<T: TerminalIO>(&mut self, terminal_io: &mut T, block: RawQuoteBlock) {
        let warning = check_legacy_ambiguity(&block);
        match normalize(block) {
            Ok(value) => {
                let _ = terminal_io.writeln(format!("{:?}", value.as_str()));
                if let Some(warning) = warning {
                    let _ = terminal_io.writeln(format!("warning: {warning}"));
                }
            }
            Err(err) => self.report(terminal_io, err.to_string()),
        }
    }

    fn report<T: TerminalIO>(&mut self, terminal_io: &mut T, message: String) {
        let _ = terminal_io.writeln(&message);
        self.errors.push(message);
    }
}

/// A block begins with a run of at least three identical quote characters.
fn opens_block(line: &str) -> Option<char> {
    let mut chars = line.chars();
    let first = chars.next()?;
    if !matches!(first, '\'' | '"') {
        return None;
    }

    if chars.take(2).filter(|&c| c == first).count() == 2 {
        Some(first)
    } else {
        None
    }
}

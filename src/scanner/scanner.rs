use crate::{
    core::{log, LogLevel},
    domain::Position,
    errors::ScanError,
};

use super::{Line, RawQuoteBlock, Terminator};

/// What an incremental feed produced so far. `NeedMoreInput` is the interactive counterpart of
/// `ScanError::UnterminatedBlock`: the caller may resume with additional lines rather than treat
/// the condition as fatal.
#[derive(Debug)]
pub enum ScanProgress {
    NeedMoreInput,
    Complete(RawQuoteBlock),
}

/// The closed set of scanner states. A failed scanner stays failed; re-feeding it returns the
/// same error.
#[derive(Debug)]
enum State {
    /// Counting the opening quote run. The run may span incremental chunks.
    AwaitingOpenMarker,
    /// Validating that only whitespace follows the opening marker on its line.
    AwaitingOpenLineEnd,
    /// Capturing whole lines verbatim until the closing marker line.
    CapturingContent(LineShape),
    Done,
    Failed(ScanError),
}

/// Where we are within the current line while capturing content. A line is only a closing-marker
/// candidate while its shape is `LeadingWs` or `QuoteRun`.
#[derive(Debug, Clone, Copy)]
enum LineShape {
    LeadingWs,
    QuoteRun,
    Content,
}

enum Step {
    Consumed,
    /// The character was not consumed: it follows the closing marker and belongs to the
    /// surrounding source.
    Rest,
}

/// Captures one multi-line literal from a character stream positioned at its opening marker.
///
/// Input arrives in arbitrary chunks via `add_line`, mirroring line-at-a-time consumption in an
/// interactive front end. A batch caller uses the `scan` free function instead.
pub struct Scanner {
    quote_char: char,
    /// Length of the opening run; fixed once the first non-quote character is seen. The closing
    /// run must match this count exactly, no more, no fewer.
    quote_len: usize,
    state: State,
    /// Position of the next character to be consumed.
    pos: Position,
    /// Position of the first character of the opening marker.
    start: Position,
    open_trailing: String,
    lines: Vec<Line>,
    /// The line currently under capture.
    line: String,
    /// Length of the quote run in progress on the current line.
    run_len: usize,
    close_indent: String,
    /// Characters following the closing marker on its line, which belong to the host.
    rest: String,
}

impl Scanner {
    pub fn new(quote_char: char) -> Self {
        Self::with_start(quote_char, Position::start())
    }

    /// `start` is the host lexer's position for the first character of the opening marker, so
    /// that diagnostics are absolute within the enclosing compilation unit.
    pub fn with_start(quote_char: char, start: Position) -> Self {
        assert!(
            matches!(quote_char, '\'' | '"'),
            "Blocks must be delimited by ' or \"."
        );

        Self {
            quote_char,
            quote_len: 0,
            state: State::AwaitingOpenMarker,
            pos: start,
            start,
            open_trailing: String::new(),
            lines: vec![],
            line: String::new(),
            run_len: 0,
            close_indent: String::new(),
            rest: String::new(),
        }
    }

    /// Feed the next chunk of input, which may be a single line, several lines, or a fragment of
    /// one. Chunk boundaries carry no meaning: even a quote run may be split across them.
    pub fn add_line(&mut self, text: &str) -> Result<ScanProgress, ScanError> {
        if let State::Failed(ref err) = self.state {
            return Err(err.clone());
        }
        assert!(
            !matches!(self.state, State::Done),
            "Scanner already produced a block."
        );

        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            match self.step(c) {
                Ok(Step::Consumed) => {}
                Ok(Step::Rest) => {
                    self.rest.push(c);
                    self.rest.extend(chars.by_ref());
                    break;
                }
                Err(err) => {
                    self.state = State::Failed(err.clone());
                    return Err(err);
                }
            }
        }

        if matches!(self.state, State::Done) {
            Ok(ScanProgress::Complete(self.take_block()))
        } else {
            Ok(ScanProgress::NeedMoreInput)
        }
    }

    /// Declare the end of the input stream. A quote run of exactly the marker length at the very
    /// end of input closes the block; anything else is an unterminated block.
    pub fn finish(mut self) -> Result<RawQuoteBlock, ScanError> {
        if let State::Failed(ref err) = self.state {
            return Err(err.clone());
        }
        assert!(
            !matches!(self.state, State::Done),
            "Scanner already produced a block."
        );

        if let State::CapturingContent(LineShape::QuoteRun) = self.state {
            if self.run_len == self.quote_len {
                self.close_block();
            }
        }

        match self.state {
            State::Done => Ok(self.take_block()),
            _ => Err(ScanError::UnterminatedBlock(self.pos)),
        }
    }

    /// Characters that followed the closing marker on its line. They are not part of the literal;
    /// a host lexer resumes tokenizing from here.
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// The truncated final line captured so far, if the scan stopped mid-line awaiting more
    /// input. Interactive callers can use this to redisplay what has been typed.
    pub fn pending_line(&self) -> Option<Line> {
        match self.state {
            State::CapturingContent(_) if !self.line.is_empty() => {
                Some(Line::new(self.line.clone(), Terminator::None))
            }
            _ => None,
        }
    }

    fn step(&mut self, c: char) -> Result<Step, ScanError> {
        log(LogLevel::Trace, || format!("char: {c:?}"));

        match self.state {
            State::AwaitingOpenMarker => {
                if c == self.quote_char {
                    self.quote_len += 1;
                    self.pos.advance();
                } else {
                    assert!(
                        self.quote_len >= 3,
                        "Opening marker must have at least three quote characters."
                    );
                    self.state = State::AwaitingOpenLineEnd;
                    return self.step(c);
                }
            }
            State::AwaitingOpenLineEnd => {
                if c == '\n' {
                    self.pos.newline();
                    self.state = State::CapturingContent(LineShape::LeadingWs);
                } else if is_inline_whitespace(c) {
                    self.open_trailing.push(c);
                    self.pos.advance();
                } else {
                    return Err(ScanError::NonWhitespaceAfterOpenMarker(self.pos));
                }
            }
            State::CapturingContent(shape) => return Ok(self.step_content(shape, c)),
            State::Done | State::Failed(_) => {
                unreachable!("A finished scanner must not be fed more input.")
            }
        }

        Ok(Step::Consumed)
    }

    fn step_content(&mut self, shape: LineShape, c: char) -> Step {
        match shape {
            LineShape::LeadingWs => {
                if c == self.quote_char {
                    self.run_len = 1;
                    self.state = State::CapturingContent(LineShape::QuoteRun);
                    self.push(c);
                } else if c == '\n' {
                    self.finish_line();
                } else if is_inline_whitespace(c) {
                    self.push(c);
                } else {
                    self.state = State::CapturingContent(LineShape::Content);
                    self.push(c);
                }
            }
            LineShape::QuoteRun => {
                if c == self.quote_char {
                    self.run_len += 1;
                    self.push(c);

                    // A run longer than the marker can never close the block.
                    if self.run_len > self.quote_len {
                        self.state = State::CapturingContent(LineShape::Content);
                    }
                } else if self.run_len == self.quote_len {
                    self.close_block();
                    return Step::Rest;
                } else {
                    // A shorter run is ordinary content; reprocess this character as such.
                    self.state = State::CapturingContent(LineShape::Content);
                    return self.step_content(LineShape::Content, c);
                }
            }
            LineShape::Content => {
                if c == '\n' {
                    self.finish_line();
                } else {
                    self.push(c);
                }
            }
        }

        Step::Consumed
    }

    fn push(&mut self, c: char) {
        self.line.push(c);
        self.pos.advance();
    }

    /// The newline has arrived: commit the current line. A CR immediately before the LF is the
    /// terminator's, not the line's.
    fn finish_line(&mut self) {
        let mut text = std::mem::take(&mut self.line);
        let terminator = if text.ends_with('\r') {
            text.pop();
            Terminator::CrLf
        } else {
            Terminator::Lf
        };

        self.lines.push(Line::new(text, terminator));
        self.run_len = 0;
        self.state = State::CapturingContent(LineShape::LeadingWs);
        self.pos.newline();
    }

    /// The current line turned out to be the closing marker line: its leading whitespace becomes
    /// the closing indentation and the line itself is not captured.
    fn close_block(&mut self) {
        let cut = self.line.len() - self.quote_len * self.quote_char.len_utf8();
        self.line.truncate(cut);
        self.close_indent = std::mem::take(&mut self.line);
        self.state = State::Done;
    }

    fn take_block(&mut self) -> RawQuoteBlock {
        RawQuoteBlock {
            quote_char: self.quote_char,
            quote_len: self.quote_len,
            open_trailing: std::mem::take(&mut self.open_trailing),
            content_lines: std::mem::take(&mut self.lines),
            close_indent: std::mem::take(&mut self.close_indent),
            start: self.start,
        }
    }
}

/// Capture one block from a complete buffer positioned at the first character of its opening
/// marker. The end of the buffer is the end of the stream, so a missing closing marker is a
/// terminal `UnterminatedBlock` here.
pub fn scan(source: &str) -> Result<RawQuoteBlock, ScanError> {
    let quote_char = match source.chars().next() {
        Some(c @ ('\'' | '"')) => c,
        _ => panic!("scan must be called at the start of a quote marker"),
    };

    let mut scanner = Scanner::new(quote_char);
    match scanner.add_line(source)? {
        ScanProgress::Complete(block) => Ok(block),
        ScanProgress::NeedMoreInput => scanner.finish(),
    }
}

/// The whitespace definition shared with the host lexer. Newlines are structural for this scanner
/// and are never classified as inline whitespace; a CR only reaches this check outside a CRLF
/// pair.
fn is_inline_whitespace(c: char) -> bool {
    c != '\n' && c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn scan_block(input: &str) -> RawQuoteBlock {
        scan(input).expect("Failed to scan block.")
    }

    fn texts(block: &RawQuoteBlock) -> Vec<&str> {
        block.content_lines().iter().map(|l| l.text()).collect()
    }

    macro_rules! scan_incremental {
        ( $( $chunk:expr ),* ) => {{
            let mut scanner = Scanner::new('"');
            let mut progress = ScanProgress::NeedMoreInput;
            $(
                progress = scanner
                    .add_line($chunk)
                    .expect("Failed to add chunk to Scanner.");
            )*
            (scanner, progress)
        }};
    }

    #[test]
    fn captures_lines_verbatim() {
        let block = scan_block("\"\"\"\nfoo\nbar\n\"\"\"");

        assert_eq!(block.quote_char(), '"');
        assert_eq!(block.quote_len(), 3);
        assert_eq!(texts(&block), vec!["foo", "bar"]);
        assert_eq!(block.close_indent(), "");
        assert_eq!(block.content_lines()[0].terminator(), Terminator::Lf);
    }

    #[test]
    fn single_quote_markers() {
        let block = scan_block("'''\nfoo\n'''");

        assert_eq!(block.quote_char(), '\'');
        assert_eq!(texts(&block), vec!["foo"]);
    }

    #[test]
    fn open_line_trailing_whitespace_is_recorded() {
        let block = scan_block("\"\"\"  \t\nX\n\"\"\"");

        assert_eq!(block.open_trailing(), "  \t");
        assert_eq!(texts(&block), vec!["X"]);
    }

    #[test]
    fn non_whitespace_after_open_marker() {
        let result = scan("\"\"\"x\nX\n\"\"\"");

        assert_eq!(
            result,
            Err(ScanError::NonWhitespaceAfterOpenMarker(Position::new(1, 4)))
        );
    }

    #[test]
    fn error_positions_honor_the_host_start() {
        let mut scanner = Scanner::with_start('"', Position::new(10, 5));
        let err = scanner.add_line("\"\"\"x\n").unwrap_err();

        assert_eq!(
            err,
            ScanError::NonWhitespaceAfterOpenMarker(Position::new(10, 8))
        );
    }

    #[test]
    fn longer_marker_keeps_shorter_runs_as_content() {
        let block = scan_block("\"\"\"\"\n\"\"\"\n\"\"\"\"");

        assert_eq!(block.quote_len(), 4);
        assert_eq!(texts(&block), vec!["\"\"\""]);
    }

    #[test]
    fn longer_run_than_marker_is_content() {
        let block = scan_block("\"\"\"\n\"\"\"\"\n\"\"\"");

        assert_eq!(texts(&block), vec!["\"\"\"\""]);
    }

    #[test]
    fn marker_not_first_token_is_content() {
        let block = scan_block("\"\"\"\nx \"\"\"\n\"\"\"");

        assert_eq!(texts(&block), vec!["x \"\"\""]);
    }

    #[test]
    fn close_indent_is_recorded() {
        let block = scan_block("\"\"\"\n    X\n    \"\"\"");

        assert_eq!(block.close_indent(), "    ");
        assert_eq!(texts(&block), vec!["    X"]);
    }

    #[test]
    fn trailing_source_after_close_belongs_to_host() {
        let mut scanner = Scanner::new('"');
        let progress = scanner
            .add_line("\"\"\"\nX\n\"\"\" + tail\n")
            .expect("Failed to add chunk to Scanner.");

        assert_matches!(progress, ScanProgress::Complete(_));
        assert_eq!(scanner.rest(), " + tail\n");
    }

    #[test]
    fn crlf_line_terminators_are_recorded() {
        let block = scan_block("\"\"\"\r\nfoo\r\nbar\n\"\"\"");

        assert_eq!(block.open_trailing(), "\r");
        assert_eq!(texts(&block), vec!["foo", "bar"]);
        assert_eq!(block.content_lines()[0].terminator(), Terminator::CrLf);
        assert_eq!(block.content_lines()[1].terminator(), Terminator::Lf);
    }

    #[test]
    fn unterminated_block_in_batch() {
        let result = scan("\"\"\"\nfoo\n");

        assert_eq!(result, Err(ScanError::UnterminatedBlock(Position::new(3, 1))));
    }

    #[test]
    fn close_marker_at_end_of_input() {
        let block = scan_block("\"\"\"\nX\n  \"\"\"");

        assert_eq!(texts(&block), vec!["X"]);
        assert_eq!(block.close_indent(), "  ");
    }

    #[test]
    fn empty_block_has_no_content_lines() {
        let block = scan_block("\"\"\"\n\"\"\"");

        assert!(block.content_lines().is_empty());
        assert_eq!(block.close_indent(), "");
    }

    #[test]
    fn incremental_scanning() {
        let (_, progress) = scan_incremental!["\"\"\"\n", "foo\n"];
        assert_matches!(progress, ScanProgress::NeedMoreInput);

        let (_, progress) = scan_incremental!["\"\"\"\n", "foo\n", "\"\"\"\n"];
        let block = match progress {
            ScanProgress::Complete(block) => block,
            ScanProgress::NeedMoreInput => panic!("Expected a complete block."),
        };
        assert_eq!(texts(&block), vec!["foo"]);
    }

    #[test]
    fn quote_run_split_across_chunks() {
        let (_, progress) = scan_incremental!["\"\"", "\"\nabc\n", "\"\"", "\"\n"];

        let block = match progress {
            ScanProgress::Complete(block) => block,
            ScanProgress::NeedMoreInput => panic!("Expected a complete block."),
        };
        assert_eq!(block.quote_len(), 3);
        assert_eq!(texts(&block), vec!["abc"]);
    }

    #[test]
    fn failed_scanner_stays_failed() {
        let mut scanner = Scanner::new('"');
        let err = scanner.add_line("\"\"\"x\n").unwrap_err();

        assert_eq!(scanner.add_line("more\n").unwrap_err(), err);
    }

    #[test]
    fn pending_line_reports_truncated_final_line() {
        let (scanner, progress) = scan_incremental!["\"\"\"\npart"];

        assert_matches!(progress, ScanProgress::NeedMoreInput);
        let pending = scanner.pending_line().expect("Expected a pending line.");
        assert_eq!(pending.text(), "part");
        assert_eq!(pending.terminator(), Terminator::None);
    }

    #[test]
    fn unterminated_position_points_past_consumed_input() {
        let mut scanner = Scanner::new('"');
        let _ = scanner
            .add_line("\"\"\"\nab")
            .expect("Failed to add chunk to Scanner.");

        assert_eq!(
            scanner.finish(),
            Err(ScanError::UnterminatedBlock(Position::new(2, 3)))
        );
    }
}

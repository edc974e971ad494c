use std::fmt::{Display, Error, Formatter};

use crate::{
    domain::Position,
    errors::NormError,
    scanner::{RawQuoteBlock, Terminator},
};

/// The final value of a multi-line literal: indentation stripped, boundary newlines dropped, and
/// every other code point passed through uninterpreted. No escape decoding happens anywhere in
/// this pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedString(String);

impl NormalizedString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for NormalizedString {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

/// Turn a captured block into its final string value.
///
/// The closing line's indentation must prefix every non-blank content line character-for-character
/// and is stripped from each; blank lines are exempt. Lines are rejoined with a single LF. The
/// newline that ended the opening marker line and the one separating the last content line from
/// the closing line are both dropped, so an empty block is the empty string rather than an error.
pub fn normalize(block: RawQuoteBlock) -> Result<NormalizedString, NormError> {
    let indent = block.close_indent();
    let last = block.content_lines().len().saturating_sub(1);

    let mut value = String::new();
    for (index, line) in block.content_lines().iter().enumerate() {
        if index > 0 {
            value.push('\n');
        }

        if !line.is_blank() {
            match strip_indent(line.text(), indent) {
                Ok(stripped) => value.push_str(stripped),
                Err(col) => {
                    // Content lines are whole lines: line N of the block is source line
                    // start + 1 + N, starting at column 1.
                    return Err(NormError::IndentationMismatch {
                        line_index: index,
                        position: Position::new(block.start().line + 1 + index, col),
                    });
                }
            }
        }

        // The CR of a CRLF ending the final content line belongs to the stripped trailing
        // newline; every other CR is content and survives verbatim.
        if line.terminator() == Terminator::CrLf && index != last {
            value.push('\r');
        }
    }

    Ok(NormalizedString(value))
}

/// Split `line` after its indentation prefix, returning the remainder. The prefix must match
/// `indent` exactly. On a mismatch, returns the 1-based column of the first character that
/// diverged, or of the point where the line ran out.
fn strip_indent<'a>(line: &'a str, indent: &str) -> Result<&'a str, usize> {
    let mut rest = line;
    for (index, expected) in indent.chars().enumerate() {
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if c == expected => rest = chars.as_str(),
            _ => return Err(index + 1),
        }
    }

    Ok(rest)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::scanner::scan;

    use super::*;

    fn norm(input: &str) -> String {
        let block = scan(input).expect("Failed to scan block.");
        normalize(block)
            .expect("Failed to normalize block.")
            .into_string()
    }

    fn norm_err(input: &str) -> NormError {
        let block = scan(input).expect("Failed to scan block.");
        normalize(block).expect_err("Expected normalization to fail.")
    }

    #[test]
    fn empty_block_is_the_empty_string() {
        assert_eq!(norm("\"\"\"\n\"\"\""), "");
    }

    #[test]
    fn single_content_line() {
        assert_eq!(norm("\"\"\"\nX\n\"\"\""), "X");
    }

    #[test]
    fn boundary_blank_lines_survive() {
        assert_eq!(norm("\"\"\"\n\n  X\n\n\"\"\""), "\n  X\n");
    }

    #[test]
    fn closing_indent_is_stripped_from_every_line() {
        let input = "\"\"\"\n    first\n    second\n    \"\"\"";
        assert_eq!(norm(input), "first\nsecond");
    }

    #[test]
    fn blank_lines_are_exempt_from_stripping() {
        let input = "\"\"\"\n    a\n\n    b\n    \"\"\"";
        assert_eq!(norm(input), "a\n\nb");
    }

    #[test]
    fn extra_indentation_is_kept() {
        let input = "\"\"\"\n    a\n        b\n    \"\"\"";
        assert_eq!(norm(input), "a\n    b");
    }

    #[test]
    fn line_shorter_than_indent_fails() {
        let err = norm_err("\"\"\"\n    a\n  b\n    \"\"\"");

        assert_eq!(
            err,
            NormError::IndentationMismatch {
                line_index: 1,
                position: Position::new(3, 3),
            }
        );
    }

    #[test]
    fn differing_prefix_fails() {
        // A tab where the closing line has a space.
        let err = norm_err("\"\"\"\n\ta\n \"\"\"");

        assert_matches!(
            err,
            NormError::IndentationMismatch { line_index: 0, .. }
        );
    }

    #[test]
    fn crlf_before_closing_line_is_stripped_wholesale() {
        assert_eq!(norm("\"\"\"\na\r\n\"\"\""), "a");
    }

    #[test]
    fn interior_crlf_cr_is_preserved() {
        assert_eq!(norm("\"\"\"\na\r\nb\n\"\"\""), "a\r\nb");
    }

    #[test]
    fn cr_inside_a_line_is_preserved() {
        assert_eq!(norm("\"\"\"\na\rb\n\"\"\""), "a\rb");
    }

    #[test]
    fn value_is_independent_of_marker_length() {
        let with_three = norm("\"\"\"\nfoo\nbar\n\"\"\"");
        let with_five = norm("\"\"\"\"\"\nfoo\nbar\n\"\"\"\"\"");

        assert_eq!(with_three, with_five);
    }

    #[test]
    fn three_quotes_are_content_inside_a_longer_marker() {
        assert_eq!(norm("\"\"\"\"\n\"\"\"\n\"\"\"\""), "\"\"\"");
    }

    #[test]
    fn backslashes_are_not_escapes() {
        assert_eq!(norm("\"\"\"\na\\nb\n\"\"\""), "a\\nb");
    }
}

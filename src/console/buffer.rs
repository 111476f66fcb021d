//! Accumulates SQL lines until a statement is complete.

use crate::sql::is_complete;

/// Raw SQL lines typed since the last flush.
#[derive(Debug, Default, Clone)]
pub struct StatementBuffer {
    lines: Vec<String>,
}

/// A flushed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushedInput {
    /// Lines joined with newlines, for comment stripping and splitting.
    pub text: String,
    /// Lines joined with spaces, for the history file.
    pub history_entry: String,
}

impl StatementBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a trimmed line.
    pub fn push(&mut self, line: &str) {
        self.lines.push(line.trim().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when the last line ends with a terminator outside quotes and
    /// comments.
    pub fn is_complete(&self) -> bool {
        !self.lines.is_empty() && is_complete(&self.lines.join("\n"))
    }

    /// Takes the buffered lines, leaving the buffer empty.
    pub fn flush(&mut self) -> FlushedInput {
        let lines = std::mem::take(&mut self.lines);
        FlushedInput {
            text: lines.join("\n"),
            history_entry: lines.join(" "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_line_statement() {
        let mut buffer = StatementBuffer::new();
        buffer.push("select *");
        assert!(!buffer.is_complete());
        buffer.push("  from users  ");
        assert!(!buffer.is_complete());
        buffer.push("where id = 1;");
        assert!(buffer.is_complete());

        let flushed = buffer.flush();
        assert_eq!(flushed.text, "select *\nfrom users\nwhere id = 1;");
        assert_eq!(flushed.history_entry, "select * from users where id = 1;");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_vertical_terminator_completes() {
        let mut buffer = StatementBuffer::new();
        buffer.push("show processlist\\G");
        assert!(buffer.is_complete());
    }

    #[test]
    fn test_terminator_inside_comment_or_quote_does_not_complete() {
        let mut buffer = StatementBuffer::new();
        buffer.push("select 1 -- done;");
        assert!(!buffer.is_complete());

        let mut buffer = StatementBuffer::new();
        buffer.push("select 'a;");
        assert!(!buffer.is_complete());
        buffer.push("b';");
        assert!(buffer.is_complete());
    }

    #[test]
    fn test_empty_buffer_is_not_complete() {
        let mut buffer = StatementBuffer::new();
        assert!(!buffer.is_complete());
        buffer.push("select 1");
        buffer.flush();
        assert!(buffer.is_empty());
    }
}

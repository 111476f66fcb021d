//! Line routing for the interactive loop.
//!
//! Decides what one input line is before anything is executed. Command
//! names win over SQL while the statement buffer is empty; once a statement
//! is being buffered every line is SQL except the loop-level keywords.

use crate::commands::definitions::is_command_name;
use crate::sql::is_allowed_verb;

/// What an input line means to the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Nothing but whitespace.
    Blank,
    /// `exit` or `quit`.
    Exit,
    /// `clear`.
    Clear,
    /// `help`, optionally naming a command.
    Help,
    /// An administrative command line.
    Command,
    /// A fragment of a SQL statement.
    Sql,
}

/// Classifies `line`. `buffering` is true while a statement is incomplete.
pub fn classify(line: &str, buffering: bool) -> LineKind {
    let line = line.trim();
    let Some(first) = line.split_whitespace().next() else {
        return LineKind::Blank;
    };
    let word = trim_terminator(first);
    let alone = line.split_whitespace().nth(1).is_none();

    if alone && (word.eq_ignore_ascii_case("exit") || word.eq_ignore_ascii_case("quit")) {
        return LineKind::Exit;
    }
    if alone && word.eq_ignore_ascii_case("clear") {
        return LineKind::Clear;
    }
    if word.eq_ignore_ascii_case("help") && (alone || !buffering) {
        return LineKind::Help;
    }
    if !buffering && (is_command_name(word) || !is_allowed_verb(word)) {
        return LineKind::Command;
    }
    LineKind::Sql
}

/// Strips one trailing `;` or `\G` from a token.
fn trim_terminator(word: &str) -> &str {
    word.strip_suffix(';')
        .or_else(|| word.strip_suffix("\\G"))
        .unwrap_or(word)
}

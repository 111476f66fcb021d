//! Splits buffered SQL into statement groups on `;` and `\G`.

use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use super::comments::{scan, RegionKind};

/// How a statement group was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `;`, rendered as a table.
    Semicolon,
    /// `\G`, rendered as a vertical record list.
    Vertical,
    /// Trailing text without a terminator; never executed.
    None,
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semicolon => write!(f, ";"),
            Self::Vertical => write!(f, "\\G"),
            Self::None => Ok(()),
        }
    }
}

/// One statement and the terminator that ended it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementGroup {
    /// Statement text without its terminator, trimmed.
    pub text: String,
    pub terminator: Terminator,
}

impl StatementGroup {
    /// Returns true when the group can be sent to the cluster.
    pub fn is_terminated(&self) -> bool {
        self.terminator != Terminator::None
    }
}

fn terminator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r";|\\G").expect("invalid terminator pattern"))
}

/// Terminators of `input` that sit in code, with their byte ranges.
fn code_terminators(input: &str) -> Vec<(Range<usize>, Terminator)> {
    let regions = scan(input);
    let in_code = |offset: usize| {
        regions
            .iter()
            .find(|region| region.range.contains(&offset))
            .is_some_and(|region| region.kind == RegionKind::Code)
    };

    terminator_regex()
        .find_iter(input)
        .filter(|found| in_code(found.start()))
        .map(|found| {
            let terminator = if found.as_str() == ";" {
                Terminator::Semicolon
            } else {
                Terminator::Vertical
            };
            (found.range(), terminator)
        })
        .collect()
}

/// Splits `input` into statement groups in input order.
///
/// Terminators inside quoted literals or comments do not split. Text after
/// the last terminator is returned as a final group with
/// [`Terminator::None`] unless it is blank.
pub fn split_statements(input: &str) -> Vec<StatementGroup> {
    let mut groups = Vec::new();
    let mut last = 0;

    for (range, terminator) in code_terminators(input) {
        groups.push(StatementGroup {
            text: input[last..range.start].trim().to_string(),
            terminator,
        });
        last = range.end;
    }

    let remainder = input[last..].trim();
    if !remainder.is_empty() {
        groups.push(StatementGroup {
            text: remainder.to_string(),
            terminator: Terminator::None,
        });
    }

    groups
}

/// Returns true if `input` has a `;` or `\G` outside literals and comments.
pub fn contains_terminator(input: &str) -> bool {
    !code_terminators(input).is_empty()
}

/// Returns true when `input` ends with a terminator outside any literal or
/// comment, i.e. the buffer is ready to be dispatched.
pub fn is_complete(input: &str) -> bool {
    split_statements(input)
        .last()
        .is_some_and(StatementGroup::is_terminated)
}

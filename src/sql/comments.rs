//! Comment handling for buffered SQL.
//!
//! A small scanner splits text into code, quoted literals and comments so
//! that comment markers and terminators inside literals are left alone.

use std::ops::Range;

/// Lexical class of a region of SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegionKind {
    Code,
    Literal,
    LineComment,
    BlockComment,
}

/// A contiguous byte range of one lexical class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Region {
    pub kind: RegionKind,
    pub range: Range<usize>,
}

/// Splits `input` into regions covering every byte exactly once.
///
/// Literals are delimited by `'`, `"` or `` ` ``; a backslash escapes the
/// next character inside `'` and `"` literals. `#` and `--` followed by
/// whitespace (or the end of input) run to the end of the line, as on the
/// server; `--1` is code. `/* */` may span lines, and an unterminated
/// literal or block comment extends to the end of the input.
pub(crate) fn scan(input: &str) -> Vec<Region> {
    let bytes = input.as_bytes();
    let mut regions = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let (kind, end) = match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => (RegionKind::Literal, literal_end(bytes, i, quote)),
            b'#' => (RegionKind::LineComment, line_end(bytes, i)),
            b'-' if bytes.get(i + 1) == Some(&b'-')
                && bytes
                    .get(i + 2)
                    .map_or(true, |b| b.is_ascii_whitespace() || b.is_ascii_control()) =>
            {
                (RegionKind::LineComment, line_end(bytes, i))
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = input[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |offset| i + 2 + offset + 2);
                (RegionKind::BlockComment, end)
            }
            _ => {
                i += 1;
                continue;
            }
        };

        push(&mut regions, RegionKind::Code, start..i);
        push(&mut regions, kind, i..end);
        i = end;
        start = end;
    }
    push(&mut regions, RegionKind::Code, start..bytes.len());

    regions
}

fn push(regions: &mut Vec<Region>, kind: RegionKind, range: Range<usize>) {
    if !range.is_empty() {
        regions.push(Region { kind, range });
    }
}

fn line_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |offset| start + offset)
}

fn literal_end(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote != b'`' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Returns true if `input` holds a versioned comment (`/*! */` or
/// `/*M! */`). The server executes the body of such comments as code.
pub fn has_executable_comment(input: &str) -> bool {
    scan(input).into_iter().any(|region| {
        let text = &input[region.range];
        region.kind == RegionKind::BlockComment
            && (text.starts_with("/*!") || text.starts_with("/*M!"))
    })
}

/// Removes `--` and `#` line comments and `/* */` block comments.
///
/// Each remaining line is trimmed and blank lines are dropped, so the
/// result of stripping already-stripped text is unchanged.
pub fn strip_comments(input: &str) -> String {
    let mut code = String::with_capacity(input.len());
    for region in scan(input) {
        match region.kind {
            RegionKind::Code | RegionKind::Literal => code.push_str(&input[region.range]),
            RegionKind::BlockComment => code.push(' '),
            RegionKind::LineComment => {}
        }
    }

    code.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

//! Leading-verb classification for the interactive allow-list.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Verbs the console forwards to a cluster.
pub const ALLOWED_VERBS: [&str; 4] = ["SELECT", "SHOW", "USE", "EXPLAIN"];

/// The leading verb of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementVerb {
    Select,
    Show,
    Use,
    Explain,
    /// Anything else, as typed.
    Other(String),
}

impl StatementVerb {
    /// Maps a word to a verb, ignoring ASCII case.
    pub fn from_word(word: &str) -> Self {
        match word.to_ascii_uppercase().as_str() {
            "SELECT" => Self::Select,
            "SHOW" => Self::Show,
            "USE" => Self::Use,
            "EXPLAIN" => Self::Explain,
            _ => Self::Other(word.to_string()),
        }
    }

    /// Returns true for verbs on the allow-list.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for StatementVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Show => write!(f, "SHOW"),
            Self::Use => write!(f, "USE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Other(word) => write!(f, "{word}"),
        }
    }
}

/// Returns true if `word` is an allow-listed verb, ignoring ASCII case.
pub fn is_allowed_verb(word: &str) -> bool {
    ALLOWED_VERBS
        .iter()
        .any(|verb| verb.eq_ignore_ascii_case(word))
}

/// Extracts the leading verb of comment-free statement text.
///
/// Returns `None` for blank text.
pub fn leading_verb(statement: &str) -> Option<StatementVerb> {
    let dialect = MySqlDialect {};
    if let Ok(tokens) = Tokenizer::new(&dialect, statement).tokenize() {
        let first = tokens
            .into_iter()
            .find(|token| !matches!(token, Token::Whitespace(_)));
        if let Some(Token::Word(word)) = first {
            if word.quote_style.is_none() {
                return Some(StatementVerb::from_word(&word.value));
            }
        }
    }

    statement
        .split_whitespace()
        .next()
        .map(|word| StatementVerb::from_word(word.trim_end_matches(';')))
}

fn use_target_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^\s*use\s+(`(?:[^`]|``)+`|[^\s;`]+)").expect("invalid use pattern")
    })
}

/// Extracts the schema named by a `USE` statement.
pub fn use_target(statement: &str) -> Option<String> {
    let captures = use_target_regex().captures(statement)?;
    let target = &captures[1];
    match target.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
        Some(quoted) => Some(quoted.replace("``", "`")),
        None => Some(target.to_string()),
    }
}

//! SQL text handling for the interactive console.
//!
//! Comment stripping, statement splitting and leading-verb classification.
//! Nothing here talks to a cluster.

pub mod classifier;
pub mod comments;
pub mod splitter;

pub use classifier::{is_allowed_verb, leading_verb, use_target, StatementVerb, ALLOWED_VERBS};
pub use comments::{has_executable_comment, strip_comments};
pub use splitter::{
    contains_terminator, is_complete, split_statements, StatementGroup, Terminator,
};

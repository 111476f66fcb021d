//! Administrative commands for clusterdba.
//!
//! Parsing is kept apart from execution so command lines can be tested
//! without a cluster.

pub mod definitions;
pub mod handlers;
pub mod help;
pub mod output;
pub mod tokenizer;

pub use definitions::{CommandCategory, CommandDef, CommandLine, ConsoleCommand, COMMANDS};
pub use handlers::CommandContext;
pub use output::{CommandOutput, ControlAction, ResultLayout};
pub use tokenizer::{split_words, ParseError};

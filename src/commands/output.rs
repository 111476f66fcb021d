//! Transport-agnostic command output types.
//!
//! Handlers and the SQL path describe what to show; the console decides how
//! to draw it.

use crate::db::QueryResult;

/// Output from a command handler or a dispatched statement.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Informational message (status, summaries, help).
    Info(String),

    /// Completed state change, e.g. `Database changed`.
    Success(String),

    /// Error message.
    Error(String),

    /// Structured table data for display.
    Table {
        /// Column headers.
        headers: Vec<String>,
        /// Row data (each row is a vector of cell values).
        rows: Vec<Vec<String>>,
    },

    /// Result set of a statement.
    ResultSet {
        result: QueryResult,
        layout: ResultLayout,
    },

    /// Console control action.
    Control(ControlAction),

    /// Multiple outputs (for commands that produce several messages).
    Multiple(Vec<CommandOutput>),
}

/// How a result set is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLayout {
    /// Boxed table, for `;`.
    Table,
    /// One record per block, for `\G`.
    Vertical,
}

/// Control actions that affect the console itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// End the interactive session.
    Exit,

    /// Clear the terminal.
    ClearScreen,
}

impl CommandOutput {
    /// Creates an info message.
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    /// Creates a success message.
    pub fn success(msg: impl Into<String>) -> Self {
        Self::Success(msg.into())
    }

    /// Creates an error message.
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// Creates a table output.
    pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::Table { headers, rows }
    }

    /// Creates a result set output.
    pub fn result_set(result: QueryResult, layout: ResultLayout) -> Self {
        Self::ResultSet { result, layout }
    }

    /// Creates an exit control action.
    pub fn exit() -> Self {
        Self::Control(ControlAction::Exit)
    }

    /// Creates a clear-screen control action.
    pub fn clear_screen() -> Self {
        Self::Control(ControlAction::ClearScreen)
    }

    /// Returns true if this output, or any nested output, is an error.
    pub fn is_error(&self) -> bool {
        match self {
            Self::Error(_) => true,
            Self::Multiple(outputs) => outputs.iter().any(Self::is_error),
            _ => false,
        }
    }
}

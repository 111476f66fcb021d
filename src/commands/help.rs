//! Help text for console commands.

use super::definitions::{CommandCategory, COMMANDS};
use crate::sql::ALLOWED_VERBS;

/// Builds the help text shown by `help`.
///
/// Commands are grouped by category in table order; `exit` and `quit` share
/// one line.
pub fn help_text() -> String {
    let mut out = String::from("Available commands:\n");

    for category in [
        CommandCategory::Cluster,
        CommandCategory::Kill,
        CommandCategory::Console,
    ] {
        out.push('\n');
        out.push_str(category.display_name());
        out.push_str(":\n");
        for cmd in COMMANDS
            .iter()
            .filter(|cmd| cmd.category == category && cmd.name != "quit")
        {
            out.push_str(&format!("  {:<10} {}\n", cmd.name, cmd.description));
            out.push_str(&format!("  {:<10} usage: {}\n", "", cmd.usage));
        }
    }

    out.push_str(&format!(
        "\nSQL:\n  After [login -c <cluster>], \
         statements ending in ';' or '\\G' run on the cluster.\n  \
         Only [{}] statements are allowed.",
        ALLOWED_VERBS.join("/")
    ));
    out
}

/// Banner printed when the interactive console starts.
pub fn welcome_text() -> String {
    format!(
        "Welcome to clusterdba {}\n\
         Type 'exit' or 'quit' to leave. Type 'clear' to clear the screen. \
         Type 'help' for commands.\n\
         After logging in to a cluster, [{}] SQL statements can be executed; \
         other statements are refused.",
        env!("CARGO_PKG_VERSION"),
        ALLOWED_VERBS.join("/")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lists_every_command_once() {
        let help = help_text();
        for name in ["login", "logout", "cluster", "kill", "clear", "help", "exit"] {
            assert!(help.contains(&format!("  {name} ")), "missing {name}");
        }
        assert!(help.contains("exit | quit"));
        assert!(!help.contains("  quit "));
    }

    #[test]
    fn test_help_mentions_allowed_verbs() {
        assert!(help_text().contains("SELECT/SHOW/USE/EXPLAIN"));
        assert!(welcome_text().contains("SELECT/SHOW/USE/EXPLAIN"));
    }
}

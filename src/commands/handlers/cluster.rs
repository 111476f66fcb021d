//! Cluster command handlers.

use super::CommandContext;
use crate::commands::output::CommandOutput;

/// Handle `cluster list`.
pub fn handle_list(ctx: &CommandContext<'_>) -> CommandOutput {
    let summaries = ctx.registry.summaries();
    if summaries.is_empty() {
        return CommandOutput::info(
            "No clusters configured. Add a [clusters.<name>] section to the config file.",
        );
    }

    let active = ctx.session.cluster();
    let rows = summaries
        .into_iter()
        .map(|summary| {
            let marker = if summary.name == active { "*" } else { "" };
            vec![
                summary.name,
                summary.address,
                summary.user,
                marker.to_string(),
            ]
        })
        .collect();

    CommandOutput::table(
        vec![
            "Cluster".to_string(),
            "Address".to_string(),
            "User".to_string(),
            "Active".to_string(),
        ],
        rows,
    )
}

//! SQL dispatch for completed statement buffers.
//!
//! A flushed buffer is split into statement groups which run in order on the
//! session's connection. Only allow-listed verbs reach the cluster.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::commands::output::{CommandOutput, ResultLayout};
use crate::connection::ConnectionRegistry;
use crate::db::SqlExecutor;
use crate::error::{ConsoleError, Result};
use crate::session::Session;
use crate::sql::{
    contains_terminator, has_executable_comment, leading_verb, split_statements, strip_comments,
    use_target, StatementGroup, StatementVerb, Terminator, ALLOWED_VERBS,
};

/// Reported for a group with no statement text, e.g. the middle of `;;`.
pub const NO_QUERY: &str = "ERROR: No query specified";

/// Message shown when SQL is flushed without an active cluster.
pub fn no_cluster_message() -> String {
    format!(
        "❌ Execute command error: the cluster_name cannot be empty, \
         if you need to execute the [{}] sql command, \
         please log in to the cluster in advance by running [login -c {{clusterName}}]. \
         Otherwise, run the [help] command to view.",
        ALLOWED_VERBS.join("/")
    )
}

/// Error for a verb outside the allow-list.
pub fn rejected_verb(verb: &StatementVerb) -> ConsoleError {
    ConsoleError::security(format!(
        "operation and maintenance security control, \
         only [{}] sql commands are allowed to be executed, \
         current command [{}] are not allowed",
        ALLOWED_VERBS.join("/"),
        verb
    ))
}

/// Error for a group that could run more than one statement on the server.
pub fn hidden_statement() -> ConsoleError {
    ConsoleError::security(
        "operation and maintenance security control, \
         executable comments and multiple statements in one command are not allowed",
    )
}

fn failure_message(statement: &str, error: &ConsoleError) -> String {
    format!(
        "❌ Execute query failed!\n\nstatement:\n{statement}\n\nquery error content:\n{error}\n"
    )
}

/// Runs every terminated group of `text` against the active cluster.
///
/// A disallowed verb or an empty group is reported and skipped. Any other
/// failure is reported and ends the dispatch.
pub async fn dispatch_sql(
    session: &Session,
    registry: &ConnectionRegistry,
    text: &str,
) -> Vec<CommandOutput> {
    let cluster = session.cluster();
    if cluster.is_empty() {
        return vec![CommandOutput::error(no_cluster_message())];
    }

    let mut outputs = Vec::new();
    for group in split_statements(text) {
        if group.terminator == Terminator::None {
            debug!("Skipping unterminated remainder: {}", group.text);
            continue;
        }

        match run_group(session, registry, &cluster, &group).await {
            Ok(output) => outputs.push(output),
            Err(e) => {
                outputs.push(CommandOutput::error(failure_message(&group.text, &e)));
                if e.aborts_dispatch() {
                    warn!("Statement failed on cluster '{}': {}", cluster, e);
                    break;
                }
            }
        }
    }
    outputs
}

async fn run_group(
    session: &Session,
    registry: &ConnectionRegistry,
    cluster: &str,
    group: &StatementGroup,
) -> Result<CommandOutput> {
    let stripped = strip_comments(&group.text);
    if has_executable_comment(&group.text) || contains_terminator(&stripped) {
        return Err(hidden_statement());
    }
    let Some(verb) = leading_verb(&stripped) else {
        return Ok(CommandOutput::error(NO_QUERY));
    };
    if !verb.is_allowed() {
        return Err(rejected_verb(&verb));
    }

    let connection = active_connection(session, registry, cluster).await?;

    if verb == StatementVerb::Use {
        match use_target(&stripped) {
            Some(schema) => {
                connection.use_schema(&schema).await?;
                session.set_schema(schema.as_str());
                info!("Schema changed to '{}' on cluster '{}'", schema, cluster);
            }
            None => connection.execute(&group.text).await?,
        }
        return Ok(CommandOutput::success("Database changed"));
    }

    let started = Instant::now();
    let mut result = connection.query(&group.text).await?;
    if result.execution_time.is_zero() {
        result.execution_time = started.elapsed();
    }
    debug!(
        "{} returned {} rows in {:?}",
        verb,
        result.row_count(),
        result.execution_time
    );

    let layout = match group.terminator {
        Terminator::Vertical => ResultLayout::Vertical,
        _ => ResultLayout::Table,
    };
    Ok(CommandOutput::result_set(result, layout))
}

/// Returns the session's connection, opening it on first use.
async fn active_connection(
    session: &Session,
    registry: &ConnectionRegistry,
    cluster: &str,
) -> Result<Arc<dyn SqlExecutor>> {
    if let Some(connection) = session.connection() {
        return Ok(connection);
    }
    let connection = registry.get_connection(cluster).await?;
    session.set_connection(cluster, Arc::clone(&connection));
    Ok(connection)
}

//! SQL used by the kill engine: capability check, discovery and kill.

use crate::db::{quote_literal, QueryResult, SqlExecutor, Value};
use crate::error::{ConsoleError, Result};
use tracing::warn;

use super::{KillTarget, TargetSession};

/// Asks the cluster whether cross-node session kill is enabled.
pub const GLOBAL_KILL_CHECK: &str =
    "SHOW CONFIG WHERE type = 'tidb' AND name = 'enable-global-kill'";

/// Fails unless every TiDB instance reports `enable-global-kill = true`.
pub async fn check_global_kill(executor: &dyn SqlExecutor, cluster: &str) -> Result<()> {
    let result = executor.query(GLOBAL_KILL_CHECK).await?;
    verify_global_kill(&result, cluster)
}

fn verify_global_kill(result: &QueryResult, cluster: &str) -> Result<()> {
    let unsupported = || {
        ConsoleError::kill(format!(
            "the cluster [{cluster}] does not meet the requirement: version >= v6.1.0 \
             with config [enable-global-kill = true]"
        ))
    };

    if result.is_empty() {
        return Err(unsupported());
    }

    if result.column_index("Value").is_some() {
        let all_enabled = (0..result.row_count()).all(|row| {
            result
                .value(row, "Value")
                .is_some_and(|v| v.to_display_string().eq_ignore_ascii_case("true"))
        });
        if !all_enabled {
            return Err(unsupported());
        }
    }

    Ok(())
}

/// Builds the cluster-wide live-session query for a target.
pub fn discovery_sql(target: &KillTarget) -> String {
    let (column, values) = match target {
        KillTarget::Digests(digests) => ("t.DIGEST", digests),
        KillTarget::Usernames(users) => ("t.USER", users),
    };
    let literals = values
        .iter()
        .map(|v| quote_literal(v))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT f.INSTANCE AS INSTANCE, t.ID AS ID \
         FROM information_schema.cluster_processlist t \
         LEFT JOIN information_schema.cluster_info f ON t.INSTANCE = f.STATUS_ADDRESS \
         WHERE {column} IN ({literals})"
    )
}

/// Converts discovery rows into kill targets, skipping rows without an id.
pub fn parse_sessions(result: &QueryResult) -> Vec<TargetSession> {
    (0..result.row_count())
        .filter_map(|row| {
            let Some(session_id) = result.value(row, "ID").and_then(Value::as_u64) else {
                warn!("Skipping discovered session without a numeric id (row {})", row);
                return None;
            };
            let instance = match result.value(row, "INSTANCE") {
                Some(value) if !value.is_null() => value.to_display_string(),
                _ => "unknown".to_string(),
            };
            Some(TargetSession {
                instance,
                session_id,
            })
        })
        .collect()
}

/// Builds the statement terminating one session anywhere in the cluster.
pub fn kill_sql(session: &TargetSession) -> String {
    format!("KILL TIDB {}", session.session_id)
}

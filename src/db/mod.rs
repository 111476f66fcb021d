//! Database abstraction layer for clusterdba.
//!
//! Provides a trait-based interface for executing statements against a
//! cluster, so the console and the kill engine can run against a real MySQL
//! protocol endpoint or an in-memory mock.

mod mock;
mod mysql;
mod types;

pub use mock::MockDatabaseClient;
pub use mysql::MySqlClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use std::sync::Arc;

use crate::config::ClusterConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Creates a database client for the given cluster configuration.
///
/// This is the central factory function for cluster connections.
pub async fn connect(config: &ClusterConfig) -> Result<Arc<dyn SqlExecutor>> {
    let client = MySqlClient::connect(config).await?;
    Ok(Arc::new(client))
}

/// Quotes an identifier with backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quotes a string literal with single quotes.
pub fn quote_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "''");
    format!("'{escaped}'")
}

/// The SQL execution boundary of the console.
///
/// All operations are async and return Results with ConsoleError.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executes a statement that produces no result set.
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Executes a statement and returns its result set.
    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Switches the default schema for subsequent statements.
    async fn use_schema(&self, schema: &str) -> Result<()> {
        self.execute(&format!("USE {}", quote_identifier(schema)))
            .await
    }

    /// Closes the connection.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("test"), "`test`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("root"), "'root'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
        assert_eq!(quote_literal(r"a\'b"), r"'a\\''b'");
    }
}

//! MySQL-protocol client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `SqlExecutor` trait
//! for TiDB and other MySQL-compatible clusters using sqlx.

use crate::config::ClusterConfig;
use crate::db::{quote_identifier, ColumnInfo, QueryResult, Row, SqlExecutor, Value};
use crate::error::{ConsoleError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 60;

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// MySQL-protocol cluster client.
///
/// Statements go through the text protocol so that administrative
/// statements (`SHOW CONFIG`, `KILL TIDB`) are accepted by the server.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
    /// Schema selected with `USE`, re-applied to every pooled connection.
    schema: RwLock<Option<String>>,
}

impl MySqlClient {
    /// Connects to the cluster, retrying transient failures with backoff.
    pub async fn connect(config: &ClusterConfig) -> Result<Self> {
        let options = connect_options(config);

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = MySqlPoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .acquire_timeout(Duration::from_secs(10))
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => {
                    debug!("Connected to {}", config.display_string());
                    return Ok(Self {
                        pool,
                        schema: RwLock::new(config.database.clone()),
                    });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    last_error = Some(e);

                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Connection attempt {} failed (transient error), retrying in {:?}",
                            attempt, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    } else {
                        break;
                    }
                }
            }
        }

        Err(match last_error {
            Some(e) => map_connection_error(e, config),
            None => ConsoleError::connection(format!(
                "Cannot connect to {}",
                config.address()
            )),
        })
    }

    fn current_schema(&self) -> Result<Option<String>> {
        self.schema
            .read()
            .map(|schema| schema.clone())
            .map_err(|_| ConsoleError::internal("schema lock poisoned"))
    }

    /// Acquires a pooled connection positioned on the current schema.
    async fn acquire(&self) -> Result<PoolConnection<MySql>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ConsoleError::connection(e.to_string()))?;

        if let Some(schema) = self.current_schema()? {
            let statement = format!("USE {}", quote_identifier(&schema));
            conn.execute(sqlx::raw_sql(&statement))
                .await
                .map_err(|e| ConsoleError::query(format_query_error(e)))?;
        }

        Ok(conn)
    }
}

#[async_trait]
impl SqlExecutor for MySqlClient {
    async fn execute(&self, sql: &str) -> Result<()> {
        let mut conn = self.acquire().await?;

        tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            conn.execute(sqlx::raw_sql(sql)),
        )
        .await
        .map_err(|_| timed_out())?
        .map_err(|e| ConsoleError::query(format_query_error(e)))?;

        Ok(())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let mut conn = self.acquire().await?;

        let rows = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            conn.fetch_all(sqlx::raw_sql(sql)),
        )
        .await
        .map_err(|_| timed_out())?
        .map_err(|e| ConsoleError::query(format_query_error(e)))?;

        let columns: Vec<ColumnInfo> = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let rows: Vec<Row> = rows.iter().map(convert_row).collect();

        Ok(QueryResult {
            columns,
            rows,
            execution_time: start.elapsed(),
        })
    }

    async fn use_schema(&self, schema: &str) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ConsoleError::connection(e.to_string()))?;

        let statement = format!("USE {}", quote_identifier(schema));
        conn.execute(sqlx::raw_sql(&statement))
            .await
            .map_err(|e| ConsoleError::query(format_query_error(e)))?;

        let mut current = self
            .schema
            .write()
            .map_err(|_| ConsoleError::internal("schema lock poisoned"))?;
        *current = Some(schema.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn connect_options(config: &ClusterConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(config.host.as_deref().unwrap_or("127.0.0.1"))
        .port(config.port)
        .username(config.user.as_deref().unwrap_or("root"));

    if let Some(password) = &config.password {
        options = options.password(password);
    }
    if let Some(database) = &config.database {
        options = options.database(database);
    }
    options
}

fn timed_out() -> ConsoleError {
    ConsoleError::query(format!(
        "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
    ))
}

/// Converts a MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single text-protocol column value to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let text = match row.try_get_unchecked::<Option<String>, _>(index) {
        Ok(Some(text)) => text,
        Ok(None) => return Value::Null,
        Err(_) => {
            return row
                .try_get_unchecked::<Option<Vec<u8>>, _>(index)
                .ok()
                .flatten()
                .map(Value::Bytes)
                .unwrap_or(Value::Null)
        }
    };

    parse_typed(text, type_name)
}

/// Narrows a textual cell to a numeric value when the column type allows it.
fn parse_typed(text: String, type_name: &str) -> Value {
    let upper = type_name.to_uppercase();
    let unsigned = upper.ends_with("UNSIGNED");

    match upper.split_whitespace().next().unwrap_or_default() {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => {
            if unsigned {
                text.parse().map(Value::UInt).unwrap_or(Value::String(text))
            } else {
                text.parse().map(Value::Int).unwrap_or(Value::String(text))
            }
        }
        "FLOAT" | "DOUBLE" => text.parse().map(Value::Float).unwrap_or(Value::String(text)),
        _ => Value::String(text),
    }
}

/// Checks if a sqlx error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("access denied") || error_str.contains("unknown database") {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
}

/// Maps sqlx connection errors to operator-facing messages.
fn map_connection_error(error: sqlx::Error, config: &ClusterConfig) -> ConsoleError {
    let address = config.address();
    let user = config.user.as_deref().unwrap_or("root");
    let database = config.database.as_deref().unwrap_or("");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        ConsoleError::connection(format!(
            "Cannot connect to {address}. Check that the cluster is running."
        ))
    } else if error_str.contains("access denied") {
        ConsoleError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("unknown database") {
        ConsoleError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ConsoleError::connection(format!(
            "Connection to {address} timed out. The cluster may be overloaded or unreachable."
        ))
    } else {
        ConsoleError::connection(error.to_string())
    }
}

/// Formats a statement error the way the mysql client prints it.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    match db_error.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
        Some(mysql_error) => match mysql_error.code() {
            Some(state) => format!(
                "ERROR {} ({}): {}",
                mysql_error.number(),
                state,
                mysql_error.message()
            ),
            None => format!("ERROR {}: {}", mysql_error.number(), mysql_error.message()),
        },
        None => format!("ERROR: {}", db_error.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_integers() {
        assert_eq!(parse_typed("42".into(), "BIGINT"), Value::Int(42));
        assert_eq!(parse_typed("-1".into(), "INT"), Value::Int(-1));
        assert_eq!(
            parse_typed("18446744073709551615".into(), "BIGINT UNSIGNED"),
            Value::UInt(u64::MAX)
        );
    }

    #[test]
    fn test_parse_typed_keeps_text() {
        assert_eq!(parse_typed("1.50".into(), "DECIMAL"), Value::from("1.50"));
        assert_eq!(parse_typed("tidb".into(), "VARCHAR"), Value::from("tidb"));
        assert_eq!(parse_typed("n/a".into(), "BIGINT"), Value::from("n/a"));
    }

    #[test]
    fn test_parse_typed_float() {
        assert_eq!(parse_typed("0.25".into(), "DOUBLE"), Value::Float(0.25));
    }

    #[test]
    fn test_transient_classification() {
        let refused = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(is_transient_error(&refused));

        let protocol = sqlx::Error::Protocol("Access denied for user 'root'".into());
        assert!(!is_transient_error(&protocol));
    }

    #[test]
    fn test_map_connection_error_messages() {
        let config = ClusterConfig {
            host: Some("10.0.0.1".to_string()),
            user: Some("dba".to_string()),
            ..ClusterConfig::default()
        };

        let refused = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let err = map_connection_error(refused, &config);
        assert!(err.to_string().contains("10.0.0.1:4000"));

        let denied = sqlx::Error::Protocol("Access denied for user 'dba'".into());
        let err = map_connection_error(denied, &config);
        assert!(err.to_string().contains("Authentication failed for user 'dba'"));
    }
}

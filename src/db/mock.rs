//! Mock database client for testing.
//!
//! Provides a scripted in-memory executor for headless testing of the
//! console and the kill engine.

use super::{ColumnInfo, QueryResult, SqlExecutor, Value};
use crate::error::{ConsoleError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Outcome of a scripted statement.
#[derive(Debug, Clone)]
enum Outcome {
    Rows(QueryResult),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Response {
    delay: Duration,
    outcome: Outcome,
}

#[derive(Debug)]
struct Rule {
    needle: String,
    responses: VecDeque<Response>,
}

/// A mock database client that returns scripted results.
///
/// Responses are matched by case-insensitive substring. Each rule answers
/// with its queued responses in order; the last one repeats.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    rules: Mutex<Vec<Rule>>,
    statements: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a result set for statements containing `needle`.
    pub fn on(self, needle: &str, result: QueryResult) -> Self {
        self.push(needle, Duration::ZERO, Outcome::Rows(result))
    }

    /// Queues a result set that is returned after `delay`.
    pub fn on_delayed(self, needle: &str, delay: Duration, result: QueryResult) -> Self {
        self.push(needle, delay, Outcome::Rows(result))
    }

    /// Queues a failure for statements containing `needle`.
    pub fn fail_on(self, needle: &str, message: &str) -> Self {
        self.push(needle, Duration::ZERO, Outcome::Fail(message.to_string()))
    }

    /// Queues a failure that is returned after `delay`.
    pub fn fail_on_delayed(self, needle: &str, delay: Duration, message: &str) -> Self {
        self.push(needle, delay, Outcome::Fail(message.to_string()))
    }

    fn push(self, needle: &str, delay: Duration, outcome: Outcome) -> Self {
        let response = Response { delay, outcome };
        {
            let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
            let needle = needle.to_lowercase();
            match rules.iter_mut().find(|rule| rule.needle == needle) {
                Some(rule) => rule.responses.push_back(response),
                None => rules.push(Rule {
                    needle,
                    responses: VecDeque::from([response]),
                }),
            }
        }
        self
    }

    /// Returns every statement received, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Returns the statements containing `needle` (case-insensitive).
    pub fn statements_matching(&self, needle: &str) -> Vec<String> {
        let needle = needle.to_lowercase();
        self.statements()
            .into_iter()
            .filter(|sql| sql.to_lowercase().contains(&needle))
            .collect()
    }

    /// Returns the highest number of statements observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, sql: &str) -> Option<Response> {
        let lowered = sql.to_lowercase();
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        let rule = rules
            .iter_mut()
            .find(|rule| lowered.contains(&rule.needle))?;

        if rule.responses.len() > 1 {
            rule.responses.pop_front()
        } else {
            rule.responses.front().cloned()
        }
    }

    async fn run(&self, sql: &str) -> Option<Result<QueryResult>> {
        self.statements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sql.to_string());

        let response = self.next_response(sql)?;

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        Some(match response.outcome {
            Outcome::Rows(result) => Ok(result),
            Outcome::Fail(message) => Err(ConsoleError::query(message)),
        })
    }
}

/// Decrements the in-flight counter even when the future is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SqlExecutor for MockDatabaseClient {
    async fn execute(&self, sql: &str) -> Result<()> {
        match self.run(sql).await {
            Some(result) => result.map(|_| ()),
            None => Ok(()),
        }
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        if let Some(result) = self.run(sql).await {
            return result;
        }

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            Ok(QueryResult::with_data(
                vec![ColumnInfo::new("result", "VARCHAR")],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            )
            .with_execution_time(Duration::from_millis(1)))
        } else {
            Ok(QueryResult::new())
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_select() {
        let client = MockDatabaseClient::new();
        let result = client.query("SELECT 1").await.unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.columns.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_unscripted_execute_succeeds() {
        let client = MockDatabaseClient::new();
        client.execute("KILL TIDB 1").await.unwrap();
        assert_eq!(client.statements(), vec!["KILL TIDB 1".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_responses_in_order_last_repeats() {
        let client = MockDatabaseClient::new()
            .on("processlist", QueryResult::from_strings(&["ID"], vec![vec!["1"]]))
            .on("processlist", QueryResult::new());

        let first = client.query("SELECT * FROM cluster_processlist").await.unwrap();
        let second = client.query("select * from CLUSTER_PROCESSLIST").await.unwrap();
        let third = client.query("SELECT * FROM cluster_processlist").await.unwrap();

        assert_eq!(first.row_count(), 1);
        assert!(second.is_empty());
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let client = MockDatabaseClient::new().fail_on("kill tidb 7", "Unknown thread id: 7");
        let err = client.execute("KILL TIDB 7").await.unwrap_err();
        assert!(matches!(err, ConsoleError::Query(_)));
        assert!(err.to_string().contains("Unknown thread id"));
    }
}

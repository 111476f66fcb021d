//! Kill command tests driven through the console.

use std::sync::Arc;

use clusterdba::commands::CommandOutput;
use clusterdba::db::{MockDatabaseClient, QueryResult};
use clusterdba::kill::query::GLOBAL_KILL_CHECK;

use super::console_with;

fn global_kill(value: &str) -> QueryResult {
    QueryResult::from_strings(
        &["Type", "Instance", "Name", "Value"],
        vec![vec!["tidb", "10.0.0.1:4000", "enable-global-kill", value]],
    )
}

fn sessions(ids: &[&str]) -> QueryResult {
    QueryResult::from_strings(
        &["INSTANCE", "ID"],
        ids.iter().map(|id| vec!["10.0.0.1:4000", *id]).collect(),
    )
}

#[test]
fn test_kill_requires_cluster() {
    let mock = Arc::new(MockDatabaseClient::new());
    let mut console = console_with(mock.clone(), &[]);

    let outputs = console.handle_line("kill user --username app").unwrap();
    let CommandOutput::Error(message) = &outputs[0] else {
        panic!("expected error, got {:?}", outputs[0]);
    };
    assert!(message.contains("required flag(s) -c"));
    assert!(mock.statements().is_empty());
}

#[test]
fn test_kill_user_until_deadline() {
    let mock = Arc::new(
        MockDatabaseClient::new()
            .on(GLOBAL_KILL_CHECK, global_kill("true"))
            .on("cluster_processlist", sessions(&["11", "12"]))
            .on("cluster_processlist", sessions(&[])),
    );
    let mut console = console_with(mock.clone(), &[]);

    let outputs = console
        .handle_line("kill user --username app -c prod --duration 1 --interval 100")
        .unwrap();
    let CommandOutput::Success(message) = &outputs[0] else {
        panic!("expected success, got {:?}", outputs[0]);
    };
    assert!(message.contains("Kill on cluster [prod] stopped (deadline exceeded)"));
    assert!(message.contains("2 session(s) killed"));

    let mut kills = mock.statements_matching("KILL TIDB");
    kills.sort();
    assert_eq!(kills, vec!["KILL TIDB 11", "KILL TIDB 12"]);
    assert!(mock.statements_matching("cluster_processlist")[0].contains("t.USER IN ('app')"));
}

#[test]
fn test_kill_uses_logged_in_cluster() {
    let mock = Arc::new(
        MockDatabaseClient::new()
            .on(GLOBAL_KILL_CHECK, global_kill("true"))
            .on("cluster_processlist", sessions(&[])),
    );
    let mut console = console_with(mock.clone(), &[]);
    console.login("prod").unwrap();

    let outputs = console
        .handle_line("kill digest --sql-digest abc,def --duration 1 --interval 200")
        .unwrap();
    assert!(matches!(&outputs[0], CommandOutput::Success(m) if m.contains("[prod]")));
    assert!(mock.statements_matching("cluster_processlist")[0]
        .ends_with("WHERE t.DIGEST IN ('abc', 'def')"));
}

#[test]
fn test_kill_refused_without_global_kill() {
    let mock = Arc::new(MockDatabaseClient::new().on(GLOBAL_KILL_CHECK, global_kill("false")));
    let mut console = console_with(mock.clone(), &[]);

    let outputs = console
        .handle_line("kill user --username app -c prod --duration 1")
        .unwrap();
    let CommandOutput::Error(message) = &outputs[0] else {
        panic!("expected error, got {:?}", outputs[0]);
    };
    assert!(message.contains("enable-global-kill = true"));
    assert!(mock.statements_matching("cluster_processlist").is_empty());
    assert_eq!(
        console.reader().history(),
        ["kill user --username app -c prod --duration 1".to_string()]
    );
}

#[test]
fn test_kill_failure_aborts_run() {
    let mock = Arc::new(
        MockDatabaseClient::new()
            .on(GLOBAL_KILL_CHECK, global_kill("true"))
            .on("cluster_processlist", sessions(&["21"]))
            .fail_on("KILL TIDB 21", "ERROR 1094 (HY000): Unknown thread id: 21"),
    );
    let mut console = console_with(mock.clone(), &[]);

    let outputs = console
        .handle_line("kill user --username app -c prod")
        .unwrap();
    let CommandOutput::Error(message) = &outputs[0] else {
        panic!("expected error, got {:?}", outputs[0]);
    };
    assert!(message.contains("round 0 aborted"));
    assert_eq!(mock.statements_matching("cluster_processlist").len(), 1);
}

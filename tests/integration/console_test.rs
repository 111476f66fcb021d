//! Console loop tests.
//!
//! Drive the console line by line against the mock executor and check what
//! reaches the cluster, what is shown and what lands in history.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use clusterdba::commands::{CommandOutput, ResultLayout};
use clusterdba::console::dispatch::NO_QUERY;
use clusterdba::db::{MockDatabaseClient, QueryResult};

use super::console_with;

fn error_text(output: &CommandOutput) -> &str {
    match output {
        CommandOutput::Error(message) => message,
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn test_sql_without_cluster_is_refused() {
    let mock = Arc::new(MockDatabaseClient::new());
    let mut console = console_with(mock.clone(), &[]);

    let outputs = console.handle_line("show status;").unwrap();
    assert_eq!(outputs.len(), 1);
    assert!(error_text(&outputs[0]).contains("the cluster_name cannot be empty"));
    assert!(mock.statements().is_empty());

    // The buffer was cleared: the next line starts a fresh statement.
    assert_eq!(
        console.handle_line("logout").unwrap(),
        vec![CommandOutput::info("Not logged in to any cluster")]
    );
}

#[test]
fn test_login_use_and_select() {
    let mock = Arc::new(MockDatabaseClient::new().on(
        "from orders",
        QueryResult::from_strings(&["id", "total"], vec![vec!["1", "9.50"], vec!["2", "3.25"]]),
    ));
    let mut console = console_with(mock.clone(), &[]);

    console.handle_line("login -c prod").unwrap();
    assert_eq!(console.session().cluster(), "prod");

    let outputs = console.handle_line("use shop;").unwrap();
    assert_eq!(outputs, vec![CommandOutput::success("Database changed")]);
    assert_eq!(console.session().schema(), "shop");

    let outputs = console.handle_line("select id, total from orders;").unwrap();
    let CommandOutput::ResultSet { result, layout } = &outputs[0] else {
        panic!("expected result set");
    };
    assert_eq!(*layout, ResultLayout::Table);
    assert_eq!(result.row_count(), 2);

    assert_eq!(
        mock.statements(),
        vec![
            "USE `shop`".to_string(),
            "select id, total from orders".to_string()
        ]
    );
    assert_eq!(
        console.reader().history(),
        [
            "login -c prod".to_string(),
            "use shop;".to_string(),
            "select id, total from orders;".to_string()
        ]
    );
}

#[test]
fn test_disallowed_statement_never_reaches_cluster() {
    let mock = Arc::new(MockDatabaseClient::new());
    let mut console = console_with(mock.clone(), &[]);
    console.login("prod").unwrap();

    // Idle lines starting with a non-allowed verb are commands.
    let outputs = console.handle_line("delete from orders;").unwrap();
    assert!(error_text(&outputs[0]).contains("Execute command error"));

    // Inside a buffered statement they reach the allow-list.
    console.handle_line("select 1;").unwrap();
    console.handle_line("select").unwrap();
    let outputs = console.handle_line("1; update orders set total = 0;").unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(matches!(outputs[0], CommandOutput::ResultSet { .. }));
    assert!(error_text(&outputs[1])
        .contains("only [SELECT/SHOW/USE/EXPLAIN] sql commands are allowed"));

    assert!(mock.statements_matching("delete").is_empty());
    assert!(mock.statements_matching("update").is_empty());
}

#[test]
fn test_empty_statements_report_no_query() {
    let mock = Arc::new(MockDatabaseClient::new());
    let mut console = console_with(mock.clone(), &[]);
    console.login("prod").unwrap();

    let outputs = console.handle_line("select 1;;").unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[1], CommandOutput::error(NO_QUERY));
    assert_eq!(mock.statements(), vec!["select 1".to_string()]);
}

#[test]
fn test_multi_line_vertical_statement_with_comments() {
    let mock = Arc::new(MockDatabaseClient::new().on(
        "processlist",
        QueryResult::from_strings(&["Id", "User"], vec![vec!["7", "app"]]),
    ));
    let mut console = console_with(mock.clone(), &[]);
    console.login("prod").unwrap();

    assert!(console.handle_line("show /* who is").unwrap().is_empty());
    assert!(console.handle_line("   connected; */").unwrap().is_empty());
    assert!(console.handle_line("processlist -- all of them;").unwrap().is_empty());
    let outputs = console.handle_line("\\G").unwrap();

    assert_eq!(outputs.len(), 1);
    assert!(matches!(
        outputs[0],
        CommandOutput::ResultSet {
            layout: ResultLayout::Vertical,
            ..
        }
    ));
    assert_eq!(mock.statements().len(), 1);
    assert_eq!(
        console.reader().history().last().map(String::as_str),
        Some("show /* who is connected; */ processlist -- all of them; \\G")
    );
}

#[test]
fn test_execution_failure_discards_rest_of_buffer() {
    let mock = Arc::new(MockDatabaseClient::new().fail_on(
        "missing",
        "ERROR 1146 (42S02): Table 'shop.missing' doesn't exist",
    ));
    let mut console = console_with(mock.clone(), &[]);
    console.login("prod").unwrap();

    let outputs = console
        .handle_line("select * from missing; select 2;")
        .unwrap();
    assert_eq!(outputs.len(), 1);
    assert!(error_text(&outputs[0]).contains("Execute query failed"));
    assert_eq!(mock.statements().len(), 1);

    // Nothing is left buffered.
    let outputs = console.handle_line("select 3;").unwrap();
    assert!(matches!(outputs[0], CommandOutput::ResultSet { .. }));
}

#[test]
fn test_cluster_list_and_logout() {
    let mock = Arc::new(MockDatabaseClient::new());
    let mut console = console_with(mock, &[]);

    let outputs = console.handle_line("cluster list").unwrap();
    assert!(matches!(&outputs[0], CommandOutput::Table { rows, .. } if rows[0][0] == "prod"));

    console.handle_line("login -c prod").unwrap();
    console.handle_line("logout").unwrap();
    assert_eq!(console.session().cluster(), "");
}

#[test]
fn test_help_and_exit() {
    let mock = Arc::new(MockDatabaseClient::new());
    let mut console = console_with(mock, &[]);

    let outputs = console.handle_line("help").unwrap();
    assert!(matches!(&outputs[0], CommandOutput::Info(text) if text.contains("kill")));

    let outputs = console.handle_line("kill --help").unwrap();
    assert!(matches!(&outputs[0], CommandOutput::Info(text) if text.contains("digest")));

    let outputs = console.handle_line("help kill").unwrap();
    assert!(matches!(&outputs[0], CommandOutput::Info(text)
        if text.contains("digest") && !text.contains("login")));

    let outputs = console.handle_line("help kill user;").unwrap();
    assert!(matches!(&outputs[0], CommandOutput::Info(text) if text.contains("--username")));

    let outputs = console.handle_line("help nosuch").unwrap();
    assert!(outputs[0].is_error());

    assert_eq!(console.handle_line("quit").unwrap(), vec![CommandOutput::exit()]);
}

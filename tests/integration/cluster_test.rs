//! Live cluster tests.
//!
//! Skipped unless CLUSTERDBA_TEST_DSN points at a MySQL-protocol cluster,
//! e.g. `mysql://root@127.0.0.1:4000/test`.

use clusterdba::config::ClusterConfig;
use clusterdba::db::{MySqlClient, SqlExecutor};

fn get_test_dsn() -> Option<String> {
    std::env::var("CLUSTERDBA_TEST_DSN").ok()
}

async fn get_test_client() -> Option<MySqlClient> {
    let dsn = get_test_dsn()?;
    let config = ClusterConfig::from_connection_string(&dsn).ok()?;
    MySqlClient::connect(&config).await.ok()
}

#[tokio::test]
async fn test_select_round_trip() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: CLUSTERDBA_TEST_DSN not set");
        return;
    };

    let result = client.query("SELECT 1 AS one, 'a' AS letter").await.unwrap();
    assert_eq!(result.column_names(), vec!["one", "letter"]);
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.value(0, "letter").unwrap().to_display_string(), "a");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_use_schema_applies_to_later_queries() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: CLUSTERDBA_TEST_DSN not set");
        return;
    };

    client.use_schema("information_schema").await.unwrap();
    let result = client.query("SELECT DATABASE() AS db").await.unwrap();
    assert_eq!(
        result.value(0, "db").unwrap().to_display_string(),
        "information_schema"
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_query_error_is_reported() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: CLUSTERDBA_TEST_DSN not set");
        return;
    };

    let err = client
        .query("SELECT * FROM clusterdba_no_such_table")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("clusterdba_no_such_table"));

    client.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_host() {
    let config = ClusterConfig {
        host: Some("invalid.host.that.does.not.exist.local".to_string()),
        port: 4000,
        user: Some("root".to_string()),
        ..ClusterConfig::default()
    };

    let result = MySqlClient::connect(&config).await;
    assert!(result.is_err());
}

use activity_test_support::ActivityHarness;
use regex::Regex;
use sea_orm::ConnectionTrait;
use serial_test::serial;
use sql_activity::{LogScope, RecorderSettings};

use crate::common::{harness_with, stmt};

#[tokio::test]
async fn ignored_sql_is_left_out_of_counts() -> Result<(), Box<dyn std::error::Error>> {
    let settings = RecorderSettings {
        ignored_sql: vec![Regex::new(r"sqlite_master")?],
        ..RecorderSettings::default()
    };
    let h = harness_with(settings).await?;

    h.assert_queries(1, || async {
        h.conn()
            .query_all(stmt("SELECT name FROM sqlite_master"))
            .await?;
        h.conn().query_all(stmt("SELECT 1")).await
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn custom_event_name_still_reaches_the_recorder() -> Result<(), Box<dyn std::error::Error>> {
    let settings = RecorderSettings {
        event_name: "sql.custom".to_string(),
        ..RecorderSettings::default()
    };
    let h = harness_with(settings).await?;

    h.conn().query_all(stmt("SELECT 1")).await?;

    assert_eq!(h.conn().event_name(), "sql.custom");
    assert_eq!(h.statements(LogScope::Filtered), vec!["SELECT 1"]);
    Ok(())
}

#[tokio::test]
#[serial]
async fn sqlite_memory_reads_settings_from_env() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("SQL_ACTIVITY_TRANSACTIONAL_TESTS", "false");
    let result = ActivityHarness::sqlite_memory().await;
    std::env::remove_var("SQL_ACTIVITY_TRANSACTIONAL_TESTS");
    let h = result?;

    assert!(!h.settings().transactional_tests);
    assert!(!h.conn().in_transaction().await);
    Ok(())
}

#[tokio::test]
#[serial]
async fn invalid_env_setting_fails_construction() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("SQL_ACTIVITY_IGNORED_SQL", "(");
    let result = ActivityHarness::sqlite_memory().await;
    std::env::remove_var("SQL_ACTIVITY_IGNORED_SQL");

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
#[serial]
async fn from_env_builds_database_and_settings() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("SQL_ACTIVITY_DB_KIND", "sqlite-memory");
    std::env::set_var("SQL_ACTIVITY_EVENT", "sql.from_env");
    let result = ActivityHarness::from_env().await;
    std::env::remove_var("SQL_ACTIVITY_DB_KIND");
    std::env::remove_var("SQL_ACTIVITY_EVENT");
    let h = result?;

    assert!(h.runs_on(sea_orm::DbBackend::Sqlite));
    assert_eq!(h.conn().event_name(), "sql.from_env");
    h.assert_queries(1, || async { h.conn().query_all(stmt("SELECT 1")).await })
        .await?;
    Ok(())
}

#[tokio::test]
#[serial]
async fn from_env_rejects_unknown_database_kind() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("SQL_ACTIVITY_DB_KIND", "oracle");
    let result = ActivityHarness::from_env().await;
    std::env::remove_var("SQL_ACTIVITY_DB_KIND");

    assert!(result.is_err());
    Ok(())
}

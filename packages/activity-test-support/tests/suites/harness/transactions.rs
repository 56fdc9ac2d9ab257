use activity_test_support::unique_helpers::unique_table;
use sea_orm::ConnectionTrait;
use sql_activity::{LogScope, Matcher, RecorderSettings};

use crate::common::{harness, harness_with, seed, stmt};

#[tokio::test]
async fn harness_opens_a_lazy_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;

    assert!(h.conn().in_transaction().await);
    assert!(h.conn().has_pending_transaction().await);
    assert!(h.statements(LogScope::All).is_empty());

    assert_eq!(h.teardown().await?, 1);
    Ok(())
}

#[tokio::test]
async fn lazy_begin_stays_out_of_the_window() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;

    let (_, statements) = h
        .capture_all(|| async { h.conn().query_all(stmt("SELECT 1")).await })
        .await?;

    let texts: Vec<&str> = statements.iter().map(|e| e.sql()).collect();
    assert_eq!(texts, vec!["SELECT 1"]);
    Ok(())
}

#[tokio::test]
async fn nested_transactions_show_up_as_savepoints() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let table = unique_table("posts");
    seed(&h, &table).await?;

    h.assert_query_patterns(
        &[
            Matcher::exact("SAVEPOINT _sqlx_savepoint_1"),
            Matcher::exact("RELEASE SAVEPOINT _sqlx_savepoint_1"),
        ],
        || async {
            h.conn().begin().await?;
            h.conn()
                .execute_unprepared(&format!("INSERT INTO {table} (title) VALUES ('third')"))
                .await?;
            h.conn().commit().await
        },
    )
    .await?;

    Ok(())
}

#[tokio::test]
async fn teardown_rolls_back_every_level() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let table = unique_table("posts");
    seed(&h, &table).await?;
    h.conn().begin().await?;

    assert_eq!(h.conn().transaction_depth().await, 2);
    assert_eq!(h.teardown().await?, 2);
    Ok(())
}

#[tokio::test]
async fn writes_are_discarded_by_teardown_rollback() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let table = unique_table("posts");
    h.conn()
        .execute_unprepared(&format!("CREATE TABLE {table} (id INTEGER)"))
        .await?;
    h.conn().rollback().await?;

    // The CREATE ran inside the harness transaction, so it is gone
    let err = h
        .conn()
        .query_all(stmt(format!("SELECT id FROM {table}")))
        .await;
    assert!(err.is_err());
    Ok(())
}

#[tokio::test]
async fn non_transactional_harness_runs_in_autocommit() -> Result<(), Box<dyn std::error::Error>> {
    let settings = RecorderSettings {
        transactional_tests: false,
        ..RecorderSettings::default()
    };
    let h = harness_with(settings).await?;

    assert!(!h.conn().in_transaction().await);
    h.assert_queries(1, || async { h.conn().query_all(stmt("SELECT 1")).await })
        .await?;
    assert_eq!(h.teardown().await?, 0);
    Ok(())
}

use activity_test_support::unique_helpers::unique_table;
use sea_orm::ConnectionTrait;
use sql_activity::{ActivityError, CountOptions, Matcher, QueryCount};

use crate::common::{harness, seed, stmt};

#[tokio::test]
async fn counts_a_single_select() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let table = unique_table("posts");
    seed(&h, &table).await?;

    let rows = h
        .assert_queries(1, || async {
            h.conn()
                .query_all(stmt(format!("SELECT title FROM {table}")))
                .await
        })
        .await?;

    assert_eq!(rows.len(), 2);
    h.teardown().await?;
    Ok(())
}

#[tokio::test]
async fn reports_count_mismatch_with_statements() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;

    let err = h
        .assert_queries(2, || async { h.conn().query_all(stmt("SELECT 1")).await })
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "1 instead of 2 queries were executed.\nQueries:\nSELECT 1"
    );
    Ok(())
}

#[tokio::test]
async fn any_count_fails_on_silence() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;

    let err = h
        .assert_query_count(QueryCount::Any, CountOptions::default(), || async {
            Ok::<_, sea_orm::DbErr>(())
        })
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .starts_with("1 or more queries expected, but none were executed."));
    Ok(())
}

#[tokio::test]
async fn unfiltered_count_includes_schema_statements() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let table = unique_table("tags");

    h.assert_query_count(2, CountOptions::unfiltered(), || async {
        h.conn()
            .execute_unprepared(&format!("CREATE TABLE {table} (id INTEGER)"))
            .await?;
        h.conn()
            .execute_unprepared(&format!("INSERT INTO {table} (id) VALUES (1)"))
            .await
    })
    .await?;

    Ok(())
}

#[tokio::test]
async fn schema_changes_violate_no_queries() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let table = unique_table("audit");

    let err = h
        .assert_no_queries(|| async {
            h.conn()
                .execute_unprepared(&format!("CREATE TABLE {table} (id INTEGER)"))
                .await
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ActivityError::CountMismatch { actual: 1, .. }));
    Ok(())
}

#[tokio::test]
async fn patterns_match_against_real_statements() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let table = unique_table("posts");
    seed(&h, &table).await?;

    h.assert_query_patterns(
        &[Matcher::regex(&format!(r"UPDATE {table} SET title"))?],
        || async {
            h.conn()
                .execute_unprepared(&format!("UPDATE {table} SET title = 'x' WHERE id = 1"))
                .await
        },
    )
    .await?;

    let err = h
        .assert_query_patterns(&[Matcher::regex("DELETE")?], || async {
            h.conn().query_all(stmt("SELECT 1")).await
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ActivityError::PatternNotFound { ref unmatched, .. } if unmatched == &vec!["/DELETE/".to_string()]
    ));
    Ok(())
}

#[tokio::test]
async fn capture_returns_business_statements() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let table = unique_table("posts");
    seed(&h, &table).await?;

    let (result, statements) = h
        .capture(|| async {
            h.conn()
                .execute_unprepared(&format!("DELETE FROM {table} WHERE id = 2"))
                .await
        })
        .await?;
    result?;

    let texts: Vec<&str> = statements.iter().map(|e| e.sql()).collect();
    assert_eq!(texts, vec![format!("DELETE FROM {table} WHERE id = 2").as_str()]);
    Ok(())
}

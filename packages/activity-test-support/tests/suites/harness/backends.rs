use sea_orm::DbBackend;

use crate::common::harness;

#[tokio::test]
async fn runs_on_reports_the_connected_backend() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;

    assert_eq!(h.backend(), DbBackend::Sqlite);
    assert!(h.runs_on(DbBackend::Sqlite));
    assert!(!h.runs_on(DbBackend::Postgres));
    Ok(())
}

#[tokio::test]
async fn skip_unless_backend_gates_test_bodies() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;

    assert!(h.skip_unless_backend(&[DbBackend::Sqlite, DbBackend::Postgres]));
    assert!(!h.skip_unless_backend(&[DbBackend::MySql]));
    Ok(())
}

#[tokio::test]
async fn capabilities_follow_the_backend() -> Result<(), Box<dyn std::error::Error>> {
    let h = harness().await?;
    let caps = h.conn().capabilities();

    assert!(caps.savepoints);
    assert!(!caps.optimizer_hints);
    Ok(())
}

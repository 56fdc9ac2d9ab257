#![allow(dead_code)]

use activity_test_support::ActivityHarness;
use db_infra::DbConfig;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use sql_activity::RecorderSettings;

#[ctor::ctor]
fn init_logging() {
    activity_test_support::logging::init();
}

/// In-memory harness with default settings, independent of the environment.
pub async fn harness() -> Result<ActivityHarness, Box<dyn std::error::Error>> {
    harness_with(RecorderSettings::default()).await
}

pub async fn harness_with(
    settings: RecorderSettings,
) -> Result<ActivityHarness, Box<dyn std::error::Error>> {
    Ok(ActivityHarness::connect(&DbConfig::sqlite_memory(), settings, None).await?)
}

/// Create `table` with a couple of rows, outside any capture window.
pub async fn seed(h: &ActivityHarness, table: &str) -> Result<(), sea_orm::DbErr> {
    h.conn()
        .execute_unprepared(&format!(
            "CREATE TABLE {table} (id INTEGER PRIMARY KEY, title TEXT NOT NULL)"
        ))
        .await?;
    h.conn()
        .execute_unprepared(&format!(
            "INSERT INTO {table} (title) VALUES ('first'), ('second')"
        ))
        .await?;
    Ok(())
}

pub fn stmt(sql: impl Into<String>) -> Statement {
    Statement::from_string(DbBackend::Sqlite, sql.into())
}

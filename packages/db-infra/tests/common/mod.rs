#![allow(dead_code)]

use std::sync::Arc;

use db_infra::{AdapterCapabilities, DbConfig, InstrumentedConnection};
use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use sql_activity::{InstrumentationBus, LogScope, Recorder, Subscription, SQL_EVENT};
use tracing_subscriber::{fmt, EnvFilter};

static LOGGING: OnceCell<()> = OnceCell::new();

#[ctor::ctor]
fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

pub struct Instrumented {
    pub conn: InstrumentedConnection,
    pub recorder: Arc<Recorder>,
    _subscription: Subscription,
}

impl Instrumented {
    pub fn all(&self) -> Vec<String> {
        self.recorder.statements(LogScope::All)
    }

    pub fn filtered(&self) -> Vec<String> {
        self.recorder.statements(LogScope::Filtered)
    }
}

/// In-memory SQLite behind an instrumented connection, with a recorder
/// subscribed and cleared of the session setup statements.
pub async fn sqlite(
    capabilities: Option<AdapterCapabilities>,
) -> Result<Instrumented, Box<dyn std::error::Error>> {
    let bus = InstrumentationBus::new();
    let recorder = Arc::new(Recorder::new());
    let subscription = bus.subscribe(SQL_EVENT, recorder.clone());

    let conn = InstrumentedConnection::connect(&DbConfig::sqlite_memory(), bus, SQL_EVENT, capabilities)
            .await?;
    recorder.clear();

    Ok(Instrumented {
        conn,
        recorder,
        _subscription: subscription,
    })
}

pub async fn create_widgets(conn: &InstrumentedConnection) -> Result<(), sea_orm::DbErr> {
    conn.execute_unprepared(
        "CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT NOT NULL, qty INTEGER NOT NULL)",
    )
    .await?;
    Ok(())
}

pub fn stmt(sql: &str) -> Statement {
    Statement::from_string(DbBackend::Sqlite, sql)
}

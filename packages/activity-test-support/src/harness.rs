//! Per-test wiring of a recorder to an instrumented connection.

use std::future::Future;
use std::sync::Arc;

use db_infra::infra::db::statement_counters;
use db_infra::{AdapterCapabilities, DbConfig, DbInfraError, InstrumentedConnection};
use sea_orm::{ConnectionTrait, DbBackend, DbErr};
use sql_activity::{
    assert_no_queries, assert_queries, assert_query_count, assert_query_patterns,
    capture_activity, capture_all_activity, ActivityError, BoxError, CountOptions,
    InstrumentationBus, LogScope, Matcher, QueryCount, Recorder, RecorderSettings,
    StatementEvent, Subscription,
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Infra(#[from] DbInfraError),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// A recorder subscribed to one instrumented connection.
///
/// With `transactional_tests` enabled the harness opens a lazy transaction on
/// construction, so everything the test writes is rolled back by
/// [`teardown`](Self::teardown). Dropping the harness always clears the
/// recorder.
pub struct ActivityHarness {
    conn: InstrumentedConnection,
    recorder: Arc<Recorder>,
    settings: RecorderSettings,
    _subscription: Subscription,
}

impl ActivityHarness {
    /// In-memory SQLite with settings from the environment.
    pub async fn sqlite_memory() -> Result<Self, HarnessError> {
        Self::connect(&DbConfig::sqlite_memory(), RecorderSettings::from_env()?, None).await
    }

    /// Database and settings both taken from the environment.
    pub async fn from_env() -> Result<Self, HarnessError> {
        Self::connect(&DbConfig::from_env()?, RecorderSettings::from_env()?, None).await
    }

    pub async fn connect(
        config: &DbConfig,
        settings: RecorderSettings,
        capabilities: Option<AdapterCapabilities>,
    ) -> Result<Self, HarnessError> {
        let bus = InstrumentationBus::new();
        let recorder = Arc::new(Recorder::with_settings(&settings));
        let subscription = bus.subscribe(&settings.event_name, recorder.clone());

        let conn =
            InstrumentedConnection::connect(config, bus, settings.event_name.as_str(), capabilities)
                .await?;

        if settings.transactional_tests {
            conn.begin().await?;
        }
        recorder.clear();

        debug!(
            kind = %config.kind,
            event = %settings.event_name,
            transactional = settings.transactional_tests,
            "activity harness ready"
        );

        Ok(Self {
            conn,
            recorder,
            settings,
            _subscription: subscription,
        })
    }

    pub fn conn(&self) -> &InstrumentedConnection {
        &self.conn
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    pub fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }

    pub fn runs_on(&self, backend: DbBackend) -> bool {
        self.backend() == backend
    }

    /// Whether a test limited to `backends` should run here.
    ///
    /// Logs the skip when it should not.
    pub fn skip_unless_backend(&self, backends: &[DbBackend]) -> bool {
        let runs = backends.contains(&self.backend());
        if !runs {
            info!(
                backend = ?self.backend(),
                wanted = ?backends,
                "skipping test for unsupported backend"
            );
        }
        runs
    }

    /// Statements recorded so far, outside any capture window.
    pub fn statements(&self, scope: LogScope) -> Vec<String> {
        self.recorder.statements(scope)
    }

    pub async fn capture<F, Fut, T>(
        &self,
        work: F,
    ) -> Result<(T, Vec<StatementEvent>), ActivityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        capture_activity(&self.recorder, &self.conn, work).await
    }

    pub async fn capture_all<F, Fut, T>(
        &self,
        work: F,
    ) -> Result<(T, Vec<StatementEvent>), ActivityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        capture_all_activity(&self.recorder, &self.conn, work).await
    }

    pub async fn assert_queries<F, Fut, T, E>(
        &self,
        expected: usize,
        work: F,
    ) -> Result<T, ActivityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        assert_queries(&self.recorder, &self.conn, expected, work).await
    }

    pub async fn assert_query_count<F, Fut, T, E>(
        &self,
        expected: impl Into<QueryCount>,
        options: CountOptions,
        work: F,
    ) -> Result<T, ActivityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        assert_query_count(&self.recorder, &self.conn, expected, options, work).await
    }

    pub async fn assert_no_queries<F, Fut, T, E>(&self, work: F) -> Result<T, ActivityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        assert_no_queries(&self.recorder, &self.conn, work).await
    }

    pub async fn assert_query_patterns<F, Fut, T, E>(
        &self,
        patterns: &[Matcher],
        work: F,
    ) -> Result<T, ActivityError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        assert_query_patterns(&self.recorder, &self.conn, patterns, work).await
    }

    /// Roll back every open transaction level and clear the recorder.
    ///
    /// Returns the number of levels rolled back.
    pub async fn teardown(self) -> Result<usize, HarnessError> {
        let mut rolled_back = 0;
        while self.conn.in_transaction().await {
            self.conn.rollback().await?;
            rolled_back += 1;
        }
        self.recorder.clear();
        statement_counters::log_snapshot("activity harness teardown");
        debug!(rolled_back, "activity harness torn down");
        Ok(rolled_back)
    }
}

impl Drop for ActivityHarness {
    fn drop(&mut self) {
        self.recorder.clear();
    }
}

//! sea-orm connection wrapper that reports every executed statement.
//!
//! [`InstrumentedConnection`] implements [`ConnectionTrait`], so entities,
//! raw statements and helper code run through it unchanged. After each
//! statement runs (successfully or not) it publishes one
//! [`StatementEvent`] on the instrumentation bus before handing the result
//! back.
//!
//! Transactions are lazy: [`begin`](InstrumentedConnection::begin) only marks a
//! transaction as pending, and the real `BEGIN` is issued by the first
//! statement that needs it or by
//! [`materialize_transactions`](InstrumentedConnection::materialize_transactions).
//! A lazy transaction that is committed or rolled back before anything ran
//! never reaches the database at all.

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, ExecResult,
    FromQueryResult, JsonValue, QueryResult, Statement, TransactionTrait,
};
use sql_activity::{
    ActivityError, Category, InstrumentationBus, MaterializeTransactions, StatementEvent, SQL_EVENT,
};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::db::DbConfig;
use crate::error::DbInfraError;
use crate::infra::db::capabilities::{AdapterCapabilities, Capability};
use crate::infra::db::classify::classify;
use crate::infra::db::core::{connect, session_statements};
use crate::infra::db::diagnostics::{redact_sql_preview, statement_counters};
use crate::infra::db::query_cache::QueryCache;

#[derive(Default)]
struct TxnState {
    /// Top-level transaction requested but not yet sent to the database
    pending: bool,
    /// Open transaction followed by one entry per savepoint
    stack: Vec<DatabaseTransaction>,
}

impl TxnState {
    fn depth(&self) -> usize {
        self.stack.len() + usize::from(self.pending)
    }
}

/// Name sqlx gives the savepoint opened at `level` (1 for the first nesting).
fn savepoint_name(level: usize) -> String {
    format!("_sqlx_savepoint_{level}")
}

pub struct InstrumentedConnection {
    inner: DatabaseConnection,
    bus: InstrumentationBus,
    event_name: String,
    capabilities: AdapterCapabilities,
    txn: Mutex<TxnState>,
    cache: QueryCache,
}

impl InstrumentedConnection {
    pub fn new(
        inner: DatabaseConnection,
        bus: InstrumentationBus,
        capabilities: AdapterCapabilities,
    ) -> Self {
        Self {
            inner,
            bus,
            event_name: SQL_EVENT.to_string(),
            capabilities,
            txn: Mutex::new(TxnState::default()),
            cache: QueryCache::default(),
        }
    }

    /// Publish under a different event name than [`SQL_EVENT`].
    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = name.into();
        self
    }

    /// Connect per `config` and run the session statements for the backend,
    /// publishing everything under `event_name`.
    ///
    /// `capabilities` defaults to what the backend supports.
    pub async fn connect(
        config: &DbConfig,
        bus: InstrumentationBus,
        event_name: impl Into<String>,
        capabilities: Option<AdapterCapabilities>,
    ) -> Result<Self, DbInfraError> {
        let inner = connect(config).await?;
        let backend = inner.get_database_backend();
        let capabilities = capabilities.unwrap_or_else(|| AdapterCapabilities::for_backend(backend));
        let conn = Self::new(inner, bus, capabilities).with_event_name(event_name);

        for sql in session_statements(backend, &conn.capabilities) {
            conn.execute_unprepared_tagged(&sql, Category::Schema).await?;
        }

        debug!(
            backend = ?backend,
            event = %conn.event_name,
            capabilities = ?conn.capabilities.enabled(),
            "instrumented connection ready"
        );
        Ok(conn)
    }

    pub fn inner(&self) -> &DatabaseConnection {
        &self.inner
    }

    pub fn bus(&self) -> &InstrumentationBus {
        &self.bus
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    fn publish(&self, sql: &str, cached: bool, category: Category) {
        trace!(
            event = %self.event_name,
            category = %category,
            cached = cached,
            sql = %redact_sql_preview(sql),
            "statement"
        );
        statement_counters::statement_published();
        self.bus
            .publish(&self.event_name, &StatementEvent::new(sql, cached, category));
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    async fn materialize_locked(&self, state: &mut TxnState) -> Result<(), DbErr> {
        if !state.pending {
            return Ok(());
        }
        let begun = self.inner.begin().await;
        self.publish("BEGIN", false, Category::Transaction);
        state.stack.push(begun?);
        state.pending = false;
        debug!(depth = state.stack.len(), "transaction materialized");
        Ok(())
    }

    /// Open a transaction, or a savepoint inside the current one.
    ///
    /// Nesting fails when the connection was built without the
    /// [`Capability::Savepoints`] capability.
    pub async fn begin(&self) -> Result<(), DbErr> {
        let mut state = self.txn.lock().await;

        if state.depth() == 0 {
            state.pending = true;
            debug!("lazy transaction opened");
            return Ok(());
        }

        if !self.capabilities.supports(Capability::Savepoints) {
            return Err(DbErr::Custom(format!(
                "nested transaction requires {}, which this connection does not support",
                Capability::Savepoints
            )));
        }

        self.materialize_locked(&mut state).await?;
        let level = state.stack.len();
        let Some(parent) = state.stack.last() else {
            return Err(DbErr::Custom("no open transaction to nest in".to_string()));
        };
        let nested = parent.begin().await;
        self.publish(
            &format!("SAVEPOINT {}", savepoint_name(level)),
            false,
            Category::Transaction,
        );
        state.stack.push(nested?);
        statement_counters::savepoint_created();
        debug!(depth = state.stack.len(), "savepoint created");
        Ok(())
    }

    /// Commit the innermost transaction level.
    pub async fn commit(&self) -> Result<(), DbErr> {
        let mut state = self.txn.lock().await;

        if state.pending {
            state.pending = false;
            statement_counters::lazy_transaction_elided();
            debug!("lazy transaction closed before use; nothing to commit");
            return Ok(());
        }

        let Some(txn) = state.stack.pop() else {
            return Err(DbErr::Custom("commit without an open transaction".to_string()));
        };
        let level = state.stack.len();
        let result = txn.commit().await;
        let sql = if level == 0 {
            "COMMIT".to_string()
        } else {
            format!("RELEASE SAVEPOINT {}", savepoint_name(level))
        };
        self.publish(&sql, false, Category::Transaction);
        result
    }

    /// Roll back the innermost transaction level.
    pub async fn rollback(&self) -> Result<(), DbErr> {
        let mut state = self.txn.lock().await;

        if state.pending {
            state.pending = false;
            statement_counters::lazy_transaction_elided();
            debug!("lazy transaction closed before use; nothing to roll back");
            return Ok(());
        }

        let Some(txn) = state.stack.pop() else {
            return Err(DbErr::Custom("rollback without an open transaction".to_string()));
        };
        let level = state.stack.len();
        let result = txn.rollback().await;
        let sql = if level == 0 {
            "ROLLBACK".to_string()
        } else {
            format!("ROLLBACK TO SAVEPOINT {}", savepoint_name(level))
        };
        self.publish(&sql, false, Category::Transaction);
        // Writes inside the rolled-back level may have been cached
        self.cache.clear();
        result
    }

    /// Issue any pending `BEGIN` now.
    pub async fn materialize_transactions(&self) -> Result<(), DbErr> {
        let mut state = self.txn.lock().await;
        self.materialize_locked(&mut state).await
    }

    /// Number of open levels, counting a pending lazy transaction.
    pub async fn transaction_depth(&self) -> usize {
        self.txn.lock().await.depth()
    }

    pub async fn in_transaction(&self) -> bool {
        self.transaction_depth().await > 0
    }

    pub async fn has_pending_transaction(&self) -> bool {
        self.txn.lock().await.pending
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Execute `stmt`, publishing it under `category` instead of the
    /// keyword-derived one.
    pub async fn execute_tagged(
        &self,
        stmt: Statement,
        category: Category,
    ) -> Result<ExecResult, DbErr> {
        let sql = stmt.sql.clone();
        self.cache.clear();
        let result = {
            let mut state = self.txn.lock().await;
            self.materialize_locked(&mut state).await?;
            match state.stack.last() {
                Some(txn) => txn.execute(stmt).await,
                None => self.inner.execute(stmt).await,
            }
        };
        self.publish(&sql, false, category);
        result
    }

    pub async fn execute_unprepared_tagged(
        &self,
        sql: &str,
        category: Category,
    ) -> Result<ExecResult, DbErr> {
        self.cache.clear();
        let result = {
            let mut state = self.txn.lock().await;
            self.materialize_locked(&mut state).await?;
            match state.stack.last() {
                Some(txn) => txn.execute_unprepared(sql).await,
                None => self.inner.execute_unprepared(sql).await,
            }
        };
        self.publish(sql, false, category);
        result
    }

    pub async fn query_one_tagged(
        &self,
        stmt: Statement,
        category: Category,
    ) -> Result<Option<QueryResult>, DbErr> {
        let sql = stmt.sql.clone();
        let result = {
            let mut state = self.txn.lock().await;
            self.materialize_locked(&mut state).await?;
            match state.stack.last() {
                Some(txn) => txn.query_one(stmt).await,
                None => self.inner.query_one(stmt).await,
            }
        };
        self.publish(&sql, false, category);
        result
    }

    pub async fn query_all_tagged(
        &self,
        stmt: Statement,
        category: Category,
    ) -> Result<Vec<QueryResult>, DbErr> {
        let sql = stmt.sql.clone();
        let result = {
            let mut state = self.txn.lock().await;
            self.materialize_locked(&mut state).await?;
            match state.stack.last() {
                Some(txn) => txn.query_all(stmt).await,
                None => self.inner.query_all(stmt).await,
            }
        };
        self.publish(&sql, false, category);
        result
    }

    // ------------------------------------------------------------------
    // Query cache
    // ------------------------------------------------------------------

    pub fn enable_query_cache(&self) {
        self.cache.enable();
        debug!("query cache enabled");
    }

    pub fn disable_query_cache(&self) {
        self.cache.disable();
        debug!("query cache disabled");
    }

    pub fn query_cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Run a read and return its rows as JSON objects.
    ///
    /// With the query cache enabled, repeating the same statement and values
    /// serves the stored rows and publishes the statement as cached. Any
    /// write through this connection empties the cache.
    pub async fn select_json(&self, stmt: Statement) -> Result<Vec<JsonValue>, DbErr> {
        let key = QueryCache::key(&stmt);
        if let Some(rows) = self.cache.get(&key) {
            statement_counters::cache_hit();
            self.publish(&stmt.sql, true, classify(&stmt.sql));
            return Ok(rows);
        }

        let category = classify(&stmt.sql);
        let rows = self.query_all_tagged(stmt, category).await?;
        let json = rows
            .iter()
            .map(|row| JsonValue::from_query_result(row, ""))
            .collect::<Result<Vec<_>, _>>()?;
        self.cache.insert(key, json.clone());
        Ok(json)
    }
}

#[async_trait]
impl ConnectionTrait for InstrumentedConnection {
    fn get_database_backend(&self) -> DbBackend {
        self.inner.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, DbErr> {
        let category = classify(&stmt.sql);
        self.execute_tagged(stmt, category).await
    }

    async fn execute_unprepared(&self, sql: &str) -> Result<ExecResult, DbErr> {
        self.execute_unprepared_tagged(sql, classify(sql)).await
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, DbErr> {
        let category = classify(&stmt.sql);
        self.query_one_tagged(stmt, category).await
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        let category = classify(&stmt.sql);
        self.query_all_tagged(stmt, category).await
    }
}

#[async_trait]
impl MaterializeTransactions for InstrumentedConnection {
    async fn materialize_transactions(&self) -> Result<(), ActivityError> {
        InstrumentedConnection::materialize_transactions(self)
            .await
            .map_err(|e| ActivityError::materialize(e.to_string()))
    }
}

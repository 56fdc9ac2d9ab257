use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbBackend, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, warn};

use crate::config::db::{DbConfig, DbKind};
use crate::error::DbInfraError;
use crate::infra::db::capabilities::AdapterCapabilities;

fn get_db_engine(db_kind: DbKind) -> &'static str {
    match db_kind {
        DbKind::Postgres => "postgresql",
        DbKind::SqliteFile | DbKind::SqliteMemory => "sqlite",
    }
}

async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, DbInfraError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbInfraError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        "connection_retry=success attempts={} interval_ms={}",
                        attempt, interval_ms
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < max_attempts {
                    warn!(
                        "connection_retry=failed attempt={} max_attempts={} interval_ms={}",
                        attempt, max_attempts, interval_ms
                    );
                    tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        DbInfraError::connect("no error recorded after max attempts (this should not happen)")
    }))
}

/// Open a sea-orm connection for `config`.
///
/// In-memory SQLite is pinned to one connection that is never recycled, since
/// every new SQLite memory connection starts with an empty database.
pub async fn connect(config: &DbConfig) -> Result<DatabaseConnection, DbInfraError> {
    let acquire_timeout = Duration::from_millis(config.acquire_timeout_ms);

    let db = match config.kind {
        DbKind::SqliteFile | DbKind::SqliteMemory => {
            let connect_opts = SqliteConnectOptions::from_str(&config.url)
                .map_err(|e| DbInfraError::config(format!("invalid SQLite connection options: {e}")))?
                .create_if_missing(true);

            let pool_opts = SqlitePoolOptions::new().acquire_timeout(acquire_timeout);
            let pool_opts = if config.kind == DbKind::SqliteMemory {
                pool_opts
                    .min_connections(1)
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                pool_opts.max_connections(config.pool_max)
            };

            let pool = pool_opts
                .connect_with(connect_opts)
                .await
                .map_err(|e| DbInfraError::connect(format!("failed to create SQLite pool: {e}")))?;

            SqlxSqliteConnector::from_sqlx_sqlite_pool(pool)
        }
        DbKind::Postgres => {
            let mut opt = ConnectOptions::new(&config.url);
            opt.max_connections(config.pool_max)
                .acquire_timeout(acquire_timeout)
                .sqlx_logging(false);

            retry_connection(
                || {
                    let opt_clone = opt.clone();
                    async move {
                        Database::connect(opt_clone).await.map_err(|e| {
                            DbInfraError::connect(format!("failed to connect to Postgres: {e}"))
                        })
                    }
                },
                5,
                500,
            )
            .await?
        }
    };

    info!(
        engine = get_db_engine(config.kind),
        url = %sanitize_db_url(&config.url),
        pool_max = config.pool_max,
        "db connected"
    );

    Ok(db)
}

/// Session-level statements run once when an instrumented connection opens.
pub fn session_statements(backend: DbBackend, capabilities: &AdapterCapabilities) -> Vec<String> {
    match backend {
        DbBackend::Sqlite => {
            let fk = if capabilities.foreign_keys { "ON" } else { "OFF" };
            vec![format!("PRAGMA foreign_keys = {fk}")]
        }
        DbBackend::Postgres => vec!["SET timezone = 'UTC'".to_string()],
        DbBackend::MySql => {
            let checks = if capabilities.foreign_keys { 1 } else { 0 };
            vec![format!("SET FOREIGN_KEY_CHECKS = {checks}")]
        }
    }
}

/// Sanitize database URL by masking password in connection strings.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((auth_part, host_part)) = url.rsplit_once('@') else {
        return url.to_string();
    };
    let Some(scheme_end) = auth_part.find("://") else {
        return url.to_string();
    };
    match auth_part[scheme_end + 3..].find(':') {
        Some(colon) => {
            let user_end = scheme_end + 3 + colon;
            format!("{}:***@{}", &auth_part[..user_end], host_part)
        }
        None => url.to_string(),
    }
}

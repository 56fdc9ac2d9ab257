use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::DbInfraError;

pub const SQLITE_MEMORY_URL: &str = "sqlite::memory:";

/// Supported database kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    SqliteFile,
    SqliteMemory,
}

impl DbKind {
    pub fn is_sqlite(&self) -> bool {
        matches!(self, DbKind::SqliteFile | DbKind::SqliteMemory)
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DbKind::Postgres => "postgres",
            DbKind::SqliteFile => "sqlite-file",
            DbKind::SqliteMemory => "sqlite-memory",
        })
    }
}

impl FromStr for DbKind {
    type Err = DbInfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "postgres" | "postgresql" => Ok(DbKind::Postgres),
            "sqlite-file" | "sqlite" => Ok(DbKind::SqliteFile),
            "sqlite-memory" | "memory" => Ok(DbKind::SqliteMemory),
            other => Err(DbInfraError::config(format!(
                "unknown database kind '{other}' (expected postgres, sqlite-file or sqlite-memory)"
            ))),
        }
    }
}

/// Connection settings for the database under observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub kind: DbKind,
    pub url: String,
    pub pool_max: u32,
    pub acquire_timeout_ms: u64,
}

impl DbConfig {
    /// Private in-memory SQLite database on a single pooled connection.
    pub fn sqlite_memory() -> Self {
        Self {
            kind: DbKind::SqliteMemory,
            url: SQLITE_MEMORY_URL.to_string(),
            pool_max: 1,
            acquire_timeout_ms: 2_000,
        }
    }

    pub fn sqlite_file(path: &str) -> Self {
        Self {
            kind: DbKind::SqliteFile,
            url: format!("sqlite://{path}?mode=rwc"),
            pool_max: 4,
            acquire_timeout_ms: 5_000,
        }
    }

    /// Read configuration from `SQL_ACTIVITY_DB_*` environment variables.
    ///
    /// Defaults to an in-memory SQLite database. File and Postgres kinds
    /// require `SQL_ACTIVITY_DB_URL`.
    pub fn from_env() -> Result<Self, DbInfraError> {
        let kind = match env::var("SQL_ACTIVITY_DB_KIND") {
            Ok(v) => v.parse::<DbKind>()?,
            Err(_) => DbKind::SqliteMemory,
        };

        let mut config = match kind {
            DbKind::SqliteMemory => Self::sqlite_memory(),
            DbKind::SqliteFile | DbKind::Postgres => Self {
                kind,
                url: must_var("SQL_ACTIVITY_DB_URL")?,
                pool_max: 4,
                acquire_timeout_ms: 5_000,
            },
        };

        if let Some(pool_max) = parse_var::<u32>("SQL_ACTIVITY_DB_POOL_MAX")? {
            if kind == DbKind::SqliteMemory && pool_max != 1 {
                return Err(DbInfraError::config(
                    "SQL_ACTIVITY_DB_POOL_MAX must be 1 for in-memory SQLite; each connection would see its own database",
                ));
            }
            config.pool_max = pool_max;
        }
        if let Some(timeout) = parse_var::<u64>("SQL_ACTIVITY_DB_ACQUIRE_TIMEOUT_MS")? {
            config.acquire_timeout_ms = timeout;
        }

        Ok(config)
    }
}

/// Get required environment variable or return error
fn must_var(name: &str) -> Result<String, DbInfraError> {
    env::var(name).map_err(|_| {
        DbInfraError::config(format!("Required environment variable '{name}' is not set"))
    })
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, DbInfraError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DbInfraError::config(format!("{name} has an invalid value: '{raw}'"))),
        Err(_) => Ok(None),
    }
}

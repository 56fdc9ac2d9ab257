//! Database connection infrastructure for SQL activity recording.
//!
//! Builds sea-orm connections from configuration and wraps them in an
//! [`InstrumentedConnection`] that publishes every executed statement on a
//! [`sql_activity::InstrumentationBus`].

pub mod config;
pub mod error;
pub mod infra;

pub use config::db::{DbConfig, DbKind};
pub use error::DbInfraError;
pub use infra::db::capabilities::{AdapterCapabilities, Capability};
pub use infra::db::classify::classify;
pub use infra::db::core::{connect, sanitize_db_url};
pub use infra::db::instrumented::InstrumentedConnection;

pub mod capabilities;
pub mod classify;
pub mod core;
pub mod diagnostics;
pub mod instrumented;
pub mod query_cache;

pub use capabilities::{AdapterCapabilities, Capability};
pub use core::{connect, sanitize_db_url};
pub use diagnostics::{redact_sql_preview, statement_counters};
pub use instrumented::InstrumentedConnection;

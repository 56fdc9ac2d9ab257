//! Recording and asserting on the SQL a database driver executes.
//!
//! A driver publishes one [`StatementEvent`] per executed statement on an
//! [`InstrumentationBus`]. A [`Recorder`] subscribed to the bus keeps two
//! ordered logs: every non-cached statement, and the business statements left
//! after schema and transaction noise is filtered out. The assertion helpers
//! wrap a unit of work in a capture window and compare what it executed with
//! an expected count or a set of patterns.

#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod assertions;
pub mod bus;
pub mod capture;
pub mod config;
pub mod error;
pub mod event;
pub mod matcher;
pub mod recorder;

#[cfg(test)]
pub mod test_bootstrap;

pub use assertions::{
    assert_no_queries, assert_no_queries_with, assert_queries, assert_query_count,
    assert_query_patterns, CountOptions, QueryCount,
};
pub use bus::{InstrumentationBus, Subscriber, Subscription, SQL_EVENT};
pub use capture::{capture_activity, capture_all_activity, MaterializeTransactions, NoTransactions};
pub use config::{RecorderOption, RecorderSettings};
pub use error::{ActivityError, BoxError};
pub use event::{Category, StatementEvent};
pub use matcher::Matcher;
pub use recorder::{LogScope, Recorder};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}

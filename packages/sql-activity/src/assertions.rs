//! Count and pattern assertions over a capture window.
//!
//! Every helper runs the caller's work inside a capture window (see
//! [`crate::capture`]) and compares the statements it executed against an
//! expectation. The work returns a `Result`; its error is propagated as
//! [`ActivityError::Work`] after the window has been cleaned up, and no
//! comparison is made in that case.

use std::fmt;
use std::future::Future;

use crate::capture::{capture_window, MaterializeTransactions};
use crate::error::{ActivityError, BoxError};
use crate::event::StatementEvent;
use crate::matcher::Matcher;
use crate::recorder::{LogScope, Recorder};

/// Expected number of statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCount {
    Exactly(usize),
    /// One or more. Counted against the same log as `Exactly`, so schema and
    /// transaction statements alone do not satisfy it unless
    /// [`CountOptions::unfiltered`] is passed.
    Any,
}

impl fmt::Display for QueryCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryCount::Exactly(n) => write!(f, "{n}"),
            QueryCount::Any => f.write_str("any"),
        }
    }
}

impl From<usize> for QueryCount {
    fn from(n: usize) -> Self {
        QueryCount::Exactly(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountOptions {
    /// Count only business statements (the filtered log)
    pub ignore_schema_and_transaction: bool,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            ignore_schema_and_transaction: true,
        }
    }
}

impl CountOptions {
    /// Count schema and transaction statements too.
    pub fn unfiltered() -> Self {
        Self {
            ignore_schema_and_transaction: false,
        }
    }

    fn scope(&self) -> LogScope {
        if self.ignore_schema_and_transaction {
            LogScope::Filtered
        } else {
            LogScope::All
        }
    }
}

fn statement_texts(log: &[StatementEvent]) -> Vec<String> {
    log.iter().map(|e| e.sql().to_string()).collect()
}

fn check_count(expected: QueryCount, log: &[StatementEvent]) -> Result<(), ActivityError> {
    let satisfied = match expected {
        QueryCount::Any => !log.is_empty(),
        QueryCount::Exactly(n) => log.len() == n,
    };
    if satisfied {
        Ok(())
    } else {
        Err(ActivityError::CountMismatch {
            expected,
            actual: log.len(),
            statements: statement_texts(log),
        })
    }
}

/// Assert that `work` executes `expected` statements.
pub async fn assert_query_count<S, F, Fut, T, E>(
    recorder: &Recorder,
    session: &S,
    expected: impl Into<QueryCount>,
    options: CountOptions,
    work: F,
) -> Result<T, ActivityError>
where
    S: MaterializeTransactions + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    let expected = expected.into();
    let captured = capture_window(recorder, session, work).await?;
    let (output, log) = captured.into_parts(options.scope());
    let value = output.map_err(ActivityError::work)?;
    check_count(expected, &log)?;
    Ok(value)
}

/// Assert that `work` executes exactly `expected` business statements.
pub async fn assert_queries<S, F, Fut, T, E>(
    recorder: &Recorder,
    session: &S,
    expected: usize,
    work: F,
) -> Result<T, ActivityError>
where
    S: MaterializeTransactions + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    assert_query_count(recorder, session, expected, CountOptions::default(), work).await
}

/// Assert that `work` executes no statements at all.
///
/// Unlike the other count helpers this counts schema and transaction
/// statements as violations by default.
pub async fn assert_no_queries<S, F, Fut, T, E>(
    recorder: &Recorder,
    session: &S,
    work: F,
) -> Result<T, ActivityError>
where
    S: MaterializeTransactions + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    assert_no_queries_with(recorder, session, CountOptions::unfiltered(), work).await
}

pub async fn assert_no_queries_with<S, F, Fut, T, E>(
    recorder: &Recorder,
    session: &S,
    options: CountOptions,
    work: F,
) -> Result<T, ActivityError>
where
    S: MaterializeTransactions + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    assert_query_count(recorder, session, 0, options, work).await
}

/// Assert that every pattern matches at least one statement `work` executed,
/// schema and transaction statements included.
///
/// All patterns are checked before failing, so the error lists every miss.
/// The statements listed in the failure are the same unfiltered log the
/// patterns were searched in.
pub async fn assert_query_patterns<S, F, Fut, T, E>(
    recorder: &Recorder,
    session: &S,
    patterns: &[Matcher],
    work: F,
) -> Result<T, ActivityError>
where
    S: MaterializeTransactions + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    let captured = capture_window(recorder, session, work).await?;
    let (output, all) = captured.into_parts(LogScope::All);
    let value = output.map_err(ActivityError::work)?;

    let unmatched: Vec<String> = patterns
        .iter()
        .filter(|pattern| !all.iter().any(|e| pattern.matches(e.sql())))
        .map(ToString::to_string)
        .collect();

    if unmatched.is_empty() {
        Ok(value)
    } else {
        Err(ActivityError::PatternNotFound {
            unmatched,
            statements: statement_texts(&all),
        })
    }
}

//! Capture windows around a unit of caller-supplied work.

use std::future::Future;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ActivityError;
use crate::event::StatementEvent;
use crate::recorder::{LogScope, Recorder};

/// A session that may hold transactional state not yet sent to the database.
///
/// Capture helpers call [`materialize_transactions`](Self::materialize_transactions)
/// before opening a window so deferred statements such as `BEGIN` run as setup
/// and are not attributed to the captured work.
#[async_trait]
pub trait MaterializeTransactions: Send + Sync {
    async fn materialize_transactions(&self) -> Result<(), ActivityError>;
}

/// Session with nothing to materialize.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransactions;

#[async_trait]
impl MaterializeTransactions for NoTransactions {
    async fn materialize_transactions(&self) -> Result<(), ActivityError> {
        Ok(())
    }
}

/// Clears the recorder when the window closes, whether the work finished,
/// panicked, or its future was dropped mid-flight.
struct CaptureWindow<'a> {
    recorder: &'a Recorder,
}

impl<'a> CaptureWindow<'a> {
    fn open(recorder: &'a Recorder) -> Self {
        recorder.clear();
        debug!("capture window open");
        Self { recorder }
    }
}

impl Drop for CaptureWindow<'_> {
    fn drop(&mut self) {
        self.recorder.clear();
        debug!("capture window closed");
    }
}

/// Output of the work plus both logs as they stood when the work finished.
#[derive(Debug)]
pub(crate) struct Captured<T> {
    pub output: T,
    pub all: Vec<StatementEvent>,
    pub filtered: Vec<StatementEvent>,
}

impl<T> Captured<T> {
    /// Split into the work's output and the log selected by `scope`.
    pub fn into_parts(self, scope: LogScope) -> (T, Vec<StatementEvent>) {
        match scope {
            LogScope::All => (self.output, self.all),
            LogScope::Filtered => (self.output, self.filtered),
        }
    }
}

pub(crate) async fn capture_window<S, F, Fut, T>(
    recorder: &Recorder,
    session: &S,
    work: F,
) -> Result<Captured<T>, ActivityError>
where
    S: MaterializeTransactions + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    session.materialize_transactions().await?;

    let window = CaptureWindow::open(recorder);
    let output = work().await;
    let captured = Captured {
        output,
        all: recorder.snapshot(LogScope::All),
        filtered: recorder.snapshot(LogScope::Filtered),
    };
    drop(window);

    Ok(captured)
}

/// Run `work` inside a capture window and return its output together with the
/// business statements (filtered log) it executed.
pub async fn capture_activity<S, F, Fut, T>(
    recorder: &Recorder,
    session: &S,
    work: F,
) -> Result<(T, Vec<StatementEvent>), ActivityError>
where
    S: MaterializeTransactions + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let captured = capture_window(recorder, session, work).await?;
    Ok(captured.into_parts(LogScope::Filtered))
}

/// Like [`capture_activity`], but returns every non-cached statement,
/// schema and transaction control included.
pub async fn capture_all_activity<S, F, Fut, T>(
    recorder: &Recorder,
    session: &S,
    work: F,
) -> Result<(T, Vec<StatementEvent>), ActivityError>
where
    S: MaterializeTransactions + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let captured = capture_window(recorder, session, work).await?;
    Ok(captured.into_parts(LogScope::All))
}

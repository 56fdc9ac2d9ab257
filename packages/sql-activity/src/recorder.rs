use parking_lot::Mutex;
use regex::Regex;
use tracing::trace;

use crate::bus::Subscriber;
use crate::config::RecorderSettings;
use crate::event::{Category, StatementEvent};

/// Which of the recorder's two logs to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogScope {
    /// Every non-cached statement
    All,
    /// Business statements only (ignored categories and SQL excluded)
    Filtered,
}

#[derive(Debug, Default)]
struct Logs {
    all: Vec<StatementEvent>,
    filtered: Vec<StatementEvent>,
}

impl Logs {
    fn get(&self, scope: LogScope) -> &Vec<StatementEvent> {
        match scope {
            LogScope::All => &self.all,
            LogScope::Filtered => &self.filtered,
        }
    }
}

/// Passive listener that keeps ordered logs of executed statements.
///
/// Construct one per test process (or per harness), subscribe it to an
/// [`InstrumentationBus`](crate::bus::InstrumentationBus), and clear it at
/// every scope boundary. `record`, `clear` and `snapshot` are serialized by a
/// single lock, so readers never see one log updated without the other.
#[derive(Debug)]
pub struct Recorder {
    logs: Mutex<Logs>,
    ignored_categories: Vec<Category>,
    ignored_sql: Vec<Regex>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::with_settings(&RecorderSettings::default())
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: &RecorderSettings) -> Self {
        Self {
            logs: Mutex::new(Logs::default()),
            ignored_categories: settings.ignored_categories.clone(),
            ignored_sql: settings.ignored_sql.clone(),
        }
    }

    pub fn clear(&self) {
        let mut logs = self.logs.lock();
        logs.all.clear();
        logs.filtered.clear();
    }

    /// Append a driver event. Cached statements are dropped.
    pub fn record(&self, event: &StatementEvent) {
        if event.is_cached() {
            return;
        }

        let business = !self.ignored_categories.contains(&event.category())
            && !self.ignored_sql.iter().any(|re| re.is_match(event.sql()));

        trace!(
            category = %event.category(),
            filtered = business,
            sql = event.sql(),
            "recorded statement"
        );

        let mut logs = self.logs.lock();
        logs.all.push(event.clone());
        if business {
            logs.filtered.push(event.clone());
        }
    }

    pub fn snapshot(&self, scope: LogScope) -> Vec<StatementEvent> {
        self.logs.lock().get(scope).clone()
    }

    /// Statement texts of the requested log, in execution order.
    pub fn statements(&self, scope: LogScope) -> Vec<String> {
        self.logs
            .lock()
            .get(scope)
            .iter()
            .map(|e| e.sql().to_string())
            .collect()
    }

    pub fn len(&self, scope: LogScope) -> usize {
        self.logs.lock().get(scope).len()
    }

    pub fn is_empty(&self, scope: LogScope) -> bool {
        self.len(scope) == 0
    }
}

impl Subscriber for Recorder {
    fn call(&self, _name: &str, event: &StatementEvent) {
        self.record(event);
    }
}

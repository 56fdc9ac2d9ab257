use std::collections::HashMap;

use parking_lot::Mutex;
use sea_orm::{JsonValue, Statement};

/// Per-connection cache of read results, keyed by SQL text and bound values.
///
/// Disabled until [`enable`](Self::enable) is called. Holding rows as JSON
/// keeps entries independent of the driver's row types.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<Option<HashMap<String, Vec<JsonValue>>>>,
}

impl QueryCache {
    pub fn key(stmt: &Statement) -> String {
        format!("{}|{:?}", stmt.sql, stmt.values)
    }

    pub fn enable(&self) {
        let mut entries = self.entries.lock();
        if entries.is_none() {
            *entries = Some(HashMap::new());
        }
    }

    pub fn disable(&self) {
        *self.entries.lock() = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.lock().is_some()
    }

    pub fn clear(&self) {
        if let Some(map) = self.entries.lock().as_mut() {
            map.clear();
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<JsonValue>> {
        self.entries
            .lock()
            .as_ref()
            .and_then(|map| map.get(key).cloned())
    }

    /// Store rows if the cache is enabled; otherwise a no-op.
    pub fn insert(&self, key: String, rows: Vec<JsonValue>) {
        if let Some(map) = self.entries.lock().as_mut() {
            map.insert(key, rows);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

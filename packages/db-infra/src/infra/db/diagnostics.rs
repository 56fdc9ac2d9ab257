/// Mask quoted literals in a statement and cut it to a log-friendly length.
pub fn redact_sql_preview(sql: &str) -> String {
    const MAX_PREVIEW: usize = 80;

    let mut out = String::with_capacity(sql.len().min(MAX_PREVIEW));
    let mut open_quote: Option<char> = None;

    for ch in sql.chars() {
        match open_quote {
            Some(q) if ch == q => {
                open_quote = None;
                out.push(ch);
            }
            Some(_) => out.push('?'),
            None => {
                if ch == '\'' || ch == '"' {
                    open_quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }

    out.chars().take(MAX_PREVIEW).collect()
}

/// Statement counters - module-local atomics
pub mod statement_counters {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static STATEMENTS_PUBLISHED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static CACHE_HITS_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static LAZY_TRANSACTIONS_ELIDED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static SAVEPOINTS_CREATED_TOTAL: AtomicUsize = AtomicUsize::new(0);

    pub fn statement_published() {
        STATEMENTS_PUBLISHED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hit() {
        CACHE_HITS_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn lazy_transaction_elided() {
        LAZY_TRANSACTIONS_ELIDED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn savepoint_created() {
        SAVEPOINTS_CREATED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Snapshot {
        pub statements_published_total: usize,
        pub cache_hits_total: usize,
        pub lazy_transactions_elided_total: usize,
        pub savepoints_created_total: usize,
    }

    pub fn snapshot() -> Snapshot {
        Snapshot {
            statements_published_total: STATEMENTS_PUBLISHED_TOTAL.load(Ordering::Relaxed),
            cache_hits_total: CACHE_HITS_TOTAL.load(Ordering::Relaxed),
            lazy_transactions_elided_total: LAZY_TRANSACTIONS_ELIDED_TOTAL.load(Ordering::Relaxed),
            savepoints_created_total: SAVEPOINTS_CREATED_TOTAL.load(Ordering::Relaxed),
        }
    }

    pub fn log_snapshot(context: &str) {
        let s = snapshot();
        tracing::debug!(
            context = context,
            statements_published_total = s.statements_published_total,
            cache_hits_total = s.cache_hits_total,
            lazy_transactions_elided_total = s.lazy_transactions_elided_total,
            savepoints_created_total = s.savepoints_created_total,
            "statement counters"
        );
    }
}

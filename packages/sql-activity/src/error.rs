use thiserror::Error;

use crate::assertions::QueryCount;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("{}", count_mismatch_message(.expected, .actual, .statements))]
    CountMismatch {
        expected: QueryCount,
        actual: usize,
        statements: Vec<String>,
    },
    #[error("{}", pattern_not_found_message(.unmatched, .statements))]
    PatternNotFound {
        unmatched: Vec<String>,
        statements: Vec<String>,
    },
    #[error("Captured work failed: {source}")]
    Work {
        #[source]
        source: BoxError,
    },
    #[error("Failed to materialize pending transactions: {detail}")]
    Materialize { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl ActivityError {
    pub fn work(source: impl Into<BoxError>) -> Self {
        Self::Work {
            source: source.into(),
        }
    }

    pub fn materialize(detail: impl Into<String>) -> Self {
        Self::Materialize {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// True for failures raised by the assertion helpers themselves.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(
            self,
            ActivityError::CountMismatch { .. } | ActivityError::PatternNotFound { .. }
        )
    }
}

fn queries_suffix(statements: &[String]) -> String {
    if statements.is_empty() {
        String::new()
    } else {
        format!("\nQueries:\n{}", statements.join("\n"))
    }
}

fn count_mismatch_message(expected: &QueryCount, actual: &usize, statements: &[String]) -> String {
    match expected {
        QueryCount::Any => "1 or more queries expected, but none were executed.".to_string(),
        QueryCount::Exactly(n) => format!(
            "{actual} instead of {n} queries were executed.{}",
            queries_suffix(statements)
        ),
    }
}

fn pattern_not_found_message(unmatched: &[String], statements: &[String]) -> String {
    format!(
        "Query pattern(s) {} not found.{}",
        unmatched.join(", "),
        queries_suffix(statements)
    )
}

use std::fmt;

use regex::Regex;

use crate::error::ActivityError;

/// Pattern a captured statement is tested against.
#[derive(Debug, Clone)]
pub enum Matcher {
    Regex(Regex),
    /// Whole-statement equality
    Exact(String),
}

impl Matcher {
    pub fn regex(pattern: &str) -> Result<Self, ActivityError> {
        Regex::new(pattern)
            .map(Matcher::Regex)
            .map_err(|e| ActivityError::config(format!("invalid query pattern '{pattern}': {e}")))
    }

    pub fn exact(sql: impl Into<String>) -> Self {
        Matcher::Exact(sql.into())
    }

    pub fn matches(&self, sql: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(sql),
            Matcher::Exact(expected) => expected == sql,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Regex(re) => write!(f, "/{}/", re.as_str()),
            Matcher::Exact(sql) => write!(f, "{sql:?}"),
        }
    }
}

impl From<Regex> for Matcher {
    fn from(re: Regex) -> Self {
        Matcher::Regex(re)
    }
}

impl From<&str> for Matcher {
    fn from(sql: &str) -> Self {
        Matcher::Exact(sql.to_string())
    }
}

impl From<String> for Matcher {
    fn from(sql: String) -> Self {
        Matcher::Exact(sql)
    }
}

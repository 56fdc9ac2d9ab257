use std::env;
use std::str::FromStr;

use regex::Regex;

use crate::bus::SQL_EVENT;
use crate::error::ActivityError;
use crate::event::Category;

/// Options recognized by [`RecorderSettings::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderOption {
    /// Instrumentation event name the recorder subscribes to
    EventName,
    /// Comma-separated categories kept out of the filtered log
    IgnoredCategories,
    /// Regex; matching statements are kept out of the filtered log
    IgnoredSql,
    /// Whether test harnesses wrap each test in a rolled-back transaction
    TransactionalTests,
}

impl RecorderOption {
    pub const ALL: [RecorderOption; 4] = [
        RecorderOption::EventName,
        RecorderOption::IgnoredCategories,
        RecorderOption::IgnoredSql,
        RecorderOption::TransactionalTests,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RecorderOption::EventName => "event_name",
            RecorderOption::IgnoredCategories => "ignored_categories",
            RecorderOption::IgnoredSql => "ignored_sql",
            RecorderOption::TransactionalTests => "transactional_tests",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            RecorderOption::EventName => "SQL_ACTIVITY_EVENT",
            RecorderOption::IgnoredCategories => "SQL_ACTIVITY_IGNORED_CATEGORIES",
            RecorderOption::IgnoredSql => "SQL_ACTIVITY_IGNORED_SQL",
            RecorderOption::TransactionalTests => "SQL_ACTIVITY_TRANSACTIONAL_TESTS",
        }
    }
}

impl FromStr for RecorderOption {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecorderOption::ALL
            .into_iter()
            .find(|opt| opt.key() == s)
            .ok_or_else(|| ActivityError::config(format!("unknown recorder option '{s}'")))
    }
}

/// Recorder and harness configuration.
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub event_name: String,
    pub ignored_categories: Vec<Category>,
    pub ignored_sql: Vec<Regex>,
    pub transactional_tests: bool,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            event_name: SQL_EVENT.to_string(),
            ignored_categories: vec![Category::Schema, Category::Transaction],
            ignored_sql: Vec::new(),
            transactional_tests: true,
        }
    }
}

impl RecorderSettings {
    /// Defaults overridden by any `SQL_ACTIVITY_*` variables that are set.
    pub fn from_env() -> Result<Self, ActivityError> {
        let mut settings = Self::default();
        for option in RecorderOption::ALL {
            if let Ok(value) = env::var(option.env_var()) {
                settings
                    .set(option, &value)
                    .map_err(|e| ActivityError::config(format!("{}: {e}", option.env_var())))?;
            }
        }
        Ok(settings)
    }

    /// Apply a single option by key.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ActivityError> {
        let option = key.parse::<RecorderOption>()?;
        self.set(option, value)
    }

    pub fn set(&mut self, option: RecorderOption, value: &str) -> Result<(), ActivityError> {
        match option {
            RecorderOption::EventName => {
                let name = value.trim();
                if name.is_empty() {
                    return Err(ActivityError::config("event_name must not be empty"));
                }
                self.event_name = name.to_string();
            }
            RecorderOption::IgnoredCategories => {
                self.ignored_categories = parse_categories(value)?;
            }
            RecorderOption::IgnoredSql => {
                let pattern = Regex::new(value).map_err(|e| {
                    ActivityError::config(format!("invalid ignored_sql pattern '{value}': {e}"))
                })?;
                self.ignored_sql.push(pattern);
            }
            RecorderOption::TransactionalTests => {
                self.transactional_tests = parse_bool(value)?;
            }
        }
        Ok(())
    }
}

fn parse_categories(value: &str) -> Result<Vec<Category>, ActivityError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|tag| match Category::from_tag(tag) {
            Category::Other if !tag.eq_ignore_ascii_case("OTHER") => Err(ActivityError::config(
                format!("unknown statement category '{tag}'"),
            )),
            category => Ok(category),
        })
        .collect()
}

fn parse_bool(value: &str) -> Result<bool, ActivityError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ActivityError::config(format!(
            "expected a boolean, got '{other}'"
        ))),
    }
}

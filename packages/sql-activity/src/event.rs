use std::fmt;
use std::str::FromStr;

/// Driver-assigned classification of a statement's purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Schema changes and introspection (DDL, PRAGMA)
    Schema,
    /// Transaction control (BEGIN, COMMIT, SAVEPOINT, ...)
    Transaction,
    /// Business queries (SELECT, INSERT, UPDATE, DELETE)
    Query,
    /// Anything the driver did not tag with a known category
    Other,
}

impl Category {
    /// The tag a driver attaches to an event of this category.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Category::Schema => "SCHEMA",
            Category::Transaction => "TRANSACTION",
            Category::Query => "QUERY",
            Category::Other => "OTHER",
        }
    }

    /// Map a raw driver tag to a category. Unknown tags become `Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "SCHEMA" => Category::Schema,
            "TRANSACTION" => Category::Transaction,
            "QUERY" => Category::Query,
            _ => Category::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from_tag(s))
    }
}

/// One executed statement as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementEvent {
    sql: String,
    cached: bool,
    category: Category,
}

impl StatementEvent {
    pub fn new(sql: impl Into<String>, cached: bool, category: Category) -> Self {
        Self {
            sql: sql.into(),
            cached,
            category,
        }
    }

    /// A statement that was executed against the database.
    pub fn executed(sql: impl Into<String>, category: Category) -> Self {
        Self::new(sql, false, category)
    }

    /// A statement whose result was served from the statement cache.
    pub fn cached(sql: impl Into<String>, category: Category) -> Self {
        Self::new(sql, true, category)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

impl fmt::Display for StatementEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

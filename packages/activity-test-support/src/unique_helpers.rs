//! Unique names for test tables, so tests sharing a database do not collide.

use ulid::Ulid;

/// Generate a unique SQL identifier with the given prefix
///
/// The result is `{prefix}_{ulid}` in lower case, which is a valid unquoted
/// table name on every supported backend.
///
/// # Examples
/// ```
/// use activity_test_support::unique_helpers::unique_table;
///
/// let a = unique_table("widgets");
/// let b = unique_table("widgets");
/// assert_ne!(a, b);
/// assert!(a.starts_with("widgets_"));
/// ```
pub fn unique_table(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new().to_string().to_lowercase())
}

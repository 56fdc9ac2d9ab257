use lazy_regex::regex;
use sql_activity::Category;

/// Tag a statement by its leading keyword.
///
/// Leading whitespace, comments and opening parentheses are skipped.
pub fn classify(sql: &str) -> Category {
    let keyword = match regex!(r"(?s)^(?:\s+|--[^\n]*(?:\n|$)|/\*.*?\*/|\()*([A-Za-z]+)").captures(sql) {
        Some(caps) => caps[1].to_ascii_uppercase(),
        None => return Category::Other,
    };

    match keyword.as_str() {
        "CREATE" | "ALTER" | "DROP" | "TRUNCATE" | "RENAME" | "COMMENT" | "GRANT" | "REVOKE"
        | "PRAGMA" => Category::Schema,
        "BEGIN" | "START" | "COMMIT" | "END" | "ROLLBACK" | "SAVEPOINT" | "RELEASE" => {
            Category::Transaction
        }
        "SELECT" | "INSERT" | "UPDATE" | "DELETE" | "WITH" | "REPLACE" | "VALUES" | "UPSERT" => {
            Category::Query
        }
        _ => Category::Other,
    }
}

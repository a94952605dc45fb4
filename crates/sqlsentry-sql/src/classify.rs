//! Statement classification.
//!
//! Uses sqlparser's tokenizer rather than substring search so that a
//! `WHERE` appearing inside a string literal is never mistaken for a real
//! WHERE clause. If tokenization fails the classifier falls back to
//! whitespace splitting, which keeps classification total over arbitrary
//! model output.

use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};
use sqlsentry_commons::models::StatementCategory;

/// Uppercased word tokens of a statement, string literals excluded.
fn word_tokens(sql: &str) -> Vec<String> {
    let dialect = GenericDialect {};
    match Tokenizer::new(&dialect, sql).tokenize() {
        Ok(tokens) => tokens
            .iter()
            .filter_map(|tok| match tok {
                Token::Word(w) => Some(w.value.to_uppercase()),
                _ => None,
            })
            .collect(),
        // Tokenizer choked (e.g. unterminated literal): simple whitespace
        // split, same fallback the statement still gets at the database.
        Err(_) => sql.split_whitespace().map(|s| s.to_uppercase()).collect(),
    }
}

/// Classify a statement by its leading keyword.
///
/// SELECT is a read; INSERT always counts as guarded (no WHERE concept
/// applies); UPDATE/DELETE are guarded only when a WHERE token is present;
/// DROP/ALTER/TRUNCATE are DDL; everything else is unknown and left for
/// the database to judge.
pub fn classify(sql: &str) -> StatementCategory {
    let words = word_tokens(sql);
    let first = match words.first() {
        Some(w) => w.as_str(),
        None => return StatementCategory::Unknown,
    };

    match first {
        "SELECT" => StatementCategory::Read,
        "INSERT" => StatementCategory::MutateGuarded,
        "UPDATE" | "DELETE" => {
            if words.iter().any(|w| w == "WHERE") {
                StatementCategory::MutateGuarded
            } else {
                StatementCategory::MutateUnguarded
            }
        },
        "DROP" | "ALTER" | "TRUNCATE" => StatementCategory::Ddl,
        _ => StatementCategory::Unknown,
    }
}

/// The statement's leading keyword, uppercased (for log and guard messages).
pub fn leading_keyword(sql: &str) -> Option<String> {
    word_tokens(sql).into_iter().next()
}

/// Whether executing this statement yields a row set: a read, or any
/// statement carrying a RETURNING clause.
pub fn returns_rows(sql: &str) -> bool {
    let words = word_tokens(sql);
    matches!(words.first().map(String::as_str), Some("SELECT"))
        || words.iter().any(|w| w == "RETURNING")
}

/// Table identifiers referenced by a statement, lowercased.
///
/// Collects the (possibly dotted) identifier following FROM, INTO, JOIN,
/// and TABLE keywords, plus the target of a leading UPDATE. Lightweight by
/// design: this feeds the allowlist check, not a query planner.
pub fn referenced_tables(sql: &str) -> Vec<String> {
    let dialect = GenericDialect {};
    let tokens = match Tokenizer::new(&dialect, sql).tokenize() {
        Ok(tokens) => tokens,
        Err(_) => return fallback_referenced_tables(sql),
    };

    let significant: Vec<&Token> = tokens
        .iter()
        .filter(|tok| !matches!(tok, Token::Whitespace(_)))
        .collect();

    let mut tables = Vec::new();
    let mut i = 0;
    while i < significant.len() {
        if let Token::Word(w) = significant[i] {
            let trigger = matches!(
                w.keyword,
                Keyword::FROM | Keyword::INTO | Keyword::JOIN | Keyword::TABLE
            ) || (i == 0 && w.keyword == Keyword::UPDATE);

            if trigger {
                if let Some((name, next)) = qualified_name(&significant, i + 1) {
                    if !tables.contains(&name) {
                        tables.push(name);
                    }
                    i = next;
                    continue;
                }
            }
        }
        i += 1;
    }

    tables
}

/// Read a dotted identifier starting at `start`; returns the lowercased
/// name and the index past it.
fn qualified_name(tokens: &[&Token], start: usize) -> Option<(String, usize)> {
    let mut parts: Vec<String> = Vec::new();
    let mut i = start;
    loop {
        match tokens.get(i) {
            Some(Token::Word(w)) => {
                parts.push(w.value.to_lowercase());
                i += 1;
            },
            _ => break,
        }
        if !matches!(tokens.get(i), Some(Token::Period)) {
            break;
        }
        i += 1;
    }

    if parts.is_empty() {
        None
    } else {
        Some((parts.join("."), i))
    }
}

fn fallback_referenced_tables(sql: &str) -> Vec<String> {
    let words: Vec<&str> = sql.split_whitespace().collect();
    let mut tables = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let upper = word.to_uppercase();
        let trigger = matches!(upper.as_str(), "FROM" | "INTO" | "JOIN" | "TABLE")
            || (i == 0 && upper == "UPDATE");
        if trigger {
            if let Some(next) = words.get(i + 1) {
                let name = next
                    .trim_matches(|c: char| matches!(c, '(' | ')' | ',' | ';'))
                    .to_lowercase();
                if !name.is_empty() && !tables.contains(&name) {
                    tables.push(name);
                }
            }
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlsentry_commons::models::StatementCategory;

    #[test]
    fn test_classify_reads() {
        assert_eq!(classify("SELECT * FROM employees"), StatementCategory::Read);
        assert_eq!(classify("select 1"), StatementCategory::Read);
    }

    #[test]
    fn test_classify_insert_is_always_guarded() {
        assert_eq!(
            classify("INSERT INTO employees (name) VALUES ('X')"),
            StatementCategory::MutateGuarded
        );
    }

    #[test]
    fn test_classify_update_delete_by_where_presence() {
        assert_eq!(
            classify("DELETE FROM employees"),
            StatementCategory::MutateUnguarded
        );
        assert_eq!(
            classify("DELETE FROM employees WHERE id = 5"),
            StatementCategory::MutateGuarded
        );
        assert_eq!(
            classify("UPDATE employees SET salary = 1"),
            StatementCategory::MutateUnguarded
        );
        assert_eq!(
            classify("update employees set salary = 1 where id = 2"),
            StatementCategory::MutateGuarded
        );
    }

    #[test]
    fn test_where_inside_string_literal_does_not_count() {
        // Substring search would see "WHERE" here; the tokenizer must not.
        assert_eq!(
            classify("UPDATE notes SET body = 'tell me WHERE it hurts'"),
            StatementCategory::MutateUnguarded
        );
    }

    #[test]
    fn test_classify_ddl() {
        assert_eq!(classify("DROP TABLE employees"), StatementCategory::Ddl);
        assert_eq!(
            classify("ALTER TABLE employees ADD COLUMN age INT"),
            StatementCategory::Ddl
        );
        assert_eq!(classify("TRUNCATE employees"), StatementCategory::Ddl);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("GRANT SELECT ON t TO alice"), StatementCategory::Unknown);
        assert_eq!(classify(""), StatementCategory::Unknown);
        assert_eq!(classify("-- only a comment"), StatementCategory::Unknown);
    }

    #[test]
    fn test_returns_rows() {
        assert!(returns_rows("SELECT * FROM employees"));
        assert!(returns_rows(
            "INSERT INTO employees (name) VALUES ('X') RETURNING *"
        ));
        assert!(returns_rows("DELETE FROM t WHERE id = 1 RETURNING id"));
        assert!(!returns_rows("INSERT INTO employees (name) VALUES ('X')"));
        assert!(!returns_rows("UPDATE t SET a = 1 WHERE id = 1"));
    }

    #[test]
    fn test_leading_keyword() {
        assert_eq!(leading_keyword("  select 1").as_deref(), Some("SELECT"));
        assert_eq!(leading_keyword("/* hi */ DELETE FROM t").as_deref(), Some("DELETE"));
        assert_eq!(leading_keyword(""), None);
    }

    #[test]
    fn test_referenced_tables() {
        assert_eq!(referenced_tables("SELECT * FROM employees"), vec!["employees"]);
        assert_eq!(
            referenced_tables("INSERT INTO orders (id) VALUES (1)"),
            vec!["orders"]
        );
        assert_eq!(
            referenced_tables("UPDATE products SET price = 1 WHERE id = 2"),
            vec!["products"]
        );
        assert_eq!(
            referenced_tables(
                "SELECT * FROM orders o JOIN products p ON o.product_id = p.id"
            ),
            vec!["orders", "products"]
        );
        assert_eq!(
            referenced_tables("SELECT table_name FROM information_schema.tables"),
            vec!["information_schema.tables"]
        );
    }

    #[test]
    fn test_referenced_tables_ignores_string_contents() {
        assert_eq!(
            referenced_tables("INSERT INTO logs (msg) VALUES ('copied FROM secrets')"),
            vec!["logs"]
        );
    }
}

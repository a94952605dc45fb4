//! Statement splitting for multi-statement SQL payloads.
//!
//! Handles quoted strings, comments, and whitespace to avoid breaking on
//! semicolons that appear inside literals or comment blocks. Splitting is
//! total: any input, including an unterminated literal, yields a (possibly
//! empty) statement sequence.

use sqlsentry_commons::models::Statement;

/// Split a SQL blob into individual statements.
///
/// Preserves statement order, trims each piece, discards empty pieces,
/// and assigns a 1-based index in source order. Semicolons inside quoted
/// strings or comments do not split. An unterminated quote or block
/// comment flushes the remainder as the final statement.
///
/// # Examples
///
/// ```
/// use sqlsentry_sql::split_statements;
///
/// let statements = split_statements("CREATE TABLE t(id INT); INSERT INTO t VALUES (1);");
/// assert_eq!(statements.len(), 2);
/// assert_eq!(statements[0].text, "CREATE TABLE t(id INT)");
/// assert_eq!(statements[1].index, 2);
/// ```
pub fn split_statements(sql: &str) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_backtick = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let mut flush = |current: &mut String, statements: &mut Vec<Statement>| {
        let stmt = current.trim();
        if !stmt.is_empty() {
            statements.push(Statement::new(statements.len() + 1, stmt));
        }
        current.clear();
    };

    while let Some(ch) = chars.next() {
        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
            }
            current.push(ch);
            continue;
        }

        if in_block_comment {
            if ch == '*' && chars.peek() == Some(&'/') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_block_comment = false;
                continue;
            }
            current.push(ch);
            continue;
        }

        if !in_single_quote && !in_double_quote && !in_backtick {
            if ch == '-' && chars.peek() == Some(&'-') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_line_comment = true;
                continue;
            }

            if ch == '/' && chars.peek() == Some(&'*') {
                current.push(ch);
                current.push(chars.next().unwrap());
                in_block_comment = true;
                continue;
            }
        }

        match ch {
            '\'' if !in_double_quote && !in_backtick => {
                if in_single_quote && chars.peek() == Some(&'\'') {
                    // Escaped quote inside single-quoted string
                    current.push(ch);
                    current.push(chars.next().unwrap());
                    continue;
                }
                in_single_quote = !in_single_quote;
                current.push(ch);
            },
            '"' if !in_single_quote && !in_backtick => {
                if in_double_quote && chars.peek() == Some(&'"') {
                    current.push(ch);
                    current.push(chars.next().unwrap());
                    continue;
                }
                in_double_quote = !in_double_quote;
                current.push(ch);
            },
            '`' if !in_single_quote && !in_double_quote => {
                in_backtick = !in_backtick;
                current.push(ch);
            },
            ';' if !(in_single_quote || in_double_quote || in_backtick) => {
                flush(&mut current, &mut statements);
            },
            _ => {
                current.push(ch);
            },
        }
    }

    flush(&mut current, &mut statements);

    statements
}

#[cfg(test)]
mod tests {
    use super::split_statements;

    #[test]
    fn splits_simple_statements() {
        let sql = "SELECT * FROM employees; INSERT INTO employees (name) VALUES ('X')";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].text, "SELECT * FROM employees");
        assert_eq!(statements[1].text, "INSERT INTO employees (name) VALUES ('X')");
        assert_eq!(statements[0].index, 1);
        assert_eq!(statements[1].index, 2);
    }

    #[test]
    fn empty_blob_yields_no_statements() {
        assert!(split_statements("").is_empty());
        assert!(split_statements("   \n\t  ").is_empty());
        assert!(split_statements("; ; ;").is_empty());
    }

    #[test]
    fn preserves_order_when_rejoined() {
        let sql = "SELECT 1; SELECT 2; SELECT 3";
        let statements = split_statements(sql);
        let rejoined: Vec<&str> = statements.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(rejoined.join("; "), "SELECT 1; SELECT 2; SELECT 3");
    }

    #[test]
    fn ignores_semicolons_in_strings() {
        let sql = "INSERT INTO logs(message) VALUES('value;still part of string'); SELECT 1;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].text.contains("value;still part of string"));
    }

    #[test]
    fn ignores_semicolons_in_comments() {
        let sql = "SELECT 1; -- second statement;\nSELECT 2; /* comment; */ SELECT 3;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 3);
    }

    #[test]
    fn handles_escaped_quotes() {
        let sql = "INSERT INTO t(text) VALUES('It''s fine; really'); SELECT 1;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].text.contains("It''s fine; really"));
    }

    #[test]
    fn unterminated_string_flushes_remainder() {
        let sql = "SELECT 1; INSERT INTO t(text) VALUES('missing end";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[1].text.contains("missing end"));
    }
}

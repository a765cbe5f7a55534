//! Read-only statement gate
//!
//! Generated SQL is only executed when it is a single `SELECT` (or `WITH ...
//! SELECT`) statement. String literals (including Postgres `$tag$` quoting)
//! and comments are blanked out before the keyword scan so values like
//! `'DELETE'` or `$$DELETE$$` do not trip it.

use crate::types::{AppError, AppResult};

const ALLOWED_LEADING: &[&str] = &["SELECT", "WITH"];

const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "MERGE", "DROP", "ALTER", "CREATE", "TRUNCATE", "GRANT",
    "REVOKE", "EXEC", "EXECUTE", "INTO", "CALL", "COPY",
];

/// Length of the `$tag$` opener at `i`, if one starts there. `$1` parameters
/// and `$` inside identifiers are not openers.
fn dollar_tag(chars: &[char], i: usize) -> Option<usize> {
    if i > 0 && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_') {
        return None;
    }
    if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut j = i + 1;
    while let Some(&c) = chars.get(j) {
        if c == '$' {
            return Some(j - i + 1);
        }
        if !(c.is_alphanumeric() || c == '_') {
            return None;
        }
        j += 1;
    }
    None
}

/// Replace quoted literals and comments with spaces, keeping everything else.
fn scrub(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            quote @ ('\'' | '"') => {
                i += 1;
                while i < chars.len() {
                    if chars[i] == quote {
                        // Doubled quote is an escaped quote.
                        if chars.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
                out.push(' ');
            }
            '$' => match dollar_tag(&chars, i) {
                Some(len) => {
                    let tag = &chars[i..i + len];
                    i += len;
                    while i < chars.len() && !chars[i..].starts_with(tag) {
                        i += 1;
                    }
                    i += len;
                    out.push(' ');
                }
                None => {
                    out.push('$');
                    i += 1;
                }
            },
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                out.push(' ');
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
                out.push(' ');
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Reject anything that is not a single read-only query.
pub fn ensure_read_only(sql: &str) -> AppResult<()> {
    let scrubbed = scrub(sql);
    let body = scrubbed.trim();
    let body = body.strip_suffix(';').unwrap_or(body);

    if body.contains(';') {
        return Err(AppError::UnsafeSql(
            "Apenas uma instrução SQL por pergunta é permitida.".to_string(),
        ));
    }

    let upper = body.to_uppercase();
    let mut words = upper
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty());

    match words.next() {
        Some(first) if ALLOWED_LEADING.contains(&first) => {}
        _ => {
            return Err(AppError::UnsafeSql(
                "Apenas consultas de leitura (SELECT) são permitidas.".to_string(),
            ))
        }
    }

    if let Some(keyword) = words.find(|w| FORBIDDEN_KEYWORDS.contains(w)) {
        return Err(AppError::UnsafeSql(format!(
            "Instrução SQL rejeitada: palavra-chave {} não é permitida.",
            keyword
        )));
    }

    Ok(())
}

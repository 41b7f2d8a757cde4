//! Named placeholder translation.
//!
//! Clause fragments and hand-written statements use `%(key)s` placeholders. Postgres only
//! understands positional `$1, $2, ...`, so [`NamedSql`] rewrites the SQL once and then
//! resolves the positional parameter slice from a [`ParamMap`] at execution time. Values are
//! never spliced into the SQL text.

use crate::error::{DbError, DbResult};
use crate::param::ParamMap;
use std::fmt::Write;
use tokio_postgres::types::ToSql;

/// SQL with `%(key)s` placeholders rewritten to `$n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSql {
    sql: String,
    /// `keys[i]` is bound to `$(i + 1)`.
    keys: Vec<String>,
}

impl NamedSql {
    /// Rewrite `named_sql`.
    ///
    /// - `%(key)s` becomes `$n`; repeated keys share one index
    /// - `%%` becomes a literal `%`
    /// - any other `%` is an error
    pub fn parse(named_sql: &str) -> DbResult<Self> {
        let mut sql = String::with_capacity(named_sql.len());
        let mut keys: Vec<String> = Vec::new();
        let mut chars = named_sql.char_indices();

        while let Some((pos, c)) = chars.next() {
            if c != '%' {
                sql.push(c);
                continue;
            }

            match chars.next() {
                Some((_, '%')) => sql.push('%'),
                Some((_, '(')) => {
                    let mut key = String::new();
                    let mut closed = false;
                    for (_, ch) in chars.by_ref() {
                        if ch == ')' {
                            closed = true;
                            break;
                        }
                        key.push(ch);
                    }

                    if !closed || !matches!(chars.next(), Some((_, 's'))) {
                        return Err(DbError::validation(format!(
                            "malformed placeholder at byte {pos}: {named_sql}"
                        )));
                    }
                    if key.is_empty() {
                        return Err(DbError::validation(format!(
                            "empty placeholder name at byte {pos}: {named_sql}"
                        )));
                    }

                    let index = match keys.iter().position(|k| *k == key) {
                        Some(i) => i + 1,
                        None => {
                            keys.push(key);
                            keys.len()
                        }
                    };
                    let _ = write!(&mut sql, "${}", index);
                }
                _ => {
                    return Err(DbError::validation(format!(
                        "unescaped '%' at byte {pos} (use '%%'): {named_sql}"
                    )));
                }
            }
        }

        Ok(Self { sql, keys })
    }

    /// The positional SQL.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder keys in `$n` order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Resolve the positional parameters from `params`.
    ///
    /// Every key must be bound; bindings the SQL does not reference are ignored.
    pub fn bind<'a>(&self, params: &'a ParamMap) -> DbResult<Vec<&'a (dyn ToSql + Sync)>> {
        self.keys
            .iter()
            .map(|key| {
                params
                    .get(key)
                    .map(|v| v as &(dyn ToSql + Sync))
                    .ok_or_else(|| {
                        DbError::validation(format!("missing parameter '{key}' for: {}", self.sql))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_update_fragment() {
        let named = NamedSql::parse(
            "UPDATE t SET column1=%(new_column1)s WHERE column1=%(column1)s",
        )
        .unwrap();
        assert_eq!(named.sql(), "UPDATE t SET column1=$1 WHERE column1=$2");
        assert_eq!(named.keys(), ["new_column1", "column1"]);
    }

    #[test]
    fn repeated_key_reuses_index() {
        let named =
            NamedSql::parse("INSERT INTO t(a, b, c) VALUES(%(x)s, %(y)s, %(x)s)").unwrap();
        assert_eq!(named.sql(), "INSERT INTO t(a, b, c) VALUES($1, $2, $1)");
        assert_eq!(named.keys().len(), 2);
    }

    #[test]
    fn no_placeholders_passes_through() {
        let named = NamedSql::parse("SELECT * FROM my_schema.site ").unwrap();
        assert_eq!(named.sql(), "SELECT * FROM my_schema.site ");
        assert!(named.keys().is_empty());
    }

    #[test]
    fn double_percent_is_literal() {
        let named = NamedSql::parse("SELECT * FROM t WHERE name LIKE 'a%%' AND id=%(id)s").unwrap();
        assert_eq!(named.sql(), "SELECT * FROM t WHERE name LIKE 'a%' AND id=$1");
    }

    #[test]
    fn rejects_malformed_placeholders() {
        for bad in [
            "SELECT 1 WHERE a=%(a",
            "SELECT 1 WHERE a=%(a)d",
            "SELECT 1 WHERE a=%()s",
            "SELECT 1 WHERE a LIKE 'x%'",
            "SELECT 1 WHERE a=%s",
        ] {
            let err = NamedSql::parse(bad).unwrap_err();
            assert!(matches!(err, DbError::Validation(_)), "{bad}");
        }
    }

    #[test]
    fn bind_orders_values_by_index() {
        let named = NamedSql::parse("WHERE b=%(b)s AND a=%(a)s").unwrap();
        let params = ParamMap::new().with("a", 1).with("b", "two").with("unused", true);
        let bound = named.bind(&params).unwrap();
        assert_eq!(bound.len(), 2);
    }

    #[test]
    fn bind_missing_key_is_error() {
        let named = NamedSql::parse("WHERE id=%(id)s").unwrap();
        let err = named.bind(&ParamMap::new()).unwrap_err();
        assert!(err.to_string().contains("missing parameter 'id'"));
    }
}

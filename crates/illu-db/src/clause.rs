//! Sparse-field SQL clause builder.
//!
//! Turns ordered [`SqlParam`] descriptors into `WHERE ...` and `UPDATE ... SET ...`
//! fragments with `%(key)s` placeholders, binding every included value into a
//! caller-supplied [`ParamMap`].
//!
//! ## Omission rules
//!
//! - A descriptor without a value is skipped entirely: no term, no binding.
//! - If nothing survives, the fragment is the empty string and the mapping is untouched.
//! - An `UPDATE` with nothing to `SET` is the empty string, whatever the where side holds.
//! - An `UPDATE` whose where side collapses has no `WHERE` suffix and so touches every row.
//!   [`build_update_with`] gates that case behind a [`DangerousDmlPolicy`].
//!
//! Keys are not checked for collisions; the set side and the where side share one mapping
//! and the later binding wins. Use distinct keys (`new_name` vs `name`) when a column
//! appears on both sides.
//!
//! # Example
//!
//! ```ignore
//! use illu_db::{BoolOp, ParamMap, SqlParam, build_update};
//!
//! let mut params = ParamMap::new();
//! let sql = build_update(
//!     &mut params,
//!     "my_schema.site",
//!     &[SqlParam::new("name", new_name).key("new_name"), SqlParam::new("is_active", active)],
//!     &[SqlParam::new("id", site_id)],
//!     BoolOp::And,
//! );
//! if !sql.is_empty() {
//!     db.run(&sql, &params).await?;
//! }
//! ```

use crate::config::DangerousDmlPolicy;
use crate::error::DbResult;
use crate::param::{IntoParamValue, ParamMap, SqlParam};
use std::fmt::{self, Write};

/// Boolean operator joining `WHERE` terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn any_present(args: &[SqlParam]) -> bool {
    args.iter().any(SqlParam::is_present)
}

/// Append `col=%(key)s` for each present descriptor, separated by `sep`, and bind its value.
fn push_terms(out: &mut String, params: &mut ParamMap, args: &[SqlParam], sep: &str) {
    let mut first = true;
    for arg in args {
        let Some(value) = arg.value() else {
            continue;
        };
        if !first {
            out.push_str(sep);
        }
        first = false;
        let _ = write!(out, "{}=%({})s", arg.column(), arg.param_key());
        params.insert(arg.param_key(), value.clone());
    }
}

/// Build `WHERE <col>=%(<key>)s <op> ...` from the present descriptors.
///
/// Returns an empty string (and leaves `params` untouched) when no descriptor has a value.
pub fn build_where(params: &mut ParamMap, where_args: &[SqlParam], op: BoolOp) -> String {
    if !any_present(where_args) {
        return String::new();
    }

    let mut sql = String::from("WHERE ");
    let sep = format!(" {} ", op);
    push_terms(&mut sql, params, where_args, &sep);
    sql
}

/// Build a `WHERE` fragment from `(column, value)` pairs, using each column as its key.
///
/// Pair order is term order. The populated mapping is returned alongside the fragment so
/// the two can be executed together.
pub fn build_where_from_pairs<K, V>(
    pairs: impl IntoIterator<Item = (K, V)>,
    op: BoolOp,
) -> (String, ParamMap)
where
    K: Into<String>,
    V: IntoParamValue,
{
    let args: Vec<SqlParam> = pairs
        .into_iter()
        .map(|(column, value)| SqlParam::new(column, value))
        .collect();

    let mut params = ParamMap::new();
    let sql = build_where(&mut params, &args, op);
    (sql, params)
}

/// Build `UPDATE <table> SET <col>=%(<key>)s, ... [WHERE ...]`.
///
/// Returns an empty string (and leaves `params` untouched) when no set-side descriptor has a
/// value; callers use that to skip the statement. The `WHERE` suffix is appended only when
/// [`build_where`] yields a non-empty fragment for `where_args`.
pub fn build_update(
    params: &mut ParamMap,
    table: &str,
    set_args: &[SqlParam],
    where_args: &[SqlParam],
    op: BoolOp,
) -> String {
    if !any_present(set_args) {
        return String::new();
    }

    let mut sql = format!("UPDATE {} SET ", table);
    push_terms(&mut sql, params, set_args, ", ");

    let where_sql = build_where(params, where_args, op);
    if !where_sql.is_empty() {
        sql.push(' ');
        sql.push_str(&where_sql);
    }
    sql
}

/// [`build_update`] with the unfiltered case checked against `update_without_where`.
///
/// With [`DangerousDmlPolicy::Error`], an update whose where side collapses is rejected and
/// `params` is left untouched. `Allow` reproduces [`build_update`] exactly.
pub fn build_update_with(
    params: &mut ParamMap,
    table: &str,
    set_args: &[SqlParam],
    where_args: &[SqlParam],
    op: BoolOp,
    update_without_where: DangerousDmlPolicy,
) -> DbResult<String> {
    let mut bound = ParamMap::new();
    let sql = build_update(&mut bound, table, set_args, where_args, op);

    if !sql.is_empty() && !any_present(where_args) {
        update_without_where.check("UPDATE without WHERE", &sql)?;
    }

    params.extend_from(bound);
    Ok(sql)
}

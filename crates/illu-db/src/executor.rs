//! Named-parameter execution.
//!
//! [`Executor`] is what the store talks to: SQL with `%(key)s` placeholders plus a
//! [`ParamMap`]. Any [`GenericClient`] is an executor; the placeholders are rewritten by
//! [`NamedSql`] right before the driver call.

use crate::client::GenericClient;
use crate::error::DbResult;
use crate::named::NamedSql;
use crate::param::ParamMap;
use crate::row::{FromRow, Record};
use std::future::Future;

/// Longest SQL prefix (in bytes) written to statement logs.
const MAX_LOGGED_SQL: usize = 200;

/// Executes named-parameter SQL.
pub trait Executor: Send + Sync {
    /// Execute a statement and return the number of affected rows.
    fn run(&self, sql: &str, params: &ParamMap) -> impl Future<Output = DbResult<u64>> + Send;

    /// Fetch exactly one row.
    ///
    /// - 0 rows: [`DbError::NotFound`](crate::DbError::NotFound)
    /// - more than 1 row: [`DbError::TooManyRows`](crate::DbError::TooManyRows)
    fn one(&self, sql: &str, params: &ParamMap) -> impl Future<Output = DbResult<Record>> + Send;

    /// Fetch every row.
    fn all(
        &self,
        sql: &str,
        params: &ParamMap,
    ) -> impl Future<Output = DbResult<Vec<Record>>> + Send;
}

fn truncate_sql(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn log_statement(kind: &'static str, named: &NamedSql, params: &ParamMap) {
    let sql = named.sql();
    let truncated = truncate_sql(sql, MAX_LOGGED_SQL);
    tracing::debug!(
        target: "illu_db.sql",
        kind,
        param_count = named.keys().len(),
        bound = params.len(),
        truncated = truncated.len() < sql.len(),
        sql = %truncated,
    );
}

impl<C: GenericClient> Executor for C {
    async fn run(&self, sql: &str, params: &ParamMap) -> DbResult<u64> {
        let named = NamedSql::parse(sql)?;
        let bound = named.bind(params)?;
        log_statement("run", &named, params);
        self.execute(named.sql(), &bound).await
    }

    async fn one(&self, sql: &str, params: &ParamMap) -> DbResult<Record> {
        let named = NamedSql::parse(sql)?;
        let bound = named.bind(params)?;
        log_statement("one", &named, params);
        let row = self.query_one_strict(named.sql(), &bound).await?;
        Record::from_row(&row)
    }

    async fn all(&self, sql: &str, params: &ParamMap) -> DbResult<Vec<Record>> {
        let named = NamedSql::parse(sql)?;
        let bound = named.bind(params)?;
        log_statement("all", &named, params);
        let rows = self.query(named.sql(), &bound).await?;
        rows.iter().map(Record::from_row).collect()
    }
}

// ===== deadpool-postgres support =====

/// One pooled connection per call; the connection returns to the pool when the call ends.
#[cfg(feature = "pool")]
impl Executor for deadpool_postgres::Pool {
    async fn run(&self, sql: &str, params: &ParamMap) -> DbResult<u64> {
        let client = self.get().await?;
        Executor::run(&client, sql, params).await
    }

    async fn one(&self, sql: &str, params: &ParamMap) -> DbResult<Record> {
        let client = self.get().await?;
        Executor::one(&client, sql, params).await
    }

    async fn all(&self, sql: &str, params: &ParamMap) -> DbResult<Vec<Record>> {
        let client = self.get().await?;
        Executor::all(&client, sql, params).await
    }
}

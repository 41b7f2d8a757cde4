//! The data-access handle.
//!
//! A [`Store`] pairs an [`Executor`] with the [`SqlPolicy`] that guards unfiltered writes.
//! Entity operations live in [`crate::org`], [`crate::site`] and [`crate::user`] as
//! `impl<E: Executor> Store<E>` blocks.

use crate::config::SqlPolicy;
use crate::error::DbResult;
use crate::executor::Executor;
use crate::param::ParamMap;
use crate::row::FromRecord;

#[derive(Debug, Clone)]
pub struct Store<E> {
    executor: E,
    policy: SqlPolicy,
}

impl<E: Executor> Store<E> {
    /// Store with the default policy (unfiltered writes allowed).
    pub fn new(executor: E) -> Self {
        Self::with_policy(executor, SqlPolicy::default())
    }

    pub fn with_policy(executor: E, policy: SqlPolicy) -> Self {
        Self { executor, policy }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn policy(&self) -> &SqlPolicy {
        &self.policy
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Fetch exactly one row and map it.
    pub(crate) async fn fetch_one<T: FromRecord>(
        &self,
        sql: &str,
        params: &ParamMap,
    ) -> DbResult<T> {
        let record = self.executor.one(sql, params).await?;
        T::from_record(&record)
    }

    /// Fetch every row and map each one.
    pub(crate) async fn fetch_all<T: FromRecord>(
        &self,
        sql: &str,
        params: &ParamMap,
    ) -> DbResult<Vec<T>> {
        let records = self.executor.all(sql, params).await?;
        records.iter().map(T::from_record).collect()
    }

    /// Run `insert`, then fetch the created row with `select`.
    ///
    /// A unique violation on insert yields `Ok(None)`; every other failure propagates.
    pub(crate) async fn insert_then_fetch<T: FromRecord>(
        &self,
        entity: &'static str,
        insert: &str,
        select: &str,
        params: &ParamMap,
    ) -> DbResult<Option<T>> {
        match self.executor.run(insert, params).await {
            Ok(_) => {}
            Err(e) if e.is_unique_violation() => {
                tracing::debug!(target: "illu_db", entity, error = %e, "already exists");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        self.fetch_one(select, params).await.map(Some)
    }
}

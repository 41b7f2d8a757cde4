//! Recording executor for store tests.

use crate::error::{DbError, DbResult};
use crate::executor::Executor;
use crate::param::ParamMap;
use crate::row::Record;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted reply for the next call.
pub(crate) enum Reply {
    Affected(u64),
    Rows(Vec<Record>),
    Fail(DbError),
}

/// Records every call and answers from a queue of [`Reply`]s.
///
/// With the queue empty, `run` reports 1 affected row and `one`/`all` see no rows.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    calls: Mutex<Vec<(String, ParamMap)>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl FakeExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, ParamMap)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, params: &ParamMap) -> Option<Reply> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.clone()));
        self.replies.lock().unwrap().pop_front()
    }
}

impl Executor for FakeExecutor {
    async fn run(&self, sql: &str, params: &ParamMap) -> DbResult<u64> {
        match self.record(sql, params) {
            None => Ok(1),
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Rows(rows)) => Ok(rows.len() as u64),
            Some(Reply::Fail(e)) => Err(e),
        }
    }

    async fn one(&self, sql: &str, params: &ParamMap) -> DbResult<Record> {
        let rows = match self.record(sql, params) {
            None | Some(Reply::Affected(_)) => Vec::new(),
            Some(Reply::Rows(rows)) => rows,
            Some(Reply::Fail(e)) => return Err(e),
        };
        match rows.len() {
            0 => Err(DbError::not_found("Expected 1 row, got 0")),
            1 => Ok(rows.into_iter().next().unwrap()),
            n => Err(DbError::too_many_rows(1, n)),
        }
    }

    async fn all(&self, sql: &str, params: &ParamMap) -> DbResult<Vec<Record>> {
        match self.record(sql, params) {
            None | Some(Reply::Affected(_)) => Ok(Vec::new()),
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(e)) => Err(e),
        }
    }
}

//! Organizations (`my_schema.organization`).

use crate::error::DbResult;
use crate::executor::Executor;
use crate::param::ParamMap;
use crate::row::{FromRecord, Record};
use crate::store::Store;
use serde::Serialize;

pub const ORG_TABLE: &str = "my_schema.organization";

const INSERT_ORG: &str = "INSERT INTO my_schema.organization(org_name) VALUES(%(org_name)s)";
const SELECT_ORG_BY_NAME: &str = "SELECT * FROM my_schema.organization WHERE org_name=%(org_name)s";
const DELETE_ORG_BY_NAME: &str = "DELETE FROM my_schema.organization WHERE org_name=%(org_name)s";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub id: i64,
    pub org_name: String,
}

impl FromRecord for Organization {
    fn from_record(record: &Record) -> DbResult<Self> {
        Ok(Self {
            id: record.try_get("id")?,
            org_name: record.try_get("org_name")?,
        })
    }
}

impl<E: Executor> Store<E> {
    /// Create an organization and return the stored row.
    ///
    /// Returns `Ok(None)` when an organization with that name already exists.
    pub async fn create_org(&self, name: &str) -> DbResult<Option<Organization>> {
        let params = ParamMap::new().with("org_name", name);
        self.insert_then_fetch("organization", INSERT_ORG, SELECT_ORG_BY_NAME, &params)
            .await
    }

    /// Delete the organization named `name`, returning the number of rows removed.
    pub async fn delete_org(&self, name: &str) -> DbResult<u64> {
        let params = ParamMap::new().with("org_name", name);
        self.executor().run(DELETE_ORG_BY_NAME, &params).await
    }
}

//! Sites (`my_schema.site`), each owned by an organization.

use crate::clause::{BoolOp, build_update_with, build_where_from_pairs};
use crate::error::DbResult;
use crate::executor::Executor;
use crate::param::{ParamMap, SqlParam};
use crate::row::{FromRecord, Record};
use crate::store::Store;
use crate::value::SqlValue;
use serde::Serialize;

pub const SITE_TABLE: &str = "my_schema.site";

const INSERT_SITE: &str = "INSERT INTO my_schema.site(name, org_id, is_active) \
                           VALUES(%(name)s, %(org_id)s, %(is_active)s)";
const SELECT_SITE_BY_NAME_AND_ORG: &str =
    "SELECT * FROM my_schema.site WHERE name=%(name)s AND org_id=%(org_id)s";
const SELECT_SITES: &str = "SELECT * FROM my_schema.site ";
const DELETE_SITES: &str = "DELETE FROM my_schema.site ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub org_id: i64,
    pub is_active: bool,
}

impl FromRecord for Site {
    fn from_record(record: &Record) -> DbResult<Self> {
        Ok(Self {
            id: record.try_get("id")?,
            name: record.try_get("name")?,
            org_id: record.try_get("org_id")?,
            is_active: record.try_get("is_active")?,
        })
    }
}

/// Optional equality filters, combined with `AND`. The default matches every site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub org_id: Option<i64>,
    pub is_active: Option<bool>,
}

impl SiteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn org_id(mut self, org_id: i64) -> Self {
        self.org_id = Some(org_id);
        self
    }

    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    fn pairs(&self) -> [(&'static str, Option<SqlValue>); 4] {
        [
            ("id", self.id.map(SqlValue::from)),
            ("name", self.name.as_deref().map(SqlValue::from)),
            ("org_id", self.org_id.map(SqlValue::from)),
            ("is_active", self.is_active.map(SqlValue::from)),
        ]
    }
}

/// Columns to change on matching sites; `None` leaves a column as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteChanges {
    pub new_name: Option<String>,
    pub org_id: Option<i64>,
    pub is_active: Option<bool>,
}

impl SiteChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_name(mut self, name: impl Into<String>) -> Self {
        self.new_name = Some(name.into());
        self
    }

    pub fn org_id(mut self, org_id: i64) -> Self {
        self.org_id = Some(org_id);
        self
    }

    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.new_name.is_none() && self.org_id.is_none() && self.is_active.is_none()
    }
}

impl<E: Executor> Store<E> {
    /// Create an active site under `org_id` and return the stored row.
    ///
    /// Returns `Ok(None)` when the organization already has a site with that name.
    pub async fn create_site(&self, name: &str, org_id: i64) -> DbResult<Option<Site>> {
        let params = ParamMap::new()
            .with("name", name)
            .with("org_id", org_id)
            .with("is_active", true);
        self.insert_then_fetch("site", INSERT_SITE, SELECT_SITE_BY_NAME_AND_ORG, &params)
            .await
    }

    /// All sites matching every filter that is set.
    pub async fn get_sites(&self, filter: &SiteFilter) -> DbResult<Vec<Site>> {
        let (where_sql, params) = build_where_from_pairs(filter.pairs(), BoolOp::And);
        self.fetch_all(&format!("{SELECT_SITES}{where_sql}"), &params)
            .await
    }

    /// Apply `changes` to the sites matching `id` and `name`.
    ///
    /// No statement is issued when `changes` sets nothing; the result is then 0. With neither
    /// `id` nor `name` the update touches every site, subject to
    /// [`SqlPolicy::update_without_where`](crate::SqlPolicy).
    pub async fn update_site(
        &self,
        id: Option<i64>,
        name: Option<&str>,
        changes: &SiteChanges,
    ) -> DbResult<u64> {
        let set_args = [
            SqlParam::new("name", changes.new_name.as_deref()).key("new_name"),
            SqlParam::new("org_id", changes.org_id),
            SqlParam::new("is_active", changes.is_active),
        ];
        let where_args = [
            SqlParam::new("id", id),
            SqlParam::new("name", name).key("old_site_name"),
        ];

        let mut params = ParamMap::new();
        let sql = build_update_with(
            &mut params,
            SITE_TABLE,
            &set_args,
            &where_args,
            BoolOp::And,
            self.policy().update_without_where,
        )?;
        if sql.is_empty() {
            tracing::debug!(target: "illu_db", table = SITE_TABLE, "nothing to update");
            return Ok(0);
        }
        self.executor().run(&sql, &params).await
    }

    /// Delete the sites matching `id` and `name`.
    ///
    /// With neither set every site is deleted, subject to
    /// [`SqlPolicy::delete_without_where`](crate::SqlPolicy).
    pub async fn delete_site(&self, id: Option<i64>, name: Option<&str>) -> DbResult<u64> {
        let (where_sql, params) = build_where_from_pairs(
            [
                ("id", id.map(SqlValue::from)),
                ("name", name.map(SqlValue::from)),
            ],
            BoolOp::And,
        );
        let sql = format!("{DELETE_SITES}{where_sql}");
        if where_sql.is_empty() {
            self.policy()
                .delete_without_where
                .check("DELETE without WHERE", &sql)?;
        }
        self.executor().run(&sql, &params).await
    }
}

//! Users (`my_schema.illu_user`), identified by phone prefix and phone number.
//!
//! Reads only ever return the non-secret columns; `pw_hash` and `jwt` are write-only here.

use crate::clause::{BoolOp, build_update_with, build_where_from_pairs};
use crate::error::DbResult;
use crate::executor::Executor;
use crate::param::{ParamMap, SqlParam};
use crate::row::{FromRecord, Record};
use crate::store::Store;
use crate::value::SqlValue;
use serde::Serialize;

pub const USER_TABLE: &str = "my_schema.illu_user";

/// Non-secret user columns.
const SELECT_USER: &str =
    "SELECT id, phone_prefix, phone, user_name, org_id FROM my_schema.illu_user ";

const INSERT_USER: &str = "INSERT INTO my_schema.illu_user(\
                           phone_prefix, phone, user_name, pw_hash, jwt, org_id) \
                           VALUES(%(phone_prefix)s, %(phone)s, %(user_name)s, \
                           %(pw_hash)s, %(jwt)s, %(org_id)s)";
const BY_PHONE: &str = "WHERE phone_prefix=%(phone_prefix)s AND phone=%(phone)s";
const DELETE_USER: &str = "DELETE FROM my_schema.illu_user \
                           WHERE phone_prefix=%(phone_prefix)s AND phone=%(phone)s";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub phone_prefix: String,
    pub phone: String,
    pub user_name: String,
    pub org_id: Option<i64>,
}

impl FromRecord for User {
    fn from_record(record: &Record) -> DbResult<Self> {
        Ok(Self {
            id: record.try_get("id")?,
            phone_prefix: record.try_get("phone_prefix")?,
            phone: record.try_get("phone")?,
            user_name: record.try_get("user_name")?,
            org_id: record.try_get("org_id")?,
        })
    }
}

/// Input for [`Store::create_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub phone_prefix: String,
    pub phone: String,
    pub user_name: String,
    pub pw_hash: String,
    pub jwt: Option<String>,
    pub org_id: Option<i64>,
}

impl NewUser {
    pub fn new(
        phone_prefix: impl Into<String>,
        phone: impl Into<String>,
        user_name: impl Into<String>,
        pw_hash: impl Into<String>,
    ) -> Self {
        Self {
            phone_prefix: phone_prefix.into(),
            phone: phone.into(),
            user_name: user_name.into(),
            pw_hash: pw_hash.into(),
            jwt: None,
            org_id: None,
        }
    }

    pub fn jwt(mut self, jwt: impl Into<String>) -> Self {
        self.jwt = Some(jwt.into());
        self
    }

    pub fn org_id(mut self, org_id: i64) -> Self {
        self.org_id = Some(org_id);
        self
    }

    /// Every column is bound; unset optional columns are stored as NULL.
    fn params(&self) -> ParamMap {
        ParamMap::new()
            .with("phone_prefix", self.phone_prefix.as_str())
            .with("phone", self.phone.as_str())
            .with("user_name", self.user_name.as_str())
            .with("pw_hash", self.pw_hash.as_str())
            .with("jwt", self.jwt.as_deref())
            .with("org_id", self.org_id)
    }
}

/// Optional equality filters, combined with `AND`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub id: Option<i64>,
    pub phone_prefix: Option<String>,
    pub phone: Option<String>,
    pub user_name: Option<String>,
    pub org_id: Option<i64>,
}

impl UserFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn phone(mut self, phone_prefix: impl Into<String>, phone: impl Into<String>) -> Self {
        self.phone_prefix = Some(phone_prefix.into());
        self.phone = Some(phone.into());
        self
    }

    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn org_id(mut self, org_id: i64) -> Self {
        self.org_id = Some(org_id);
        self
    }

    fn pairs(&self) -> [(&'static str, Option<SqlValue>); 5] {
        [
            ("id", self.id.map(SqlValue::from)),
            ("phone_prefix", self.phone_prefix.as_deref().map(SqlValue::from)),
            ("phone", self.phone.as_deref().map(SqlValue::from)),
            ("user_name", self.user_name.as_deref().map(SqlValue::from)),
            ("org_id", self.org_id.map(SqlValue::from)),
        ]
    }
}

/// Columns to change on a user; `None` leaves a column as it is.
///
/// `org_id` cannot be cleared back to NULL through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub new_phone_prefix: Option<String>,
    pub new_phone: Option<String>,
    pub user_name: Option<String>,
    pub pw_hash: Option<String>,
    pub jwt: Option<String>,
    pub org_id: Option<i64>,
}

impl UserChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_phone(mut self, phone_prefix: impl Into<String>, phone: impl Into<String>) -> Self {
        self.new_phone_prefix = Some(phone_prefix.into());
        self.new_phone = Some(phone.into());
        self
    }

    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn pw_hash(mut self, pw_hash: impl Into<String>) -> Self {
        self.pw_hash = Some(pw_hash.into());
        self
    }

    pub fn jwt(mut self, jwt: impl Into<String>) -> Self {
        self.jwt = Some(jwt.into());
        self
    }

    pub fn org_id(mut self, org_id: i64) -> Self {
        self.org_id = Some(org_id);
        self
    }
}

impl<E: Executor> Store<E> {
    /// Create a user and return its non-secret columns.
    ///
    /// Returns `Ok(None)` when the phone number is already registered.
    pub async fn create_user(&self, user: &NewUser) -> DbResult<Option<User>> {
        let select = format!("{SELECT_USER}{BY_PHONE}");
        self.insert_then_fetch("user", INSERT_USER, &select, &user.params())
            .await
    }

    /// All users matching every filter that is set.
    pub async fn get_users(&self, filter: &UserFilter) -> DbResult<Vec<User>> {
        let (where_sql, params) = build_where_from_pairs(filter.pairs(), BoolOp::And);
        self.fetch_all(&format!("{SELECT_USER}{where_sql}"), &params)
            .await
    }

    /// Apply `changes` to the user with this phone number.
    ///
    /// Returns the number of rows updated; no statement is issued when `changes` sets nothing.
    pub async fn update_user(
        &self,
        phone_prefix: &str,
        phone: &str,
        changes: &UserChanges,
    ) -> DbResult<u64> {
        let set_args = [
            SqlParam::new("phone_prefix", changes.new_phone_prefix.as_deref())
                .key("new_phone_prefix"),
            SqlParam::new("phone", changes.new_phone.as_deref()),
            SqlParam::new("user_name", changes.user_name.as_deref()),
            SqlParam::new("pw_hash", changes.pw_hash.as_deref()),
            SqlParam::new("jwt", changes.jwt.as_deref()),
            SqlParam::new("org_id", changes.org_id),
        ];
        let where_args = [
            SqlParam::new("phone_prefix", phone_prefix).key("old_phone_prefix"),
            SqlParam::new("phone", phone).key("old_phone"),
        ];

        let mut params = ParamMap::new();
        let sql = build_update_with(
            &mut params,
            USER_TABLE,
            &set_args,
            &where_args,
            BoolOp::And,
            self.policy().update_without_where,
        )?;
        if sql.is_empty() {
            tracing::debug!(target: "illu_db", table = USER_TABLE, "nothing to update");
            return Ok(0);
        }
        self.executor().run(&sql, &params).await
    }

    /// Delete the user with this phone number.
    pub async fn delete_user(&self, phone_prefix: &str, phone: &str) -> DbResult<u64> {
        let params = ParamMap::new()
            .with("phone_prefix", phone_prefix)
            .with("phone", phone);
        self.executor().run(DELETE_USER, &params).await
    }
}

#[cfg(test)]
mod tests;

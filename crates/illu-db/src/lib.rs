//! # illu-db
//!
//! Postgres data access for organizations, sites and users.
//!
//! ## Features
//!
//! - **Sparse-field clauses**: `WHERE` / `UPDATE ... SET` fragments built only from the
//!   fields that were actually supplied ([`clause`])
//! - **Named parameters**: SQL is written with `%(key)s` placeholders and a [`ParamMap`];
//!   values are always bound, never spliced into SQL text
//! - **Injected handle**: a [`Store`] wraps any [`Executor`] (pool, client or transaction)
//! - **Write guards**: unfiltered `UPDATE` / `DELETE` can be allowed, logged or rejected
//!   ([`SqlPolicy`])
//!
//! ## Clause builder
//!
//! ```ignore
//! use illu_db::{BoolOp, ParamMap, SqlParam, build_update, build_where};
//!
//! let mut params = ParamMap::new();
//! let where_sql = build_where(
//!     &mut params,
//!     &[SqlParam::new("org_id", Some(1)), SqlParam::new("is_active", None::<bool>)],
//!     BoolOp::And,
//! );
//! assert_eq!(where_sql, "WHERE org_id=%(org_id)s");
//! ```
//!
//! ## Store
//!
//! ```ignore
//! use illu_db::{DbConfig, SiteChanges, Store, create_pool};
//!
//! let config = DbConfig::from_env()?;
//! let store = Store::with_policy(create_pool(&config)?, config.policy.clone());
//!
//! let org = store.create_org("acme").await?;
//! store.update_site(Some(3), None, &SiteChanges::new().is_active(false)).await?;
//! ```

pub mod clause;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod named;
pub mod org;
pub mod param;
pub mod row;
pub mod site;
pub mod store;
pub mod user;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(test)]
mod testing;

pub use clause::{BoolOp, build_update, build_update_with, build_where, build_where_from_pairs};
pub use client::GenericClient;
pub use config::{DangerousDmlPolicy, DbConfig, SqlPolicy};
pub use error::{DbError, DbResult};
pub use executor::Executor;
pub use named::NamedSql;
pub use org::Organization;
pub use param::{IntoParamValue, ParamMap, SqlParam};
pub use row::{FromRecord, FromRow, FromSqlValue, Record};
pub use site::{Site, SiteChanges, SiteFilter};
pub use store::Store;
pub use user::{NewUser, User, UserChanges, UserFilter};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_tls};

//! Connection and SQL policy configuration.
//!
//! Configuration comes either from the environment (with `.env` support):
//!
//! - `LOCAL_PG_CONN` (falls back to `DATABASE_URL`): connection URL, required
//! - `ILLU_DB_MAX_POOL_SIZE`: pool size, default 16
//! - `ILLU_DB_ALLOW_UNFILTERED_UPDATE`: `true`/`false`, default `true`
//!
//! or from a TOML file, where `${VAR}` references are expanded:
//!
//! ```toml
//! url = "${LOCAL_PG_CONN}"
//! max_pool_size = 8
//!
//! [policy]
//! update_without_where = "error"
//! delete_without_where = "warn"
//! ```

use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::path::Path;

pub const CONN_ENV: &str = "LOCAL_PG_CONN";
pub const FALLBACK_CONN_ENV: &str = "DATABASE_URL";
pub const MAX_POOL_SIZE_ENV: &str = "ILLU_DB_MAX_POOL_SIZE";
pub const ALLOW_UNFILTERED_UPDATE_ENV: &str = "ILLU_DB_ALLOW_UNFILTERED_UPDATE";

const DEFAULT_MAX_POOL_SIZE: usize = 16;

/// What to do with a statement that would touch every row of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerousDmlPolicy {
    #[default]
    Allow,
    Warn,
    Error,
}

impl DangerousDmlPolicy {
    /// Apply the policy to `sql`, which has already been found to break `rule`.
    pub fn check(self, rule: &str, sql: &str) -> DbResult<()> {
        match self {
            DangerousDmlPolicy::Allow => Ok(()),
            DangerousDmlPolicy::Warn => {
                tracing::warn!(target: "illu_db", rule, sql, "SQL policy");
                Ok(())
            }
            DangerousDmlPolicy::Error => Err(DbError::validation(format!(
                "SQL policy violation: {rule}: {sql}"
            ))),
        }
    }
}

/// Runtime guards for unfiltered writes. Both default to `Allow`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SqlPolicy {
    #[serde(default)]
    pub update_without_where: DangerousDmlPolicy,
    #[serde(default)]
    pub delete_without_where: DangerousDmlPolicy,
}

impl SqlPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure how UPDATE without WHERE is handled.
    pub fn update_without_where(mut self, policy: DangerousDmlPolicy) -> Self {
        self.update_without_where = policy;
        self
    }

    /// Configure how DELETE without WHERE is handled.
    pub fn delete_without_where(mut self, policy: DangerousDmlPolicy) -> Self {
        self.delete_without_where = policy;
        self
    }

    /// Shorthand for `update_without_where(Allow | Error)`.
    pub fn allow_unfiltered_update(self, allow: bool) -> Self {
        self.update_without_where(if allow {
            DangerousDmlPolicy::Allow
        } else {
            DangerousDmlPolicy::Error
        })
    }
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbConfig {
    pub url: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,
    #[serde(default)]
    pub policy: SqlPolicy,
}

fn default_max_pool_size() -> usize {
    DEFAULT_MAX_POOL_SIZE
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            policy: SqlPolicy::default(),
        }
    }

    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    pub fn policy(mut self, policy: SqlPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> DbResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let url = lookup(CONN_ENV)
            .or_else(|| lookup(FALLBACK_CONN_ENV))
            .ok_or_else(|| {
                DbError::config(format!("{CONN_ENV} (or {FALLBACK_CONN_ENV}) is not set"))
            })?;

        let mut config = Self::new(url);

        if let Some(raw) = lookup(MAX_POOL_SIZE_ENV) {
            config.max_pool_size = raw.trim().parse().map_err(|_| {
                DbError::config(format!("{MAX_POOL_SIZE_ENV} must be a positive integer, got '{raw}'"))
            })?;
        }

        if let Some(raw) = lookup(ALLOW_UNFILTERED_UPDATE_ENV) {
            let allow = parse_bool(&raw).ok_or_else(|| {
                DbError::config(format!("{ALLOW_UNFILTERED_UPDATE_ENV} must be true or false, got '{raw}'"))
            })?;
            config.policy = config.policy.allow_unfiltered_update(allow);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML, expanding `${VAR}` references from the process environment.
    pub fn from_toml_str(raw: &str) -> DbResult<Self> {
        Self::parse_toml(raw, |key| std::env::var(key).ok())
    }

    pub(crate) fn parse_toml(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let mut config: DbConfig = toml::from_str(raw)
            .map_err(|e| DbError::config(format!("failed to parse config: {e}")))?;
        config.url = expand_env_vars(&config.url, &lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DbResult<()> {
        if self.url.trim().is_empty() {
            return Err(DbError::config("url must not be empty"));
        }
        if self.max_pool_size == 0 {
            return Err(DbError::config("max_pool_size must be greater than 0"));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> DbResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(DbError::config(format!(
                    "unterminated env var reference: ${{{key}}}"
                )));
            }
            if key.is_empty() {
                return Err(DbError::config("invalid env var reference: ${}"));
            }

            let v = lookup(&key).ok_or_else(|| {
                DbError::config(format!("missing env var for config expansion: {key}"))
            })?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn env_defaults() {
        let config = DbConfig::from_lookup(env(&[(CONN_ENV, "postgres://localhost/illu")])).unwrap();
        assert_eq!(config.url, "postgres://localhost/illu");
        assert_eq!(config.max_pool_size, DEFAULT_MAX_POOL_SIZE);
        assert_eq!(config.policy.update_without_where, DangerousDmlPolicy::Allow);
    }

    #[test]
    fn env_falls_back_to_database_url() {
        let config =
            DbConfig::from_lookup(env(&[(FALLBACK_CONN_ENV, "postgres://db/fallback")])).unwrap();
        assert_eq!(config.url, "postgres://db/fallback");
    }

    #[test]
    fn env_missing_url_is_config_error() {
        let err = DbConfig::from_lookup(env(&[])).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn env_overrides() {
        let config = DbConfig::from_lookup(env(&[
            (CONN_ENV, "postgres://localhost/illu"),
            (MAX_POOL_SIZE_ENV, "4"),
            (ALLOW_UNFILTERED_UPDATE_ENV, "false"),
        ]))
        .unwrap();
        assert_eq!(config.max_pool_size, 4);
        assert_eq!(config.policy.update_without_where, DangerousDmlPolicy::Error);
    }

    #[test]
    fn env_rejects_bad_values() {
        assert!(DbConfig::from_lookup(env(&[(CONN_ENV, "x"), (MAX_POOL_SIZE_ENV, "many")])).is_err());
        assert!(DbConfig::from_lookup(env(&[(CONN_ENV, "x"), (MAX_POOL_SIZE_ENV, "0")])).is_err());
        assert!(
            DbConfig::from_lookup(env(&[(CONN_ENV, "x"), (ALLOW_UNFILTERED_UPDATE_ENV, "maybe")]))
                .is_err()
        );
    }

    #[test]
    fn toml_with_policy_and_expansion() {
        let raw = r#"
            url = "postgres://${PG_USER}@localhost/illu"
            max_pool_size = 8

            [policy]
            update_without_where = "error"
            delete_without_where = "warn"
        "#;
        let config = DbConfig::parse_toml(raw, env(&[("PG_USER", "illu")])).unwrap();
        assert_eq!(config.url, "postgres://illu@localhost/illu");
        assert_eq!(config.max_pool_size, 8);
        assert_eq!(
            config.policy,
            SqlPolicy::new()
                .update_without_where(DangerousDmlPolicy::Error)
                .delete_without_where(DangerousDmlPolicy::Warn)
        );
    }

    #[test]
    fn toml_defaults() {
        let config = DbConfig::parse_toml(r#"url = "postgres://localhost/illu""#, env(&[])).unwrap();
        assert_eq!(config, DbConfig::new("postgres://localhost/illu"));
    }

    #[test]
    fn toml_expansion_errors() {
        assert!(DbConfig::parse_toml(r#"url = "${MISSING}""#, env(&[])).is_err());
        assert!(DbConfig::parse_toml(r#"url = "${OPEN""#, env(&[])).is_err());
        assert!(DbConfig::parse_toml(r#"url = "${}""#, env(&[])).is_err());
    }

    #[test]
    fn policy_check() {
        assert!(DangerousDmlPolicy::Allow.check("rule", "UPDATE t SET a=1").is_ok());
        assert!(DangerousDmlPolicy::Warn.check("rule", "UPDATE t SET a=1").is_ok());
        assert!(DangerousDmlPolicy::Error.check("rule", "UPDATE t SET a=1").is_err());
    }
}

//! Scalar values bound into queries and decoded from rows.
//!
//! [`SqlValue`] is the value half of a parameter binding. A deliberate SQL `NULL` is
//! [`SqlValue::Null`]; a field that was simply not supplied is represented one level up as
//! `Option<SqlValue>::None` (see [`crate::param::SqlParam`]).

use bytes::BytesMut;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, WrongType};

/// A dynamically typed scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short name of the variant, used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(v) => write!(f, "{v}"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Text(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v.into())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

// None binds as SQL NULL. This is for INSERT columns that are nullable; the clause
// builder's "absent" semantics live on `SqlParam`, not here.
impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

// ─── ToSql / FromSql ────────────────────────────────────────────────────────

fn wrong_type<T>(ty: &Type) -> Box<dyn Error + Sync + Send> {
    Box::new(WrongType::new::<T>(ty.clone()))
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(v) => match *ty {
                Type::BOOL => v.to_sql(ty, out),
                _ => Err(wrong_type::<bool>(ty)),
            },
            // Postgres infers the narrowest column type for `$n`; narrow with a range check.
            SqlValue::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::INT8 => v.to_sql(ty, out),
                _ => Err(wrong_type::<i64>(ty)),
            },
            SqlValue::Float(v) => match *ty {
                Type::FLOAT4 => {
                    if v.is_finite() && !(f64::from(f32::MIN)..=f64::from(f32::MAX)).contains(v) {
                        return Err(format!("{v} out of range for FLOAT4").into());
                    }
                    (*v as f32).to_sql(ty, out)
                }
                Type::FLOAT8 => v.to_sql(ty, out),
                _ => Err(wrong_type::<f64>(ty)),
            },
            SqlValue::Text(v) => {
                if !<String as ToSql>::accepts(ty) {
                    return Err(wrong_type::<String>(ty));
                }
                v.to_sql(ty, out)
            }
        }
    }

    // The variant decides compatibility, so the real check happens in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

impl<'a> FromSql<'a> for SqlValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        match *ty {
            Type::BOOL => Ok(SqlValue::Bool(bool::from_sql(ty, raw)?)),
            Type::INT2 => Ok(SqlValue::Int(i16::from_sql(ty, raw)?.into())),
            Type::INT4 => Ok(SqlValue::Int(i32::from_sql(ty, raw)?.into())),
            Type::INT8 => Ok(SqlValue::Int(i64::from_sql(ty, raw)?)),
            Type::FLOAT4 => Ok(SqlValue::Float(f32::from_sql(ty, raw)?.into())),
            Type::FLOAT8 => Ok(SqlValue::Float(f64::from_sql(ty, raw)?)),
            _ if <String as FromSql<'_>>::accepts(ty) => {
                Ok(SqlValue::Text(String::from_sql(ty, raw)?))
            }
            _ => Err(format!("unsupported column type: {}", ty).into()),
        }
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(SqlValue::Null)
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL | Type::INT2 | Type::INT4 | Type::INT8 | Type::FLOAT4 | Type::FLOAT8
        ) || <String as FromSql<'_>>::accepts(ty)
    }
}

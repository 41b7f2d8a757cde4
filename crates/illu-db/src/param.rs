//! Parameter descriptors and the named parameter mapping they populate.

use crate::value::SqlValue;
use std::collections::BTreeMap;

/// Conversion into a descriptor value, where `None` means "not supplied".
///
/// Implemented for every scalar [`SqlValue`] converts from, and for `Option` of those.
/// Use [`SqlValue::Null`] when the intent is to bind an actual SQL `NULL`.
pub trait IntoParamValue {
    fn into_param_value(self) -> Option<SqlValue>;
}

macro_rules! impl_into_param_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoParamValue for $ty {
                fn into_param_value(self) -> Option<SqlValue> {
                    Some(SqlValue::from(self))
                }
            }
        )*
    };
}

impl_into_param_value!(bool, i16, i32, i64, f32, f64, String, &String, &str);

impl IntoParamValue for SqlValue {
    fn into_param_value(self) -> Option<SqlValue> {
        Some(self)
    }
}

impl<T: IntoParamValue> IntoParamValue for Option<T> {
    fn into_param_value(self) -> Option<SqlValue> {
        self.and_then(IntoParamValue::into_param_value)
    }
}

/// One `column = %(key)s` term: a column, an optional value and the placeholder key.
///
/// The column is emitted verbatim; it is never escaped, so it must come from code, not input.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParam {
    column: String,
    value: Option<SqlValue>,
    key: String,
}

impl SqlParam {
    /// Create a descriptor whose parameter key is the column name.
    pub fn new(column: impl Into<String>, value: impl IntoParamValue) -> Self {
        let column = column.into();
        Self {
            key: column.clone(),
            value: value.into_param_value(),
            column,
        }
    }

    /// Create a descriptor with no value; builders skip it.
    pub fn absent(column: impl Into<String>) -> Self {
        Self::new(column, None::<SqlValue>)
    }

    /// Override the parameter key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn param_key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&SqlValue> {
        self.value.as_ref()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Named parameter bindings: placeholder key → value.
///
/// Inserting an existing key replaces the previous value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    values: BTreeMap<String, SqlValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `value`, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<SqlValue>,
    ) -> Option<SqlValue> {
        self.values.insert(key.into(), value.into())
    }

    /// Chainable [`ParamMap::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every binding of `other` into `self` (last write wins).
    pub fn extend_from(&mut self, other: ParamMap) {
        self.values.extend(other.values);
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

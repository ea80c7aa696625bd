//! Typed statement parameters
//!
//! A [`SqlValue`] carries the PostgreSQL type a parameter binds as. The type
//! comes from the Rust value it was built from, never from what a string
//! happens to contain: `"550e8400-e29b-41d4-a716-446655440000"` binds as
//! `text`, while a [`Uuid`] binds as `uuid`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Untyped null, bound as a null `text`
    Null,

    Bool(bool),

    /// 32-bit signed integer (integer)
    I32(i32),

    /// 64-bit signed integer (bigint)
    I64(i64),

    /// Double precision float
    F64(f64),

    Text(String),

    Uuid(Uuid),

    /// Timestamp with time zone
    Timestamp(DateTime<Utc>),

    /// Arrays and objects, bound as `jsonb`
    Json(serde_json::Value),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// The text of a `Text` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// PostgreSQL type name the value binds as
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "text",
            SqlValue::Bool(_) => "boolean",
            SqlValue::I32(_) => "integer",
            SqlValue::I64(_) => "bigint",
            SqlValue::F64(_) => "double precision",
            SqlValue::Text(_) => "text",
            SqlValue::Uuid(_) => "uuid",
            SqlValue::Timestamp(_) => "timestamptz",
            SqlValue::Json(_) => "jsonb",
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I32,
    i16 => I32,
    i32 => I32,
    u8 => I32,
    u16 => I32,
    i64 => I64,
    u32 => I64,
    f32 => F64,
    f64 => F64,
    String => Text,
    &str => Text,
    Uuid => Uuid,
    DateTime<Utc> => Timestamp,
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<&Uuid> for SqlValue {
    fn from(value: &Uuid) -> Self {
        SqlValue::Uuid(*value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// JSON scalars map by their JSON type; arrays and objects stay JSON
impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    SqlValue::F64(f)
                } else {
                    SqlValue::Text(n.to_string())
                }
            }
            Value::String(s) => SqlValue::Text(s),
            other => SqlValue::Json(other),
        }
    }
}

//! Native value types held by model slots.
//!
//! The [`Value`] enum is what fields produce on import and consume on
//! export. Raw input (JSON, BSON, hand-built maps) is first lifted into a
//! `Value` through the `From` impls below, and each field then coerces it
//! into its own native variant.

use std::fmt::{self, Write as _};

use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use tbone_core::{ConversionError, ConversionResult, SETTINGS};
use uuid::Uuid;

use crate::fields::{DbRef, RefDict};
use crate::model::Model;

/// A native value stored in a model slot.
///
/// # Examples
///
/// ```
/// use tbone_data::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// A date without time.
    Date(NaiveDate),
    /// A date and time without timezone (UTC by convention).
    DateTime(NaiveDateTime),
    /// A UUID value.
    Uuid(Uuid),
    /// A MongoDB object identifier.
    ObjectId(ObjectId),
    /// A native MongoDB database reference.
    DbRef(DbRef),
    /// An ordered list of values.
    List(Vec<Value>),
    /// An insertion-ordered mapping of string keys to values.
    Map(IndexMap<String, Value>),
    /// An embedded model instance.
    Model(Box<Model>),
}

impl Value {
    /// Returns `true` if this is [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// A short name for the variant, used in log events.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Uuid(_) => "uuid",
            Self::ObjectId(_) => "ObjectId",
            Self::DbRef(_) => "DBRef",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Model(_) => "model",
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as `f64`, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Self::ObjectId(oid) => Some(oid),
            _ => None,
        }
    }

    pub fn as_db_ref(&self) -> Option<&DbRef> {
        match self {
            Self::DbRef(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Converts this value into primitive data without a field to guide it.
    ///
    /// Used for export-accessor results and for the contents of free-form
    /// containers. Object ids become hex strings, references become
    /// `{"ref", "id"}` objects, and date-times follow the configured
    /// `datetime_format`.
    pub fn to_primitive(&self) -> ConversionResult<serde_json::Value> {
        Ok(match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    ConversionError::new("", "to_data", "Non-finite float cannot be exported")
                })?,
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => serde_json::Value::String(format_datetime(dt)?),
            Self::Uuid(u) => serde_json::Value::String(u.to_string()),
            Self::ObjectId(oid) => serde_json::Value::String(oid.to_hex()),
            Self::DbRef(r) => RefDict::from(r).to_json(),
            Self::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(Self::to_primitive)
                    .collect::<ConversionResult<_>>()?,
            ),
            Self::Map(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(
                        key.clone(),
                        value.to_primitive().map_err(|e| e.nested_in(key))?,
                    );
                }
                serde_json::Value::Object(out)
            }
            Self::Model(m) => serde_json::Value::Object(m.to_data()?),
        })
    }
}

/// Formats a date-time with the configured `datetime_format`.
///
/// An invalid format string is reported as a `to_data` error instead of
/// panicking inside `Display`.
pub(crate) fn format_datetime(dt: &NaiveDateTime) -> ConversionResult<String> {
    let format = &SETTINGS.current().datetime_format;
    let mut out = String::new();
    write!(out, "{}", dt.format(format)).map_err(|_| {
        ConversionError::new(
            "",
            "to_data",
            format!("Invalid datetime_format '{format}'"),
        )
    })?;
    Ok(out)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::ObjectId(oid) => write!(f, "{oid}"),
            Self::DbRef(r) => write!(f, "{r}"),
            Self::List(vals) => {
                write!(f, "[")?;
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Model(m) => write!(f, "{m}"),
        }
    }
}

// ── From implementations ────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v.naive_utc())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::ObjectId(v)
    }
}

impl From<DbRef> for Value {
    fn from(v: DbRef) -> Self {
        Self::DbRef(v)
    }
}

impl From<Model> for Value {
    fn from(v: Model) -> Self {
        Self::Model(Box::new(v))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::from(map),
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Value {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
    }
}

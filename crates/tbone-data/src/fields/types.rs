//! Scalar field types.
//!
//! Each field coerces raw primitives into one native [`Value`] variant on
//! import and back into JSON primitives on export. Coercion failures use the
//! `convert` key; exporting a value of the wrong native type uses `to_data`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tbone_core::ConversionResult;
use uuid::Uuid;

use super::base::{field_options, DataType, Field, FieldExt, FieldOptions};
use crate::validators::LengthValidator;
use crate::value::{format_datetime, Value};

/// Formats tried, in order, when parsing a date-time from a string. RFC 3339
/// strings with an offset are tried first and normalized to UTC.
const DATETIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

fn json_number(f: f64) -> Option<serde_json::Value> {
    serde_json::Number::from_f64(f).map(serde_json::Value::Number)
}

// ── StringField ─────────────────────────────────────────────────────────

/// A text field. Numbers, booleans and identifiers are stringified on import.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{Field, StringField};
/// use tbone_data::value::Value;
///
/// let field = StringField::new("title");
/// assert_eq!(field.import(Value::Int(7)).unwrap(), Value::from("7"));
/// ```
#[derive(Debug)]
pub struct StringField {
    options: FieldOptions,
}

impl StringField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(
                name,
                &[("convert", "Value could not be converted to a string")],
            ),
        }
    }

    pub fn min_length(self, min: usize) -> Self {
        self.validator(LengthValidator::min(min))
    }

    pub fn max_length(self, max: usize) -> Self {
        self.validator(LengthValidator::max(max))
    }
}

impl Field for StringField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::String
    }

    fn native_type(&self) -> &'static str {
        "String"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        match value {
            Value::String(_) => Ok(value),
            Value::Int(i) => Ok(Value::String(i.to_string())),
            Value::Float(f) => Ok(Value::String(f.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Uuid(u) => Ok(Value::String(u.to_string())),
            Value::ObjectId(oid) => Ok(Value::String(oid.to_hex())),
            _ => Err(self.error("convert")),
        }
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        match value {
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            _ => Err(self.error("to_data")),
        }
    }
}

// ── IntegerField ────────────────────────────────────────────────────────

/// A 64-bit integer field. Integral floats and numeric strings are accepted.
#[derive(Debug)]
pub struct IntegerField {
    options: FieldOptions,
}

impl IntegerField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Value is not a valid integer")]),
        }
    }
}

impl Field for IntegerField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::Integer
    }

    fn native_type(&self) -> &'static str {
        "i64"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        let int = match &value {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
                Some(*f as i64)
            }
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        int.map(Value::Int).ok_or_else(|| self.error("convert"))
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        match value {
            Value::Int(i) => Ok(serde_json::Value::from(*i)),
            _ => Err(self.error("to_data")),
        }
    }
}

// ── FloatField ──────────────────────────────────────────────────────────

/// A 64-bit floating-point field.
#[derive(Debug)]
pub struct FloatField {
    options: FieldOptions,
}

impl FloatField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Value is not a valid number")]),
        }
    }
}

impl Field for FloatField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::Float
    }

    fn native_type(&self) -> &'static str {
        "f64"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        let float = match &value {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        float
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(|| self.error("convert"))
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        value
            .as_float()
            .and_then(json_number)
            .ok_or_else(|| self.error("to_data"))
    }
}

// ── BooleanField ────────────────────────────────────────────────────────

/// A boolean field. Accepts `0`/`1` and the usual textual spellings.
#[derive(Debug)]
pub struct BooleanField {
    options: FieldOptions,
}

impl BooleanField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Value is not a valid boolean")]),
        }
    }
}

impl Field for BooleanField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::Boolean
    }

    fn native_type(&self) -> &'static str {
        "bool"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        let b = match &value {
            Value::Bool(b) => Some(*b),
            Value::Int(0) => Some(false),
            Value::Int(1) => Some(true),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        b.map(Value::Bool).ok_or_else(|| self.error("convert"))
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        value
            .as_bool()
            .map(serde_json::Value::Bool)
            .ok_or_else(|| self.error("to_data"))
    }
}

// ── DateTimeField ───────────────────────────────────────────────────────

/// A date-time field. Exports with the configured `datetime_format`.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{DateTimeField, Field};
/// use tbone_data::value::Value;
///
/// let field = DateTimeField::new("dt");
/// let native = field.import(Value::from("2017-07-25T12:34:14.414471")).unwrap();
/// assert_eq!(
///     field.export(&native).unwrap(),
///     serde_json::json!("2017-07-25T12:34:14.414471")
/// );
/// ```
#[derive(Debug)]
pub struct DateTimeField {
    options: FieldOptions,
}

impl DateTimeField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Value is not a valid date-time")]),
        }
    }
}

impl Field for DateTimeField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::String
    }

    fn native_type(&self) -> &'static str {
        "NaiveDateTime"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        let dt = match &value {
            Value::DateTime(dt) => Some(*dt),
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            Value::String(s) => parse_datetime(s),
            _ => None,
        };
        dt.map(Value::DateTime).ok_or_else(|| self.error("convert"))
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        match value {
            Value::DateTime(dt) => format_datetime(dt)
                .map(serde_json::Value::String)
                .map_err(|_| self.error("to_data")),
            _ => Err(self.error("to_data")),
        }
    }
}

// ── DateField ───────────────────────────────────────────────────────────

/// A calendar date field, exported as `YYYY-MM-DD`.
#[derive(Debug)]
pub struct DateField {
    options: FieldOptions,
}

impl DateField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Value is not a valid date")]),
        }
    }
}

impl Field for DateField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::String
    }

    fn native_type(&self) -> &'static str {
        "NaiveDate"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        let date = match &value {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            Value::String(s) => parse_date(s),
            _ => None,
        };
        date.map(Value::Date).ok_or_else(|| self.error("convert"))
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        match value {
            Value::Date(d) => Ok(serde_json::Value::String(d.format("%Y-%m-%d").to_string())),
            _ => Err(self.error("to_data")),
        }
    }
}

// ── UuidField ───────────────────────────────────────────────────────────

/// A UUID field, exported in hyphenated form.
#[derive(Debug)]
pub struct UuidField {
    options: FieldOptions,
}

impl UuidField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Value is not a valid UUID")]),
        }
    }
}

impl Field for UuidField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::String
    }

    fn native_type(&self) -> &'static str {
        "Uuid"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        match &value {
            Value::Uuid(_) => Ok(value),
            Value::String(s) => Uuid::parse_str(s.trim())
                .map(Value::Uuid)
                .map_err(|_| self.error("convert")),
            _ => Err(self.error("convert")),
        }
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        match value {
            Value::Uuid(u) => Ok(serde_json::Value::String(u.hyphenated().to_string())),
            _ => Err(self.error("to_data")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_field() {
        let f = StringField::new("name");
        assert_eq!(f.import(Value::from("Ron")).unwrap(), Value::from("Ron"));
        assert_eq!(f.import(Value::Float(34.77)).unwrap(), Value::from("34.77"));
        assert_eq!(f.export(&Value::from("Ron")).unwrap(), json!("Ron"));
        assert_eq!(f.import(Value::List(vec![])).unwrap_err().key, "convert");
        assert_eq!(f.export(&Value::List(vec![])).unwrap_err().key, "to_data");
    }

    #[test]
    fn test_export_normalizes_non_native_values() {
        assert_eq!(StringField::new("s").export(&Value::Int(7)).unwrap(), json!("7"));
        assert_eq!(IntegerField::new("i").export(&Value::from("42")).unwrap(), json!(42));
        assert_eq!(FloatField::new("f").export(&Value::from("2.5")).unwrap(), json!(2.5));
        assert_eq!(BooleanField::new("b").export(&Value::from("yes")).unwrap(), json!(true));
        assert_eq!(
            DateTimeField::new("dt").export(&Value::from("2017-07-25T12:34:14")).unwrap(),
            json!("2017-07-25T12:34:14")
        );
        assert_eq!(
            DateField::new("d").export(&Value::from("07/25/2017")).unwrap(),
            json!("2017-07-25")
        );
        assert_eq!(
            UuidField::new("u")
                .export(&Value::from("6BA7B810-9DAD-11D1-80B4-00C04FD430C8"))
                .unwrap(),
            json!("6ba7b810-9dad-11d1-80b4-00c04fd430c8")
        );
    }

    #[test]
    fn test_export_keeps_to_data_key_when_normalization_fails() {
        let err = IntegerField::new("age").export(&Value::from("forty")).unwrap_err();
        assert_eq!(err.key, "to_data");
        assert_eq!(err.field, "age");
    }

    #[test]
    fn test_string_field_length_validators() {
        let f = StringField::new("code").min_length(2).max_length(4);
        assert!(f.validate(&Value::from("abc")).is_ok());
        assert_eq!(f.validate(&Value::from("a")).unwrap_err().code, "min_length");
        assert_eq!(
            f.validate(&Value::from("abcde")).unwrap_err().code,
            "max_length"
        );
    }

    #[test]
    fn test_integer_field() {
        let f = IntegerField::new("age");
        assert_eq!(f.import(Value::from(" 42 ")).unwrap(), Value::Int(42));
        assert_eq!(f.import(Value::Float(3.0)).unwrap(), Value::Int(3));
        assert_eq!(f.import(Value::Float(3.5)).unwrap_err().key, "convert");
        assert_eq!(f.import(Value::from("abc")).unwrap_err().key, "convert");
        assert_eq!(f.export(&Value::Int(42)).unwrap(), json!(42));
    }

    #[test]
    fn test_float_field() {
        let f = FloatField::new("score");
        assert_eq!(f.import(Value::Int(2)).unwrap(), Value::Float(2.0));
        assert_eq!(f.import(Value::from("34.77")).unwrap(), Value::Float(34.77));
        assert_eq!(f.import(Value::from("NaN")).unwrap_err().key, "convert");
        assert_eq!(f.export(&Value::Float(34.77)).unwrap(), json!(34.77));
    }

    #[test]
    fn test_boolean_field() {
        let f = BooleanField::new("active");
        assert_eq!(f.import(Value::from("Yes")).unwrap(), Value::Bool(true));
        assert_eq!(f.import(Value::Int(0)).unwrap(), Value::Bool(false));
        assert_eq!(f.import(Value::Int(2)).unwrap_err().key, "convert");
        assert_eq!(f.export(&Value::Bool(true)).unwrap(), json!(true));
    }

    #[test]
    fn test_datetime_field_parses_formats() {
        let f = DateTimeField::new("dt");
        let expected = NaiveDate::from_ymd_opt(2017, 7, 25)
            .unwrap()
            .and_hms_opt(12, 34, 14)
            .unwrap();
        for raw in [
            "2017-07-25T12:34:14",
            "2017-07-25 12:34:14",
            "2017-07-25T14:34:14+02:00",
        ] {
            assert_eq!(f.import(Value::from(raw)).unwrap(), Value::DateTime(expected));
        }
        assert_eq!(f.import(Value::from("yesterday")).unwrap_err().key, "convert");
    }

    #[test]
    fn test_datetime_field_export() {
        let f = DateTimeField::new("dt");
        let dt = NaiveDate::from_ymd_opt(2017, 7, 25)
            .unwrap()
            .and_hms_micro_opt(12, 34, 14, 414_471)
            .unwrap();
        assert_eq!(
            f.export(&Value::DateTime(dt)).unwrap(),
            json!("2017-07-25T12:34:14.414471")
        );
        assert_eq!(f.export(&Value::from("x")).unwrap_err().key, "to_data");
    }

    #[test]
    fn test_date_field() {
        let f = DateField::new("born");
        let d = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(f.import(Value::from("1970-01-02")).unwrap(), Value::Date(d));
        assert_eq!(f.import(Value::from("01/02/1970")).unwrap(), Value::Date(d));
        assert_eq!(
            f.import(Value::from("1970-01-02T10:00:00")).unwrap(),
            Value::Date(d)
        );
        assert_eq!(f.export(&Value::Date(d)).unwrap(), json!("1970-01-02"));
    }

    #[test]
    fn test_uuid_field() {
        let f = UuidField::new("key");
        let raw = "550e8400-e29b-41d4-a716-446655440000";
        let native = f.import(Value::from(raw)).unwrap();
        assert!(matches!(native, Value::Uuid(_)));
        assert_eq!(f.export(&native).unwrap(), json!(raw));
        assert_eq!(f.import(Value::from("nope")).unwrap_err().key, "convert");
    }

    #[test]
    fn test_native_types() {
        assert_eq!(IntegerField::new("a").native_type(), "i64");
        assert_eq!(DateTimeField::new("a").data_type(), DataType::String);
    }
}

//! Container fields that apply an inner field to every element.

use indexmap::IndexMap;
use tbone_core::{ConversionResult, ValidationError};

use super::base::{check_options, field_options, DataType, Field, FieldOptions};
use crate::value::Value;

/// A homogeneous list whose elements are converted by an inner field.
///
/// Element errors are reported with the element index appended to the field
/// name, e.g. `tags.2`.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{Field, IntegerField, ListField};
/// use tbone_data::value::Value;
///
/// let field = ListField::new("scores", IntegerField::new("score"));
/// let native = field.import(Value::from(vec!["1", "2"])).unwrap();
/// assert_eq!(native, Value::from(vec![1_i64, 2]));
///
/// let err = field.import(Value::from(vec!["1", "x"])).unwrap_err();
/// assert_eq!(err.field, "scores.1");
/// ```
#[derive(Debug)]
pub struct ListField {
    options: FieldOptions,
    inner: Box<dyn Field>,
}

impl ListField {
    pub fn new(name: impl Into<String>, inner: impl Field + 'static) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Value is not a list")]),
            inner: Box::new(inner),
        }
    }

    /// The field applied to each element.
    pub fn inner(&self) -> &dyn Field {
        self.inner.as_ref()
    }
}

impl Field for ListField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::List
    }

    fn native_type(&self) -> &'static str {
        "Vec"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        let Value::List(items) = value else {
            return Err(self.error("convert"));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                self.inner
                    .import(item)
                    .map_err(|e| relabel(e, &i.to_string(), self.name()))
            })
            .collect::<ConversionResult<Vec<_>>>()
            .map(Value::List)
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        let Value::List(items) = value else {
            return Err(self.error("to_data"));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.inner
                    .export(item)
                    .map_err(|e| relabel(e, &i.to_string(), self.name()))
            })
            .collect::<ConversionResult<Vec<_>>>()
            .map(serde_json::Value::Array)
    }

    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        check_options(self.options(), value)?;
        if let Value::List(items) = value {
            for item in items {
                self.inner.validate(item)?;
            }
        }
        Ok(())
    }
}

/// A string-keyed mapping whose values are converted by an inner field.
/// Key order is preserved.
#[derive(Debug)]
pub struct DictField {
    options: FieldOptions,
    inner: Box<dyn Field>,
}

impl DictField {
    pub fn new(name: impl Into<String>, inner: impl Field + 'static) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Value is not a mapping")]),
            inner: Box::new(inner),
        }
    }

    pub fn inner(&self) -> &dyn Field {
        self.inner.as_ref()
    }
}

impl Field for DictField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::Map
    }

    fn native_type(&self) -> &'static str {
        "IndexMap"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        let Value::Map(map) = value else {
            return Err(self.error("convert"));
        };
        let mut out = IndexMap::with_capacity(map.len());
        for (key, item) in map {
            let native = self
                .inner
                .import(item)
                .map_err(|e| relabel(e, &key, self.name()))?;
            out.insert(key, native);
        }
        Ok(Value::Map(out))
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        let Value::Map(map) = value else {
            return Err(self.error("to_data"));
        };
        let mut out = serde_json::Map::with_capacity(map.len());
        for (key, item) in map {
            let data = self
                .inner
                .export(item)
                .map_err(|e| relabel(e, key, self.name()))?;
            out.insert(key.clone(), data);
        }
        Ok(serde_json::Value::Object(out))
    }

    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        check_options(self.options(), value)?;
        if let Value::Map(map) = value {
            for item in map.values() {
                self.inner.validate(item)?;
            }
        }
        Ok(())
    }
}

/// Points an inner field's error at `parent.position`.
fn relabel(
    mut err: tbone_core::ConversionError,
    position: &str,
    parent: &str,
) -> tbone_core::ConversionError {
    err.field = position.to_string();
    err.nested_in(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldExt, IntegerField, StringField};
    use crate::validators::LengthValidator;
    use serde_json::json;

    #[test]
    fn test_list_field_import_export() {
        let f = ListField::new("tags", StringField::new("tag"));
        let native = f.import(Value::from(vec!["a", "b"])).unwrap();
        assert_eq!(f.export(&native).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_list_field_rejects_scalar() {
        let f = ListField::new("tags", StringField::new("tag"));
        let err = f.import(Value::from("a")).unwrap_err();
        assert_eq!(err.field, "tags");
        assert_eq!(err.key, "convert");
    }

    #[test]
    fn test_list_field_null_element_passes() {
        let f = ListField::new("nums", IntegerField::new("n"));
        let native = f.import(Value::List(vec![Value::Null, Value::Int(1)])).unwrap();
        assert_eq!(f.export(&native).unwrap(), json!([null, 1]));
    }

    #[test]
    fn test_list_field_validates_elements() {
        let f = ListField::new("tags", StringField::new("tag").validator(LengthValidator::max(2)))
            .required();
        assert!(f.validate(&Value::from(vec!["ab"])).is_ok());
        assert_eq!(
            f.validate(&Value::from(vec!["abc"])).unwrap_err().code,
            "max_length"
        );
        assert_eq!(f.validate(&Value::Null).unwrap_err().code, "required");
    }

    #[test]
    fn test_dict_field_keeps_order_and_labels_errors() {
        let f = DictField::new("meta", IntegerField::new("v"));
        let native = f.import(Value::from(json!({"z": "1", "a": 2}))).unwrap();
        assert_eq!(
            serde_json::to_string(&f.export(&native).unwrap()).unwrap(),
            r#"{"z":1,"a":2}"#
        );

        let err = f.import(Value::from(json!({"ok": 1, "bad": "x"}))).unwrap_err();
        assert_eq!(err.field, "meta.bad");
    }

    #[test]
    fn test_dict_field_export_wrong_type() {
        let f = DictField::new("meta", IntegerField::new("v"));
        assert_eq!(f.export(&Value::Int(1)).unwrap_err().key, "to_data");
    }
}

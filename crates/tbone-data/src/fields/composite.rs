//! Composite fields: fields whose data form is a closed-key record.

use std::sync::Arc;

use indexmap::IndexMap;
use tbone_core::{ConversionResult, SchemaViolation, ValidationError};

use super::base::{check_options, field_options, DataType, Field, FieldOptions};
use crate::model::{Model, ModelSchema};
use crate::value::Value;

/// A field whose data representation is a structured record with a fixed
/// key set.
pub trait CompositeField: Field {
    /// The record type name used in [`SchemaViolation::UnknownKey`].
    fn record_name(&self) -> &str;

    /// The closed set of keys the record may contain.
    fn keys(&self) -> Vec<&str>;

    /// Rejects the first key of `map` that is outside [`keys`](Self::keys).
    fn check_keys(&self, map: &IndexMap<String, Value>) -> Result<(), SchemaViolation> {
        let keys = self.keys();
        map.keys()
            .find(|key| !keys.contains(&key.as_str()))
            .map_or(Ok(()), |key| {
                Err(SchemaViolation::UnknownKey {
                    record: self.record_name().to_string(),
                    key: key.clone(),
                })
            })
    }
}

/// A fixed-shape record that rejects unknown keys at write time.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{ClosedRecord, RefDict};
/// use tbone_data::value::Value;
///
/// let mut record = RefDict::default();
/// record.set("ref", Value::from("movies")).unwrap();
/// assert!(record.set("name", Value::from("x")).is_err());
/// ```
pub trait ClosedRecord: Default + Sized {
    /// The record type name.
    const NAME: &'static str;
    /// Every key the record accepts.
    const KEYS: &'static [&'static str];

    /// Writes one key, failing on keys outside [`KEYS`](Self::KEYS).
    fn set(&mut self, key: &str, value: Value) -> Result<(), SchemaViolation>;

    /// Builds a record key by key from a mapping.
    fn from_map(map: IndexMap<String, Value>) -> Result<Self, SchemaViolation> {
        let mut record = Self::default();
        for (key, value) in map {
            record.set(&key, value)?;
        }
        Ok(record)
    }

    fn unknown_key(key: &str) -> SchemaViolation {
        SchemaViolation::UnknownKey {
            record: Self::NAME.to_string(),
            key: key.to_string(),
        }
    }

    fn invalid_value(key: &str) -> SchemaViolation {
        SchemaViolation::InvalidValue {
            record: Self::NAME.to_string(),
            key: key.to_string(),
        }
    }
}

/// An embedded model stored inline in its parent.
///
/// The data form is the embedded model's exported map; its keys are the
/// embedded schema's field names and nothing else.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{Field, ModelField, StringField};
/// use tbone_data::model::ModelSchema;
/// use tbone_data::value::Value;
///
/// let address = ModelSchema::builder("Address")
///     .field(StringField::new("city"))
///     .build()
///     .unwrap();
/// let field = ModelField::new("address", &address);
///
/// let native = field.import(Value::from(serde_json::json!({"city": "San Diego"}))).unwrap();
/// assert_eq!(
///     field.export(&native).unwrap(),
///     serde_json::json!({"city": "San Diego"})
/// );
/// ```
#[derive(Debug)]
pub struct ModelField {
    options: FieldOptions,
    schema: Arc<ModelSchema>,
}

impl ModelField {
    pub fn new(name: impl Into<String>, schema: &Arc<ModelSchema>) -> Self {
        Self {
            options: FieldOptions::new(
                name,
                &[("to_python", "Value is not a valid embedded model")],
            ),
            schema: Arc::clone(schema),
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    fn is_bound_type(&self, model: &Model) -> bool {
        model.schema().name() == self.schema.name()
    }
}

impl Field for ModelField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::Map
    }

    fn native_type(&self) -> &'static str {
        "Model"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        match value {
            Value::Model(model) if self.is_bound_type(&model) => Ok(Value::Model(model)),
            Value::Map(map) => {
                if let Err(violation) = self.check_keys(&map) {
                    tracing::debug!(field = %self.name(), %violation, "embedded model rejected");
                    return Err(self.error("to_python"));
                }
                Model::from_data(&self.schema, map)
                    .map(Value::from)
                    .map_err(|e| e.nested_in(self.name()))
            }
            _ => Err(self.error("to_python")),
        }
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        match value {
            Value::Model(model) if self.is_bound_type(model) => model
                .to_data()
                .map(serde_json::Value::Object)
                .map_err(|e| e.nested_in(self.name())),
            Value::Map(_) => {
                let native = self.to_python(value.clone())?;
                self.to_data(&native)
            }
            _ => Err(self.error("to_data")),
        }
    }

    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        check_options(self.options(), value)?;
        match value {
            Value::Model(model) => model.validate(),
            _ => Ok(()),
        }
    }
}

impl CompositeField for ModelField {
    fn record_name(&self) -> &str {
        self.schema.name()
    }

    fn keys(&self) -> Vec<&str> {
        self.schema.field_names().collect()
    }
}

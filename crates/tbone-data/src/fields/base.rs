//! The [`Field`] trait and the options every field carries.

use std::collections::HashMap;
use std::fmt;

use tbone_core::{ConversionError, ConversionResult, ValidationError};

use crate::validators::Validator;
use crate::value::Value;

/// Error messages shared by every field type.
///
/// Concrete fields layer their own entries on top, and user-supplied
/// messages win over both.
const BASE_ERROR_MESSAGES: &[(&str, &str)] = &[
    ("required", "This is a required field"),
    ("choices", "Value is not one of the allowed choices"),
    ("convert", "Value could not be converted"),
    ("to_python", "Cannot convert value to its native type"),
    ("to_data", "Cannot convert value to primitive data"),
];

/// The primitive data kind a field exports to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    List,
    Map,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// A default applied when a field is absent from imported data.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// A fixed value, cloned on every use.
    Value(Value),
    /// A producer called on every use (e.g. a fresh `ObjectId`).
    Factory(fn() -> Value),
}

impl FieldDefault {
    /// Produces the default value.
    pub fn produce(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Factory(f) => f(),
        }
    }
}

/// Options shared by every field.
#[derive(Debug)]
pub struct FieldOptions {
    /// The attribute name, also the key in raw and exported data.
    pub name: String,
    /// Whether `validate` rejects an absent value.
    pub required: bool,
    /// Value applied by `import_data` when the field is absent.
    pub default: Option<FieldDefault>,
    /// If set, the only native values `validate` accepts.
    pub choices: Option<Vec<Value>>,
    /// Extra constraints run by `validate`.
    pub validators: Vec<Box<dyn Validator>>,
    /// The resolved error-message table.
    pub error_messages: HashMap<String, String>,
}

impl FieldOptions {
    /// Creates options for a field, layering `type_messages` over the base
    /// error table.
    pub fn new(name: impl Into<String>, type_messages: &[(&str, &str)]) -> Self {
        let error_messages = BASE_ERROR_MESSAGES
            .iter()
            .chain(type_messages)
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self {
            name: name.into(),
            required: false,
            default: None,
            choices: None,
            validators: Vec::new(),
            error_messages,
        }
    }

    /// Resolves an error-message key.
    pub fn message(&self, key: &str) -> String {
        self.error_messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| format!("Invalid value ({key})"))
    }
}

/// A typed attribute of a model.
///
/// A field converts between the raw data representation (JSON-like
/// primitives) and the native representation stored in a model slot.
/// Implementations supply [`to_python`](Field::to_python) and
/// [`to_data`](Field::to_data); the provided [`import`](Field::import) and
/// [`export`](Field::export) wrap them with null handling and logging.
pub trait Field: Send + Sync + fmt::Debug {
    fn options(&self) -> &FieldOptions;

    fn options_mut(&mut self) -> &mut FieldOptions;

    /// The primitive kind this field exports.
    fn data_type(&self) -> DataType;

    /// Name of the native type held in model slots (e.g. `"ObjectId"`).
    fn native_type(&self) -> &'static str;

    /// Coerces a non-null raw value into the native type.
    fn to_python(&self, value: Value) -> ConversionResult<Value>;

    /// Converts a non-null native value into primitive data.
    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value>;

    fn name(&self) -> &str {
        &self.options().name
    }

    /// Imports a raw value. Null passes through unchanged.
    fn import(&self, value: Value) -> ConversionResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let type_name = value.type_name();
        self.to_python(value).map_err(|err| {
            tracing::warn!(
                field = %self.name(),
                key = %err.key,
                input = type_name,
                "field import failed"
            );
            err
        })
    }

    /// Exports a native value. Null exports as JSON `null`.
    ///
    /// A value that is not yet of the native type is normalized through
    /// [`to_python`](Self::to_python) first; if that fails too, the original
    /// `to_data` error is returned.
    fn export(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        if value.is_null() {
            return Ok(serde_json::Value::Null);
        }
        let exported = self.to_data(value).or_else(|err| match self.to_python(value.clone()) {
            Ok(native) if native != *value => self.to_data(&native),
            _ => Err(err),
        });
        exported.map_err(|err| {
            tracing::warn!(
                field = %self.name(),
                key = %err.key,
                input = value.type_name(),
                "field export failed"
            );
            err
        })
    }

    /// Checks `required`, `choices` and the attached validators.
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        check_options(self.options(), value)
    }

    /// Builds a [`ConversionError`] from this field's error table.
    fn error(&self, key: &str) -> ConversionError {
        ConversionError::new(self.name(), key, self.options().message(key))
    }

    /// The value `import_data` applies when this field is absent.
    fn default_value(&self) -> Option<Value> {
        self.options().default.as_ref().map(FieldDefault::produce)
    }
}

/// The option checks behind [`Field::validate`], shared with fields that
/// override it to also validate their contents.
pub(crate) fn check_options(options: &FieldOptions, value: &Value) -> Result<(), ValidationError> {
    if value.is_null() {
        if options.required {
            return Err(ValidationError::new(options.message("required"), "required"));
        }
        return Ok(());
    }
    if let Some(choices) = &options.choices {
        if !choices.contains(value) {
            return Err(
                ValidationError::new(options.message("choices"), "choices")
                    .with_param("value", value.to_string()),
            );
        }
    }
    for validator in &options.validators {
        validator.validate(value).inspect_err(|_| {
            tracing::trace!(field = %options.name, validator = validator.name(), "constraint failed");
        })?;
    }
    Ok(())
}

/// Builder methods available on every concrete field.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{Field, FieldExt, StringField};
///
/// let field = StringField::new("title")
///     .required()
///     .choices(["draft", "published"])
///     .error_message("choices", "Unknown status");
/// assert!(field.options().required);
/// assert_eq!(field.options().message("choices"), "Unknown status");
/// ```
pub trait FieldExt: Field + Sized {
    fn required(mut self) -> Self {
        self.options_mut().required = true;
        self
    }

    fn default(mut self, value: impl Into<Value>) -> Self {
        self.options_mut().default = Some(FieldDefault::Value(value.into()));
        self
    }

    fn default_with(mut self, factory: fn() -> Value) -> Self {
        self.options_mut().default = Some(FieldDefault::Factory(factory));
        self
    }

    fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options_mut().choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.options_mut().validators.push(Box::new(validator));
        self
    }

    /// Overrides one entry of the error-message table.
    fn error_message(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.options_mut()
            .error_messages
            .insert(key.into(), message.into());
        self
    }
}

impl<T: Field + Sized> FieldExt for T {}

/// Implements the `options` accessors for a field struct with an `options`
/// member.
macro_rules! field_options {
    () => {
        fn options(&self) -> &$crate::fields::FieldOptions {
            &self.options
        }

        fn options_mut(&mut self) -> &mut $crate::fields::FieldOptions {
            &mut self.options
        }
    };
}

pub(crate) use field_options;

//! Error types for the tbone-rs data mapping layer.
//!
//! Three error families exist:
//!
//! - [`ConversionError`]: a value could not be coerced between its native and
//!   data representations. Always tagged with a key from the failing field's
//!   error-message table (`"convert"`, `"to_python"`, `"missing_id"`, ...).
//! - [`SchemaViolation`]: a structural rule was broken, such as writing an
//!   unknown key into a closed record or binding a reference field to
//!   something that is not a model.
//! - [`ValidationError`]: a value converted fine but failed a constraint
//!   (required, choices, validators). Can carry per-field errors.
//!
//! [`TboneError`] wraps all of them for callers that want a single error type.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A value could not be converted by a field.
///
/// The `key` identifies the entry of the field's error-message table that
/// produced `message`, so that callers can map failures to their own
/// user-facing text without parsing messages.
///
/// # Examples
///
/// ```
/// use tbone_core::error::ConversionError;
///
/// let err = ConversionError::new("id", "convert", "Could not cast value as ObjectId");
/// assert_eq!(err.key, "convert");
/// assert_eq!(err.to_string(), "id: Could not cast value as ObjectId");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ConversionError {
    /// Name of the field whose conversion failed.
    pub field: String,
    /// The error-message key (e.g. "convert", "to_data").
    pub key: String,
    /// The resolved, human-readable message.
    pub message: String,
}

impl ConversionError {
    /// Creates a new `ConversionError`.
    pub fn new(
        field: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Prefixes the field name with a parent path, e.g. `tags` -> `tags.2`.
    ///
    /// Used by container fields to point at the offending element.
    #[must_use]
    pub fn nested_in(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }
}

/// A structural rule of a schema or closed record was broken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// A key outside the closed key set was written into a record.
    #[error("'{key}' is not a valid key for {record}")]
    UnknownKey {
        /// The record type (e.g. "RefDict").
        record: String,
        /// The rejected key.
        key: String,
    },

    /// A recognized key was written with a value of the wrong shape.
    #[error("invalid value for '{key}' in {record}")]
    InvalidValue {
        /// The record type.
        record: String,
        /// The key whose value was rejected.
        key: String,
    },

    /// A reference was declared against something that is not a known model.
    #[error("Expected a model of the type '{0}'")]
    NotAModel(String),

    /// Two fields (or a field and an export) share the same name.
    #[error("duplicate field '{field}' on model {model}")]
    DuplicateField {
        /// The model being declared.
        model: String,
        /// The repeated name.
        field: String,
    },

    /// A value was assigned to a name that is not part of the schema.
    #[error("model {model} has no field '{field}'")]
    UnknownField {
        /// The model name.
        model: String,
        /// The unknown field name.
        field: String,
    },
}

/// A converted value failed a constraint.
///
/// A leaf error carries a `message` and a `code` (`"required"`, `"choices"`,
/// `"max_length"`, ...). A model-level error has an empty message and groups
/// leaf errors by field name in `field_errors`.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use tbone_core::error::ValidationError;
///
/// let leaf = ValidationError::new("This is a required field", "required");
/// let err = ValidationError::with_field_errors(HashMap::from([
///     ("name".to_string(), vec![leaf]),
/// ]));
/// assert_eq!(err.to_string(), "name: This is a required field");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    /// Machine-readable failure code.
    pub code: String,
    /// Values interpolated into the message, e.g. `max` for `max_length`.
    pub params: HashMap<String, String>,
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// A model-level error grouping the failures of individual fields.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            field_errors,
            ..Self::new("", "invalid")
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn has_field_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }
}

/// The failing path (e.g. `tags.2`) is kept in the `path` param.
impl From<ConversionError> for ValidationError {
    fn from(err: ConversionError) -> Self {
        Self::new(err.message, err.key).with_param("path", err.field)
    }
}

// Field errors print sorted by field name so output is stable.
impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return f.write_str(&self.message);
        }
        let mut names: Vec<&String> = self.field_errors.keys().collect();
        names.sort();
        let parts: Vec<String> = names
            .into_iter()
            .flat_map(|name| {
                self.field_errors[name]
                    .iter()
                    .map(move |error| format!("{name}: {error}"))
            })
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Any failure raised by tbone-rs.
///
/// [`TboneError::status_code`] tells a resource layer which HTTP status to
/// answer with.
#[derive(Error, Debug)]
pub enum TboneError {
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Settings could not be parsed or resolved.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TboneError {
    /// Client mistakes (bad input data) map to 400, everything else to 500.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Conversion(_) | Self::Validation(_) => 400,
            Self::Schema(_) | Self::Config(_) | Self::Io(_) => 500,
        }
    }
}

/// A convenience type alias for `Result<T, TboneError>`.
pub type TboneResult<T> = Result<T, TboneError>;

/// Result of a single field conversion.
pub type ConversionResult<T> = Result<T, ConversionError>;

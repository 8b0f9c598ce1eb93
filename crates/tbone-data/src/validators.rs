//! Field validators.
//!
//! Validators run after conversion, from [`Field::validate`](crate::fields::Field::validate).
//! Each checks a single constraint on a native value and ignores values of
//! types it does not understand.

use std::fmt;

use regex::Regex;
use tbone_core::ValidationError;

use crate::value::Value;

/// A single constraint on a native value.
///
/// # Examples
///
/// ```
/// use tbone_data::validators::{LengthValidator, Validator};
/// use tbone_data::value::Value;
///
/// let v = LengthValidator::max(5);
/// assert!(v.validate(&Value::from("Ron")).is_ok());
/// assert_eq!(v.validate(&Value::from("Burgundy")).unwrap_err().code, "max_length");
/// ```
pub trait Validator: Send + Sync + fmt::Debug {
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Which side of a bound a value must stay on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Limit {
    AtMost,
    AtLeast,
}

impl Limit {
    fn admits<T: PartialOrd>(self, actual: T, bound: T) -> bool {
        match self {
            Self::AtMost => actual <= bound,
            Self::AtLeast => actual >= bound,
        }
    }
}

/// Bounds the length of a string, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthValidator {
    limit: Limit,
    chars: usize,
}

impl LengthValidator {
    pub const fn max(chars: usize) -> Self {
        Self {
            limit: Limit::AtMost,
            chars,
        }
    }

    pub const fn min(chars: usize) -> Self {
        Self {
            limit: Limit::AtLeast,
            chars,
        }
    }
}

impl Validator for LengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let Value::String(s) = value else {
            return Ok(());
        };
        let len = s.chars().count();
        if self.limit.admits(len, self.chars) {
            return Ok(());
        }
        let (side, param) = match self.limit {
            Limit::AtMost => ("at most", "max"),
            Limit::AtLeast => ("at least", "min"),
        };
        Err(ValidationError::new(
            format!("Value must have {side} {} characters, not {len}", self.chars),
            self.name(),
        )
        .with_param(param, self.chars.to_string()))
    }

    fn name(&self) -> &str {
        match self.limit {
            Limit::AtMost => "max_length",
            Limit::AtLeast => "min_length",
        }
    }
}

/// Bounds a numeric value. Integers are compared as floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValidator {
    limit: Limit,
    bound: f64,
}

impl RangeValidator {
    pub const fn max(bound: f64) -> Self {
        Self {
            limit: Limit::AtMost,
            bound,
        }
    }

    pub const fn min(bound: f64) -> Self {
        Self {
            limit: Limit::AtLeast,
            bound,
        }
    }
}

impl Validator for RangeValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value.as_float() {
            Some(n) if !self.limit.admits(n, self.bound) => {
                let (side, param) = match self.limit {
                    Limit::AtMost => ("less than or equal to", "max"),
                    Limit::AtLeast => ("greater than or equal to", "min"),
                };
                Err(
                    ValidationError::new(format!("Value must be {side} {}", self.bound), self.name())
                        .with_param(param, self.bound.to_string()),
                )
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        match self.limit {
            Limit::AtMost => "max_value",
            Limit::AtLeast => "min_value",
        }
    }
}

/// Validates that a string value matches a regular expression.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    regex: Regex,
    message: String,
}

impl RegexValidator {
    /// Compiles `pattern`; fails if it is not a valid regular expression.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::String(s) if !self.regex.is_match(s) => Err(ValidationError::new(
                self.message.clone(),
                "invalid",
            )
            .with_param("pattern", self.regex.as_str())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "regex"
    }
}

/// Validates that a string value looks like an email address.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    inner: RegexValidator,
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailValidator {
    pub fn new() -> Self {
        static EMAIL: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
            Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
                .unwrap_or_else(|e| unreachable!("email pattern is valid: {e}"))
        });
        Self {
            inner: RegexValidator {
                regex: EMAIL.clone(),
                message: "Enter a valid email address.".to_string(),
            },
        }
    }
}

impl Validator for EmailValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.inner.validate(value)
    }

    fn name(&self) -> &str {
        "email"
    }
}

//! Settings for the tbone-rs data mapping layer.
//!
//! This module provides the [`Settings`] struct, which holds library
//! configuration, and [`LazySettings`], a globally-accessible slot that is
//! configured once at startup. Code that only needs to read settings calls
//! [`LazySettings::current`], which falls back to the defaults when nothing
//! was configured.

use std::collections::HashMap;
use std::sync::OnceLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::TboneError;
use crate::utils::text;

/// How a collection name is derived from a model name when a schema does not
/// declare one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionNaming {
    /// `MovieReview` -> `moviereview`.
    #[default]
    Lowercase,
    /// `MovieReview` -> `movie_review`.
    SnakeCase,
    /// `MovieReview` -> `movie_reviews`.
    SnakeCasePlural,
}

impl CollectionNaming {
    /// Applies this policy to a model name.
    ///
    /// # Examples
    ///
    /// ```
    /// use tbone_core::settings::CollectionNaming;
    ///
    /// assert_eq!(CollectionNaming::Lowercase.apply("MovieReview"), "moviereview");
    /// assert_eq!(CollectionNaming::SnakeCase.apply("MovieReview"), "movie_review");
    /// assert_eq!(CollectionNaming::SnakeCasePlural.apply("Person"), "persons");
    /// ```
    pub fn apply(self, model_name: &str) -> String {
        match self {
            Self::Lowercase => model_name.to_lowercase(),
            Self::SnakeCase => text::snake_case(model_name),
            Self::SnakeCasePlural => text::pluralize(&text::snake_case(model_name)),
        }
    }

    /// Parses a policy name as used in configuration files.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "lowercase" => Some(Self::Lowercase),
            "snake_case" => Some(Self::SnakeCase),
            "snake_case_plural" => Some(Self::SnakeCasePlural),
            _ => None,
        }
    }
}

/// The complete set of library settings.
///
/// # Examples
///
/// ```
/// use tbone_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Pretty, human-readable logs instead of JSON lines.
    pub debug: bool,
    /// An `EnvFilter` directive, e.g. "info" or "tbone_data=debug".
    pub log_level: String,

    /// `chrono` format string used when exporting date-time fields.
    pub datetime_format: String,
    /// Policy for deriving collection names from model names.
    pub collection_naming: CollectionNaming,

    /// Application-defined values, e.g. a resource layer's API prefix.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            datetime_format: "%Y-%m-%dT%H:%M:%S%.f".to_string(),
            collection_naming: CollectionNaming::default(),
            extra: HashMap::new(),
        }
    }
}

static DEFAULT_SETTINGS: Lazy<Settings> = Lazy::new(Settings::default);

/// The process-wide settings slot.
///
/// An application installs its settings once at startup with
/// [`configure`](LazySettings::configure); library code reads them through
/// [`current`](LazySettings::current), which sees the defaults until then.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Installs the settings. Only the first call succeeds.
    pub fn configure(&self, settings: Settings) -> Result<(), TboneError> {
        self.inner
            .set(settings)
            .map_err(|_| TboneError::Config("settings are already configured".to_string()))?;
        tracing::debug!("settings configured");
        Ok(())
    }

    /// The installed settings, or the defaults when nothing was installed.
    pub fn current(&self) -> &Settings {
        self.inner.get().unwrap_or(&DEFAULT_SETTINGS)
    }

    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.datetime_format, "%Y-%m-%dT%H:%M:%S%.f");
        assert_eq!(s.collection_naming, CollectionNaming::Lowercase);
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_collection_naming_apply() {
        assert_eq!(CollectionNaming::Lowercase.apply("Movie"), "movie");
        assert_eq!(CollectionNaming::SnakeCase.apply("MovieReview"), "movie_review");
        assert_eq!(
            CollectionNaming::SnakeCasePlural.apply("MovieReview"),
            "movie_reviews"
        );
        assert_eq!(CollectionNaming::SnakeCasePlural.apply("Category"), "categories");
    }

    #[test]
    fn test_collection_naming_parse() {
        assert_eq!(
            CollectionNaming::parse("snake_case"),
            Some(CollectionNaming::SnakeCase)
        );
        assert_eq!(
            CollectionNaming::parse(" Lowercase "),
            Some(CollectionNaming::Lowercase)
        );
        assert_eq!(CollectionNaming::parse("kebab"), None);
    }

    #[test]
    fn test_collection_naming_serde() {
        let json = serde_json::to_string(&CollectionNaming::SnakeCasePlural).unwrap();
        assert_eq!(json, "\"snake_case_plural\"");
    }

    #[test]
    fn test_configure_once() {
        let slot = LazySettings::new();
        assert!(!slot.is_configured());
        assert_eq!(slot.current().log_level, "info");

        let mut settings = Settings::default();
        settings.collection_naming = CollectionNaming::SnakeCasePlural;
        slot.configure(settings).unwrap();
        assert!(slot.is_configured());
        assert_eq!(slot.current().collection_naming, CollectionNaming::SnakeCasePlural);

        assert!(matches!(
            slot.configure(Settings::default()),
            Err(TboneError::Config(_))
        ));
        assert_eq!(slot.current().collection_naming, CollectionNaming::SnakeCasePlural);
    }
}

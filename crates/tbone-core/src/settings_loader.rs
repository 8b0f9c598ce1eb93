//! Loading [`Settings`] from configuration text, files and the environment.
//!
//! A configuration document only names the keys it changes; everything else
//! keeps its default. Keys of the `extra` table are overlaid one by one, so a
//! file can add custom entries without restating the others.
//!
//! Environment variables win over file contents:
//!
//! | Env Var | Setting |
//! |---|---|
//! | `TBONE_DEBUG` | `debug` |
//! | `TBONE_LOG_LEVEL` | `log_level` |
//! | `TBONE_DATETIME_FORMAT` | `datetime_format` |
//! | `TBONE_COLLECTION_NAMING` | `collection_naming` |
//!
//! ```rust,no_run
//! use tbone_core::settings_loader;
//!
//! let settings = settings_loader::from_file("config/tbone.toml").unwrap();
//! let settings = settings_loader::from_file_with_env("config/tbone.json").unwrap();
//! ```

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::TboneError;
use crate::settings::{CollectionNaming, Settings};

/// A supported configuration syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Picks the syntax from a file extension (`.toml` or `.json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn parse(self, text: &str) -> Result<Map<String, Value>, TboneError> {
        let parsed: Result<Map<String, Value>, String> = match self {
            Self::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            Self::Json if text.trim().is_empty() => Ok(Map::new()),
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| TboneError::Config(format!("invalid {self} settings: {e}")))
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        })
    }
}

/// Parses settings from configuration text in the given syntax.
pub fn from_str(text: &str, format: Format) -> Result<Settings, TboneError> {
    let patch = format.parse(text)?;
    let mut base = match serde_json::to_value(Settings::default()) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            return Err(TboneError::Config(
                "default settings are not a table".to_string(),
            ))
        }
    };
    overlay(&mut base, patch);
    serde_json::from_value(Value::Object(base))
        .map_err(|e| TboneError::Config(format!("invalid {format} settings: {e}")))
}

/// Parses settings from a TOML string.
pub fn from_toml_str(text: &str) -> Result<Settings, TboneError> {
    from_str(text, Format::Toml)
}

/// Parses settings from a JSON string.
pub fn from_json_str(text: &str) -> Result<Settings, TboneError> {
    from_str(text, Format::Json)
}

/// Reads settings from a `.toml` or `.json` file.
pub fn from_file(path: impl AsRef<Path>) -> Result<Settings, TboneError> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| {
        TboneError::Config(format!(
            "cannot tell the settings format of '{}'",
            path.display()
        ))
    })?;
    let text = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), %format, "loading settings");
    from_str(&text, format)
}

/// Reads settings from a file, then applies the environment overrides.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, TboneError> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// The default settings with the environment overrides applied.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Overwrites settings from the `TBONE_*` environment variables that are set.
///
/// `TBONE_DEBUG` is true for `true`, `1` or `yes`. An unknown
/// `TBONE_COLLECTION_NAMING` is logged and ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    let var = |name: &str| std::env::var(name).ok();

    if let Some(debug) = var("TBONE_DEBUG") {
        settings.debug = matches!(debug.trim().to_lowercase().as_str(), "true" | "1" | "yes");
    }
    if let Some(level) = var("TBONE_LOG_LEVEL") {
        settings.log_level = level;
    }
    if let Some(format) = var("TBONE_DATETIME_FORMAT") {
        settings.datetime_format = format;
    }
    if let Some(naming) = var("TBONE_COLLECTION_NAMING") {
        match CollectionNaming::parse(&naming) {
            Some(policy) => settings.collection_naming = policy,
            None => tracing::warn!(value = %naming, "ignoring unknown TBONE_COLLECTION_NAMING"),
        }
    }
}

/// Top-level keys replace; the `extra` table is merged key by key.
fn overlay(base: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Object(added) if key == "extra" => {
                match base.entry(key).or_insert_with(|| Value::Object(Map::new())) {
                    Value::Object(current) => current.extend(added),
                    other => *other = Value::Object(added),
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

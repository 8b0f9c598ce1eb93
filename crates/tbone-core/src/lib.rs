//! # tbone-core
//!
//! Core types, settings, and error types for the tbone-rs data mapping layer.
//! This crate has no dependency on the model/field system and provides the
//! foundation shared by the other crates.
//!
//! ## Modules
//!
//! - [`error`] - Conversion, schema and validation errors plus result aliases
//! - [`settings`] - Library settings and the global configuration slot
//! - [`settings_loader`] - Loading settings from TOML/JSON and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Text helpers used for collection naming

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{
    ConversionError, ConversionResult, SchemaViolation, TboneError, TboneResult, ValidationError,
};
pub use settings::{CollectionNaming, Settings, SETTINGS};

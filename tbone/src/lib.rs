//! # tbone
//!
//! A declarative object-data-mapping layer: declare models as ordered typed
//! fields, import raw request or storage data into them, and export them back
//! into ordered, JSON-safe maps.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on the individual crates for finer-grained control.
//!
//! ```
//! use tbone::prelude::*;
//!
//! let person = ModelSchema::builder("Person")
//!     .field(StringField::new("first_name"))
//!     .field(StringField::new("last_name"))
//!     .export("full_name", |m: &Model| {
//!         Value::from(format!(
//!             "{} {}",
//!             m.get_str("first_name").unwrap_or_default(),
//!             m.get_str("last_name").unwrap_or_default()
//!         ))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let ron = Model::from_data(&person, [("first_name", "Ron"), ("last_name", "Burgundy")]).unwrap();
//! assert_eq!(format!("{ron:?}"), "<Person instance>");
//! assert_eq!(ron.to_data().unwrap()["full_name"], "Ron Burgundy");
//! tbone::tracing::debug!(model = person.name(), "exported");
//! ```

/// Errors, settings, settings loading, and logging.
pub use tbone_core as core;

/// Values, fields, models, and the model registry.
pub use tbone_data as data;

/// MongoDB collection mixin and BSON document bridge.
#[cfg(feature = "mongo")]
pub use tbone_db as db;

pub use bson;
pub use serde_json;
/// The logging facade every sub-crate emits through.
pub use tracing;

/// The types most model declarations need.
pub mod prelude {
    pub use tbone_core::{
        ConversionError, ConversionResult, SchemaViolation, TboneError, TboneResult,
        ValidationError, SETTINGS,
    };
    pub use tbone_data::fields::{
        BooleanField, ClosedRecord, CompositeField, DateField, DateTimeField, DbRef, DbRefField,
        DictField, Field, FieldExt, FloatField, IntegerField, ListField, ModelField,
        ObjectIdField, RefDict, StringField, UuidField,
    };
    pub use tbone_data::model::{Data, Model, ModelSchema, SchemaBuilder};
    pub use tbone_data::registry::MODELS;
    pub use tbone_data::value::Value;

    #[cfg(feature = "mongo")]
    pub use tbone_db::MongoCollection;
}

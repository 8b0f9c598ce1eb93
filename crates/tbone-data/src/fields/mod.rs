//! Field definitions.
//!
//! Every field implements [`Field`]: it converts raw data into a native
//! [`Value`](crate::value::Value) on import and back into primitive data on
//! export. Builder methods shared by all fields live on [`FieldExt`].
//!
//! - [`types`] - scalar fields (string, numbers, booleans, dates, UUIDs)
//! - [`containers`] - [`ListField`] and [`DictField`]
//! - [`composite`] - closed-key records and embedded models
//! - [`mongo`] - `ObjectId` and `DBRef` support

pub mod base;
pub mod composite;
pub mod containers;
pub mod mongo;
pub mod types;

pub use base::{DataType, Field, FieldDefault, FieldExt, FieldOptions};
pub use composite::{ClosedRecord, CompositeField, ModelField};
pub use containers::{DictField, ListField};
pub use mongo::{DbRef, DbRefField, ObjectIdField, RefDict, RefInput, ID_FIELD};
pub use types::{
    BooleanField, DateField, DateTimeField, FloatField, IntegerField, StringField, UuidField,
};

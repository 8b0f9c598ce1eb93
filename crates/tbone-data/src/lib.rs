//! # tbone-data
//!
//! Field and model layer for tbone-rs. Declares record shapes as
//! [`ModelSchema`](model::ModelSchema)s built from [`Field`](fields::Field)s,
//! converts incoming raw data into native values, and exports model
//! instances back into ordered, primitive-only data.
//!
//! ## Module Overview
//!
//! - [`value`] - The native [`Value`](value::Value) enum held by model slots
//! - [`fields`] - The [`Field`](fields::Field) trait, scalar and container
//!   fields, composite fields and the MongoDB reference fields
//! - [`model`] - [`ModelSchema`](model::ModelSchema),
//!   [`SchemaBuilder`](model::SchemaBuilder) and [`Model`](model::Model)
//! - [`registry`] - The model registry used to resolve references by name
//! - [`validators`] - Constraint validators attachable to any field

// - cast_precision_loss: i64-to-f64 casts are acceptable for numeric coercion
// - cast_possible_truncation: integral floats are range-checked before casting
// - needless_pass_by_value: conversion hooks take ownership of raw values
// - return_self_not_must_use: builder methods are self-documenting
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::result_large_err)]

pub mod fields;
pub mod model;
pub mod registry;
pub mod validators;
pub mod value;

pub use fields::{
    BooleanField, ClosedRecord, CompositeField, DataType, DateField, DateTimeField, DbRef,
    DbRefField, DictField, Field, FieldDefault, FieldExt, FieldOptions, FloatField, IntegerField,
    ListField, ModelField, ObjectIdField, RefDict, RefInput, StringField, UuidField,
};
pub use model::{Data, Export, Items, Model, ModelSchema, SchemaBuilder};
pub use registry::{ModelRegistry, MODELS};
pub use value::Value;

//! # tbone-db
//!
//! MongoDB support for tbone-rs models. The crate does not talk to a server;
//! it provides what a persistence layer needs from a model:
//!
//! - [`collection`] - the [`MongoCollection`](collection::MongoCollection)
//!   trait (collection name, `_id` access, self references)
//! - [`document`] - conversion between [`Model`](tbone_data::Model)s and BSON
//!   [`Document`](bson::Document)s, keeping `ObjectId`, `DBRef` and
//!   date-time values in their storage-native BSON form

#![allow(clippy::doc_markdown)]
#![allow(clippy::result_large_err)]

pub mod collection;
pub mod document;

pub use collection::MongoCollection;
pub use document::{from_document, to_document};

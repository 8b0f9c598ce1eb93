//! The collection mixin for document-backed models.

use bson::oid::ObjectId;
use bson::Document;
use tbone_core::{ConversionResult, SchemaViolation};
use tbone_data::fields::{DbRef, ID_FIELD};
use tbone_data::model::Model;
use tbone_data::value::Value;

/// What a persistence layer needs from a model stored in a MongoDB
/// collection.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{ObjectIdField, StringField};
/// use tbone_data::model::{Model, ModelSchema};
/// use tbone_db::MongoCollection;
///
/// let schema = ModelSchema::builder("MovieReview")
///     .field(ObjectIdField::new("_id"))
///     .field(StringField::new("text"))
///     .build()
///     .unwrap();
/// let mut review = Model::new(&schema);
/// assert!(review.object_id().is_none());
///
/// let id = review.assign_object_id().unwrap();
/// assert_eq!(review.object_id(), Some(id));
/// assert_eq!(review.db_ref().unwrap().collection, "moviereview");
/// ```
pub trait MongoCollection {
    /// The collection documents of this model live in.
    fn collection_name(&self) -> String;

    /// The document id, if `_id` holds a valid object id.
    fn object_id(&self) -> Option<ObjectId>;

    /// Returns the document id, generating and storing a new one if unset.
    ///
    /// Fails if the schema does not declare `_id`.
    fn assign_object_id(&mut self) -> Result<ObjectId, SchemaViolation>;

    /// A reference to this document, if it has an id.
    fn db_ref(&self) -> Option<DbRef> {
        self.object_id()
            .map(|id| DbRef::new(self.collection_name(), id))
    }

    /// The storage form of this model.
    fn to_document(&self) -> ConversionResult<Document>;
}

impl MongoCollection for Model {
    fn collection_name(&self) -> String {
        self.schema().collection_name()
    }

    fn object_id(&self) -> Option<ObjectId> {
        match self.get(ID_FIELD)? {
            Value::ObjectId(oid) => Some(*oid),
            Value::String(s) => ObjectId::parse_str(s).ok(),
            _ => None,
        }
    }

    fn assign_object_id(&mut self) -> Result<ObjectId, SchemaViolation> {
        if let Some(id) = self.object_id() {
            return Ok(id);
        }
        let id = ObjectId::new();
        self.set(ID_FIELD, id)?;
        tracing::debug!(model = %self.class_name(), %id, "assigned object id");
        Ok(id)
    }

    fn to_document(&self) -> ConversionResult<Document> {
        crate::document::to_document(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbone_data::fields::{ObjectIdField, StringField};
    use tbone_data::model::ModelSchema;

    #[test]
    fn test_object_id_accepts_hex_string() {
        let schema = ModelSchema::builder("Hexed")
            .field(StringField::new("_id"))
            .build()
            .unwrap();
        let mut m = Model::new(&schema);
        m.set("_id", "5979c0f6fe4b3e5ff1a2b7c1").unwrap();
        assert_eq!(m.object_id().unwrap().to_hex(), "5979c0f6fe4b3e5ff1a2b7c1");

        m.set("_id", "nope").unwrap();
        assert!(m.object_id().is_none());
    }

    #[test]
    fn test_assign_object_id_requires_id_field() {
        let schema = ModelSchema::builder("NoId").build().unwrap();
        let mut m = Model::new(&schema);
        assert!(matches!(
            m.assign_object_id(),
            Err(SchemaViolation::UnknownField { .. })
        ));
        assert!(m.db_ref().is_none());
    }

    #[test]
    fn test_explicit_collection_name() {
        let schema = ModelSchema::builder("Movie")
            .collection("films")
            .field(ObjectIdField::new("_id"))
            .build()
            .unwrap();
        let mut m = Model::new(&schema);
        let id = m.assign_object_id().unwrap();
        assert_eq!(m.collection_name(), "films");
        assert_eq!(m.db_ref(), Some(DbRef::new("films", id)));
        // stable once assigned
        assert_eq!(m.assign_object_id().unwrap(), id);
    }
}

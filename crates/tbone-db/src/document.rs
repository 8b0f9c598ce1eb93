//! Conversion between models and BSON documents.
//!
//! Exported JSON loses type information MongoDB keeps natively, so the
//! bridge works from the stored native values: object ids stay
//! `Bson::ObjectId`, references become `{"$ref", "$id"}` sub-documents and
//! date-times become `Bson::DateTime`. Export accessors, which have no native
//! value, are converted from their exported JSON.

use std::sync::Arc;

use bson::{doc, Bson, Document};
use tbone_core::logging::model_span;
use tbone_core::{ConversionError, ConversionResult};
use tbone_data::fields::DbRef;
use tbone_data::model::{Model, ModelSchema};
use tbone_data::value::Value;

/// Converts a model into a BSON document.
///
/// The model is exported first, so any export failure is reported exactly as
/// [`Model::to_data`] would report it. Each declared field's value is then
/// normalized through the field before it is stored, so references,
/// object ids and date-times keep their BSON types.
///
/// # Examples
///
/// ```
/// use bson::oid::ObjectId;
/// use tbone_data::fields::{ObjectIdField, StringField};
/// use tbone_data::model::{Model, ModelSchema};
///
/// let movie = ModelSchema::builder("Movie")
///     .field(ObjectIdField::new("_id"))
///     .field(StringField::new("title"))
///     .build()
///     .unwrap();
/// let mut m = Model::new(&movie);
/// let id = ObjectId::new();
/// m.set("_id", id).unwrap();
/// m.set("title", "Anchorman").unwrap();
///
/// let doc = tbone_db::to_document(&m).unwrap();
/// assert_eq!(doc.get_object_id("_id").unwrap(), id);
/// assert_eq!(doc.get_str("title").unwrap(), "Anchorman");
/// ```
pub fn to_document(model: &Model) -> ConversionResult<Document> {
    let span = model_span(model.class_name());
    let _guard = span.enter();

    let data = model.to_data()?;
    let mut doc = Document::new();
    for (key, exported) in data {
        let bson = match model.schema().field(&key) {
            Some(field) => {
                let stored = model
                    .get(&key)
                    .cloned()
                    .or_else(|| field.default_value())
                    .unwrap_or(Value::Null);
                // slots set without conversion may still hold a model for a
                // reference or a hex string for an id
                let native = field.import(stored)?;
                value_to_bson(&native, &key)?
            }
            None => bson::to_bson(&exported)
                .map_err(|e| ConversionError::new(&key, "to_data", e.to_string()))?,
        };
        doc.insert(key, bson);
    }

    tracing::debug!(keys = doc.len(), "built document");
    Ok(doc)
}

/// Builds a model from a BSON document, importing fail-fast.
///
/// Only keys declared by the schema are converted; other keys are ignored
/// like any undeclared raw key.
pub fn from_document(schema: &Arc<ModelSchema>, doc: &Document) -> ConversionResult<Model> {
    let span = model_span(schema.name());
    let _guard = span.enter();

    let raw = doc
        .iter()
        .filter(|(key, _)| schema.has_field(key))
        .map(|(key, bson)| bson_to_value(bson, key).map(|value| (key.clone(), value)))
        .collect::<ConversionResult<Vec<_>>>()?;

    tracing::debug!(keys = raw.len(), "loading document");
    Model::from_data(schema, raw)
}

/// Converts a native value into its storage form.
pub fn value_to_bson(value: &Value, path: &str) -> ConversionResult<Bson> {
    Ok(match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int(i) => Bson::Int64(*i),
        Value::Float(f) => Bson::Double(*f),
        Value::String(s) => Bson::String(s.clone()),
        Value::Date(d) => {
            let midnight = d.and_hms_opt(0, 0, 0).ok_or_else(|| {
                ConversionError::new(path, "to_data", format!("Invalid date {d}"))
            })?;
            Bson::DateTime(bson::DateTime::from_chrono(midnight.and_utc()))
        }
        Value::DateTime(dt) => Bson::DateTime(bson::DateTime::from_chrono(dt.and_utc())),
        Value::Uuid(u) => Bson::String(u.to_string()),
        Value::ObjectId(oid) => Bson::ObjectId(*oid),
        Value::DbRef(r) => Bson::Document(doc! {
            "$ref": r.collection.clone(),
            "$id": r.id,
        }),
        Value::List(items) => Bson::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| value_to_bson(item, &format!("{path}.{i}")))
                .collect::<ConversionResult<_>>()?,
        ),
        Value::Map(map) => {
            let mut doc = Document::new();
            for (key, item) in map {
                doc.insert(key.clone(), value_to_bson(item, &format!("{path}.{key}"))?);
            }
            Bson::Document(doc)
        }
        Value::Model(m) => Bson::Document(to_document(m).map_err(|e| e.nested_in(path))?),
    })
}

/// Converts a stored BSON value into a native value.
pub fn bson_to_value(bson: &Bson, path: &str) -> ConversionResult<Value> {
    Ok(match bson {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::Int(i64::from(*i)),
        Bson::Int64(i) => Value::Int(*i),
        Bson::Double(f) => Value::Float(*f),
        Bson::String(s) | Bson::Symbol(s) => Value::String(s.clone()),
        Bson::DateTime(dt) => Value::DateTime(dt.to_chrono().naive_utc()),
        Bson::ObjectId(oid) => Value::ObjectId(*oid),
        Bson::Array(items) => Value::List(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| bson_to_value(item, &format!("{path}.{i}")))
                .collect::<ConversionResult<_>>()?,
        ),
        Bson::Document(doc) if doc.contains_key("$ref") => {
            Value::DbRef(parse_db_ref(doc).ok_or_else(|| {
                ConversionError::new(path, "convert", "Malformed DBRef document")
            })?)
        }
        Bson::Document(doc) => Value::Map(
            doc.iter()
                .map(|(key, item)| {
                    bson_to_value(item, &format!("{path}.{key}")).map(|value| (key.clone(), value))
                })
                .collect::<ConversionResult<_>>()?,
        ),
        other => {
            return Err(ConversionError::new(
                path,
                "convert",
                format!("Unsupported BSON type {:?}", other.element_type()),
            ))
        }
    })
}

fn parse_db_ref(doc: &Document) -> Option<DbRef> {
    let collection = doc.get_str("$ref").ok()?;
    let id = match doc.get("$id")? {
        Bson::ObjectId(oid) => *oid,
        Bson::String(s) => bson::oid::ObjectId::parse_str(s).ok()?,
        _ => return None,
    };
    Some(DbRef::new(collection, id))
}

//! MongoDB-specific fields: object identifiers and database references.

use std::fmt;
use std::sync::Arc;

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tbone_core::{ConversionResult, SchemaViolation};

use super::base::{field_options, DataType, Field, FieldOptions};
use super::composite::{ClosedRecord, CompositeField};
use crate::model::{Model, ModelSchema};
use crate::registry::{ModelRegistry, MODELS};
use crate::value::Value;

/// Name of the identifier field a referenced model must declare.
pub const ID_FIELD: &str = "_id";

// ── ObjectIdField ───────────────────────────────────────────────────────

/// A MongoDB `ObjectId`, exported as its 24-character hex string.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{Field, ObjectIdField};
/// use tbone_data::value::Value;
///
/// let field = ObjectIdField::new("_id");
/// let native = field.import(Value::from("5979c0f6fe4b3e5ff1a2b7c1")).unwrap();
/// assert!(native.as_object_id().is_some());
///
/// let err = field.import(Value::from("not-an-id")).unwrap_err();
/// assert_eq!(err.key, "convert");
/// ```
#[derive(Debug)]
pub struct ObjectIdField {
    options: FieldOptions,
}

impl ObjectIdField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name, &[("convert", "Could not cast value as ObjectId")]),
        }
    }

    /// Default producer generating a fresh identifier.
    pub fn generate() -> Value {
        Value::ObjectId(ObjectId::new())
    }
}

impl Field for ObjectIdField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::String
    }

    fn native_type(&self) -> &'static str {
        "ObjectId"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        match &value {
            Value::ObjectId(_) => Ok(value),
            Value::String(s) => ObjectId::parse_str(s)
                .map(Value::ObjectId)
                .map_err(|_| self.error("convert")),
            _ => Err(self.error("convert")),
        }
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        match value {
            Value::ObjectId(oid) => Ok(serde_json::Value::String(oid.to_hex())),
            Value::String(s) if ObjectId::parse_str(s).is_ok() => {
                Ok(serde_json::Value::String(s.to_lowercase()))
            }
            _ => Err(self.error("to_data")),
        }
    }
}

// ── DbRef / RefDict ─────────────────────────────────────────────────────

/// A native database reference: a collection name plus a document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbRef {
    pub collection: String,
    pub id: ObjectId,
}

impl DbRef {
    pub fn new(collection: impl Into<String>, id: ObjectId) -> Self {
        Self {
            collection: collection.into(),
            id,
        }
    }
}

impl fmt::Display for DbRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DBRef('{}', ObjectId('{}'))", self.collection, self.id)
    }
}

/// The wire form of a [`DbRef`]: exactly the keys `ref` and `id`.
///
/// # Examples
///
/// ```
/// use tbone_data::fields::RefDict;
///
/// let ok: Result<RefDict, _> =
///     serde_json::from_str(r#"{"ref": "movies", "id": "5979c0f6fe4b3e5ff1a2b7c1"}"#);
/// assert!(ok.is_ok());
///
/// let extra: Result<RefDict, _> =
///     serde_json::from_str(r#"{"ref": "movies", "id": "x", "name": "y"}"#);
/// assert!(extra.is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefDict {
    #[serde(rename = "ref")]
    pub collection: String,
    pub id: String,
}

impl RefDict {
    /// Reads one key. Keys outside `ref`/`id` are never present.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "ref" => Some(&self.collection),
            "id" => Some(&self.id),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "ref": self.collection, "id": self.id })
    }

    /// Parses the id into a native reference.
    pub fn to_db_ref(&self) -> Result<DbRef, bson::oid::Error> {
        ObjectId::parse_str(&self.id).map(|id| DbRef::new(self.collection.clone(), id))
    }
}

impl ClosedRecord for RefDict {
    const NAME: &'static str = "RefDict";
    const KEYS: &'static [&'static str] = &["ref", "id"];

    fn set(&mut self, key: &str, value: Value) -> Result<(), SchemaViolation> {
        let slot = match key {
            "ref" => &mut self.collection,
            "id" => &mut self.id,
            _ => return Err(Self::unknown_key(key)),
        };
        *slot = match value {
            Value::String(s) => s,
            Value::ObjectId(oid) if key == "id" => oid.to_hex(),
            _ => return Err(Self::invalid_value(key)),
        };
        Ok(())
    }
}

impl From<&DbRef> for RefDict {
    fn from(r: &DbRef) -> Self {
        Self {
            collection: r.collection.clone(),
            id: r.id.to_hex(),
        }
    }
}

// ── RefInput ────────────────────────────────────────────────────────────

/// The shapes a reference field accepts on import and export.
#[derive(Debug, Clone, Copy)]
pub enum RefInput<'a> {
    /// A model instance, referenced through its `_id`.
    Model(&'a Model),
    /// An already-built native reference.
    Native(&'a DbRef),
    /// A `{"ref", "id"}` mapping.
    Mapping(&'a indexmap::IndexMap<String, Value>),
}

impl<'a> RefInput<'a> {
    /// Classifies a value, or returns `None` for shapes no reference accepts.
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::Model(m) => Some(Self::Model(m)),
            Value::DbRef(r) => Some(Self::Native(r)),
            Value::Map(map) => Some(Self::Mapping(map)),
            _ => None,
        }
    }
}

// ── DbRefField ──────────────────────────────────────────────────────────

/// A reference to a document of a registered, collection-backed model.
///
/// The native form is a [`DbRef`]; the data form is a [`RefDict`].
///
/// # Examples
///
/// ```
/// use tbone_data::fields::{DbRefField, Field, ObjectIdField, StringField};
/// use tbone_data::model::{Model, ModelSchema};
/// use tbone_data::value::Value;
///
/// let movie = ModelSchema::builder("DocMovie")
///     .field(ObjectIdField::new("_id"))
///     .field(StringField::new("title"))
///     .register()
///     .unwrap();
/// let field = DbRefField::new("movie", "DocMovie").unwrap();
///
/// let mut m = Model::new(&movie);
/// m.set("_id", Value::from(bson::oid::ObjectId::parse_str("5979c0f6fe4b3e5ff1a2b7c1").unwrap()))
///     .unwrap();
/// assert_eq!(
///     field.export(&Value::from(m)).unwrap(),
///     serde_json::json!({"ref": "docmovie", "id": "5979c0f6fe4b3e5ff1a2b7c1"})
/// );
/// ```
#[derive(Debug)]
pub struct DbRefField {
    options: FieldOptions,
    model: Arc<ModelSchema>,
}

impl DbRefField {
    /// Binds the field to a model registered in the global registry.
    pub fn new(name: impl Into<String>, model_name: &str) -> Result<Self, SchemaViolation> {
        Self::with_registry(name, model_name, &MODELS)
    }

    /// Binds the field to a model registered in `registry`.
    pub fn with_registry(
        name: impl Into<String>,
        model_name: &str,
        registry: &ModelRegistry,
    ) -> Result<Self, SchemaViolation> {
        let model = registry
            .get(model_name)
            .ok_or_else(|| SchemaViolation::NotAModel(model_name.to_string()))?;
        Ok(Self::for_schema(name, &model))
    }

    /// Binds the field directly to a schema.
    pub fn for_schema(name: impl Into<String>, model: &Arc<ModelSchema>) -> Self {
        Self {
            options: FieldOptions::new(
                name,
                &[
                    ("missing_id", "Referenced model does not have the _id attribute"),
                    ("invalid_id", "Referenced model has an empty or invalid _id"),
                    ("convert", "Could not cast reference id as ObjectId"),
                ],
            ),
            model: Arc::clone(model),
        }
    }

    /// The schema of the referenced model.
    pub fn model(&self) -> &Arc<ModelSchema> {
        &self.model
    }

    fn is_bound_type(&self, model: &Model) -> bool {
        model.schema().name() == self.model.name()
    }

    /// Builds a reference to a model instance from its `_id`.
    fn reference_model(&self, model: &Model) -> ConversionResult<DbRef> {
        if !model.schema().has_field(ID_FIELD) {
            return Err(self.error("missing_id"));
        }
        let id = match model.get(ID_FIELD) {
            Some(Value::ObjectId(oid)) => *oid,
            Some(Value::String(s)) => {
                ObjectId::parse_str(s).map_err(|_| self.error("invalid_id"))?
            }
            _ => return Err(self.error("invalid_id")),
        };
        Ok(DbRef::new(model.schema().collection_name(), id))
    }

    fn record_from_mapping(
        &self,
        map: &indexmap::IndexMap<String, Value>,
        failure_key: &str,
    ) -> ConversionResult<RefDict> {
        self.check_keys(map)
            .and_then(|()| RefDict::from_map(map.clone()))
            .map_err(|violation| {
                tracing::debug!(field = %self.name(), %violation, "reference mapping rejected");
                self.error(failure_key)
            })
    }
}

impl Field for DbRefField {
    field_options!();

    fn data_type(&self) -> DataType {
        DataType::Map
    }

    fn native_type(&self) -> &'static str {
        "DbRef"
    }

    fn to_python(&self, value: Value) -> ConversionResult<Value> {
        let reference = match RefInput::classify(&value) {
            Some(RefInput::Model(m)) if self.is_bound_type(m) => self.reference_model(m)?,
            Some(RefInput::Native(r)) => r.clone(),
            Some(RefInput::Mapping(map)) => self
                .record_from_mapping(map, "to_python")?
                .to_db_ref()
                .map_err(|_| self.error("convert"))?,
            _ => return Err(self.error("to_python")),
        };
        Ok(Value::DbRef(reference))
    }

    fn to_data(&self, value: &Value) -> ConversionResult<serde_json::Value> {
        let record = match RefInput::classify(value) {
            Some(RefInput::Model(m)) if self.is_bound_type(m) => {
                RefDict::from(&self.reference_model(m)?)
            }
            Some(RefInput::Native(r)) => RefDict::from(r),
            Some(RefInput::Mapping(map)) => {
                let record = self.record_from_mapping(map, "to_data")?;
                RefDict::from(&record.to_db_ref().map_err(|_| self.error("convert"))?)
            }
            _ => return Err(self.error("to_data")),
        };
        Ok(record.to_json())
    }
}

impl CompositeField for DbRefField {
    fn record_name(&self) -> &str {
        RefDict::NAME
    }

    fn keys(&self) -> Vec<&str> {
        RefDict::KEYS.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::StringField;
    use serde_json::json;

    const HEX: &str = "5979c0f6fe4b3e5ff1a2b7c1";

    fn oid() -> ObjectId {
        ObjectId::parse_str(HEX).unwrap()
    }

    fn registry_with(name: &str, with_id: bool) -> (ModelRegistry, Arc<ModelSchema>) {
        let mut builder = ModelSchema::builder(name).collection("movies");
        if with_id {
            builder = builder.field(ObjectIdField::new("_id"));
        }
        let schema = builder.field(StringField::new("title")).build().unwrap();
        let registry = ModelRegistry::new();
        registry.register(Arc::clone(&schema));
        (registry, schema)
    }

    // ── ObjectIdField ────────────────────────────────────────────────

    #[test]
    fn test_object_id_import() {
        let f = ObjectIdField::new("_id");
        assert_eq!(f.import(Value::from(HEX)).unwrap(), Value::ObjectId(oid()));
        assert_eq!(f.import(Value::ObjectId(oid())).unwrap(), Value::ObjectId(oid()));
        assert_eq!(f.import(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_object_id_import_failures() {
        let f = ObjectIdField::new("_id");
        for bad in [Value::from("xyz"), Value::Int(5), Value::from("5979c0f6fe4b3e5ff1a2b7")] {
            let err = f.import(bad).unwrap_err();
            assert_eq!(err.key, "convert");
            assert_eq!(err.message, "Could not cast value as ObjectId");
        }
    }

    #[test]
    fn test_object_id_export() {
        let f = ObjectIdField::new("_id");
        assert_eq!(f.export(&Value::ObjectId(oid())).unwrap(), json!(HEX));
        assert_eq!(f.export(&Value::Int(1)).unwrap_err().key, "to_data");
    }

    #[test]
    fn test_object_id_generate() {
        assert!(matches!(ObjectIdField::generate(), Value::ObjectId(_)));
    }

    // ── RefDict ──────────────────────────────────────────────────────

    #[test]
    fn test_ref_dict_rejects_unknown_key() {
        let mut r = RefDict::default();
        assert_eq!(
            r.set("name", Value::from("x")).unwrap_err(),
            SchemaViolation::UnknownKey {
                record: "RefDict".into(),
                key: "name".into()
            }
        );
        assert_eq!(r, RefDict::default());
    }

    #[test]
    fn test_ref_dict_set_and_get() {
        let mut r = RefDict::default();
        r.set("ref", Value::from("movies")).unwrap();
        r.set("id", Value::ObjectId(oid())).unwrap();
        assert_eq!(r.get("ref"), Some("movies"));
        assert_eq!(r.get("id"), Some(HEX));
        assert_eq!(r.get("other"), None);
        assert!(matches!(
            r.set("ref", Value::Int(1)),
            Err(SchemaViolation::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_ref_dict_serde_shape() {
        let r = RefDict::from(&DbRef::new("movies", oid()));
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"ref": "movies", "id": HEX})
        );
        assert_eq!(r.to_json(), json!({"ref": "movies", "id": HEX}));
    }

    #[test]
    fn test_db_ref_display() {
        assert_eq!(
            DbRef::new("movies", oid()).to_string(),
            format!("DBRef('movies', ObjectId('{HEX}'))")
        );
    }

    // ── DbRefField ───────────────────────────────────────────────────

    #[test]
    fn test_db_ref_field_requires_registered_model() {
        let registry = ModelRegistry::new();
        assert_eq!(
            DbRefField::with_registry("movie", "Ghost", &registry).unwrap_err(),
            SchemaViolation::NotAModel("Ghost".into())
        );
    }

    #[test]
    fn test_db_ref_field_export_model() {
        let (registry, schema) = registry_with("RefMovie", true);
        let f = DbRefField::with_registry("movie", "RefMovie", &registry).unwrap();
        let mut m = Model::new(&schema);
        m.set("_id", oid()).unwrap();
        assert_eq!(
            f.export(&Value::from(m)).unwrap(),
            json!({"ref": "movies", "id": HEX})
        );
    }

    #[test]
    fn test_db_ref_field_missing_id() {
        let (registry, schema) = registry_with("NoIdMovie", false);
        let f = DbRefField::with_registry("movie", "NoIdMovie", &registry).unwrap();
        let err = f.export(&Value::from(Model::new(&schema))).unwrap_err();
        assert_eq!(err.key, "missing_id");
        assert_eq!(err.message, "Referenced model does not have the _id attribute");
    }

    #[test]
    fn test_db_ref_field_invalid_id() {
        let (registry, schema) = registry_with("UnsetIdMovie", true);
        let f = DbRefField::with_registry("movie", "UnsetIdMovie", &registry).unwrap();
        let err = f.export(&Value::from(Model::new(&schema))).unwrap_err();
        assert_eq!(err.key, "invalid_id");

        let mut m = Model::new(&schema);
        m.set("_id", "garbage").unwrap();
        assert_eq!(f.import(Value::from(m)).unwrap_err().key, "invalid_id");
    }

    #[test]
    fn test_db_ref_field_native_passthrough() {
        let (registry, _) = registry_with("NativeMovie", true);
        let f = DbRefField::with_registry("movie", "NativeMovie", &registry).unwrap();
        let r = Value::DbRef(DbRef::new("movies", oid()));
        assert_eq!(f.import(r.clone()).unwrap(), r);
        assert_eq!(f.export(&r).unwrap(), json!({"ref": "movies", "id": HEX}));
    }

    #[test]
    fn test_db_ref_field_import_mapping() {
        let (registry, _) = registry_with("MapMovie", true);
        let f = DbRefField::with_registry("movie", "MapMovie", &registry).unwrap();
        let native = f
            .import(Value::from(json!({"ref": "movies", "id": HEX})))
            .unwrap();
        assert_eq!(native, Value::DbRef(DbRef::new("movies", oid())));

        let bad_id = f.import(Value::from(json!({"ref": "movies", "id": "nope"})));
        assert_eq!(bad_id.unwrap_err().key, "convert");

        let extra = f.import(Value::from(json!({"ref": "movies", "id": HEX, "x": 1})));
        assert_eq!(extra.unwrap_err().key, "to_python");
    }

    #[test]
    fn test_db_ref_field_rejects_other_shapes() {
        let (registry, _) = registry_with("ShapeMovie", true);
        let (_, other) = registry_with("OtherShape", true);
        let f = DbRefField::with_registry("movie", "ShapeMovie", &registry).unwrap();
        assert_eq!(f.import(Value::from(HEX)).unwrap_err().key, "to_python");
        assert_eq!(f.export(&Value::Int(3)).unwrap_err().key, "to_data");
        assert_eq!(
            f.export(&Value::from(Model::new(&other))).unwrap_err().key,
            "to_data"
        );
    }

    #[test]
    fn test_db_ref_field_keys() {
        let (registry, _) = registry_with("KeysMovie", true);
        let f = DbRefField::with_registry("movie", "KeysMovie", &registry).unwrap();
        assert_eq!(f.keys(), vec!["ref", "id"]);
        assert_eq!(f.record_name(), "RefDict");
    }
}

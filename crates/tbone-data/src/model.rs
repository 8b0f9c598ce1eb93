//! Model schemas and instances.
//!
//! A [`ModelSchema`] is the declared shape of a record: ordered fields plus
//! ordered export accessors (computed properties included in exported data).
//! Schemas are built once with a [`SchemaBuilder`] and shared through `Arc`
//! by every [`Model`] instance.
//!
//! A [`Model`] holds one optional native value per declared field. Raw data
//! enters through [`Model::import_data`] and leaves through
//! [`Model::to_data`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tbone_core::logging::model_span;
use tbone_core::{ConversionError, ConversionResult, SchemaViolation, ValidationError, SETTINGS};

use crate::fields::Field;
use crate::registry::MODELS;
use crate::value::Value;

/// Exported primitive data of a model, keyed in declaration order.
pub type Data = serde_json::Map<String, serde_json::Value>;

/// A computed property included in exported data.
pub type ExportFn = Arc<dyn Fn(&Model) -> Value + Send + Sync>;

static NULL: Value = Value::Null;

/// A named export accessor.
#[derive(Clone)]
pub struct Export {
    name: String,
    func: ExportFn,
}

impl Export {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the accessor against an instance.
    pub fn compute(&self, model: &Model) -> Value {
        (self.func)(model)
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export").field("name", &self.name).finish()
    }
}

/// The immutable, shared shape of a model type.
pub struct ModelSchema {
    name: String,
    collection: Option<String>,
    fields: Vec<Box<dyn Field>>,
    positions: HashMap<String, usize>,
    exports: Vec<Export>,
}

impl ModelSchema {
    /// Starts declaring a model type.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// The model (class) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = &dyn Field> + '_ {
        self.fields.iter().map(|f| {
            let field: &dyn Field = f.as_ref();
            field
        })
    }

    pub fn field(&self, name: &str) -> Option<&dyn Field> {
        self.position(name).map(|pos| self.fields[pos].as_ref())
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name())
    }

    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The explicitly declared collection name, if any.
    pub fn explicit_collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// The storage collection, explicit or derived from the model name by the
    /// configured `collection_naming` policy.
    pub fn collection_name(&self) -> String {
        self.collection.clone().unwrap_or_else(|| {
            SETTINGS
                .current()
                .collection_naming
                .apply(&self.name)
        })
    }
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .field(
                "exports",
                &self.exports.iter().map(Export::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`ModelSchema`].
///
/// # Examples
///
/// ```
/// use tbone_data::fields::StringField;
/// use tbone_data::model::{Model, ModelSchema};
/// use tbone_data::value::Value;
///
/// let person = ModelSchema::builder("Person")
///     .field(StringField::new("first_name"))
///     .field(StringField::new("last_name"))
///     .export("full_name", |m: &Model| {
///         Value::from(format!(
///             "{} {}",
///             m.get_str("first_name").unwrap_or_default(),
///             m.get_str("last_name").unwrap_or_default()
///         ))
///     })
///     .build()
///     .unwrap();
///
/// let ron = Model::from_data(&person, [("first_name", "Ron"), ("last_name", "Burgundy")]).unwrap();
/// assert_eq!(ron.to_data().unwrap()["full_name"], "Ron Burgundy");
/// ```
pub struct SchemaBuilder {
    name: String,
    collection: Option<String>,
    fields: Vec<Box<dyn Field>>,
    exports: Vec<Export>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
            fields: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Appends a field. Declaration order is export order.
    pub fn field(mut self, field: impl Field + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }

    pub fn boxed_field(mut self, field: Box<dyn Field>) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a computed property exported after the fields.
    pub fn export<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Model) -> Value + Send + Sync + 'static,
    {
        self.exports.push(Export {
            name: name.into(),
            func: Arc::new(func),
        });
        self
    }

    /// Sets an explicit storage collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Finalizes the schema. Field and export names must be unique.
    pub fn build(self) -> Result<Arc<ModelSchema>, SchemaViolation> {
        let mut seen = HashSet::new();
        let names = self
            .fields
            .iter()
            .map(|f| f.name())
            .chain(self.exports.iter().map(Export::name));
        for name in names {
            if !seen.insert(name) {
                return Err(SchemaViolation::DuplicateField {
                    model: self.name.clone(),
                    field: name.to_string(),
                });
            }
        }

        let positions = self
            .fields
            .iter()
            .enumerate()
            .map(|(pos, f)| (f.name().to_string(), pos))
            .collect();

        tracing::debug!(
            model = %self.name,
            fields = self.fields.len(),
            exports = self.exports.len(),
            "schema built"
        );

        Ok(Arc::new(ModelSchema {
            name: self.name,
            collection: self.collection,
            fields: self.fields,
            positions,
            exports: self.exports,
        }))
    }

    /// Builds the schema and registers it in the global registry, replacing
    /// any schema previously registered under the same name.
    pub fn register(self) -> Result<Arc<ModelSchema>, SchemaViolation> {
        let schema = self.build()?;
        MODELS.register(Arc::clone(&schema));
        Ok(schema)
    }
}

/// An instance of a model type.
#[derive(Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
    values: Vec<Option<Value>>,
}

impl Model {
    /// Creates an instance with every field unset.
    pub fn new(schema: &Arc<ModelSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: vec![None; schema.len()],
        }
    }

    /// Creates an instance and imports `raw` into it.
    pub fn from_data<I, K, V>(schema: &Arc<ModelSchema>, raw: I) -> ConversionResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut model = Self::new(schema);
        model.import_data(raw)?;
        Ok(model)
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn class_name(&self) -> &str {
        self.schema.name()
    }

    /// Imports raw data, converting each declared field present in `raw`.
    ///
    /// Absent fields keep their current value, or receive their default when
    /// unset. Keys that name no field are ignored. The first conversion error
    /// is returned unchanged and leaves the instance untouched.
    pub fn import_data<I, K, V>(&mut self, raw: I) -> ConversionResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let span = model_span(self.class_name());
        let _guard = span.enter();

        let mut raw = collect_raw(raw);
        tracing::debug!(keys = raw.len(), "importing data");

        let mut staged = Vec::with_capacity(self.values.len());
        for (pos, field) in self.schema.fields.iter().enumerate() {
            if let Some(result) = self.resolve(field.as_ref(), pos, &mut raw) {
                staged.push((pos, result?));
            }
        }
        self.commit(staged, &raw);
        Ok(())
    }

    /// Like [`import_data`](Self::import_data), but attempts every field and
    /// reports all conversion failures at once as per-field errors.
    pub fn import_data_collect<I, K, V>(&mut self, raw: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let span = model_span(self.class_name());
        let _guard = span.enter();

        let mut raw = collect_raw(raw);
        let mut staged = Vec::with_capacity(self.values.len());
        let mut errors: HashMap<String, Vec<ValidationError>> = HashMap::new();
        for (pos, field) in self.schema.fields.iter().enumerate() {
            match self.resolve(field.as_ref(), pos, &mut raw) {
                Some(Ok(value)) => staged.push((pos, value)),
                Some(Err(err)) => errors
                    .entry(field.name().to_string())
                    .or_default()
                    .push(err.into()),
                None => {}
            }
        }
        if !errors.is_empty() {
            tracing::warn!(failed = errors.len(), "import rejected");
            return Err(ValidationError::with_field_errors(errors));
        }
        self.commit(staged, &raw);
        Ok(())
    }

    fn resolve(
        &self,
        field: &dyn Field,
        pos: usize,
        raw: &mut HashMap<String, Value>,
    ) -> Option<ConversionResult<Value>> {
        match raw.remove(field.name()) {
            Some(value) => {
                tracing::trace!(field = %field.name(), "importing field");
                Some(field.import(value))
            }
            None if self.values[pos].is_none() => field.default_value().map(Ok),
            None => None,
        }
    }

    fn commit(&mut self, staged: Vec<(usize, Value)>, ignored: &HashMap<String, Value>) {
        if !ignored.is_empty() {
            tracing::trace!(
                ignored = ?ignored.keys().collect::<Vec<_>>(),
                "ignoring undeclared keys"
            );
        }
        for (pos, value) in staged {
            self.values[pos] = Some(value);
        }
    }

    /// Exports the instance: declared fields in order (unset fields fall back
    /// to their default, then null), followed by the export accessors.
    pub fn to_data(&self) -> ConversionResult<Data> {
        let span = model_span(self.class_name());
        let _guard = span.enter();

        let mut data = Data::new();
        for (field, slot) in self.schema.fields.iter().zip(&self.values) {
            let fallback;
            let value = match slot {
                Some(value) => value,
                None => {
                    fallback = field.default_value().unwrap_or(Value::Null);
                    &fallback
                }
            };
            data.insert(field.name().to_string(), field.export(value)?);
        }
        for export in &self.schema.exports {
            let value = export
                .compute(self)
                .to_primitive()
                .map_err(|err| relabel_export(err, export.name()))?;
            data.insert(export.name().to_string(), value);
        }

        tracing::debug!(keys = data.len(), "exported data");
        Ok(data)
    }

    /// The stored value of a field; `None` if unset or undeclared.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .position(name)
            .and_then(|pos| self.values[pos].as_ref())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Stores a native value without conversion.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), SchemaViolation> {
        let pos = self.require_position(name)?;
        self.values[pos] = Some(value.into());
        Ok(())
    }

    /// Clears a field, returning its previous value.
    pub fn unset(&mut self, name: &str) -> Result<Option<Value>, SchemaViolation> {
        let pos = self.require_position(name)?;
        Ok(self.values[pos].take())
    }

    /// Returns `true` if the field holds a non-null value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    /// `(name, value)` pairs over exactly the declared fields, in order.
    ///
    /// This is a view of the stored slots: an unset field yields
    /// [`Value::Null`] even when it has a default. Defaults are stored by
    /// [`import_data`](Self::import_data) and emitted by
    /// [`to_data`](Self::to_data); an instance from [`Model::new`] has
    /// none stored yet.
    pub fn items(&self) -> Items<'_> {
        Items {
            model: self,
            next: 0,
        }
    }

    /// Runs every field's validation and collects per-field errors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors: HashMap<String, Vec<ValidationError>> = HashMap::new();
        for (field, slot) in self.schema.fields.iter().zip(&self.values) {
            let fallback;
            let value = match slot {
                Some(value) => value,
                None => {
                    fallback = field.default_value().unwrap_or(Value::Null);
                    &fallback
                }
            };
            if let Err(err) = field.validate(value) {
                errors.entry(field.name().to_string()).or_default().push(err);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(model = %self.class_name(), failed = errors.len(), "validation failed");
            Err(ValidationError::with_field_errors(errors))
        }
    }

    fn require_position(&self, name: &str) -> Result<usize, SchemaViolation> {
        self.schema
            .position(name)
            .ok_or_else(|| SchemaViolation::UnknownField {
                model: self.class_name().to_string(),
                field: name.to_string(),
            })
    }
}

fn collect_raw<I, K, V>(raw: I) -> HashMap<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    raw.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

fn relabel_export(err: ConversionError, export: &str) -> ConversionError {
    if err.field.is_empty() {
        ConversionError {
            field: export.to_string(),
            ..err
        }
    } else {
        err.nested_in(export)
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class_name())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Iterator returned by [`Model::items`].
#[derive(Clone)]
pub struct Items<'a> {
    model: &'a Model,
    next: usize,
}

impl<'a> Iterator for Items<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let model = self.model;
        let field = model.schema.fields.get(self.next)?;
        let value = model.values[self.next].as_ref().unwrap_or(&NULL);
        self.next += 1;
        Some((field.name(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.model.values.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Items<'_> {}

impl<'a> IntoIterator for &'a Model {
    type Item = (&'a str, &'a Value);
    type IntoIter = Items<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.items()
    }
}

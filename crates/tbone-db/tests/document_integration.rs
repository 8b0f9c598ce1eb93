//! Integration tests for the BSON document bridge.

use bson::oid::ObjectId;
use bson::{doc, Bson};
use chrono::NaiveDate;
use serde_json::json;
use tbone_data::fields::{
    DateTimeField, DbRefField, FieldExt, IntegerField, ListField, ModelField, ObjectIdField,
    StringField,
};
use tbone_data::model::{Model, ModelSchema};
use tbone_data::value::Value;
use tbone_db::{from_document, to_document, MongoCollection};

const MOVIE_ID: &str = "5979c0f6fe4b3e5ff1a2b7c1";

#[test]
fn test_review_document_round_trip() {
    let movie = ModelSchema::builder("DocIntegrationMovie")
        .collection("movies")
        .field(ObjectIdField::new("_id"))
        .field(StringField::new("title"))
        .register()
        .unwrap();
    let author = ModelSchema::builder("DocIntegrationAuthor")
        .field(StringField::new("name"))
        .build()
        .unwrap();
    let review = ModelSchema::builder("DocIntegrationReview")
        .field(ObjectIdField::new("_id").default_with(ObjectIdField::generate))
        .field(DbRefField::new("movie", "DocIntegrationMovie").unwrap())
        .field(ModelField::new("author", &author))
        .field(ListField::new("stars", IntegerField::new("star")))
        .field(DateTimeField::new("created"))
        .export("summary", |m: &Model| {
            let name = m
                .get("author")
                .and_then(Value::as_model)
                .and_then(|a| a.get_str("name"))
                .unwrap_or("anonymous");
            Value::from(format!("by {name}"))
        })
        .build()
        .unwrap();

    let created = NaiveDate::from_ymd_opt(2004, 7, 9)
        .unwrap()
        .and_hms_milli_opt(20, 15, 0, 250)
        .unwrap();
    let mut anchorman = Model::new(&movie);
    anchorman.set("_id", ObjectId::parse_str(MOVIE_ID).unwrap()).unwrap();

    let r = Model::from_data(
        &review,
        [
            ("movie", Value::from(anchorman)),
            ("author", Value::from(json!({"name": "Veronica"}))),
            ("stars", Value::from(vec![5_i64, 4])),
            ("created", Value::DateTime(created)),
        ],
    )
    .unwrap();

    let doc = r.to_document().unwrap();
    assert!(matches!(doc.get("_id"), Some(Bson::ObjectId(_))));
    let movie_ref = doc.get_document("movie").unwrap();
    assert_eq!(movie_ref.get_str("$ref").unwrap(), "movies");
    assert_eq!(
        movie_ref.get_object_id("$id").unwrap(),
        ObjectId::parse_str(MOVIE_ID).unwrap()
    );
    assert_eq!(doc.get_document("author").unwrap(), &doc! { "name": "Veronica" });
    assert_eq!(
        doc.get_array("stars").unwrap(),
        &vec![Bson::Int64(5), Bson::Int64(4)]
    );
    assert!(matches!(doc.get("created"), Some(Bson::DateTime(_))));
    assert_eq!(doc.get_str("summary").unwrap(), "by Veronica");

    let back = from_document(&review, &doc).unwrap();
    assert_eq!(back.get("_id"), r.get("_id"));
    assert_eq!(back.get("movie"), r.get("movie"));
    assert_eq!(back.get("created"), Some(&Value::DateTime(created)));
    assert_eq!(back.to_data().unwrap(), r.to_data().unwrap());
}

#[test]
fn test_from_document_ignores_undeclared_keys() {
    let schema = ModelSchema::builder("DocIntegrationLoose")
        .field(StringField::new("title").required())
        .build()
        .unwrap();
    let doc = doc! {
        "title": "Wake Up, Ron Burgundy",
        "legacy": Bson::JavaScriptCode("ignored".into()),
    };
    let m = from_document(&schema, &doc).unwrap();
    assert_eq!(m.get_str("title"), Some("Wake Up, Ron Burgundy"));
}

#[test]
fn test_from_document_reports_field_errors() {
    let schema = ModelSchema::builder("DocIntegrationStrict")
        .field(IntegerField::new("year"))
        .field(ObjectIdField::new("_id"))
        .build()
        .unwrap();

    let err = from_document(&schema, &doc! { "year": "MMIV" }).unwrap_err();
    assert_eq!(err.field, "year");
    assert_eq!(err.key, "convert");

    let err = from_document(&schema, &doc! { "_id": 12 }).unwrap_err();
    assert_eq!(err.message, "Could not cast value as ObjectId");
}

#[test]
fn test_unset_fields_store_defaults_or_null() {
    let schema = ModelSchema::builder("DocIntegrationDefaults")
        .field(StringField::new("status").default("draft"))
        .field(StringField::new("note"))
        .build()
        .unwrap();
    let doc = to_document(&Model::new(&schema)).unwrap();
    assert_eq!(doc.get_str("status").unwrap(), "draft");
    assert_eq!(doc.get("note"), Some(&Bson::Null));
}

#[test]
fn test_document_stores_field_native_types_for_raw_slots() {
    let movie = ModelSchema::builder("DocIntegrationRawMovie")
        .field(ObjectIdField::new("_id"))
        .field(StringField::new("title"))
        .register()
        .unwrap();
    let review = ModelSchema::builder("DocIntegrationRawReview")
        .field(ObjectIdField::new("_id"))
        .field(DbRefField::new("movie", "DocIntegrationRawMovie").unwrap())
        .field(DateTimeField::new("created"))
        .build()
        .unwrap();

    let mut anchorman = Model::new(&movie);
    anchorman.set("_id", MOVIE_ID).unwrap();
    anchorman.set("title", "Anchorman").unwrap();

    let review_id = "5979c0f6fe4b3e5ff1a2b7c2";
    let mut r = Model::new(&review);
    r.set("_id", review_id).unwrap();
    r.set("movie", anchorman).unwrap();
    r.set("created", "2004-07-09T20:15:00").unwrap();

    let doc = to_document(&r).unwrap();
    assert_eq!(
        doc.get("_id"),
        Some(&Bson::ObjectId(ObjectId::parse_str(review_id).unwrap()))
    );
    assert_eq!(
        doc.get_document("movie").unwrap(),
        &doc! {
            "$ref": "docintegrationrawmovie",
            "$id": ObjectId::parse_str(MOVIE_ID).unwrap(),
        }
    );
    assert!(matches!(doc.get("created"), Some(Bson::DateTime(_))));

    let back = from_document(&review, &doc).unwrap();
    assert_eq!(back.to_data().unwrap(), r.to_data().unwrap());
}

//! Ad-hoc queries over the Titanic passenger sample dataset.
//!
//! Everything expressible as a typed [`Document`] goes through a
//! [`Session`]; the `$and` filter and the aggregation pipeline need arrays of
//! documents and are built as raw BSON instead.

use mongodb::bson::{doc, Document as BsonDocument};

use crate::errors::StoreError;
use crate::models::{Document, FieldValue, FindOptions, SortDirection};
use crate::store::Session;

fn operator(field: &str, op: &str, operand: impl Into<FieldValue>) -> Document {
    let mut condition = Document::new();
    condition.insert(op, operand);
    let mut filter = Document::new();
    filter.insert(field, condition);
    filter
}

fn equals(field: &str, value: impl Into<FieldValue>) -> Document {
    let mut filter = Document::new();
    filter.insert(field, value);
    filter
}

pub fn survivors() -> Document {
    equals("survived", 1i64)
}

pub fn minors() -> Document {
    operator("age", "$lt", 18i64)
}

pub fn name_contains(fragment: &str) -> Document {
    operator("name", "$regex", fragment)
}

pub fn missing_ticket_number() -> Document {
    operator("ticket_number", "$exists", false)
}

pub fn free_passage() -> Document {
    equals("fare_paid", 0i64)
}

pub fn large_families() -> Document {
    operator("parents_children", "$gte", 5i64)
}

pub fn elderly() -> Document {
    operator("age", "$gte", 70i64)
}

/// Inclusion projection of `fields`, dropping `_id`.
pub fn projection_of(fields: &[&str]) -> Document {
    let mut projection = Document::new();
    for field in fields {
        projection.insert(*field, 1i64);
    }
    projection.insert("_id", 0i64);
    projection
}

pub fn surviving_minors() -> BsonDocument {
    doc! { "$and": [ { "survived": 1 }, { "age": { "$lt": 18 } } ] }
}

pub fn elderly_pipeline() -> Vec<BsonDocument> {
    vec![
        doc! { "$match": { "age": { "$gte": 70 } } },
        doc! { "$project": { "class": 1, "gender": 1, "survived": 1 } },
        doc! { "$sort": { "class": 1, "gender": 1 } },
        doc! { "$limit": 5 },
    ]
}

/// Results of the session-level walkthrough.
#[derive(Debug, Default)]
pub struct Summary {
    pub total: u64,
    pub sample: Option<Document>,
    pub survivors: u64,
    pub minors: u64,
    pub names_with_mis: u64,
    pub missing_ticket_number: u64,
    pub embarkation_points: Vec<FieldValue>,
    pub classes_travelling_free: Vec<FieldValue>,
    pub large_families: Vec<Document>,
    pub minors_by_survival: Vec<Document>,
    pub minors_by_class_and_gender: Vec<Document>,
    pub large_families_second_page: Vec<Document>,
    pub elderly: u64,
}

pub async fn summarize(session: &dyn Session) -> Result<Summary, StoreError> {
    let total = session.count(Document::new()).await?;
    let sample = session
        .find(Document::new(), FindOptions::default().limit(1))
        .await?
        .into_iter()
        .next();

    let name_and_age = projection_of(&["name", "age"]);

    Ok(Summary {
        total,
        sample,
        survivors: session.count(survivors()).await?,
        minors: session.count(minors()).await?,
        names_with_mis: session.count(name_contains("Mis")).await?,
        missing_ticket_number: session.count(missing_ticket_number()).await?,
        embarkation_points: session.distinct("point_of_embarkation", Document::new()).await?,
        classes_travelling_free: session.distinct("class", free_passage()).await?,
        large_families: session
            .find(
                large_families(),
                FindOptions::default().projection(name_and_age.clone()).limit(3),
            )
            .await?,
        minors_by_survival: session
            .find(
                minors(),
                FindOptions::default()
                    .projection(projection_of(&["class", "survived"]))
                    .sort_by("survived", SortDirection::Ascending),
            )
            .await?,
        minors_by_class_and_gender: session
            .find(
                minors(),
                FindOptions::default()
                    .projection(projection_of(&["class", "gender", "survived"]))
                    .sort_by("class", SortDirection::Ascending)
                    .sort_by("gender", SortDirection::Ascending),
            )
            .await?,
        large_families_second_page: session
            .find(
                large_families(),
                FindOptions::default().projection(name_and_age).skip(3).limit(3),
            )
            .await?,
        elderly: session.count(elderly()).await?,
    })
}

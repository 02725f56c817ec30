use indexmap::IndexMap;
use mongodb::bson::oid::ObjectId;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use thiserror::Error;

/// A scalar value stored in a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// Hex encoded object id, rendered as `{"$oid": "..."}`
    ObjectId(String),
}

/// A field value: a scalar, a list of scalars, or a nested document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Primitive(Primitive),
    List(Vec<Primitive>),
    Document(Document),
}

/// Schemaless document. Field order is insertion order; re-inserting a key
/// replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: IndexMap<String, FieldValue>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("expected a JSON object at the top level")]
    NotAnObject,

    #[error("field '{field}' holds a value that cannot be stored: {reason}")]
    Unsupported { field: String, reason: String },
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<FieldValue>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.entries.get_mut(key)
    }

    /// Resolves a dotted path (`address.city`) through nested documents.
    pub fn get_path(&self, path: &str) -> Option<&FieldValue> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            match current {
                FieldValue::Document(inner) => current = inner.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes `key`, keeping the order of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Field order is significant, as it is for stored documents.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl Extend<(String, FieldValue)> for Document {
    fn extend<T: IntoIterator<Item = (String, FieldValue)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl FromIterator<(String, FieldValue)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        let mut document = Document::new();
        document.extend(iter);
        document
    }
}

impl IntoIterator for Document {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<Primitive> for FieldValue {
    fn from(value: Primitive) -> Self {
        FieldValue::Primitive(value)
    }
}

impl From<Vec<Primitive>> for FieldValue {
    fn from(values: Vec<Primitive>) -> Self {
        FieldValue::List(values)
    }
}

impl From<Document> for FieldValue {
    fn from(document: Document) -> Self {
        FieldValue::Document(document)
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::Int(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Primitive::Double(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Primitive(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Primitive(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Primitive(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Primitive(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Primitive(value.into())
    }
}

impl Serialize for Primitive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Primitive::Null => serializer.serialize_unit(),
            Primitive::Bool(b) => serializer.serialize_bool(*b),
            Primitive::Int(i) => serializer.serialize_i64(*i),
            Primitive::Double(d) => serializer.serialize_f64(*d),
            Primitive::String(s) => serializer.serialize_str(s),
            Primitive::ObjectId(hex) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$oid", hex)?;
                map.end()
            }
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Primitive(p) => p.serialize(serializer),
            FieldValue::List(values) => values.serialize(serializer),
            FieldValue::Document(document) => document.serialize(serializer),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = ConversionError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Object(map) => document_from_json(map),
            _ => Err(ConversionError::NotAnObject),
        }
    }
}

fn document_from_json(
    map: serde_json::Map<String, serde_json::Value>,
) -> Result<Document, ConversionError> {
    let mut document = Document::new();
    for (field, value) in map {
        let converted = field_from_json(&field, value)?;
        document.insert(field, converted);
    }
    Ok(document)
}

fn field_from_json(field: &str, value: serde_json::Value) -> Result<FieldValue, ConversionError> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| {
                primitive_from_json(field, item)?.ok_or_else(|| ConversionError::Unsupported {
                    field: field.to_string(),
                    reason: "lists may only hold scalar values".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::List),
        serde_json::Value::Object(map) => match object_id_from_json(field, &map)? {
            Some(hex) => Ok(FieldValue::Primitive(Primitive::ObjectId(hex))),
            None => document_from_json(map).map(FieldValue::Document),
        },
        other => primitive_from_json(field, other)?
            .map(FieldValue::Primitive)
            .ok_or_else(|| ConversionError::Unsupported {
                field: field.to_string(),
                reason: "number out of range".to_string(),
            }),
    }
}

/// `Ok(None)` when the value is not a scalar.
fn primitive_from_json(
    field: &str,
    value: serde_json::Value,
) -> Result<Option<Primitive>, ConversionError> {
    Ok(match value {
        serde_json::Value::Null => Some(Primitive::Null),
        serde_json::Value::Bool(b) => Some(Primitive::Bool(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Primitive::Int(i)),
            None => n.as_f64().map(Primitive::Double),
        },
        serde_json::Value::String(s) => Some(Primitive::String(s)),
        serde_json::Value::Object(map) => object_id_from_json(field, &map)?.map(Primitive::ObjectId),
        serde_json::Value::Array(_) => None,
    })
}

/// Recognises `{"$oid": "<hex>"}`. The hex must be a valid ObjectId.
fn object_id_from_json(
    field: &str,
    map: &serde_json::Map<String, serde_json::Value>,
) -> Result<Option<String>, ConversionError> {
    let oid = match map.get("$oid") {
        Some(oid) if map.len() == 1 => oid,
        _ => return Ok(None),
    };
    oid.as_str()
        .and_then(|hex| ObjectId::parse_str(hex).ok())
        .map(|parsed| Some(parsed.to_hex()))
        .ok_or_else(|| ConversionError::Unsupported {
            field: field.to_string(),
            reason: format!("invalid $oid {}", oid),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let mut doc = Document::new();
        doc.insert("name", "Ada");
        doc.insert("age", 30i64);
        let previous = doc.insert("name", "Grace");

        assert_eq!(previous, Some(FieldValue::from("Ada")));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(doc.get("name"), Some(&FieldValue::from("Grace")));
    }

    #[test]
    fn serializes_in_insertion_order_with_object_ids() {
        let mut doc = Document::new();
        doc.insert("_id", Primitive::ObjectId("65a1f0c2e4b0a1b2c3d4e5f6".to_string()));
        doc.insert("name", vec![Primitive::from("Ada")]);
        doc.insert("age", 30i64);

        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            text,
            r#"{"_id":{"$oid":"65a1f0c2e4b0a1b2c3d4e5f6"},"name":["Ada"],"age":30}"#
        );
    }

    #[test]
    fn converts_json_objects() {
        let doc = Document::try_from(json!({
            "name": "Ada",
            "tags": ["a", 1, 2.5, null],
            "address": {"city": "London"},
            "ref": {"$oid": "65a1f0c2e4b0a1b2c3d4e5f6"}
        }))
        .unwrap();

        assert_eq!(doc.get("name"), Some(&FieldValue::from("Ada")));
        assert_eq!(
            doc.get("tags"),
            Some(&FieldValue::List(vec![
                Primitive::from("a"),
                Primitive::Int(1),
                Primitive::Double(2.5),
                Primitive::Null,
            ]))
        );
        assert_eq!(doc.get_path("address.city"), Some(&FieldValue::from("London")));
        assert_eq!(
            doc.get("ref"),
            Some(&FieldValue::Primitive(Primitive::ObjectId(
                "65a1f0c2e4b0a1b2c3d4e5f6".to_string()
            )))
        );
    }

    #[test]
    fn rejects_malformed_object_ids() {
        let err = Document::try_from(json!({"ref": {"$oid": "not-hex"}})).unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { ref field, .. } if field == "ref"));

        let err = Document::try_from(json!({"refs": [{"$oid": 42}]})).unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { ref field, .. } if field == "refs"));
    }

    #[test]
    fn equality_depends_on_field_order() {
        let mut first = Document::new();
        first.insert("a", 1i64);
        first.insert("b", 2i64);
        let mut second = Document::new();
        second.insert("b", 2i64);
        second.insert("a", 1i64);

        assert_ne!(first, second);
        second.remove("b");
        second.insert("b", 2i64);
        assert_eq!(first, second);
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut doc = Document::new();
        for key in ["a", "b", "c", "d"] {
            doc.insert(key, key);
        }
        doc.remove("b");
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "c", "d"]);
    }

    #[test]
    fn rejects_nested_lists_and_non_objects() {
        let err = Document::try_from(json!({"matrix": [[1, 2]]})).unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { ref field, .. } if field == "matrix"));

        assert_eq!(
            Document::try_from(json!(["not", "an", "object"])).unwrap_err(),
            ConversionError::NotAnObject
        );
    }
}

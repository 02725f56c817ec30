use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{filter, DocumentStore, Session};
use crate::errors::StoreError;
use crate::models::{Document, FieldValue, FindOptions, Namespace, Primitive};

type Collections = HashMap<Namespace, Vec<Document>>;

/// In-process store with the same session contract as [`super::MongoStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    sessions_opened: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions handed out so far.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    /// Snapshot of a collection's contents in insertion order.
    pub async fn documents(&self, namespace: &Namespace) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn session(&self, namespace: &Namespace) -> Result<Box<dyn Session>, StoreError> {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            namespace: namespace.clone(),
            collections: self.collections.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

struct MemorySession {
    namespace: Namespace,
    collections: Arc<RwLock<Collections>>,
}

impl MemorySession {
    async fn matching(&self, filter: &Document) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut found = Vec::new();
        for document in collections.get(&self.namespace).into_iter().flatten() {
            if filter::matches(document, filter)? {
                found.push(document.clone());
            }
        }
        Ok(found)
    }
}

fn with_id(document: Document) -> Document {
    if document.contains_key("_id") {
        return document;
    }
    let mut stamped = Document::new();
    stamped.insert("_id", Primitive::ObjectId(ObjectId::new().to_hex()));
    stamped.extend(document);
    stamped
}

#[async_trait]
impl Session for MemorySession {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, StoreError> {
        let mut found = self.matching(&filter).await?;
        filter::sort(&mut found, &options.sort);

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = match options.limit {
            Some(limit) if limit != 0 => limit.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        found
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| match &options.projection {
                Some(projection) => filter::project(document, projection),
                None => Ok(document),
            })
            .collect()
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(self.namespace.clone())
            .or_default()
            .push(with_id(document));
        Ok(())
    }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<(), StoreError> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut collections = self.collections.write().await;
        collections
            .entry(self.namespace.clone())
            .or_default()
            .extend(documents.into_iter().map(with_id));
        Ok(())
    }

    async fn count(&self, filter: Document) -> Result<u64, StoreError> {
        Ok(self.matching(&filter).await?.len() as u64)
    }

    async fn distinct(&self, field: &str, filter: Document) -> Result<Vec<FieldValue>, StoreError> {
        let mut values: Vec<FieldValue> = Vec::new();
        for document in self.matching(&filter).await? {
            let candidates: Vec<FieldValue> = match document.get_path(field) {
                Some(FieldValue::List(items)) => {
                    items.iter().cloned().map(FieldValue::Primitive).collect()
                }
                Some(other) => vec![other.clone()],
                None => Vec::new(),
            };
            for candidate in candidates {
                if !values.contains(&candidate) {
                    values.push(candidate);
                }
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortDirection;

    fn ns() -> Namespace {
        Namespace::new("titanic", "guests")
    }

    fn guest(name: &str, class: i64, age: i64) -> Document {
        let mut doc = Document::new();
        doc.insert("name", name);
        doc.insert("class", class);
        doc.insert("age", age);
        doc
    }

    async fn seeded() -> (MemoryStore, Box<dyn Session>) {
        let store = MemoryStore::new();
        let session = store.session(&ns()).await.unwrap();
        session
            .insert_many(vec![
                guest("Allen", 1, 29),
                guest("Braund", 3, 22),
                guest("Cumings", 1, 38),
                guest("Heikkinen", 3, 26),
                guest("Palsson", 3, 2),
            ])
            .await
            .unwrap();
        (store, session)
    }

    #[tokio::test]
    async fn assigns_ids_first() {
        let (store, _session) = seeded().await;
        let docs = store.documents(&ns()).await;
        assert_eq!(docs.len(), 5);
        for doc in docs {
            assert_eq!(doc.keys().next(), Some("_id"));
            assert!(matches!(doc.get("_id"), Some(FieldValue::Primitive(Primitive::ObjectId(_)))));
        }
    }

    #[tokio::test]
    async fn keeps_caller_supplied_ids() {
        let store = MemoryStore::new();
        let session = store.session(&ns()).await.unwrap();
        let mut doc = guest("Ada", 1, 30);
        doc.insert("_id", "custom");
        session.insert_one(doc).await.unwrap();

        let docs = store.documents(&ns()).await;
        assert_eq!(docs[0].get("_id"), Some(&FieldValue::from("custom")));
    }

    #[tokio::test]
    async fn find_applies_sort_skip_limit_and_projection() {
        let (_store, session) = seeded().await;

        let mut projection = Document::new();
        projection.insert("name", 1i64);
        projection.insert("_id", 0i64);

        let options = FindOptions::default()
            .projection(projection)
            .sort_by("age", SortDirection::Ascending)
            .skip(1)
            .limit(2);
        let docs = session.find(Document::new(), options).await.unwrap();

        let names: Vec<_> = docs.iter().map(|d| d.get("name").cloned().unwrap()).collect();
        assert_eq!(names, vec![FieldValue::from("Braund"), FieldValue::from("Heikkinen")]);
        assert!(docs.iter().all(|d| d.len() == 1));
    }

    #[tokio::test]
    async fn count_and_distinct() {
        let (_store, session) = seeded().await;

        let mut third_class = Document::new();
        third_class.insert("class", 3i64);
        assert_eq!(session.count(third_class.clone()).await.unwrap(), 3);
        assert_eq!(session.count(Document::new()).await.unwrap(), 5);

        let classes = session.distinct("class", Document::new()).await.unwrap();
        assert_eq!(classes, vec![FieldValue::from(1i64), FieldValue::from(3i64)]);

        let names = session.distinct("name", third_class).await.unwrap();
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let (store, _session) = seeded().await;
        let other = store.session(&Namespace::new("somedb", "somecol")).await.unwrap();
        assert_eq!(other.count(Document::new()).await.unwrap(), 0);
        assert_eq!(store.sessions_opened(), 2);
    }

    #[tokio::test]
    async fn empty_batches_are_no_ops() {
        let store = MemoryStore::new();
        let session = store.session(&ns()).await.unwrap();
        session.insert_many(Vec::new()).await.unwrap();
        assert!(store.documents(&ns()).await.is_empty());
    }
}

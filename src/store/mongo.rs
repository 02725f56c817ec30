use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document as BsonDocument},
    error::{Error as MongoError, ErrorKind},
    options::ClientOptions,
    Client, Collection,
};
use tracing::{debug, info};

use super::{DocumentStore, Session};
use crate::errors::StoreError;
use crate::models::{Document, FieldValue, FindOptions, Namespace, Primitive};

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub app_name: Option<String>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            min_pool_size: 0,
            app_name: Some("mongo-api".to_string()),
        }
    }
}

/// Document store backed by a MongoDB deployment. Holds one pooled client;
/// sessions borrow connections from it for the duration of a call.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    pub async fn connect(uri: &str, pool: PoolSettings) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| classify(e, false))?;
        options.max_pool_size = Some(pool.max_pool_size);
        options.min_pool_size = Some(pool.min_pool_size);
        options.app_name = pool.app_name;

        let client = Client::with_options(options).map_err(|e| classify(e, false))?;
        info!(
            "MongoDB client configured (max_pool_size={}, min_pool_size={})",
            pool.max_pool_size, pool.min_pool_size
        );
        Ok(Self { client })
    }

    pub fn collection(&self, namespace: &Namespace) -> Collection<BsonDocument> {
        self.client
            .database(&namespace.database)
            .collection::<BsonDocument>(&namespace.collection)
    }

    /// Runs a raw aggregation pipeline and materialises the results.
    pub async fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: Vec<BsonDocument>,
    ) -> Result<Vec<BsonDocument>, StoreError> {
        let cursor = self
            .collection(namespace)
            .aggregate(pipeline)
            .await
            .map_err(|e| classify(e, false))?;
        cursor.try_collect().await.map_err(|e| classify(e, false))
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn session(&self, namespace: &Namespace) -> Result<Box<dyn Session>, StoreError> {
        debug!("Opening session on {}", namespace);
        Ok(Box::new(MongoSession {
            namespace: namespace.clone(),
            collection: self.collection(namespace),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| classify(e, false))
    }
}

struct MongoSession {
    namespace: Namespace,
    collection: Collection<BsonDocument>,
}

#[async_trait]
impl Session for MongoSession {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, StoreError> {
        let mut find = self.collection.find(to_bson_document(filter));
        if let Some(projection) = options.projection {
            find = find.projection(to_bson_document(projection));
        }
        if !options.sort.is_empty() {
            let mut sort = BsonDocument::new();
            for (field, direction) in options.sort {
                sort.insert(field, direction.as_i32());
            }
            find = find.sort(sort);
        }
        if let Some(skip) = options.skip {
            find = find.skip(skip);
        }
        if let Some(limit) = options.limit {
            find = find.limit(limit);
        }

        let cursor = find.await.map_err(|e| classify(e, false))?;
        let raw: Vec<BsonDocument> = cursor.try_collect().await.map_err(|e| classify(e, false))?;
        Ok(raw.into_iter().map(Document::from).collect())
    }

    async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        self.collection
            .insert_one(to_bson_document(document))
            .await
            .map(|_| ())
            .map_err(|e| classify(e, true))
    }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<(), StoreError> {
        if documents.is_empty() {
            return Ok(());
        }
        let batch: Vec<BsonDocument> = documents.into_iter().map(to_bson_document).collect();
        self.collection
            .insert_many(batch)
            .await
            .map(|_| ())
            .map_err(|e| classify(e, true))
    }

    async fn count(&self, filter: Document) -> Result<u64, StoreError> {
        self.collection
            .count_documents(to_bson_document(filter))
            .await
            .map_err(|e| classify(e, false))
    }

    async fn distinct(&self, field: &str, filter: Document) -> Result<Vec<FieldValue>, StoreError> {
        let values = self
            .collection
            .distinct(field, to_bson_document(filter))
            .await
            .map_err(|e| classify(e, false))?;
        Ok(values.into_iter().map(field_from_bson).collect())
    }
}

/// Connection trouble is reported as such; anything else failing a write is
/// a rejection of the payload.
fn classify(error: MongoError, is_write: bool) -> StoreError {
    let message = error.to_string();
    match *error.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
            StoreError::Connection { message }
        }
        ErrorKind::InvalidArgument { .. } | ErrorKind::Write(_) => StoreError::Rejected { message },
        _ if is_write => StoreError::Rejected { message },
        _ => StoreError::Query { message },
    }
}

pub fn to_bson_document(document: Document) -> BsonDocument {
    document
        .into_iter()
        .map(|(key, value)| (key, field_to_bson(value)))
        .collect()
}

fn field_to_bson(value: FieldValue) -> Bson {
    match value {
        FieldValue::Primitive(p) => primitive_to_bson(p),
        FieldValue::List(items) => Bson::Array(items.into_iter().map(primitive_to_bson).collect()),
        FieldValue::Document(d) => Bson::Document(to_bson_document(d)),
    }
}

fn primitive_to_bson(value: Primitive) -> Bson {
    match value {
        Primitive::Null => Bson::Null,
        Primitive::Bool(b) => Bson::Boolean(b),
        Primitive::Int(i) => match i32::try_from(i) {
            Ok(small) => Bson::Int32(small),
            Err(_) => Bson::Int64(i),
        },
        Primitive::Double(d) => Bson::Double(d),
        Primitive::String(s) => Bson::String(s),
        Primitive::ObjectId(hex) => match ObjectId::parse_str(&hex) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => Bson::String(hex),
        },
    }
}

/// Values outside the typed model (timestamps, decimals, binary, arrays of
/// documents and the like) are kept as their relaxed extended JSON text, so
/// every stored document can be read back.
impl From<BsonDocument> for Document {
    fn from(raw: BsonDocument) -> Self {
        raw.into_iter()
            .map(|(key, value)| (key, field_from_bson(value)))
            .collect()
    }
}

fn field_from_bson(value: Bson) -> FieldValue {
    match value {
        Bson::Array(items) => FieldValue::List(items.into_iter().map(primitive_from_bson).collect()),
        Bson::Document(inner) => FieldValue::Document(Document::from(inner)),
        other => FieldValue::Primitive(primitive_from_bson(other)),
    }
}

fn primitive_from_bson(value: Bson) -> Primitive {
    match value {
        Bson::Null | Bson::Undefined => Primitive::Null,
        Bson::Boolean(b) => Primitive::Bool(b),
        Bson::Int32(i) => Primitive::Int(i64::from(i)),
        Bson::Int64(i) => Primitive::Int(i),
        Bson::Double(d) => Primitive::Double(d),
        Bson::String(s) | Bson::Symbol(s) => Primitive::String(s),
        Bson::ObjectId(oid) => Primitive::ObjectId(oid.to_hex()),
        Bson::DateTime(dt) => Primitive::String(dt.to_string()),
        other => Primitive::String(other.into_relaxed_extjson().to_string()),
    }
}

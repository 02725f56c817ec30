use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::{Document, FieldValue, FindOptions, Namespace};

pub mod filter;
pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::{MongoStore, PoolSettings};

/// Source of sessions against named database/collection pairs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a handle for one operation. Dropping it releases whatever it
    /// borrowed from the store.
    async fn session(&self, namespace: &Namespace) -> Result<Box<dyn Session>, StoreError>;

    /// Round trip to the store to confirm it is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Operations against a single collection.
#[async_trait]
pub trait Session: Send + Sync {
    fn namespace(&self) -> &Namespace;

    async fn find(&self, filter: Document, options: FindOptions) -> Result<Vec<Document>, StoreError>;

    async fn insert_one(&self, document: Document) -> Result<(), StoreError>;

    /// An empty batch is a no-op.
    async fn insert_many(&self, documents: Vec<Document>) -> Result<(), StoreError>;

    async fn count(&self, filter: Document) -> Result<u64, StoreError>;

    async fn distinct(&self, field: &str, filter: Document) -> Result<Vec<FieldValue>, StoreError>;
}

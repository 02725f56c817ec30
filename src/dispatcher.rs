use std::sync::Arc;

use tracing::debug;

use crate::errors::StoreError;
use crate::models::{Document, FindOptions, Namespace};
use crate::store::DocumentStore;

/// Issues exactly one store call per operation, each on a freshly opened
/// session that is dropped before returning.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
    find_target: Namespace,
    bulk_target: Namespace,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, find_target: Namespace, bulk_target: Namespace) -> Self {
        Self {
            store,
            find_target,
            bulk_target,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn find_target(&self) -> &Namespace {
        &self.find_target
    }

    pub fn bulk_target(&self) -> &Namespace {
        &self.bulk_target
    }

    /// Every document matching `filter`, rendered as a JSON array.
    pub async fn find(&self, filter: Document) -> Result<String, StoreError> {
        let documents = self.find_documents(filter, FindOptions::default()).await?;
        render_documents(&documents)
    }

    pub async fn find_documents(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let session = self.store.session(&self.find_target).await?;
        let documents = session.find(filter, options).await?;
        debug!("find on {} returned {} documents", self.find_target, documents.len());
        Ok(documents)
    }

    pub async fn insert_one(&self, document: Document) -> Result<(), StoreError> {
        let session = self.store.session(&self.find_target).await?;
        session.insert_one(document).await?;
        debug!("inserted one document into {}", self.find_target);
        Ok(())
    }

    pub async fn insert_many(&self, documents: Vec<Document>) -> Result<(), StoreError> {
        let session = self.store.session(&self.bulk_target).await?;
        let count = documents.len();
        session.insert_many(documents).await?;
        debug!("inserted {} documents into {}", count, self.bulk_target);
        Ok(())
    }

    /// Not implemented. Opens a session and leaves the collection untouched.
    pub async fn delete(&self) -> Result<(), StoreError> {
        let _session = self.store.session(&self.find_target).await?;
        Err(StoreError::NotImplemented { operation: "delete" })
    }

    /// Not implemented. Opens a session and leaves the collection untouched.
    pub async fn update(&self) -> Result<(), StoreError> {
        let _session = self.store.session(&self.find_target).await?;
        Err(StoreError::NotImplemented { operation: "update" })
    }
}

pub fn render_documents(documents: &[Document]) -> Result<String, StoreError> {
    Ok(serde_json::to_string(documents)?)
}

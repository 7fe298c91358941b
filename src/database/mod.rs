//! Document store port and its adapters.
//!
//! Services talk to [`DocumentStore`] only; `MongoStore` is the production
//! adapter and `MemoryStore` backs tests and `memory://` development runs.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use thiserror::Error;

pub const USERS: &str = "users";
pub const PRODUCTS: &str = "products";
pub const BIDS: &str = "bids";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the connection could not be set up.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// A unique index rejected the write.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("store query failed: {0}")]
    Query(String),
}

/// Sort and limit applied to a `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Sort specification in store syntax: `{ field: 1 | -1 }`, keys in priority order.
    pub sort: Option<Document>,
    pub limit: Option<i64>,
}

impl QueryOptions {
    pub fn sorted_by(sort: Document) -> Self {
        Self {
            sort: Some(sort),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Counts reported by an update, as acknowledged by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Collection-scoped document operations. Filters are equality predicates
/// in store syntax; `update_one` merges `changes` into the first match.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: QueryOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError>;

    /// Inserts `document` and returns the generated `_id`.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<Bson, StoreError>;

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        changes: Document,
    ) -> Result<UpdateSummary, StoreError>;

    /// Returns the number of deleted documents (0 or 1).
    async fn delete_one(&self, collection: &str, filter: Document) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    async fn shutdown(&self);
}

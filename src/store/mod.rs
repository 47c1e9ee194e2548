//! DocumentStore - the storage collaborator behind every repository.
//!
//! The registry hands compiled [`Filter`]s to a `DocumentStore` and never
//! touches the wire protocol itself. A MongoDB adapter translates the filter
//! tree into BSON; [`InMemoryDocumentStore`] evaluates it directly.

mod in_memory;

use thiserror::Error;

use crate::entity::IndexSpec;
use crate::query::{Filter, SortField, UpdateBatch};
use crate::value::{Document, Value};

pub use in_memory::InMemoryDocumentStore;

/// Error type for document store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("duplicate key in {collection} for unique index {index}")]
    DuplicateKey { collection: String, index: String },
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Sorting and windowing for a find.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FindOptions {
    pub sort: Vec<SortField>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

/// Abstract document storage, one method per operation the core issues.
///
/// Every method receives the collection name so one store can serve many
/// repositories. Booleans report whether the store acknowledged the write.
pub trait DocumentStore: Send + Sync {
    /// Every document matching `filter`, sorted and windowed.
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// The first document matching `filter` after sorting.
    fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &[SortField],
    ) -> Result<Option<Document>, StoreError>;

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    fn delete_many(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError>;

    /// Apply `updates` to every matching document. Never inserts.
    fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        updates: &UpdateBatch,
    ) -> Result<bool, StoreError>;

    /// Replace the document whose `id_field` equals `id`, inserting it when
    /// absent.
    fn upsert_by_id(
        &self,
        collection: &str,
        id_field: &str,
        id: &Value,
        document: Document,
    ) -> Result<bool, StoreError>;

    fn insert(&self, collection: &str, document: Document) -> Result<bool, StoreError>;

    /// Drop the collection and everything in it.
    fn delete_collection(&self, collection: &str) -> Result<bool, StoreError>;

    fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), StoreError>;

    fn drop_indexes(&self, collection: &str) -> Result<(), StoreError>;
}

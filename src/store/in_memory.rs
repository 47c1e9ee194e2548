//! InMemoryDocumentStore - HashMap-backed document store for testing and development.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};

use crate::entity::IndexSpec;
use crate::query::{FieldUpdate, Filter, SortField, UpdateBatch};
use crate::value::{Document, Value};

use super::{DocumentStore, FindOptions, StoreError};

#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

impl Collection {
    /// Reject `doc` if it collides with another document on a unique index.
    /// `skip` is the position being replaced, if any.
    fn check_unique(
        &self,
        name: &str,
        doc: &Document,
        skip: Option<usize>,
    ) -> Result<(), StoreError> {
        self.check_unique_among(name, &self.documents, doc, skip)
    }

    /// As [`Collection::check_unique`], against a candidate document set.
    fn check_unique_among(
        &self,
        name: &str,
        documents: &[Document],
        doc: &Document,
        skip: Option<usize>,
    ) -> Result<(), StoreError> {
        for index in self.indexes.iter().filter(|i| i.unique) {
            let key = |d: &Document| -> Vec<Value> {
                index
                    .keys
                    .iter()
                    .map(|(field, _)| d.get(field).cloned().unwrap_or_default())
                    .collect()
            };
            let wanted = key(doc);
            let clash = documents
                .iter()
                .enumerate()
                .filter(|(pos, _)| Some(*pos) != skip)
                .any(|(_, other)| {
                    key(other)
                        .iter()
                        .zip(&wanted)
                        .all(|(a, b)| a.loose_eq(b))
                });
            if clash {
                return Err(StoreError::DuplicateKey {
                    collection: name.to_string(),
                    index: index.name(),
                });
            }
        }
        Ok(())
    }
}

/// In-memory document store backed by a HashMap of collections.
///
/// Clone-friendly via Arc; clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    index_creations: Arc<AtomicUsize>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create_index` calls received so far.
    pub fn index_creations(&self) -> usize {
        self.index_creations.load(AtomicOrdering::SeqCst)
    }

    /// Indexes currently defined on a collection.
    pub fn indexes(&self, collection: &str) -> Result<Vec<IndexSpec>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default())
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> Result<usize, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(collections.get(collection).map_or(0, |c| c.documents.len()))
    }

    fn matching(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &[SortField],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        let mut found: Vec<Document> = collections
            .get(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .filter(|d| filter.matches(d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if !sort.is_empty() {
            found.sort_by(|a, b| compare_documents(a, b, sort));
        }
        Ok(found)
    }
}

fn compare_documents(a: &Document, b: &Document, sort: &[SortField]) -> Ordering {
    let null = Value::Null;
    for key in sort {
        let left = a.get(&key.field).unwrap_or(&null);
        let right = b.get(&key.field).unwrap_or(&null);
        let ord = left.sort_cmp(right);
        let ord = if key.ascending { ord } else { ord.reverse() };
        if ord.is_ne() {
            return ord;
        }
    }
    Ordering::Equal
}

fn apply_updates(doc: &mut Document, updates: &UpdateBatch) {
    for update in updates.updates() {
        match update {
            FieldUpdate::Set { field, value } => {
                doc.insert(field.clone(), value.clone());
            }
            FieldUpdate::Unset { field } => {
                doc.remove(field);
            }
            FieldUpdate::Rename { field, to } => {
                if let Some(value) = doc.remove(field) {
                    doc.insert(to.clone(), value);
                }
            }
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let found = self.matching(collection, filter, &options.sort)?;
        let skip = options.skip.unwrap_or(0);
        let limit = options.limit.unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(skip).take(limit).collect())
    }

    fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        sort: &[SortField],
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.matching(collection, filter, sort)?.into_iter().next())
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        let count = collections.get(collection).map_or(0, |c| {
            c.documents.iter().filter(|d| filter.matches(d)).count()
        });
        Ok(count as u64)
    }

    fn delete_many(&self, collection: &str, filter: &Filter) -> Result<bool, StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        if let Some(c) = collections.get_mut(collection) {
            c.documents.retain(|d| !filter.matches(d));
        }
        Ok(true)
    }

    fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        updates: &UpdateBatch,
    ) -> Result<bool, StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        if let Some(c) = collections.get_mut(collection) {
            // Update a copy so a unique-index clash leaves the collection as it was.
            let mut updated = c.documents.clone();
            let mut touched = Vec::new();
            for (pos, doc) in updated.iter_mut().enumerate() {
                if filter.matches(doc) {
                    apply_updates(doc, updates);
                    touched.push(pos);
                }
            }
            for pos in touched {
                c.check_unique_among(collection, &updated, &updated[pos], Some(pos))?;
            }
            c.documents = updated;
        }
        Ok(true)
    }

    fn upsert_by_id(
        &self,
        collection: &str,
        id_field: &str,
        id: &Value,
        document: Document,
    ) -> Result<bool, StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        let c = collections.entry(collection.to_string()).or_default();
        let position = c
            .documents
            .iter()
            .position(|d| d.get(id_field).is_some_and(|v| v.loose_eq(id)));
        c.check_unique(collection, &document, position)?;
        match position {
            Some(pos) => c.documents[pos] = document,
            None => c.documents.push(document),
        }
        Ok(true)
    }

    fn insert(&self, collection: &str, document: Document) -> Result<bool, StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        let c = collections.entry(collection.to_string()).or_default();
        c.check_unique(collection, &document, None)?;
        c.documents.push(document);
        Ok(true)
    }

    fn delete_collection(&self, collection: &str) -> Result<bool, StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        collections.remove(collection);
        Ok(true)
    }

    fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), StoreError> {
        self.index_creations.fetch_add(1, AtomicOrdering::SeqCst);
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        let c = collections.entry(collection.to_string()).or_default();
        if !c.indexes.contains(index) {
            c.indexes.push(index.clone());
        }
        Ok(())
    }

    fn drop_indexes(&self, collection: &str) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        if let Some(c) = collections.get_mut(collection) {
            c.indexes.clear();
        }
        Ok(())
    }
}

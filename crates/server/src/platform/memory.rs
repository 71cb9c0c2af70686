//! In-memory document store for tests and local development.
//!
//! Implements the same contract as [`HttpStore`](super::HttpStore) but keeps
//! everything in process and bumps the per-collection change channels
//! synchronously on every mutation, so subscription behavior can be tested
//! without a network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use super::store::{Document, DocumentStore};
use super::StoreError;

/// An in-memory [`DocumentStore`].
///
/// Collections preserve insertion order, which is the order `list` returns.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    collections: Mutex<HashMap<String, Vec<StoredDoc>>>,
    channels: Mutex<HashMap<String, watch::Sender<u64>>>,
}

struct StoredDoc {
    id: String,
    fields: Value,
}

impl MemoryStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal a change on `collection`.
    fn bump(&self, collection: &str) {
        let mut channels = self.channels();
        let tx = channels
            .entry(collection.to_owned())
            .or_insert_with(|| watch::channel(0).0);
        tx.send_modify(|version| *version += 1);
    }

    // A poisoned lock means a panic mid-mutation; propagating the panic is
    // the only sound option for an in-process store.
    #[allow(clippy::unwrap_used)]
    fn collections(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<StoredDoc>>> {
        self.inner.collections.lock().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn channels(&self) -> std::sync::MutexGuard<'_, HashMap<String, watch::Sender<u64>>> {
        self.inner.channels.lock().unwrap()
    }

    fn with_doc<T>(
        &self,
        collection: &str,
        id: &str,
        apply: impl FnOnce(&mut Value) -> T,
    ) -> Result<T, StoreError> {
        let mut collections = self.collections();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        Ok(apply(&mut doc.fields))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, fields: Value) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.collections()
            .entry(collection.to_owned())
            .or_default()
            .push(StoredDoc {
                id: id.clone(),
                fields,
            });
        self.bump(collection);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(|d| Document {
                id: d.id.clone(),
                fields: d.fields.clone(),
            }))
    }

    async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
        {
            let mut collections = self.collections();
            let docs = collections.entry(collection.to_owned()).or_default();
            match docs.iter_mut().find(|d| d.id == id) {
                Some(doc) => doc.fields = fields,
                None => docs.push(StoredDoc {
                    id: id.to_owned(),
                    fields,
                }),
            }
        }
        self.bump(collection);
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError> {
        self.with_doc(collection, id, |existing| {
            if let (Some(target), Some(updates)) = (existing.as_object_mut(), fields.as_object()) {
                for (key, value) in updates {
                    target.insert(key.clone(), value.clone());
                }
            }
        })?;
        self.bump(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let removed = {
            let mut collections = self.collections();
            collections
                .get_mut(collection)
                .is_some_and(|docs| {
                    let before = docs.len();
                    docs.retain(|d| d.id != id);
                    docs.len() != before
                })
        };
        if removed {
            self.bump(collection);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|d| Document {
                        id: d.id.clone(),
                        fields: d.fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| {
                        d.fields
                            .get(field)
                            .and_then(Value::as_array)
                            .is_some_and(|items| {
                                items.iter().any(|item| item.as_str() == Some(value))
                            })
                    })
                    .map(|d| Document {
                        id: d.id.clone(),
                        fields: d.fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        self.with_doc(collection, id, |fields| {
            let current = fields.get(field).and_then(Value::as_i64).unwrap_or(0);
            if let Some(target) = fields.as_object_mut() {
                target.insert(field.to_owned(), Value::from(current + delta));
            }
        })?;
        self.bump(collection);
        Ok(())
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.with_doc(collection, id, |fields| {
            let Some(target) = fields.as_object_mut() else {
                return;
            };
            let items = target
                .entry(field.to_owned())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Some(items) = items.as_array_mut()
                && !items.iter().any(|item| item.as_str() == Some(value))
            {
                items.push(Value::from(value));
            }
        })?;
        self.bump(collection);
        Ok(())
    }

    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.with_doc(collection, id, |fields| {
            if let Some(items) = fields.get_mut(field).and_then(Value::as_array_mut) {
                items.retain(|item| item.as_str() != Some(value));
            }
        })?;
        self.bump(collection);
        Ok(())
    }

    fn watch(&self, collection: &str) -> watch::Receiver<u64> {
        let mut channels = self.channels();
        channels
            .entry(collection.to_owned())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

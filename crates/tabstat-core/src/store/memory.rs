//! In-process collection.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use super::DocumentStore;
use crate::document::{Body, Document, DocumentId};
use crate::error::Result;
use crate::util::json::merge_into;

/// Collection held entirely in memory.
pub struct MemoryCollection {
    name: String,
    docs: RwLock<IndexMap<u64, Body>>,
    next_id: AtomicU64,
}

impl MemoryCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: RwLock::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a collection pre-filled with bodies, ids assigned from 1.
    #[must_use]
    pub fn with_bodies(name: impl Into<String>, bodies: impl IntoIterator<Item = Body>) -> Self {
        let collection = Self::new(name);
        {
            let mut docs = collection.docs.write();
            for body in bodies {
                let id = collection.next_id.fetch_add(1, Ordering::Relaxed);
                docs.insert(id, body);
            }
        }
        collection
    }
}

impl DocumentStore for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self) -> Result<Vec<Document>> {
        Ok(self
            .docs
            .read()
            .iter()
            .map(|(&id, body)| Document::new(DocumentId(id), body.clone()))
            .collect())
    }

    fn insert(&self, body: Body) -> Result<DocumentId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.docs.write().insert(id, body);
        Ok(DocumentId(id))
    }

    fn upsert_by_key(&self, id: DocumentId, patch: Body) -> Result<()> {
        let mut docs = self.docs.write();
        merge_into(docs.entry(id.0).or_default(), patch);
        // Keep generated ids ahead of explicitly upserted ones.
        self.next_id.fetch_max(id.0 + 1, Ordering::Relaxed);
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.docs.read().len())
    }

    fn clear(&self) -> Result<()> {
        self.docs.write().clear();
        Ok(())
    }
}

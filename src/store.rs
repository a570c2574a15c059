//! Dedup/persistence collaborator.

use crate::element::Element;
use crate::error::StoreError;
use crate::fingerprint::Checksum;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Keyed element store with insert-if-absent semantics per audit scope
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// The stored element for `key` within `scope`, if any
    async fn lookup(&self, scope: &str, key: &Checksum) -> Result<Option<Element>, StoreError>;

    /// Stores `element` unless its key is already present; returns the stored record
    async fn upsert(&self, scope: &str, element: Element) -> Result<Element, StoreError>;
}

/// Process-local store shared between page workers through an `Arc`
#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    elements: Mutex<HashMap<(String, Checksum), Element>>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored elements across all scopes
    pub async fn len(&self) -> usize {
        self.elements.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.elements.lock().await.is_empty()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn lookup(&self, scope: &str, key: &Checksum) -> Result<Option<Element>, StoreError> {
        let elements = self.elements.lock().await;
        Ok(elements.get(&(scope.to_string(), key.clone())).cloned())
    }

    async fn upsert(&self, scope: &str, element: Element) -> Result<Element, StoreError> {
        let mut elements = self.elements.lock().await;
        let stored = elements
            .entry((scope.to_string(), element.key.clone()))
            .or_insert_with(|| {
                ::log::debug!("Stored element {} in scope {}", element.key, scope);
                element
            });
        Ok(stored.clone())
    }
}

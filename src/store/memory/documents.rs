use crate::error::StoreResult;
use crate::query::DocFilter;
use crate::store::memory::faults::FaultPlan;
use crate::store::traits::DocumentStore;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Document collections held in memory, in insertion order.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    /// Keyed by collection name
    pub insert_faults: FaultPlan<str>,
    pub delete_faults: FaultPlan<str>,
    pub find_faults: FaultPlan<str>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, |docs| docs.len())
    }

    pub fn all(&self, collection: &str) -> Vec<Value> {
        self.collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &DocFilter) -> StoreResult<Vec<Value>> {
        self.find_faults.check(collection)?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> StoreResult<()> {
        self.insert_faults.check(collection)?;
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    async fn delete_many(&self, collection: &str, filter: &DocFilter) -> StoreResult<u64> {
        self.delete_faults.check(collection)?;
        let mut collections = self.collections.write();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }
}

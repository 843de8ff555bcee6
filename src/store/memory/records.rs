use crate::error::{StoreError, StoreResult};
use crate::model::Id;
use crate::store::memory::faults::FaultPlan;
use crate::store::traits::RecordStore;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Relational rows held in memory, one map per table.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<String, BTreeMap<Id, Value>>>,
    /// Keyed by table name
    pub insert_faults: FaultPlan<str>,
    pub delete_faults: FaultPlan<str>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |rows| rows.len())
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_record(&self, table: &str, id: &Id, row: Value) -> StoreResult<()> {
        self.insert_faults.check(table)?;
        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        if rows.contains_key(id) {
            return Err(StoreError::rejected(format!(
                "duplicate key {} in table {}",
                id, table
            )));
        }
        rows.insert(id.clone(), row);
        Ok(())
    }

    async fn delete_record(&self, table: &str, id: &Id) -> StoreResult<bool> {
        self.delete_faults.check(table)?;
        Ok(self
            .tables
            .write()
            .get_mut(table)
            .map_or(false, |rows| rows.remove(id).is_some()))
    }

    async fn get_record(&self, table: &str, id: &Id) -> StoreResult<Option<Value>> {
        Ok(self
            .tables
            .read()
            .get(table)
            .and_then(|rows| rows.get(id).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let store = MemoryRecordStore::new();
        let id = "http://e/1".to_string();
        store.insert_record("experiments", &id, json!({"campaign": 2019})).await.unwrap();

        let err = store
            .insert_record("experiments", &id, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.delete_record("experiments", &id).await.unwrap());
        assert_eq!(store.len("experiments"), 0);
    }
}

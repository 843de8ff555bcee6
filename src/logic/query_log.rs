use crate::model::UserContext;
use crate::store::traits::DocumentStore;
use chrono::Utc;
use log::warn;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Records who searched what. A failed record never fails the search.
#[derive(Clone)]
pub struct QueryLog {
    documents: Arc<dyn DocumentStore>,
    collection: String,
    enabled: bool,
}

impl QueryLog {
    pub fn new<C: Into<String>>(documents: Arc<dyn DocumentStore>, collection: C, enabled: bool) -> Self {
        Self {
            documents,
            collection: collection.into(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn record<C: Serialize>(&self, user: &UserContext, kind: &str, criteria: &C) {
        if !self.enabled {
            return;
        }
        let criteria = match serde_json::to_value(criteria) {
            Ok(value) => value,
            Err(e) => {
                warn!("Query log skipped for {}: {}", user.user_id, e);
                return;
            }
        };
        let entry = json!({
            "user": user.user_id,
            "kind": kind,
            "criteria": criteria,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let Err(e) = self.documents.insert_one(&self.collection, entry).await {
            warn!("Query log write to {} failed: {}", self.collection, e);
        }
    }
}

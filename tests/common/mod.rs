#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use phenolink::config::AppConfig;
use phenolink::model::{EntityKind, UserContext};
use phenolink::seed;
use phenolink::service::{Backends, EntityService};
use phenolink::store::{MemoryDocumentStore, MemoryGraphStore, MemoryRecordStore};
use std::sync::Arc;

/// Seeded in-memory stores with their fault plans reachable from the test
pub struct Fixture {
    pub graph: Arc<MemoryGraphStore>,
    pub documents: Arc<MemoryDocumentStore>,
    pub records: Arc<MemoryRecordStore>,
    pub backends: Backends,
    pub config: AppConfig,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let graph = Arc::new(MemoryGraphStore::new());
        seed::load_seed_data(graph.as_ref(), true)
            .await
            .expect("seed data loads");
        let documents = Arc::new(MemoryDocumentStore::new());
        let records = Arc::new(MemoryRecordStore::new());
        let backends =
            Backends::with_graph_ontology(graph.clone(), documents.clone(), records.clone());
        Self {
            graph,
            documents,
            records,
            backends,
            config,
        }
    }

    pub fn service(&self, kind: EntityKind) -> EntityService {
        EntityService::new(kind, &self.backends, &self.config)
    }

    pub fn events(&self) -> EntityService {
        self.service(EntityKind::event())
    }
}

pub fn ts(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).expect("valid RFC 3339 timestamp")
}

pub fn user() -> UserContext {
    UserContext::new("tester".to_string())
}

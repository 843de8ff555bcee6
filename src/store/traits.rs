use crate::error::StoreResult;
use crate::model::{Id, Iri, Node, Triple};
use crate::query::{DocFilter, Query};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One solution of a graph query, keyed by projected variable name.
/// Variables left unbound by an optional pattern are absent.
pub type Row = BTreeMap<String, Node>;

/// A single graph write: deletions are applied before insertions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphUpdate {
    pub delete: Vec<Triple>,
    pub insert: Vec<Triple>,
}

impl GraphUpdate {
    pub fn insert(triples: Vec<Triple>) -> Self {
        Self {
            delete: Vec::new(),
            insert: triples,
        }
    }

    pub fn delete(triples: Vec<Triple>) -> Self {
        Self {
            delete: triples,
            insert: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.insert.is_empty()
    }
}

#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    async fn query(&self, query: &Query) -> StoreResult<Vec<Row>>;
    async fn update(&self, update: &GraphUpdate) -> StoreResult<()>;
    /// Opens the single transaction the store supports at a time
    async fn begin(&self) -> StoreResult<()>;
    async fn commit(&self) -> StoreResult<()>;
    async fn rollback(&self) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, filter: &DocFilter) -> StoreResult<Vec<Value>>;
    async fn insert_one(&self, collection: &str, document: Value) -> StoreResult<()>;
    /// Returns the number of removed documents
    async fn delete_many(&self, collection: &str, filter: &DocFilter) -> StoreResult<u64>;
}

/// Rows keyed by the identifier of the entity they belong to
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_record(&self, table: &str, id: &Id, row: Value) -> StoreResult<()>;
    async fn delete_record(&self, table: &str, id: &Id) -> StoreResult<bool>;
    async fn get_record(&self, table: &str, id: &Id) -> StoreResult<Option<Value>>;
}

#[async_trait::async_trait]
pub trait SchemaService: Send + Sync {
    /// Whether the type is declared by the schema
    async fn type_exists(&self, rdf_type: &str) -> StoreResult<bool>;
    /// Reflexive: a type is a subtype of itself
    async fn is_subtype_of(&self, candidate: &str, root: &str) -> StoreResult<bool>;
    async fn property_domain_range(&self, predicate: &str) -> StoreResult<Option<(Iri, Iri)>>;
}

#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    async fn exists_uri(&self, id: &str) -> StoreResult<bool>;
    /// Declared types of an existing resource
    async fn resource_types(&self, id: &str) -> StoreResult<Vec<Iri>>;
}

pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod query;
pub mod seed;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use error::{CoordError, StoreError, StoreResult};

// Export logic types
pub use logic::{
    CreateReport, EntityReader, ImageMetadata, ReconcileOutcome, RelationReconciler,
    ValidationPipeline, WriteCoordinator,
};

// Export all model types
pub use model::*;

pub use service::{Backends, EntityService};

// Export store types
pub use store::{
    DocumentStore, GraphStore, MemoryDocumentStore, MemoryGraphStore, MemoryRecordStore,
    PostgresRecordStore, RecordStore,
};

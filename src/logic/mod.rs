pub mod coordinator;
pub mod identity;
pub mod images;
pub mod query_log;
pub mod reader;
pub mod reconcile;
pub mod validate;

pub use coordinator::{
    CoordinatorSettings, CreateReport, EntityState, WriteAction, WriteCoordinator, WritePhase,
    WritePlan, WriteStep,
};
pub use identity::IdentityAllocator;
pub use images::{ImageConcernedItem, ImageMetadata, ImageMetadataReader, ShootingConfiguration};
pub use query_log::QueryLog;
pub use reader::{EntityReader, ReaderSettings};
pub use reconcile::{ReconcileOutcome, RelationReconciler};
pub use validate::{ValidationContext, ValidationPipeline, Validator};

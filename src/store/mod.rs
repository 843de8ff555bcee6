pub mod memory;
pub mod ontology;
pub mod postgres;
pub mod traits;

pub use memory::{MemoryDocumentStore, MemoryGraphStore, MemoryRecordStore};
pub use ontology::GraphOntology;
pub use postgres::*;
pub use traits::*;

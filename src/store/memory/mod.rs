pub mod documents;
pub mod faults;
pub mod graph;
pub mod records;

pub use documents::MemoryDocumentStore;
pub use faults::FaultPlan;
pub use graph::MemoryGraphStore;
pub use records::MemoryRecordStore;

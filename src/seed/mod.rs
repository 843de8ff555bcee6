pub mod data;

pub use data::{load_seed_data, ontology_triples, sample_triples, samples};

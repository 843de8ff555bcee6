use crate::model::vocabulary::{oeev, oeso, rdf, rdfs, time};
use crate::model::Iri;
use serde::{Deserialize, Serialize};

/// Describes one family of entities: where its type hierarchy is rooted and
/// which structural predicates shape it in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKind {
    /// Short name, also the identifier segment (e.g. "event")
    pub name: String,

    /// Root concept; an untyped search is still scoped to it
    pub root_type: Iri,

    /// Entities carry a `time:hasTime` instant
    pub timestamped: bool,

    /// Predicate linking an entity to its concerned items, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concerns: Option<Iri>,

    /// Entities must be created with an `rdfs:label`
    pub labelled: bool,
}

impl EntityKind {
    pub fn new<N: Into<String>, T: Into<String>>(name: N, root_type: T) -> Self {
        Self {
            name: name.into(),
            root_type: root_type.into(),
            timestamped: false,
            concerns: None,
            labelled: true,
        }
    }

    pub fn event() -> Self {
        Self {
            timestamped: true,
            concerns: Some(oeev::CONCERNS.to_string()),
            labelled: false,
            ..Self::new("event", oeev::EVENT)
        }
    }

    pub fn experiment() -> Self {
        Self::new("experiment", oeso::EXPERIMENT)
    }

    pub fn image() -> Self {
        Self {
            timestamped: true,
            concerns: Some(oeev::CONCERNS.to_string()),
            labelled: false,
            ..Self::new("image", oeso::IMAGE)
        }
    }

    pub fn provenance() -> Self {
        Self::new("provenance", oeso::PROVENANCE)
    }

    pub fn germplasm() -> Self {
        Self::new("germplasm", oeso::GERMPLASM)
    }

    /// Predicates materialized as dedicated fields; the generic property
    /// fan-out must not return them again.
    pub fn structural_predicates(&self) -> Vec<Iri> {
        let mut predicates = vec![rdf::TYPE.to_string()];
        if self.timestamped {
            predicates.push(time::HAS_TIME.to_string());
        }
        if let Some(concerns) = &self.concerns {
            predicates.push(concerns.clone());
        }
        predicates.push(rdfs::LABEL.to_string());
        predicates
    }
}

use crate::model::{Id, Iri, Node};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// An entity as materialized by one read. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Id,
    #[serde(rename = "rdfType")]
    pub rdf_type: Iri,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub concerned_items: Vec<ConcernedItem>,
    pub properties: Vec<AttachedProperty>,
    pub annotations: Vec<Annotation>,
}

impl Entity {
    /// Partial entity built from a primary result row; fan-out fills the rest
    pub fn partial(id: Id, rdf_type: Iri) -> Self {
        Self {
            id,
            rdf_type,
            label: None,
            timestamp: None,
            concerned_items: Vec::new(),
            properties: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn concerned_item_ids(&self) -> Vec<&str> {
        self.concerned_items.iter().map(|c| c.id.as_str()).collect()
    }
}

/// Entity input for creation. The identifier is assigned server-side; a
/// supplied one marks the update path and must already exist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(rename = "rdfType")]
    pub rdf_type: Iri,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub concerned_items: Vec<Id>,
    #[serde(default)]
    pub properties: Vec<AttachedProperty>,
    #[serde(default)]
    pub annotations: Vec<NewAnnotation>,
    /// Payload for the document store (image metadata, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<serde_json::Value>,
    /// Payload for the relational store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<serde_json::Value>,
}

impl NewEntity {
    pub fn of_type<T: Into<String>>(rdf_type: T) -> Self {
        Self {
            rdf_type: rdf_type.into(),
            ..Self::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_label<T: Into<String>>(mut self, label: T) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn concerning<T: Into<String>>(mut self, item: T) -> Self {
        self.concerned_items.push(item.into());
        self
    }

    pub fn with_property(mut self, property: AttachedProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_annotation(mut self, annotation: NewAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Key/value pair attached to an entity. The predicate's domain and range
/// are declared by the schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachedProperty {
    pub relation: Iri,
    pub value: Node,
    /// Type of the referenced resource, resolved from the graph on read
    #[serde(rename = "rdfType", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<Iri>,
}

impl AttachedProperty {
    pub fn reference<R: Into<String>, V: Into<String>>(relation: R, value: V) -> Self {
        Self {
            relation: relation.into(),
            value: Node::Iri(value.into()),
            value_type: None,
        }
    }

    pub fn literal<R: Into<String>, V: Into<String>>(relation: R, value: V) -> Self {
        Self {
            relation: relation.into(),
            value: Node::Literal(value.into()),
            value_type: None,
        }
    }

    /// Same relation and value, ignoring the resolved type
    pub fn same_statement(&self, other: &AttachedProperty) -> bool {
        self.relation == other.relation && self.value == other.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcernedItem {
    pub id: Id,
    #[serde(rename = "rdfType", skip_serializing_if = "Option::is_none")]
    pub rdf_type: Option<Iri>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Id,
    pub motivation: Iri,
    pub body_values: Vec<String>,
    pub targets: Vec<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    pub created: DateTime<FixedOffset>,
}

/// Annotation input; its targets are the entity it is submitted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub motivation: Iri,
    pub body_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

impl NewAnnotation {
    pub fn new<M: Into<String>>(motivation: M, body_values: Vec<String>) -> Self {
        Self {
            motivation: motivation.into(),
            body_values,
            creator: None,
        }
    }
}

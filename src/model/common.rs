use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique resource identifier (URI-like, opaque to the core).
pub type Id = String;

/// Identifier of a schema term: a type, a predicate or a datatype.
pub type Iri = String;

/// A value in the graph store: either a resource reference or a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Node {
    Iri(Iri),
    Literal(String),
}

impl Node {
    pub fn iri<T: Into<String>>(value: T) -> Self {
        Node::Iri(value.into())
    }

    pub fn literal<T: Into<String>>(value: T) -> Self {
        Node::Literal(value.into())
    }

    /// The lexical form, what `str()` yields in a filter
    pub fn as_str(&self) -> &str {
        match self {
            Node::Iri(value) | Node::Literal(value) => value,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Node::Iri(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(value) => write!(f, "<{}>", value),
            Node::Literal(value) => write!(f, "\"{}\"", value.replace('"', "\\\"")),
        }
    }
}

/// A stored statement. Subjects are always resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Id,
    pub predicate: Iri,
    pub object: Node,
}

impl Triple {
    pub fn new<S: Into<String>, P: Into<String>>(subject: S, predicate: P, object: Node) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> <{}> {} .", self.subject, self.predicate, self.object)
    }
}

/// A directed, typed edge between two resources. Several objects may share
/// the same subject and predicate: links form a set, not a map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationLink {
    pub subject: Id,
    pub predicate: Iri,
    pub object: Id,
}

impl RelationLink {
    pub fn new<S: Into<String>, P: Into<String>, O: Into<String>>(
        subject: S,
        predicate: P,
        object: O,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl From<RelationLink> for Triple {
    fn from(link: RelationLink) -> Self {
        Triple::new(link.subject, link.predicate, Node::Iri(link.object))
    }
}

/// Which end of a link the reconciled set lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
    /// `anchor predicate ?member`
    Outgoing,
    /// `?member predicate anchor`
    Incoming,
}

impl LinkDirection {
    pub fn link(self, anchor: &str, predicate: &str, member: &str) -> RelationLink {
        match self {
            LinkDirection::Outgoing => RelationLink::new(anchor, predicate, member),
            LinkDirection::Incoming => RelationLink::new(member, predicate, anchor),
        }
    }
}

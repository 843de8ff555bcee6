use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a candidate entity was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    UnknownUri,
    /// The identifier exists but belongs to another kind of entity
    WrongKind,
    UnknownType,
    TypeOutsideHierarchy,
    MissingTimestamp,
    MissingLabel,
    UnknownConcernedItem,
    UnknownProperty,
    DomainMismatch,
    RangeMismatch,
    UnknownPropertyValue,
    UnknownMotivation,
    EmptyAnnotationBody,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = match self {
            ReasonCode::UnknownUri => "unknown_uri",
            ReasonCode::WrongKind => "wrong_kind",
            ReasonCode::UnknownType => "unknown_type",
            ReasonCode::TypeOutsideHierarchy => "type_outside_hierarchy",
            ReasonCode::MissingTimestamp => "missing_timestamp",
            ReasonCode::MissingLabel => "missing_label",
            ReasonCode::UnknownConcernedItem => "unknown_concerned_item",
            ReasonCode::UnknownProperty => "unknown_property",
            ReasonCode::DomainMismatch => "domain_mismatch",
            ReasonCode::RangeMismatch => "range_mismatch",
            ReasonCode::UnknownPropertyValue => "unknown_property_value",
            ReasonCode::UnknownMotivation => "unknown_motivation",
            ReasonCode::EmptyAnnotationBody => "empty_annotation_body",
        };
        write!(f, "{}", code)
    }
}

/// One failed check. Collected across a whole batch, never raised on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Position of the offending entity in the submitted batch
    pub entity_index: usize,
    /// The value that failed the check
    pub value: String,
    pub reason: ReasonCode,
    pub message: String,
}

impl ValidationError {
    pub fn new<V: Into<String>, M: Into<String>>(
        entity_index: usize,
        value: V,
        reason: ReasonCode,
        message: M,
    ) -> Self {
        Self {
            entity_index,
            value: value.into(),
            reason,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "entity #{}: {} ({}): {}",
            self.entity_index, self.reason, self.value, self.message
        )
    }
}

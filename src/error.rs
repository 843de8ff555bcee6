use serde::Serialize;
use thiserror::Error;

use crate::model::{Id, ValidationError};

/// Failure reported by one of the backing stores.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The store could not parse or evaluate the request (bad regex, unsupported pattern...)
    #[error("malformed request: {0}")]
    Malformed(String),
    /// The store understood the request but refused it
    #[error("request rejected: {0}")]
    Rejected(String),
    /// Connection-level failure, timeouts included
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn malformed<T: Into<String>>(msg: T) -> Self {
        StoreError::Malformed(msg.into())
    }

    pub fn rejected<T: Into<String>>(msg: T) -> Self {
        StoreError::Rejected(msg.into())
    }

    pub fn unavailable<T: Into<String>>(msg: T) -> Self {
        StoreError::Unavailable(msg.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the coordination layer.
#[derive(Debug, Error)]
pub enum CoordError {
    #[error("query error: {0}")]
    Query(String),
    #[error("entity not found: {0}")]
    NotFound(Id),
    #[error("authorization error: {0}")]
    Authorization(String),
    #[error("{} validation error(s)", .0.len())]
    AggregateValidation(Vec<ValidationError>),
    #[error("partial write on {}: {}", .0.entity_id, .0.cause)]
    PartialWrite(Box<PartialWriteReport>),
    #[error("partial reconcile of {} {}: {}", .0.subject, .0.predicate, .0.cause)]
    PartialReconcile(Box<ReconcileFailure>),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("batch failed: {} created, {} failed", .0.created.len(), .0.failures.len())]
    Batch(Box<BatchFailure>),
}

impl CoordError {
    pub fn query<T: Into<String>>(msg: T) -> Self {
        CoordError::Query(msg.into())
    }

    pub fn authorization<T: Into<String>>(msg: T) -> Self {
        CoordError::Authorization(msg.into())
    }

    /// Wraps validation errors; an empty list is success, never an error.
    pub fn from_validation(errors: Vec<ValidationError>) -> Result<(), CoordError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoordError::AggregateValidation(errors))
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, CoordError::Authorization(_))
    }
}

impl From<StoreError> for CoordError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Malformed(msg) => CoordError::Query(msg),
            StoreError::Rejected(msg) => CoordError::Query(msg),
            StoreError::Unavailable(msg) => CoordError::BackendUnavailable(msg),
        }
    }
}

/// What happened to one entity whose writes failed part way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialWriteReport {
    pub entity_id: Id,
    pub failed_phase: String,
    pub cause: String,
    /// Steps that were undone, in the order they were undone
    pub compensated: Vec<String>,
    /// Steps whose undo failed; these may still be persisted
    pub compensation_failures: Vec<CompensationFailure>,
}

impl PartialWriteReport {
    pub fn fully_compensated(&self) -> bool {
        self.compensation_failures.is_empty()
    }

    pub fn remaining_persisted(&self) -> Vec<&str> {
        self.compensation_failures
            .iter()
            .map(|f| f.step.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompensationFailure {
    pub step: String,
    pub reason: String,
}

/// Delete phase went through but the insert phase did not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileFailure {
    pub subject: Id,
    pub predicate: String,
    pub removed: Vec<Id>,
    pub not_added: Vec<Id>,
    pub cause: String,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub created: Vec<Id>,
    pub failures: Vec<EntityFailure>,
}

#[derive(Debug)]
pub struct EntityFailure {
    /// Position of the entity in the submitted batch
    pub index: usize,
    pub id: Option<Id>,
    pub error: CoordError,
}

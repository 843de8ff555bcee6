use crate::error::CoordError;
use crate::model::{EntityKind, Id};
use crate::store::traits::IdentityService;
use std::sync::Arc;
use uuid::Uuid;

const MAX_ATTEMPTS: usize = 8;

/// Mints `{base_uri}{kind}/{uuid}` identifiers, drawing again while the
/// candidate already exists in the graph.
#[derive(Clone)]
pub struct IdentityAllocator {
    base_uri: String,
    identity: Arc<dyn IdentityService>,
}

impl IdentityAllocator {
    pub fn new<B: Into<String>>(base_uri: B, identity: Arc<dyn IdentityService>) -> Self {
        let mut base_uri = base_uri.into();
        if !base_uri.ends_with('/') && !base_uri.ends_with('#') {
            base_uri.push('/');
        }
        Self { base_uri, identity }
    }

    pub fn candidate(&self, kind: &EntityKind) -> Id {
        format!("{}{}/{}", self.base_uri, kind.name, Uuid::new_v4())
    }

    pub async fn allocate(&self, kind: &EntityKind) -> Result<Id, CoordError> {
        for _ in 0..MAX_ATTEMPTS {
            let id = self.candidate(kind);
            if !self.identity.exists_uri(&id).await? {
                return Ok(id);
            }
            log::warn!("Identifier {} already in use, drawing another", id);
        }
        Err(CoordError::query(format!(
            "no free {} identifier after {} attempts",
            kind.name, MAX_ATTEMPTS
        )))
    }
}

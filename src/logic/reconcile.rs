use crate::error::{CoordError, ReconcileFailure};
use crate::model::{Id, LinkDirection, Node, Triple};
use crate::query::{QueryBuilder, Term, TriplePattern};
use crate::store::traits::{GraphStore, GraphUpdate};
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

const MEMBER: &str = "member";

/// What one reconciliation changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub removed: Vec<Id>,
    pub added: Vec<Id>,
    pub unchanged: Vec<Id>,
}

impl ReconcileOutcome {
    /// No write was issued
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Brings the set of links stored under one (anchor, predicate) key to a
/// desired set with at most one delete and one insert.
#[derive(Clone)]
pub struct RelationReconciler {
    graph: Arc<dyn GraphStore>,
}

impl RelationReconciler {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Members currently linked to `anchor`
    pub async fn current(
        &self,
        anchor: &str,
        predicate: &str,
        direction: LinkDirection,
    ) -> Result<BTreeSet<Id>, CoordError> {
        let pattern = match direction {
            LinkDirection::Outgoing => {
                TriplePattern::link(Term::iri(anchor), predicate, Term::var(MEMBER))
            }
            LinkDirection::Incoming => {
                TriplePattern::link(Term::var(MEMBER), predicate, Term::iri(anchor))
            }
        };
        let mut builder = QueryBuilder::new_query();
        builder.select_variable(MEMBER).add_triple_pattern(pattern);
        let query = builder.build()?;
        debug!("Graph query: {}", query);

        Ok(self
            .graph
            .query(&query)
            .await?
            .into_iter()
            .filter_map(|row| match row.get(MEMBER) {
                Some(Node::Iri(member)) => Some(member.clone()),
                _ => None,
            })
            .collect())
    }

    /// `subject predicate ?object` for every desired object, and nothing else
    pub async fn reconcile(
        &self,
        subject: &str,
        predicate: &str,
        desired: &[Id],
    ) -> Result<ReconcileOutcome, CoordError> {
        self.reconcile_directed(subject, predicate, LinkDirection::Outgoing, desired)
            .await
    }

    pub async fn reconcile_directed(
        &self,
        anchor: &str,
        predicate: &str,
        direction: LinkDirection,
        desired: &[Id],
    ) -> Result<ReconcileOutcome, CoordError> {
        let current = self.current(anchor, predicate, direction).await?;
        let desired: BTreeSet<Id> = desired.iter().cloned().collect();

        let outcome = ReconcileOutcome {
            removed: current.difference(&desired).cloned().collect(),
            added: desired.difference(&current).cloned().collect(),
            unchanged: current.intersection(&desired).cloned().collect(),
        };
        let links = |members: &[Id]| -> Vec<Triple> {
            members
                .iter()
                .map(|m| direction.link(anchor, predicate, m).into())
                .collect()
        };

        if !outcome.removed.is_empty() {
            self.graph
                .update(&GraphUpdate::delete(links(&outcome.removed)))
                .await?;
        }

        if !outcome.added.is_empty() {
            if let Err(err) = self
                .graph
                .update(&GraphUpdate::insert(links(&outcome.added)))
                .await
            {
                if outcome.removed.is_empty() {
                    return Err(err.into());
                }
                warn!(
                    "Links of {} {} shrunk: {} removed, insert of {} failed: {}",
                    anchor,
                    predicate,
                    outcome.removed.len(),
                    outcome.added.len(),
                    err
                );
                return Err(CoordError::PartialReconcile(Box::new(ReconcileFailure {
                    subject: anchor.to_string(),
                    predicate: predicate.to_string(),
                    removed: outcome.removed,
                    not_added: outcome.added,
                    cause: err.to_string(),
                })));
            }
        }

        debug!(
            "Reconciled {} {}: -{} +{} ={}",
            anchor,
            predicate,
            outcome.removed.len(),
            outcome.added.len(),
            outcome.unchanged.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::vocabulary::oeso;
    use crate::store::MemoryGraphStore;

    fn ids(values: &[&str]) -> Vec<Id> {
        values.iter().map(|v| v.to_string()).collect()
    }

    async fn seeded(objects: &[&str]) -> Arc<MemoryGraphStore> {
        let graph = Arc::new(MemoryGraphStore::new());
        let triples = objects
            .iter()
            .map(|o| Triple::new("exp", oeso::MEASURES, Node::iri(*o)))
            .collect();
        graph.update(&GraphUpdate::insert(triples)).await.unwrap();
        graph
    }

    #[tokio::test]
    async fn test_minimal_diff() {
        let graph = seeded(&["a", "b", "c"]).await;
        let reconciler = RelationReconciler::new(graph.clone());

        let outcome = reconciler
            .reconcile("exp", oeso::MEASURES, &ids(&["b", "c", "d"]))
            .await
            .unwrap();

        assert_eq!(outcome.removed, ids(&["a"]));
        assert_eq!(outcome.added, ids(&["d"]));
        assert_eq!(outcome.unchanged, ids(&["b", "c"]));
        assert!(!graph.contains(&Triple::new("exp", oeso::MEASURES, Node::iri("a"))));
        assert!(graph.contains(&Triple::new("exp", oeso::MEASURES, Node::iri("d"))));
    }

    #[tokio::test]
    async fn test_second_call_writes_nothing() {
        let graph = seeded(&["a"]).await;
        let reconciler = RelationReconciler::new(graph.clone());
        let desired = ids(&["a", "b"]);

        reconciler.reconcile("exp", oeso::MEASURES, &desired).await.unwrap();
        let writes = graph.updates_applied();
        let outcome = reconciler.reconcile("exp", oeso::MEASURES, &desired).await.unwrap();

        assert!(outcome.is_noop());
        assert_eq!(graph.updates_applied(), writes);
    }

    #[tokio::test]
    async fn test_failed_insert_reports_removed_links() {
        let graph = seeded(&["a", "b"]).await;
        graph.update_faults.fail_next(
            1,
            StoreError::unavailable("graph store timed out"),
            |u: &GraphUpdate| !u.insert.is_empty(),
        );
        let reconciler = RelationReconciler::new(graph.clone());

        let err = reconciler
            .reconcile("exp", oeso::MEASURES, &ids(&["b", "c"]))
            .await
            .unwrap_err();

        match err {
            CoordError::PartialReconcile(failure) => {
                assert_eq!(failure.removed, ids(&["a"]));
                assert_eq!(failure.not_added, ids(&["c"]));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_incoming_links_are_reconciled_on_the_member_side() {
        let graph = Arc::new(MemoryGraphStore::new());
        let reconciler = RelationReconciler::new(graph.clone());

        reconciler
            .reconcile_directed(
                "exp",
                oeso::PARTICIPATES_IN,
                LinkDirection::Incoming,
                &ids(&["sensor-1"]),
            )
            .await
            .unwrap();

        assert!(graph.contains(&Triple::new(
            "sensor-1",
            oeso::PARTICIPATES_IN,
            Node::iri("exp")
        )));
    }
}

mod common;

use common::{user, Fixture};
use phenolink::error::{CoordError, StoreError};
use phenolink::model::vocabulary::oeso;
use phenolink::model::{EntityKind, LinkDirection, Node, ReasonCode, Triple};
use phenolink::seed::samples;
use phenolink::store::GraphUpdate;

fn experiments(fixture: &Fixture) -> phenolink::EntityService {
    fixture.service(EntityKind::experiment())
}

#[tokio::test]
async fn test_linked_variables_follow_the_desired_set() {
    let fixture = Fixture::new().await;
    let service = experiments(&fixture);

    let outcome = service
        .update_linked_variables(&user(), samples::EXPERIMENT_1, &[samples::VAR_HEIGHT.to_string()])
        .await
        .unwrap();
    assert_eq!(outcome.added, vec![samples::VAR_HEIGHT.to_string()]);

    let outcome = service
        .update_linked_variables(
            &user(),
            samples::EXPERIMENT_1,
            &[samples::VAR_LEAF_AREA.to_string()],
        )
        .await
        .unwrap();
    assert_eq!(outcome.removed, vec![samples::VAR_HEIGHT.to_string()]);
    assert_eq!(outcome.added, vec![samples::VAR_LEAF_AREA.to_string()]);

    let linked = service
        .linked_objects(samples::EXPERIMENT_1, oeso::MEASURES, LinkDirection::Outgoing)
        .await
        .unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(
        linked.get(samples::VAR_LEAF_AREA),
        Some(&Some("Leaf area".to_string()))
    );
}

#[tokio::test]
async fn test_linked_sensors_point_at_the_experiment() {
    let fixture = Fixture::new().await;
    let service = experiments(&fixture);
    let sensors = vec![samples::CAMERA_1.to_string(), samples::CAMERA_2.to_string()];

    service
        .update_linked_sensors(&user(), samples::EXPERIMENT_1, &sensors)
        .await
        .unwrap();

    for sensor in &sensors {
        assert!(fixture.graph.contains(&Triple::new(
            sensor,
            oeso::PARTICIPATES_IN,
            Node::iri(samples::EXPERIMENT_1)
        )));
    }
    let linked = service
        .linked_objects(samples::EXPERIMENT_1, oeso::PARTICIPATES_IN, LinkDirection::Incoming)
        .await
        .unwrap();
    assert_eq!(linked.keys().cloned().collect::<Vec<_>>(), sensors);

    let outcome = service
        .update_linked_sensors(&user(), samples::EXPERIMENT_1, &[])
        .await
        .unwrap();
    assert_eq!(outcome.removed.len(), 2);
    assert!(service
        .linked_objects(samples::EXPERIMENT_1, oeso::PARTICIPATES_IN, LinkDirection::Incoming)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_repeated_reconcile_writes_nothing() {
    let fixture = Fixture::new().await;
    let service = experiments(&fixture);
    let desired = vec![samples::VAR_HEIGHT.to_string(), samples::VAR_LEAF_AREA.to_string()];

    service
        .reconcile_relations(samples::EXPERIMENT_1, oeso::MEASURES, &desired)
        .await
        .unwrap();
    let updates = fixture.graph.updates_applied();

    let outcome = service
        .reconcile_relations(samples::EXPERIMENT_1, oeso::MEASURES, &desired)
        .await
        .unwrap();
    assert!(outcome.is_noop());
    assert_eq!(outcome.unchanged.len(), 2);
    assert_eq!(fixture.graph.updates_applied(), updates);
}

#[tokio::test]
async fn test_unknown_members_are_rejected_before_writing() {
    let fixture = Fixture::new().await;
    let service = experiments(&fixture);
    let updates = fixture.graph.updates_applied();

    let err = service
        .update_linked_variables(
            &user(),
            samples::EXPERIMENT_1,
            &[
                samples::VAR_HEIGHT.to_string(),
                "http://www.phenome-fppn.fr/test/variable/unknown".to_string(),
            ],
        )
        .await
        .unwrap_err();

    match err {
        CoordError::AggregateValidation(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].reason, ReasonCode::UnknownUri);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fixture.graph.updates_applied(), updates);
}

#[tokio::test]
async fn test_unknown_experiment_is_not_found() {
    let fixture = Fixture::new().await;
    let err = experiments(&fixture)
        .update_linked_variables(
            &user(),
            "http://www.phenome-fppn.fr/test/experiment/none",
            &[samples::VAR_HEIGHT.to_string()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::NotFound(_)));
}

#[tokio::test]
async fn test_insert_failure_after_delete_is_partial() {
    let fixture = Fixture::new().await;
    let service = experiments(&fixture);
    service
        .reconcile_relations(
            samples::EXPERIMENT_1,
            oeso::MEASURES,
            &[samples::VAR_HEIGHT.to_string()],
        )
        .await
        .unwrap();

    fixture
        .graph
        .update_faults
        .fail_next(1, StoreError::unavailable("graph down"), |u: &GraphUpdate| {
            !u.insert.is_empty()
        });
    let err = service
        .reconcile_relations(
            samples::EXPERIMENT_1,
            oeso::MEASURES,
            &[samples::VAR_LEAF_AREA.to_string()],
        )
        .await
        .unwrap_err();

    match err {
        CoordError::PartialReconcile(failure) => {
            assert_eq!(failure.removed, vec![samples::VAR_HEIGHT.to_string()]);
            assert_eq!(failure.not_added, vec![samples::VAR_LEAF_AREA.to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

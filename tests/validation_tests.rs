mod common;

use common::{ts, user, Fixture};
use phenolink::error::CoordError;
use phenolink::model::vocabulary::{oa, oeev, oeso, rdfs};
use phenolink::model::{
    AttachedProperty, EntityKind, NewAnnotation, NewEntity, ReasonCode, UserContext,
};
use phenolink::seed::samples;
use phenolink::AppConfig;

fn at(rdf_type: &str) -> NewEntity {
    NewEntity::of_type(rdf_type).with_timestamp(ts("2019-03-05T10:00:00Z"))
}

fn reasons(errors: &[phenolink::model::ValidationError]) -> Vec<ReasonCode> {
    errors.iter().map(|e| e.reason).collect()
}

#[tokio::test]
async fn test_valid_batch_has_no_errors() {
    let fixture = Fixture::new().await;
    let batch = vec![
        at(oeev::MOVE_FROM)
            .concerning(samples::PLOT_42)
            .with_property(AttachedProperty::reference(oeev::FROM, samples::GREENHOUSE_A)),
        at(oeev::TROUBLE).with_annotation(NewAnnotation::new(
            oa::DESCRIBING,
            vec!["sensor replaced".to_string()],
        )),
    ];
    let errors = fixture.events().validate(&user(), &batch).await.unwrap();
    assert!(errors.is_empty(), "{errors:?}");
}

#[tokio::test]
async fn test_every_bad_entity_is_reported() {
    let fixture = Fixture::new().await;
    let batch = vec![
        at("http://example.org/vocabulary#Unknown"),
        at(oeev::TROUBLE),
        at("http://example.org/vocabulary#Other"),
    ];
    let errors = fixture.events().validate(&user(), &batch).await.unwrap();

    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].entity_index, 0);
    assert_eq!(errors[1].entity_index, 2);
    assert!(errors.iter().all(|e| e.reason == ReasonCode::UnknownType));
}

#[tokio::test]
async fn test_type_outside_kind_hierarchy() {
    let fixture = Fixture::new().await;
    let errors = fixture
        .events()
        .validate(&user(), &[at(oeso::PLOT)])
        .await
        .unwrap();
    assert_eq!(reasons(&errors), vec![ReasonCode::TypeOutsideHierarchy]);
}

#[tokio::test]
async fn test_required_fields_follow_the_kind() {
    let fixture = Fixture::new().await;

    let errors = fixture
        .events()
        .validate(&user(), &[NewEntity::of_type(oeev::TROUBLE)])
        .await
        .unwrap();
    assert_eq!(reasons(&errors), vec![ReasonCode::MissingTimestamp]);

    let errors = fixture
        .service(EntityKind::experiment())
        .validate(&user(), &[NewEntity::of_type(oeso::EXPERIMENT).with_label("  ")])
        .await
        .unwrap();
    assert_eq!(reasons(&errors), vec![ReasonCode::MissingLabel]);
}

#[tokio::test]
async fn test_nested_collections_report_their_own_reason() {
    let fixture = Fixture::new().await;
    let entity = at(oeev::TROUBLE)
        .concerning("http://www.phenome-fppn.fr/test/so/plot-999")
        .with_annotation(NewAnnotation::new(
            "http://www.w3.org/ns/oa#bookmarking",
            vec!["x".to_string()],
        ))
        .with_annotation(NewAnnotation::new(oa::COMMENTING, vec![" ".to_string()]));

    let errors = fixture.events().validate(&user(), &[entity]).await.unwrap();
    assert_eq!(
        reasons(&errors),
        vec![
            ReasonCode::UnknownConcernedItem,
            ReasonCode::UnknownMotivation,
            ReasonCode::EmptyAnnotationBody,
        ]
    );
}

#[tokio::test]
async fn test_property_domain_and_range() {
    let fixture = Fixture::new().await;
    let events = fixture.events();

    let wrong_domain = at(oeev::TROUBLE)
        .with_property(AttachedProperty::reference(oeev::FROM, samples::GREENHOUSE_A));
    let wrong_range = at(oeev::MOVE_FROM)
        .with_property(AttachedProperty::reference(oeev::FROM, samples::VAR_HEIGHT));
    let literal_for_object = at(oeev::MOVE_FROM)
        .with_property(AttachedProperty::literal(oeev::FROM, "greenhouse A"));
    let dangling = at(oeev::MOVE_FROM).with_property(AttachedProperty::reference(
        oeev::FROM,
        "http://www.phenome-fppn.fr/test/infra/nowhere",
    ));
    let undeclared = at(oeev::TROUBLE)
        .with_property(AttachedProperty::literal("http://example.org/vocabulary#color", "red"));
    let reference_for_literal = at(oeev::TROUBLE)
        .with_property(AttachedProperty::reference(rdfs::COMMENT, samples::PLOT_42));

    let errors = events
        .validate(
            &user(),
            &[
                wrong_domain,
                wrong_range,
                literal_for_object,
                dangling,
                undeclared,
                reference_for_literal,
            ],
        )
        .await
        .unwrap();

    let by_index: Vec<(usize, ReasonCode)> =
        errors.iter().map(|e| (e.entity_index, e.reason)).collect();
    assert_eq!(
        by_index,
        vec![
            (0, ReasonCode::DomainMismatch),
            (1, ReasonCode::RangeMismatch),
            (2, ReasonCode::RangeMismatch),
            (3, ReasonCode::UnknownPropertyValue),
            (4, ReasonCode::UnknownProperty),
            (5, ReasonCode::RangeMismatch),
        ]
    );
}

#[tokio::test]
async fn test_supplied_identifier_must_exist() {
    let fixture = Fixture::new().await;
    let entity = NewEntity {
        id: Some("http://www.phenome-fppn.fr/phenolink/event/unknown".to_string()),
        ..at(oeev::TROUBLE)
    };
    let errors = fixture.events().validate(&user(), &[entity]).await.unwrap();
    assert_eq!(reasons(&errors), vec![ReasonCode::UnknownUri]);
}

#[tokio::test]
async fn test_identifier_of_another_kind_is_rejected() {
    let fixture = Fixture::new().await;
    let plot_as_event = NewEntity {
        id: Some(samples::PLOT_42.to_string()),
        ..at(oeev::TROUBLE)
    };
    let errors = fixture
        .events()
        .validate(&user(), &[plot_as_event.clone()])
        .await
        .unwrap();
    assert_eq!(reasons(&errors), vec![ReasonCode::WrongKind]);
    assert_eq!(errors[0].value, samples::PLOT_42);

    let report = fixture
        .events()
        .create(&user(), vec![plot_as_event])
        .await
        .unwrap();
    assert!(report.created.is_empty());
    assert!(fixture.graph.describe(&format!("{}/instant", samples::PLOT_42)).is_empty());
}

#[tokio::test]
async fn test_permission_check_fails_fast() {
    let mut config = AppConfig::default();
    config.validation.require_admin = true;
    let fixture = Fixture::with_config(config).await;
    let events = fixture.events();
    let batch = vec![at("http://example.org/vocabulary#Unknown")];

    let err = events.validate(&user(), &batch).await.unwrap_err();
    assert!(err.is_authorization());

    let err = events.create(&user(), batch.clone()).await.unwrap_err();
    assert!(matches!(err, CoordError::Authorization(_)));

    let admin = UserContext::new("admin".to_string()).as_admin();
    let errors = events.validate(&admin, &batch).await.unwrap();
    assert_eq!(reasons(&errors), vec![ReasonCode::UnknownType]);
}

mod common;

use common::{ts, user, Fixture};
use phenolink::model::vocabulary::{oa, oeev, oeso, rdfs};
use phenolink::model::{
    AttachedProperty, DateRange, NewAnnotation, NewEntity, Node, SearchCriteria, Triple,
};
use phenolink::seed::samples;
use phenolink::store::GraphUpdate;
use phenolink::{GraphStore, RecordStore};
use std::collections::BTreeSet;
use serde_json::json;

fn move_from_plot_42() -> NewEntity {
    NewEntity::of_type(oeev::MOVE_FROM)
        .with_timestamp(ts("2019-03-05T10:00:00+01:00"))
        .concerning(samples::PLOT_42)
}

#[tokio::test]
async fn test_event_found_by_concerned_item_within_dates() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    let created = events
        .create(&user(), vec![move_from_plot_42()])
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let criteria = SearchCriteria::new()
        .with_type(oeev::MOVE_FROM)
        .with_concerned_item("plot-42")
        .with_date_range(DateRange::parse(Some("2019-03-01"), Some("2019-03-10")).unwrap());
    let (found, total) = events.search(&criteria).await.unwrap();

    assert_eq!(total, 1);
    assert_eq!(found.len(), 1);
    let event = &found[0];
    assert_eq!(event.id, created[0]);
    assert_eq!(event.rdf_type, oeev::MOVE_FROM);
    assert_eq!(event.timestamp, Some(ts("2019-03-05T10:00:00+01:00")));
    assert_eq!(event.concerned_items.len(), 1);
    assert_eq!(event.concerned_items[0].id, samples::PLOT_42);
    assert_eq!(event.concerned_items[0].rdf_type.as_deref(), Some(oeso::PLOT));
    assert_eq!(event.concerned_items[0].labels, vec!["Plot 42".to_string()]);
}

#[tokio::test]
async fn test_event_outside_date_range_is_excluded() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    events.create(&user(), vec![move_from_plot_42()]).await.unwrap();

    let criteria = SearchCriteria::new()
        .with_concerned_item("plot-42")
        .with_date_range(DateRange::parse(Some("2019-04-01"), Some("2019-04-10")).unwrap());
    let (found, total) = events.search(&criteria).await.unwrap();

    assert!(found.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_type_filter_includes_subtypes() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    let at = ts("2019-03-05T10:00:00Z");
    events
        .create(
            &user(),
            vec![
                NewEntity::of_type(oeev::MOVE_FROM).with_timestamp(at),
                NewEntity::of_type(oeev::MOVE_TO).with_timestamp(at),
                NewEntity::of_type(oeev::TROUBLE).with_timestamp(at),
            ],
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();

    let (moves, total) = events
        .search(&SearchCriteria::new().with_type(oeev::MOVE))
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert!(moves.iter().all(|e| e.rdf_type != oeev::TROUBLE));

    assert_eq!(events.count(&SearchCriteria::new()).await.unwrap(), 3);
}

#[tokio::test]
async fn test_page_is_bounded_but_total_is_not() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    let batch = (1..=3)
        .map(|day| {
            NewEntity::of_type(oeev::TROUBLE)
                .with_timestamp(ts(&format!("2019-03-0{}T08:00:00Z", day)))
        })
        .collect();
    events.create(&user(), batch).await.unwrap();

    let (first, total) = events
        .search(&SearchCriteria::new().paginate(0, 2))
        .await
        .unwrap();
    let (second, _) = events
        .search(&SearchCriteria::new().paginate(1, 2))
        .await
        .unwrap();

    assert_eq!(total, 3);
    assert_eq!(
        events
            .count(&SearchCriteria::new().paginate(1, 2))
            .await
            .unwrap(),
        3
    );
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert!(first.iter().all(|e| e.id != second[0].id));
}

#[tokio::test]
async fn test_label_filter_is_case_insensitive() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    events
        .create(
            &user(),
            vec![
                NewEntity::of_type(oeev::TROUBLE)
                    .with_timestamp(ts("2019-03-05T10:00:00Z"))
                    .with_label("Broken Sensor"),
                NewEntity::of_type(oeev::TROUBLE).with_timestamp(ts("2019-03-06T10:00:00Z")),
            ],
        )
        .await
        .unwrap();

    let (found, total) = events
        .search(&SearchCriteria::new().with_label("broken"))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].label.as_deref(), Some("Broken Sensor"));

    // unlabelled events still come back when no label filter is given
    let (_, all) = events.search(&SearchCriteria::new()).await.unwrap();
    assert_eq!(all, 2);
}

#[tokio::test]
async fn test_concerned_item_label_filter() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    events
        .create(
            &user(),
            vec![
                move_from_plot_42(),
                NewEntity::of_type(oeev::TROUBLE)
                    .with_timestamp(ts("2019-03-05T10:00:00Z"))
                    .concerning(samples::PLOT_43),
            ],
        )
        .await
        .unwrap();

    let (found, total) = events
        .search(&SearchCriteria::new().with_concerned_item_label("plot 42"))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].rdf_type, oeev::MOVE_FROM);
}

#[tokio::test]
async fn test_read_back_properties_and_annotations() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    let event = move_from_plot_42()
        .with_property(AttachedProperty::reference(oeev::FROM, samples::GREENHOUSE_A))
        .with_property(AttachedProperty::literal(rdfs::COMMENT, "moved for imaging"))
        .with_annotation(NewAnnotation::new(
            oa::COMMENTING,
            vec!["plants look healthy".to_string()],
        ));
    let id = events
        .create(&user(), vec![event])
        .await
        .unwrap()
        .into_result()
        .unwrap()
        .remove(0);

    let entity = events.get_by_id(&id).await.unwrap().expect("event exists");

    assert_eq!(entity.properties.len(), 2);
    let from = entity
        .properties
        .iter()
        .find(|p| p.relation == oeev::FROM)
        .expect("from property");
    assert_eq!(from.value_type.as_deref(), Some(oeso::GREENHOUSE));
    assert!(entity
        .properties
        .iter()
        .any(|p| p.relation == rdfs::COMMENT && p.value.as_str() == "moved for imaging"));

    assert_eq!(entity.annotations.len(), 1);
    assert_eq!(entity.annotations[0].targets, vec![id.clone()]);
    assert_eq!(entity.annotations[0].motivation, oa::COMMENTING);
}

#[tokio::test]
async fn test_unknown_id_reads_as_none() {
    let fixture = Fixture::new().await;
    let missing = fixture
        .events()
        .get_by_id("http://www.phenome-fppn.fr/test/event/missing")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_search_as_records_query_log() {
    let mut config = phenolink::AppConfig::default();
    config.query_log.enabled = true;
    let fixture = Fixture::with_config(config).await;

    fixture
        .events()
        .search_as(&user(), &SearchCriteria::new().with_label("x"))
        .await
        .unwrap();

    let entries = fixture.documents.all("query_log");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["user"], "tester");
    assert_eq!(entries[0]["kind"], "event");
}

#[tokio::test]
async fn test_date_bounds_are_inclusive() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    events
        .create(
            &user(),
            vec![
                NewEntity::of_type(oeev::TROUBLE).with_timestamp(ts("2019-03-01T00:00:00Z")),
                NewEntity::of_type(oeev::TROUBLE).with_timestamp(ts("2019-03-10T23:59:59Z")),
                NewEntity::of_type(oeev::TROUBLE).with_timestamp(ts("2019-03-11T00:00:00Z")),
            ],
        )
        .await
        .unwrap();

    let range = DateRange::between(ts("2019-03-01T00:00:00Z"), ts("2019-03-10T23:59:59Z"));
    let (_, total) = events
        .search(&SearchCriteria::new().with_date_range(range))
        .await
        .unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_unfiltered_search_matches_count() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    let batch = (0..4)
        .map(|i| {
            NewEntity::of_type(if i % 2 == 0 { oeev::MOVE_TO } else { oeev::TROUBLE })
                .with_timestamp(ts("2019-03-05T10:00:00Z"))
        })
        .collect();
    events.create(&user(), batch).await.unwrap();

    let (all, total) = events.search(&SearchCriteria::new()).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(total, 4);
    assert_eq!(events.count(&SearchCriteria::new()).await.unwrap(), all.len());
}

#[tokio::test]
async fn test_created_entity_reads_back_as_submitted() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    let submitted = NewEntity::of_type(oeev::MOVE_FROM)
        .with_timestamp(ts("2019-03-05T10:00:00+01:00"))
        .with_label("move to greenhouse")
        .concerning(samples::PLOT_42)
        .concerning(samples::PLOT_43)
        .with_property(AttachedProperty::reference(oeev::FROM, samples::GREENHOUSE_A));
    let submitted = NewEntity {
        record: Some(json!({ "operator": "alice", "vehicle": "trolley-3" })),
        ..submitted
    };
    let id = events
        .create(&user(), vec![submitted.clone()])
        .await
        .unwrap()
        .into_result()
        .unwrap()
        .remove(0);

    let entity = events.get_by_id(&id).await.unwrap().expect("created event");
    assert_eq!(entity.rdf_type, submitted.rdf_type);
    assert_eq!(entity.label, submitted.label);
    assert_eq!(entity.timestamp, submitted.timestamp);
    assert_eq!(entity.concerned_item_ids(), vec![samples::PLOT_42, samples::PLOT_43]);
    assert_eq!(entity.properties.len(), 1);
    assert!(entity.properties[0].same_statement(&submitted.properties[0]));

    let record = fixture
        .records
        .get_record(&fixture.config.records.table, &id)
        .await
        .unwrap();
    assert_eq!(record, submitted.record);
}

#[tokio::test]
async fn test_pages_count_entities_not_stored_values() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    let created = events
        .create(
            &user(),
            vec![
                NewEntity::of_type(oeev::TROUBLE)
                    .with_timestamp(ts("2019-03-05T10:00:00Z"))
                    .with_label("alpha"),
                NewEntity::of_type(oeev::TROUBLE)
                    .with_timestamp(ts("2019-03-06T10:00:00Z"))
                    .with_label("beta"),
                NewEntity::of_type(oeev::TROUBLE)
                    .with_timestamp(ts("2019-03-07T10:00:00Z"))
                    .with_label("gamma"),
            ],
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();

    // one entity carrying extra labels and a second timestamp
    let crowded = &created[0];
    fixture
        .graph
        .update(&GraphUpdate::insert(vec![
            Triple::new(crowded, rdfs::LABEL, Node::literal("alias one")),
            Triple::new(crowded, rdfs::LABEL, Node::literal("alias two")),
            Triple::new(
                format!("{}/instant", crowded),
                phenolink::model::vocabulary::time::IN_XSD_DATE_TIME_STAMP,
                Node::literal("2019-03-08T10:00:00+00:00"),
            ),
        ]))
        .await
        .unwrap();

    let mut seen = BTreeSet::new();
    for page in 0..3 {
        let (found, total) = events
            .search(&SearchCriteria::new().paginate(page, 1))
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(found.len(), 1, "page {page} holds one entity");
        assert!(seen.insert(found[0].id.clone()), "page {page} repeats an entity");
    }
    assert_eq!(seen, created.iter().cloned().collect::<BTreeSet<_>>());

    let (beyond, _) = events
        .search(&SearchCriteria::new().paginate(3, 1))
        .await
        .unwrap();
    assert!(beyond.is_empty());

    let entity = events.get_by_id(crowded).await.unwrap().expect("stored event");
    assert_eq!(entity.label.as_deref(), Some("alias one"));
    assert_eq!(entity.timestamp, Some(ts("2019-03-05T10:00:00Z")));
}

#[tokio::test]
async fn test_page_number_past_any_offset_is_empty() {
    let fixture = Fixture::new().await;
    let events = fixture.events();
    events
        .create(&user(), vec![move_from_plot_42()])
        .await
        .unwrap();

    let (found, total) = events
        .search(&SearchCriteria::new().paginate(usize::MAX / 2, 4))
        .await
        .unwrap();
    assert!(found.is_empty());
    assert_eq!(total, 1);
}

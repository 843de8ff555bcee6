use crate::error::CoordError;
use crate::model::vocabulary::{rdf, rdfs};
use crate::model::{
    Annotation, AttachedProperty, ConcernedItem, Entity, EntityKind, Iri, Node, SearchCriteria,
};
use crate::query::search::{timestamp_patterns, DATE_TIME_STAMP, LABEL, RDF_TYPE, URI};
use crate::query::{
    prepare_by_id, prepare_search, ConcernedItemFilter, DocFilter, FilterClause, Predicate,
    Query, QueryBuilder, Term, TriplePattern,
};
use crate::store::traits::{DocumentStore, GraphStore, Row};
use chrono::{DateTime, FixedOffset};
use itertools::Itertools;
use log::debug;
use std::sync::Arc;

/// Where the reader finds sub-resources and how far fan-out queries go
#[derive(Debug, Clone)]
pub struct ReaderSettings {
    pub annotations_collection: String,
    /// Row bound of each fan-out query
    pub fan_out_limit: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            annotations_collection: "annotations".to_string(),
            fan_out_limit: 1000,
        }
    }
}

/// Reads entities of one kind: primary rows from the graph, then for each
/// of them its properties, concerned items and annotations.
#[derive(Clone)]
pub struct EntityReader {
    kind: EntityKind,
    graph: Arc<dyn GraphStore>,
    documents: Arc<dyn DocumentStore>,
    concerned: Arc<dyn ConcernedItemFilter>,
    settings: ReaderSettings,
}

impl EntityReader {
    pub fn new(
        kind: EntityKind,
        graph: Arc<dyn GraphStore>,
        documents: Arc<dyn DocumentStore>,
        concerned: Arc<dyn ConcernedItemFilter>,
        settings: ReaderSettings,
    ) -> Self {
        Self {
            kind,
            graph,
            documents,
            concerned,
            settings,
        }
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// One page of matching entities plus the total over all pages
    pub async fn find(&self, criteria: &SearchCriteria) -> Result<(Vec<Entity>, usize), CoordError> {
        let queries = prepare_search(&self.kind, criteria, self.concerned.as_ref())?;

        let rows = self.run(&queries.select).await?;
        let total = self.run_count(&queries.count).await?;

        let mut entities = Vec::with_capacity(rows.len());
        for partial in self.partials(rows) {
            entities.push(self.complete(partial).await?);
        }
        Ok((entities, total))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Entity>, CoordError> {
        let query = prepare_by_id(&self.kind, id, self.concerned.as_ref())?;
        let rows = self.run(&query).await?;
        match self.partials(rows).into_iter().next() {
            Some(partial) => Ok(Some(self.complete(partial).await?)),
            None => Ok(None),
        }
    }

    pub async fn count(&self, criteria: &SearchCriteria) -> Result<usize, CoordError> {
        let queries = prepare_search(&self.kind, criteria, self.concerned.as_ref())?;
        self.run_count(&queries.count).await
    }

    /// Every statement about `id` as a property, except those whose
    /// predicate is in `excluded`
    pub async fn properties(
        &self,
        id: &str,
        excluded: &[Iri],
    ) -> Result<Vec<AttachedProperty>, CoordError> {
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("relation")
            .select_variable("value")
            .select_variable("valueType")
            .add_triple_pattern(TriplePattern::new(
                Term::iri(id),
                Predicate::Var("relation".to_string()),
                Term::var("value"),
            ))
            .add_optional_pattern(vec![TriplePattern::link(
                Term::var("value"),
                rdf::TYPE,
                Term::var("valueType"),
            )])
            .order_by("relation")
            .order_by("value")
            .set_page_size(self.settings.fan_out_limit);
        if !excluded.is_empty() {
            builder.add_filter(FilterClause::not_one_of(
                "relation",
                excluded.iter().map(|p| Node::iri(p.as_str())).collect(),
            ));
        }

        let rows = self.run(&builder.build()?).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let relation = row.get("relation")?.as_str().to_string();
                let value = row.get("value")?.clone();
                let value_type = iri_of(&row, "valueType");
                Some(AttachedProperty {
                    relation,
                    value,
                    value_type,
                })
            })
            .unique_by(|p| (p.relation.clone(), p.value.clone()))
            .collect())
    }

    /// The entity's label and timestamp. When several values are stored
    /// the least one in value order is taken.
    pub async fn label_and_timestamp(
        &self,
        id: &str,
    ) -> Result<(Option<String>, Option<DateTime<FixedOffset>>), CoordError> {
        let mut label = QueryBuilder::new_query();
        label
            .select_variable(LABEL)
            .add_triple_pattern(TriplePattern::link(Term::iri(id), rdfs::LABEL, Term::var(LABEL)))
            .order_by(LABEL)
            .set_page_size(1);
        let label = self
            .run(&label.build()?)
            .await?
            .into_iter()
            .find_map(|mut row| row.remove(LABEL))
            .map(|l| l.as_str().to_string());

        if !self.kind.timestamped {
            return Ok((label, None));
        }
        let mut stamp = QueryBuilder::new_query();
        stamp.select_variable(DATE_TIME_STAMP);
        for pattern in timestamp_patterns(Term::iri(id)) {
            stamp.add_triple_pattern(pattern);
        }
        stamp.order_by(DATE_TIME_STAMP).set_page_size(1);
        let timestamp = self
            .run(&stamp.build()?)
            .await?
            .into_iter()
            .find_map(|mut row| row.remove(DATE_TIME_STAMP))
            .map(|t| parse_timestamp(t.as_str()))
            .transpose()?;
        Ok((label, timestamp))
    }

    pub async fn concerned_items(&self, id: &str) -> Result<Vec<ConcernedItem>, CoordError> {
        let Some(concerns) = &self.kind.concerns else {
            return Ok(Vec::new());
        };

        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable(URI)
            .select_variable(RDF_TYPE)
            .select_variable(LABEL)
            .add_triple_pattern(TriplePattern::link(Term::iri(id), concerns.as_str(), Term::var(URI)))
            .add_optional_pattern(vec![TriplePattern::link(
                Term::var(URI),
                rdf::TYPE,
                Term::var(RDF_TYPE),
            )])
            .add_optional_pattern(vec![TriplePattern::link(
                Term::var(URI),
                rdfs::LABEL,
                Term::var(LABEL),
            )])
            .order_by(URI)
            .set_page_size(self.settings.fan_out_limit);

        let rows = self.run(&builder.build()?).await?;
        let mut items: Vec<ConcernedItem> = Vec::new();
        for row in rows {
            let Some(uri) = iri_of(&row, URI) else {
                continue;
            };
            if items.last().map(|item| &item.id) != Some(&uri) {
                items.push(ConcernedItem {
                    id: uri,
                    rdf_type: iri_of(&row, RDF_TYPE),
                    labels: Vec::new(),
                });
            }
            if let (Some(item), Some(label)) = (items.last_mut(), row.get(LABEL)) {
                if !item.labels.iter().any(|l| l == label.as_str()) {
                    item.labels.push(label.as_str().to_string());
                }
            }
        }
        Ok(items)
    }

    /// Annotations whose targets include `id`, oldest first
    pub async fn annotations(&self, id: &str) -> Result<Vec<Annotation>, CoordError> {
        let filter = DocFilter::eq("targets", id);
        debug!(
            "Annotation lookup in {}: {}",
            self.settings.annotations_collection,
            serde_json::to_string(&filter).unwrap_or_default()
        );
        let documents = self
            .documents
            .find(&self.settings.annotations_collection, &filter)
            .await?;

        let mut annotations = documents
            .into_iter()
            .map(|doc| {
                serde_json::from_value::<Annotation>(doc)
                    .map_err(|e| CoordError::query(format!("unreadable annotation: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        annotations.sort_by_key(|a| a.created);
        Ok(annotations)
    }

    async fn complete(&self, mut entity: Entity) -> Result<Entity, CoordError> {
        let excluded = self.kind.structural_predicates();
        let ((label, timestamp), properties, concerned_items, annotations) = tokio::try_join!(
            self.label_and_timestamp(&entity.id),
            self.properties(&entity.id, &excluded),
            self.concerned_items(&entity.id),
            self.annotations(&entity.id),
        )?;
        entity.label = label;
        entity.timestamp = timestamp;
        entity.properties = properties;
        entity.concerned_items = concerned_items;
        entity.annotations = annotations;
        Ok(entity)
    }

    /// Identity and type of each matched entity, one per row
    fn partials(&self, rows: Vec<Row>) -> Vec<Entity> {
        rows.into_iter()
            .unique_by(|row| row.get(URI).cloned())
            .filter_map(|row| Some(Entity::partial(iri_of(&row, URI)?, iri_of(&row, RDF_TYPE)?)))
            .collect()
    }

    async fn run(&self, query: &Query) -> Result<Vec<Row>, CoordError> {
        debug!("Graph query: {}", query);
        Ok(self.graph.query(query).await?)
    }

    async fn run_count(&self, query: &Query) -> Result<usize, CoordError> {
        let rows = self.run(query).await?;
        let Some(value) = rows.first().and_then(|row| row.values().next()) else {
            return Ok(0);
        };
        value
            .as_str()
            .parse()
            .map_err(|e| CoordError::query(format!("invalid count '{}': {}", value.as_str(), e)))
    }
}

fn iri_of(row: &Row, var: &str) -> Option<Iri> {
    match row.get(var) {
        Some(Node::Iri(value)) => Some(value.clone()),
        _ => None,
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, CoordError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| CoordError::query(format!("invalid timestamp '{}': {}", value, e)))
}

//! Per-kind entry points used by the outer (HTTP) layer.

use crate::config::AppConfig;
use crate::error::CoordError;
use crate::logic::{
    CoordinatorSettings, CreateReport, EntityReader, IdentityAllocator, ImageMetadata,
    ImageMetadataReader, QueryLog, ReaderSettings, ReconcileOutcome, RelationReconciler,
    ValidationContext, ValidationPipeline, WriteCoordinator,
};
use crate::model::vocabulary::{oeso, rdfs};
use crate::model::{
    Entity, EntityKind, Id, ImageCriteria, LinkDirection, NewEntity, Node, ReasonCode,
    SearchCriteria, UserContext, ValidationError,
};
use crate::query::{QueryBuilder, RegexConcernedItemFilter, Term, TriplePattern};
use crate::store::traits::{DocumentStore, GraphStore, IdentityService, RecordStore, SchemaService};
use crate::store::GraphOntology;
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The collaborators a service is wired to
#[derive(Clone)]
pub struct Backends {
    pub graph: Arc<dyn GraphStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub records: Arc<dyn RecordStore>,
    pub schema: Arc<dyn SchemaService>,
    pub identity: Arc<dyn IdentityService>,
}

impl Backends {
    /// Schema and identity answered from the graph itself
    pub fn with_graph_ontology(
        graph: Arc<dyn GraphStore>,
        documents: Arc<dyn DocumentStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let ontology = Arc::new(GraphOntology::new(graph.clone()));
        Self {
            graph,
            documents,
            records,
            schema: ontology.clone(),
            identity: ontology,
        }
    }
}

/// Search, read and write operations for one entity kind
#[derive(Clone)]
pub struct EntityService {
    kind: EntityKind,
    graph: Arc<dyn GraphStore>,
    identity: Arc<dyn IdentityService>,
    reader: EntityReader,
    coordinator: WriteCoordinator,
    pipeline: Arc<ValidationPipeline>,
    reconciler: RelationReconciler,
    images: ImageMetadataReader,
    query_log: QueryLog,
}

impl EntityService {
    pub fn new(kind: EntityKind, backends: &Backends, config: &AppConfig) -> Self {
        let reader = EntityReader::new(
            kind.clone(),
            backends.graph.clone(),
            backends.documents.clone(),
            Arc::new(RegexConcernedItemFilter),
            ReaderSettings {
                annotations_collection: config.collections.annotations.clone(),
                fan_out_limit: config.query.page_size_max,
            },
        );
        let pipeline = Arc::new(ValidationPipeline::new(
            ValidationContext {
                kind: kind.clone(),
                schema: backends.schema.clone(),
                identity: backends.identity.clone(),
            },
            config.validation.require_admin,
        ));
        let documents_collection = if kind.root_type == oeso::IMAGE {
            config.collections.images.clone()
        } else {
            format!("{}_documents", kind.name)
        };
        let coordinator = WriteCoordinator::new(
            kind.clone(),
            backends.graph.clone(),
            backends.documents.clone(),
            backends.records.clone(),
            IdentityAllocator::new(config.identifiers.base_uri.as_str(), backends.identity.clone()),
            pipeline.clone(),
            CoordinatorSettings {
                documents_collection,
                annotations_collection: config.collections.annotations.clone(),
                records_table: config.records.table.clone(),
                atomic_batches: config.writes.atomic_batches,
            },
        );

        Self {
            kind,
            graph: backends.graph.clone(),
            identity: backends.identity.clone(),
            reader,
            coordinator,
            pipeline,
            reconciler: RelationReconciler::new(backends.graph.clone()),
            images: ImageMetadataReader::new(
                backends.documents.clone(),
                config.collections.images.as_str(),
            ),
            query_log: QueryLog::new(
                backends.documents.clone(),
                config.query_log.collection.as_str(),
                config.query_log.enabled,
            ),
        }
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub async fn search(&self, criteria: &SearchCriteria) -> Result<(Vec<Entity>, usize), CoordError> {
        self.reader.find(criteria).await
    }

    /// Same as `search`, recording the request in the query log
    pub async fn search_as(
        &self,
        user: &UserContext,
        criteria: &SearchCriteria,
    ) -> Result<(Vec<Entity>, usize), CoordError> {
        self.query_log.record(user, &self.kind.name, criteria).await;
        self.search(criteria).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Entity>, CoordError> {
        self.reader.find_by_id(id).await
    }

    pub async fn count(&self, criteria: &SearchCriteria) -> Result<usize, CoordError> {
        self.reader.count(criteria).await
    }

    /// Batch create with the configured batch semantics
    pub async fn create(
        &self,
        user: &UserContext,
        entities: Vec<NewEntity>,
    ) -> Result<CreateReport, CoordError> {
        self.coordinator.create(user, entities).await
    }

    /// Batch create where one failure undoes the whole batch
    pub async fn create_atomic(
        &self,
        user: &UserContext,
        entities: Vec<NewEntity>,
    ) -> Result<Vec<Id>, CoordError> {
        self.coordinator
            .create_with(user, entities, true)
            .await?
            .into_result()
    }

    pub async fn validate(
        &self,
        user: &UserContext,
        entities: &[NewEntity],
    ) -> Result<Vec<ValidationError>, CoordError> {
        self.coordinator.validate(user, entities).await
    }

    pub async fn reconcile_relations(
        &self,
        subject: &str,
        predicate: &str,
        desired: &[Id],
    ) -> Result<ReconcileOutcome, CoordError> {
        self.reconciler.reconcile(subject, predicate, desired).await
    }

    /// Resources linked to `anchor` under `predicate`, with their label
    pub async fn linked_objects(
        &self,
        anchor: &str,
        predicate: &str,
        direction: LinkDirection,
    ) -> Result<BTreeMap<Id, Option<String>>, CoordError> {
        let link = match direction {
            LinkDirection::Outgoing => {
                TriplePattern::link(Term::iri(anchor), predicate, Term::var("member"))
            }
            LinkDirection::Incoming => {
                TriplePattern::link(Term::var("member"), predicate, Term::iri(anchor))
            }
        };
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("member")
            .select_variable("label")
            .add_triple_pattern(link)
            .add_optional_pattern(vec![TriplePattern::link(
                Term::var("member"),
                rdfs::LABEL,
                Term::var("label"),
            )]);
        let query = builder.build()?;
        debug!("Graph query: {}", query);

        let mut linked = BTreeMap::new();
        for row in self.graph.query(&query).await? {
            if let Some(Node::Iri(member)) = row.get("member") {
                let label = row.get("label").map(|l| l.as_str().to_string());
                let entry = linked.entry(member.clone()).or_insert(None);
                if entry.is_none() {
                    *entry = label;
                }
            }
        }
        Ok(linked)
    }

    /// `experiment oeso:measures ?variable` for exactly the given variables
    pub async fn update_linked_variables(
        &self,
        user: &UserContext,
        experiment: &str,
        variables: &[Id],
    ) -> Result<ReconcileOutcome, CoordError> {
        self.update_links(user, experiment, oeso::MEASURES, LinkDirection::Outgoing, variables)
            .await
    }

    /// `?sensor oeso:participatesIn experiment` for exactly the given sensors
    pub async fn update_linked_sensors(
        &self,
        user: &UserContext,
        experiment: &str,
        sensors: &[Id],
    ) -> Result<ReconcileOutcome, CoordError> {
        self.update_links(user, experiment, oeso::PARTICIPATES_IN, LinkDirection::Incoming, sensors)
            .await
    }

    async fn update_links(
        &self,
        user: &UserContext,
        anchor: &str,
        predicate: &str,
        direction: LinkDirection,
        members: &[Id],
    ) -> Result<ReconcileOutcome, CoordError> {
        self.pipeline.authorize(user)?;
        if self.reader.find_by_id(anchor).await?.is_none() {
            return Err(CoordError::NotFound(anchor.to_string()));
        }

        let mut errors = Vec::new();
        for member in members {
            if !self.identity.exists_uri(member).await? {
                errors.push(ValidationError::new(
                    0,
                    member.as_str(),
                    ReasonCode::UnknownUri,
                    format!("unknown identifier {}", member),
                ));
            }
        }
        CoordError::from_validation(errors)?;

        let outcome = self
            .reconciler
            .reconcile_directed(anchor, predicate, direction, members)
            .await?;
        info!(
            "Links {} of {} updated: {} removed, {} added",
            predicate,
            anchor,
            outcome.removed.len(),
            outcome.added.len()
        );
        Ok(outcome)
    }

    /// Image metadata from the document store, sorted by shooting date
    pub async fn search_images(
        &self,
        criteria: &ImageCriteria,
    ) -> Result<(Vec<ImageMetadata>, usize), CoordError> {
        self.images.find(criteria).await
    }
}

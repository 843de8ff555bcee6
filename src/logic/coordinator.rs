use crate::error::{
    BatchFailure, CompensationFailure, CoordError, EntityFailure, PartialWriteReport,
};
use crate::logic::identity::IdentityAllocator;
use crate::logic::reconcile::RelationReconciler;
use crate::logic::validate::ValidationPipeline;
use crate::model::vocabulary::{oa, rdf, rdfs, time};
use crate::model::{
    Annotation, EntityKind, Id, Iri, LinkDirection, NewEntity, Node, Triple, UserContext,
    ValidationError,
};
use crate::query::{DocFilter, FilterClause, QueryBuilder, Term, TriplePattern};
use crate::store::traits::{DocumentStore, GraphStore, GraphUpdate, RecordStore};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use itertools::Itertools;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// Ordered write phases of one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePhase {
    Primary,
    Relations,
    Properties,
    SubResources,
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WritePhase::Primary => "primary",
            WritePhase::Relations => "relations",
            WritePhase::Properties => "properties",
            WritePhase::SubResources => "sub_resources",
        };
        write!(f, "{}", name)
    }
}

/// Where one entity stands in its write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityState {
    Pending,
    IdentifierAssigned,
    PrimaryWritten,
    RelationsWritten,
    PropertiesWritten,
    SubResourcesWritten,
    Committed,
    Failed(WritePhase),
    Compensating,
    Compensated,
    Fatal,
}

impl EntityState {
    fn after(phase: WritePhase) -> Self {
        match phase {
            WritePhase::Primary => EntityState::PrimaryWritten,
            WritePhase::Relations => EntityState::RelationsWritten,
            WritePhase::Properties => EntityState::PropertiesWritten,
            WritePhase::SubResources => EntityState::SubResourcesWritten,
        }
    }
}

/// One action against one backend
#[derive(Debug, Clone, PartialEq)]
pub enum WriteAction {
    InsertTriples(Vec<Triple>),
    DeleteTriples(Vec<Triple>),
    InsertDocument { collection: String, document: Value },
    DeleteDocuments { collection: String, filter: DocFilter },
    InsertRecord { table: String, id: Id, row: Value },
    DeleteRecord { table: String, id: Id },
    Reconcile {
        anchor: Id,
        predicate: Iri,
        direction: LinkDirection,
        members: Vec<Id>,
    },
}

impl WriteAction {
    /// Covered by the graph transaction in atomic batches
    pub fn is_graph(&self) -> bool {
        matches!(
            self,
            WriteAction::InsertTriples(_)
                | WriteAction::DeleteTriples(_)
                | WriteAction::Reconcile { .. }
        )
    }
}

/// A write paired with the action undoing it, fixed when the step is built
#[derive(Debug, Clone, PartialEq)]
pub struct WriteStep {
    pub name: String,
    pub phase: WritePhase,
    pub action: WriteAction,
    pub inverse: WriteAction,
}

impl WriteStep {
    pub fn insert_triples<N: Into<String>>(phase: WritePhase, name: N, triples: Vec<Triple>) -> Self {
        Self {
            name: name.into(),
            phase,
            action: WriteAction::InsertTriples(triples.clone()),
            inverse: WriteAction::DeleteTriples(triples),
        }
    }

    /// Removes stored statements; undoing puts them back
    pub fn delete_triples<N: Into<String>>(phase: WritePhase, name: N, triples: Vec<Triple>) -> Self {
        Self {
            name: name.into(),
            phase,
            action: WriteAction::DeleteTriples(triples.clone()),
            inverse: WriteAction::InsertTriples(triples),
        }
    }

    /// `key` must select the inserted document and nothing else
    pub fn insert_document<N: Into<String>, C: Into<String>>(
        phase: WritePhase,
        name: N,
        collection: C,
        document: Value,
        key: DocFilter,
    ) -> Self {
        let collection = collection.into();
        Self {
            name: name.into(),
            phase,
            action: WriteAction::InsertDocument {
                collection: collection.clone(),
                document,
            },
            inverse: WriteAction::DeleteDocuments {
                collection,
                filter: key,
            },
        }
    }

    pub fn insert_record<N: Into<String>, T: Into<String>>(
        phase: WritePhase,
        name: N,
        table: T,
        id: Id,
        row: Value,
    ) -> Self {
        let table = table.into();
        Self {
            name: name.into(),
            phase,
            action: WriteAction::InsertRecord {
                table: table.clone(),
                id: id.clone(),
                row,
            },
            inverse: WriteAction::DeleteRecord { table, id },
        }
    }

    /// Reconciles to `desired`; undoing reconciles back to `previous`
    pub fn reconcile<N: Into<String>>(
        phase: WritePhase,
        name: N,
        anchor: &str,
        predicate: &str,
        direction: LinkDirection,
        desired: Vec<Id>,
        previous: Vec<Id>,
    ) -> Self {
        let action = |members: Vec<Id>| WriteAction::Reconcile {
            anchor: anchor.to_string(),
            predicate: predicate.to_string(),
            direction,
            members,
        };
        Self {
            name: name.into(),
            phase,
            action: action(desired),
            inverse: action(previous),
        }
    }
}

/// Every step of one entity, in execution order
#[derive(Debug, Clone)]
pub struct WritePlan {
    pub index: usize,
    pub id: Id,
    pub steps: Vec<WriteStep>,
}

/// Outcome of a batch create in per-entity mode
#[derive(Debug, Default)]
pub struct CreateReport {
    /// In submission order
    pub created: Vec<Id>,
    pub failures: Vec<EntityFailure>,
}

impl CreateReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<Id>, CoordError> {
        if self.failures.is_empty() {
            Ok(self.created)
        } else {
            Err(CoordError::Batch(Box::new(BatchFailure {
                created: self.created,
                failures: self.failures,
            })))
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Collection receiving the entity's own document, if it has one
    pub documents_collection: String,
    pub annotations_collection: String,
    pub records_table: String,
    /// Default batch semantics when the caller does not choose
    pub atomic_batches: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            documents_collection: "documents".to_string(),
            annotations_collection: "annotations".to_string(),
            records_table: "records".to_string(),
            atomic_batches: false,
        }
    }
}

/// Writes composite entities across the graph, document and relational
/// stores, undoing completed steps when a later one fails.
#[derive(Clone)]
pub struct WriteCoordinator {
    kind: EntityKind,
    graph: Arc<dyn GraphStore>,
    documents: Arc<dyn DocumentStore>,
    records: Arc<dyn RecordStore>,
    reconciler: RelationReconciler,
    allocator: IdentityAllocator,
    pipeline: Arc<ValidationPipeline>,
    settings: CoordinatorSettings,
}

impl WriteCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: EntityKind,
        graph: Arc<dyn GraphStore>,
        documents: Arc<dyn DocumentStore>,
        records: Arc<dyn RecordStore>,
        allocator: IdentityAllocator,
        pipeline: Arc<ValidationPipeline>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            kind,
            reconciler: RelationReconciler::new(graph.clone()),
            graph,
            documents,
            records,
            allocator,
            pipeline,
            settings,
        }
    }

    /// Validates then writes the batch with the configured batch semantics
    pub async fn create(
        &self,
        user: &UserContext,
        entities: Vec<NewEntity>,
    ) -> Result<CreateReport, CoordError> {
        self.create_with(user, entities, self.settings.atomic_batches)
            .await
    }

    /// Per-entity mode reports each failed entity and keeps the others.
    /// Atomic mode writes all or nothing: any validation error aborts the
    /// batch before the first write.
    pub async fn create_with(
        &self,
        user: &UserContext,
        entities: Vec<NewEntity>,
        atomic: bool,
    ) -> Result<CreateReport, CoordError> {
        let errors = self.pipeline.validate(user, &entities).await?;
        if atomic && !errors.is_empty() {
            info!(
                "Atomic {} batch of {} rejected with {} validation error(s)",
                self.kind.name,
                entities.len(),
                errors.len()
            );
            return Err(CoordError::AggregateValidation(errors));
        }

        let mut report = CreateReport::default();
        let mut by_entity = errors.into_iter().into_group_map_by(|e| e.entity_index);
        let mut plans = Vec::new();
        for (index, entity) in entities.into_iter().enumerate() {
            if let Some(entity_errors) = by_entity.remove(&index) {
                report.failures.push(EntityFailure {
                    index,
                    id: entity.id.clone(),
                    error: CoordError::AggregateValidation(entity_errors),
                });
                continue;
            }
            match self.plan(index, entity).await {
                Ok(plan) => plans.push(plan),
                Err(error) => report.failures.push(EntityFailure {
                    index,
                    id: None,
                    error,
                }),
            }
        }

        if atomic {
            if !report.failures.is_empty() {
                return Err(CoordError::Batch(Box::new(BatchFailure {
                    created: Vec::new(),
                    failures: report.failures,
                })));
            }
            report.created = self.write_atomic(plans).await?;
        } else {
            for plan in plans {
                let (index, id) = (plan.index, plan.id.clone());
                match self.write_entity(&plan).await {
                    Ok(()) => report.created.push(id),
                    Err(error) => report.failures.push(EntityFailure {
                        index,
                        id: Some(id),
                        error,
                    }),
                }
            }
        }
        report.failures.sort_by_key(|f| f.index);

        info!(
            "{} batch: {} created, {} failed",
            self.kind.name,
            report.created.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Validation only, for callers checking a batch before submitting it
    pub async fn validate(
        &self,
        user: &UserContext,
        entities: &[NewEntity],
    ) -> Result<Vec<ValidationError>, CoordError> {
        self.pipeline.validate(user, entities).await
    }

    /// Builds the ordered steps of one entity, assigning its identifier
    pub async fn plan(&self, index: usize, entity: NewEntity) -> Result<WritePlan, CoordError> {
        let (id, existing) = match &entity.id {
            Some(id) => (id.clone(), true),
            None => (self.allocator.allocate(&self.kind).await?, false),
        };
        debug!("Entity #{} {:?}: {}", index, EntityState::IdentifierAssigned, id);

        let mut steps = Vec::new();

        let mut primary = vec![Triple::new(&id, rdf::TYPE, Node::iri(&entity.rdf_type))];
        if let Some(label) = &entity.label {
            primary.push(Triple::new(&id, rdfs::LABEL, Node::literal(label)));
        }
        if let Some(timestamp) = &entity.timestamp {
            let instant = format!("{}/instant", id);
            primary.push(Triple::new(&id, time::HAS_TIME, Node::iri(&instant)));
            primary.push(Triple::new(&instant, rdf::TYPE, Node::iri(time::INSTANT)));
            primary.push(Triple::new(
                &instant,
                time::IN_XSD_DATE_TIME_STAMP,
                timestamp_literal(timestamp),
            ));
        }
        if existing {
            // single-valued fields are replaced, not accumulated
            let superseded = self.superseded(&id, &entity).await?;
            if !superseded.is_empty() {
                steps.push(WriteStep::delete_triples(
                    WritePhase::Primary,
                    "graph:replace",
                    superseded,
                ));
            }
            primary = self.absent(primary).await?;
        }
        if !primary.is_empty() {
            steps.push(WriteStep::insert_triples(WritePhase::Primary, "graph:primary", primary));
        }

        if let Some(row) = entity.record.clone() {
            steps.push(WriteStep::insert_record(
                WritePhase::Primary,
                format!("record:{}", self.settings.records_table),
                self.settings.records_table.as_str(),
                id.clone(),
                row,
            ));
        }

        if let Some(document) = entity.document.clone() {
            let document = self.entity_document(&id, &entity, document);
            steps.push(WriteStep::insert_document(
                WritePhase::Primary,
                format!("document:{}", self.settings.documents_collection),
                self.settings.documents_collection.as_str(),
                document,
                DocFilter::eq("uri", id.as_str()),
            ));
        }

        if let Some(concerns) = &self.kind.concerns {
            let previous = if existing {
                self.reconciler
                    .current(&id, concerns, LinkDirection::Outgoing)
                    .await?
                    .into_iter()
                    .collect()
            } else {
                Vec::new()
            };
            if !entity.concerned_items.is_empty() || !previous.is_empty() {
                steps.push(WriteStep::reconcile(
                    WritePhase::Relations,
                    "graph:concerns",
                    &id,
                    concerns,
                    LinkDirection::Outgoing,
                    entity.concerned_items.clone(),
                    previous,
                ));
            }
        }

        let mut properties = entity
            .properties
            .iter()
            .map(|p| Triple::new(&id, &p.relation, p.value.clone()))
            .collect::<Vec<_>>();
        if existing {
            properties = self.absent(properties).await?;
        }
        if !properties.is_empty() {
            steps.push(WriteStep::insert_triples(
                WritePhase::Properties,
                "graph:properties",
                properties,
            ));
        }

        let annotation_kind = EntityKind::new("annotation", oa::ANNOTATION);
        for new_annotation in &entity.annotations {
            let annotation = Annotation {
                id: self.allocator.candidate(&annotation_kind),
                motivation: new_annotation.motivation.clone(),
                body_values: new_annotation.body_values.clone(),
                targets: vec![id.clone()],
                creator: new_annotation.creator.clone(),
                created: Utc::now().fixed_offset(),
            };
            let document = serde_json::to_value(&annotation)
                .map_err(|e| CoordError::query(format!("unserializable annotation: {}", e)))?;
            steps.push(WriteStep::insert_document(
                WritePhase::SubResources,
                format!("annotation:{}", annotation.id),
                self.settings.annotations_collection.as_str(),
                document,
                DocFilter::eq("id", annotation.id.as_str()),
            ));
        }

        Ok(WritePlan { index, id, steps })
    }

    /// Stamps identity and concerned items into the entity's own document
    fn entity_document(&self, id: &str, entity: &NewEntity, document: Value) -> Value {
        let mut document = match document {
            Value::Object(map) => Value::Object(map),
            other => json!({ "content": other }),
        };
        if let Some(map) = document.as_object_mut() {
            map.insert("uri".to_string(), json!(id));
            map.insert("rdfType".to_string(), json!(entity.rdf_type));
            if !entity.concerned_items.is_empty() && !map.contains_key("concernedItems") {
                let items = entity
                    .concerned_items
                    .iter()
                    .map(|item| json!({ "uri": item }))
                    .collect::<Vec<_>>();
                map.insert("concernedItems".to_string(), Value::Array(items));
            }
        }
        document
    }

    /// Stored type, label and timestamp statements that the update changes.
    /// A field the update leaves out keeps its stored values.
    async fn superseded(&self, id: &str, entity: &NewEntity) -> Result<Vec<Triple>, CoordError> {
        let mut stale = Vec::new();

        let rdf_type = Node::iri(&entity.rdf_type);
        for old in self.stored_objects(id, rdf::TYPE).await? {
            if old != rdf_type {
                stale.push(Triple::new(id, rdf::TYPE, old));
            }
        }

        if let Some(label) = &entity.label {
            let label = Node::literal(label);
            for old in self.stored_objects(id, rdfs::LABEL).await? {
                if old != label {
                    stale.push(Triple::new(id, rdfs::LABEL, old));
                }
            }
        }

        if let Some(timestamp) = &entity.timestamp {
            let instant = format!("{}/instant", id);
            let stamp = timestamp_literal(timestamp);
            for time_node in self.stored_objects(id, time::HAS_TIME).await? {
                let Node::Iri(time_iri) = &time_node else {
                    continue;
                };
                let own = *time_iri == instant;
                for old in self
                    .stored_objects(time_iri, time::IN_XSD_DATE_TIME_STAMP)
                    .await?
                {
                    if !own || old != stamp {
                        stale.push(Triple::new(time_iri, time::IN_XSD_DATE_TIME_STAMP, old));
                    }
                }
                if !own {
                    stale.push(Triple::new(id, time::HAS_TIME, time_node.clone()));
                }
            }
        }
        Ok(stale)
    }

    async fn stored_objects(&self, subject: &str, predicate: &str) -> Result<Vec<Node>, CoordError> {
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("o")
            .add_triple_pattern(TriplePattern::link(
                Term::iri(subject),
                predicate,
                Term::var("o"),
            ));
        Ok(self
            .graph
            .query(&builder.build()?)
            .await?
            .into_iter()
            .filter_map(|mut row| row.remove("o"))
            .collect())
    }

    /// Triples not already stored, so undoing an update never removes
    /// statements that predate it
    async fn absent(&self, triples: Vec<Triple>) -> Result<Vec<Triple>, CoordError> {
        let mut missing = Vec::new();
        for triple in triples {
            let mut builder = QueryBuilder::new_query();
            builder
                .select_variable("o")
                .add_triple_pattern(TriplePattern::link(
                    Term::iri(&triple.subject),
                    triple.predicate.as_str(),
                    Term::var("o"),
                ))
                .add_filter(FilterClause::equals("o", triple.object.clone()))
                .set_page_size(1);
            if self.graph.query(&builder.build()?).await?.is_empty() {
                missing.push(triple);
            }
        }
        Ok(missing)
    }

    async fn apply(&self, action: &WriteAction) -> Result<(), CoordError> {
        match action {
            WriteAction::InsertTriples(triples) => {
                self.graph.update(&GraphUpdate::insert(triples.clone())).await?
            }
            WriteAction::DeleteTriples(triples) => {
                self.graph.update(&GraphUpdate::delete(triples.clone())).await?
            }
            WriteAction::InsertDocument {
                collection,
                document,
            } => self.documents.insert_one(collection, document.clone()).await?,
            WriteAction::DeleteDocuments { collection, filter } => {
                self.documents.delete_many(collection, filter).await?;
            }
            WriteAction::InsertRecord { table, id, row } => {
                self.records.insert_record(table, id, row.clone()).await?
            }
            WriteAction::DeleteRecord { table, id } => {
                self.records.delete_record(table, id).await?;
            }
            WriteAction::Reconcile {
                anchor,
                predicate,
                direction,
                members,
            } => {
                self.reconciler
                    .reconcile_directed(anchor, predicate, *direction, members)
                    .await?;
            }
        }
        Ok(())
    }

    /// Runs the steps of one entity in order; on failure undoes the
    /// completed ones, newest first
    pub async fn write_entity(&self, plan: &WritePlan) -> Result<(), CoordError> {
        let mut done: Vec<&WriteStep> = Vec::new();
        for step in &plan.steps {
            if let Err(err) = self.apply(&step.action).await {
                warn!(
                    "Entity {} {:?} at step {}: {}",
                    plan.id,
                    EntityState::Failed(step.phase),
                    step.name,
                    err
                );
                // a reconcile that removed links before failing is undone too
                if matches!(err, CoordError::PartialReconcile(_)) {
                    done.push(step);
                }
                let report = self
                    .compensate(&plan.id, &step.phase.to_string(), &err, &done, |_| true)
                    .await;
                return Err(CoordError::PartialWrite(Box::new(report)));
            }
            done.push(step);
            if plan.steps.get(done.len()).map(|s| s.phase) != Some(step.phase) {
                debug!("Entity {} {:?}", plan.id, EntityState::after(step.phase));
            }
        }
        debug!("Entity {} {:?}", plan.id, EntityState::Committed);
        Ok(())
    }

    async fn compensate<F>(
        &self,
        id: &str,
        failed_phase: &str,
        cause: &CoordError,
        done: &[&WriteStep],
        include: F,
    ) -> PartialWriteReport
    where
        F: Fn(&WriteStep) -> bool,
    {
        debug!("Entity {} {:?}", id, EntityState::Compensating);
        let mut report = PartialWriteReport {
            entity_id: id.to_string(),
            failed_phase: failed_phase.to_string(),
            cause: cause.to_string(),
            compensated: Vec::new(),
            compensation_failures: Vec::new(),
        };
        for step in done.iter().rev().filter(|s| include(**s)) {
            match self.apply(&step.inverse).await {
                Ok(()) => report.compensated.push(step.name.clone()),
                Err(err) => {
                    error!("Undo of {} for entity {} failed: {}", step.name, id, err);
                    report.compensation_failures.push(CompensationFailure {
                        step: step.name.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        if report.fully_compensated() {
            warn!("Entity {} {:?}", id, EntityState::Compensated);
        } else {
            error!(
                "Entity {} {:?}: {} still persisted",
                id,
                EntityState::Fatal,
                report.remaining_persisted().join(", ")
            );
        }
        report
    }

    /// The whole batch inside one graph transaction. On failure the graph
    /// is rolled back and the other stores are compensated for every
    /// entity written so far.
    async fn write_atomic(&self, plans: Vec<WritePlan>) -> Result<Vec<Id>, CoordError> {
        let Some(last) = plans.last() else {
            return Ok(Vec::new());
        };
        self.graph.begin().await?;

        let mut done: Vec<&WriteStep> = Vec::new();
        let mut failure: Option<(&WritePlan, String, CoordError)> = None;
        'plans: for plan in &plans {
            for step in &plan.steps {
                if let Err(err) = self.apply(&step.action).await {
                    warn!(
                        "Atomic {} batch failed on entity {} at step {}: {}",
                        self.kind.name, plan.id, step.name, err
                    );
                    failure = Some((plan, step.phase.to_string(), err));
                    break 'plans;
                }
                done.push(step);
            }
        }

        let (plan, failed_phase, cause) = match failure {
            Some(failure) => failure,
            None => match self.graph.commit().await {
                Ok(()) => return Ok(plans.iter().map(|p| p.id.clone()).collect()),
                Err(err) => {
                    error!("Commit of atomic {} batch failed: {}", self.kind.name, err);
                    (last, "commit".to_string(), CoordError::from(err))
                }
            },
        };

        let mut report = self
            .compensate(&plan.id, &failed_phase, &cause, &done, |s| !s.action.is_graph())
            .await;
        match self.graph.rollback().await {
            Ok(()) => report.compensated.push("graph:rollback".to_string()),
            Err(err) => {
                error!("Rollback of atomic {} batch failed: {}", self.kind.name, err);
                report.compensation_failures.push(CompensationFailure {
                    step: "graph:rollback".to_string(),
                    reason: err.to_string(),
                });
            }
        }
        Err(self.batch_failure(plan.index, &plan.id, report))
    }

    fn batch_failure(&self, index: usize, id: &str, report: PartialWriteReport) -> CoordError {
        CoordError::Batch(Box::new(BatchFailure {
            created: Vec::new(),
            failures: vec![EntityFailure {
                index,
                id: Some(id.to_string()),
                error: CoordError::PartialWrite(Box::new(report)),
            }],
        }))
    }
}

fn timestamp_literal(timestamp: &DateTime<FixedOffset>) -> Node {
    Node::literal(timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

use crate::error::{StoreError, StoreResult};
use crate::model::vocabulary::{owl, rdf, rdfs};
use crate::model::{Iri, Node};
use crate::query::{FilterClause, Predicate, Query, QueryBuilder, Term, TriplePattern};
use crate::store::traits::{GraphStore, IdentityService, Row, SchemaService};
use std::sync::Arc;

/// Schema and identity lookups answered from the graph itself, where the
/// ontology is stored next to the data.
#[derive(Clone)]
pub struct GraphOntology {
    graph: Arc<dyn GraphStore>,
}

impl GraphOntology {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    async fn run(&self, builder: &QueryBuilder) -> StoreResult<Vec<Row>> {
        let query: Query = builder
            .build()
            .map_err(|e| StoreError::malformed(e.to_string()))?;
        self.graph.query(&query).await
    }
}

fn iri_values(rows: &[Row], var: &str) -> Vec<Iri> {
    rows.iter()
        .filter_map(|row| match row.get(var) {
            Some(Node::Iri(value)) => Some(value.clone()),
            _ => None,
        })
        .collect()
}

#[async_trait::async_trait]
impl SchemaService for GraphOntology {
    async fn type_exists(&self, rdf_type: &str) -> StoreResult<bool> {
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("class")
            .add_triple_pattern(TriplePattern::link(
                Term::iri(rdf_type),
                rdf::TYPE,
                Term::var("class"),
            ))
            .add_filter(FilterClause::equals("class", Node::iri(owl::CLASS)))
            .set_page_size(1);
        Ok(!self.run(&builder).await?.is_empty())
    }

    async fn is_subtype_of(&self, candidate: &str, root: &str) -> StoreResult<bool> {
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("ancestor")
            .add_triple_pattern(TriplePattern::new(
                Term::iri(candidate),
                Predicate::ZeroOrMore(rdfs::SUBCLASS_OF.to_string()),
                Term::var("ancestor"),
            ))
            .add_filter(FilterClause::equals("ancestor", Node::iri(root)))
            .set_page_size(1);
        Ok(!self.run(&builder).await?.is_empty())
    }

    async fn property_domain_range(&self, predicate: &str) -> StoreResult<Option<(Iri, Iri)>> {
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("domain")
            .select_variable("range")
            .add_triple_pattern(TriplePattern::link(
                Term::iri(predicate),
                rdfs::DOMAIN,
                Term::var("domain"),
            ))
            .add_triple_pattern(TriplePattern::link(
                Term::iri(predicate),
                rdfs::RANGE,
                Term::var("range"),
            ))
            .set_page_size(1);
        let rows = self.run(&builder).await?;
        let domain = iri_values(&rows, "domain");
        let range = iri_values(&rows, "range");
        Ok(domain.into_iter().zip(range).next())
    }
}

#[async_trait::async_trait]
impl IdentityService for GraphOntology {
    async fn exists_uri(&self, id: &str) -> StoreResult<bool> {
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("p")
            .add_triple_pattern(TriplePattern::new(
                Term::iri(id),
                Predicate::Var("p".to_string()),
                Term::var("o"),
            ))
            .set_page_size(1);
        Ok(!self.run(&builder).await?.is_empty())
    }

    async fn resource_types(&self, id: &str) -> StoreResult<Vec<Iri>> {
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("rdfType")
            .add_triple_pattern(TriplePattern::link(
                Term::iri(id),
                rdf::TYPE,
                Term::var("rdfType"),
            ));
        Ok(iri_values(&self.run(&builder).await?, "rdfType"))
    }
}

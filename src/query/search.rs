//! Translation of search criteria into graph queries, shared by every
//! entity kind.

use crate::error::CoordError;
use crate::model::vocabulary::{rdf, rdfs, time};
use crate::model::{EntityKind, Node, SearchCriteria};
use crate::query::builder::{Query, QueryBuilder, Term, TriplePattern};
use crate::query::concerned::ConcernedItemFilter;
use crate::query::filter::FilterClause;

pub const URI: &str = "uri";
pub const RDF_TYPE: &str = "rdfType";
pub const LABEL: &str = "label";
pub const TIME: &str = "time";
pub const DATE_TIME_STAMP: &str = "dateTimeStamp";
pub const COUNT: &str = "count";

/// The page query and its count twin, sharing every filter
#[derive(Debug, Clone)]
pub struct SearchQueries {
    pub select: Query,
    pub count: Query,
}

/// Builds the select and count queries for `criteria`.
///
/// Clause order: identifier regex, type hierarchy (rooted at the kind's
/// root type when no type is given), label, concerned items, then the date
/// bounds. Absent criteria add nothing.
pub fn prepare_search(
    kind: &EntityKind,
    criteria: &SearchCriteria,
    concerned: &dyn ConcernedItemFilter,
) -> Result<SearchQueries, CoordError> {
    let mut builder = base_builder(kind, criteria, concerned);

    if let Some(page) = criteria.page {
        builder.set_page(page);
    }
    if let Some(page_size) = criteria.page_size {
        builder.set_page_size(page_size);
    }

    let select = builder.build()?;
    let count = select.as_count_query(URI, COUNT);
    Ok(SearchQueries { select, count })
}

/// Single entity lookup, still scoped to the kind's type hierarchy
pub fn prepare_by_id(
    kind: &EntityKind,
    id: &str,
    concerned: &dyn ConcernedItemFilter,
) -> Result<Query, CoordError> {
    let mut builder = base_builder(kind, &SearchCriteria::default(), concerned);
    builder.set_identifier(URI, Node::iri(id));
    builder.build()
}

fn base_builder(
    kind: &EntityKind,
    criteria: &SearchCriteria,
    concerned: &dyn ConcernedItemFilter,
) -> QueryBuilder {
    let mut builder = QueryBuilder::new_query();
    builder
        .select_variable(URI)
        .select_variable(RDF_TYPE)
        .add_triple_pattern(TriplePattern::link(
            Term::var(URI),
            rdf::TYPE,
            Term::var(RDF_TYPE),
        ));

    if let Some(pattern) = &criteria.uri {
        builder.add_filter(FilterClause::regex(URI, pattern.as_str()));
    }

    let root = criteria.rdf_type.as_deref().unwrap_or(&kind.root_type);
    builder.add_filter(FilterClause::subtype_of(RDF_TYPE, root));

    // label and timestamp constrain the match but are not projected, so
    // that one row stands for one entity and paging counts entities
    if let Some(pattern) = &criteria.label {
        builder
            .add_triple_pattern(TriplePattern::link(
                Term::var(URI),
                rdfs::LABEL,
                Term::var(LABEL),
            ))
            .add_filter(FilterClause::regex(LABEL, pattern.as_str()));
    }

    if let Some(concerns) = &kind.concerns {
        concerned.apply(
            &mut builder,
            URI,
            concerns,
            criteria.concerned_item_uri.as_deref(),
            criteria.concerned_item_label.as_deref(),
        );
    }

    let range = criteria
        .date_range
        .as_ref()
        .filter(|r| kind.timestamped && !r.is_empty());
    if let Some(range) = range {
        for pattern in timestamp_patterns(Term::var(URI)) {
            builder.add_triple_pattern(pattern);
        }
        for clause in FilterClause::date_range(DATE_TIME_STAMP, range.start, range.end) {
            builder.add_filter(clause);
        }
    }

    builder.group_by(URI).group_by(RDF_TYPE);
    builder.order_by(URI);
    builder
}

/// `subject time:hasTime ?time . ?time time:inXSDDateTimeStamp ?dateTimeStamp`
pub fn timestamp_patterns(subject: Term) -> Vec<TriplePattern> {
    vec![
        TriplePattern::link(subject, time::HAS_TIME, Term::var(TIME)),
        TriplePattern::link(
            Term::var(TIME),
            time::IN_XSD_DATE_TIME_STAMP,
            Term::var(DATE_TIME_STAMP),
        ),
    ]
}

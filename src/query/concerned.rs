use crate::model::vocabulary::rdfs;
use crate::query::builder::{QueryBuilder, Term, TriplePattern};
use crate::query::filter::FilterClause;

pub const CONCERNED_ITEM_URI: &str = "concernedItemUri";
pub const CONCERNED_ITEM_LABEL: &str = "concernedItemLabel";

/// Appends the clauses selecting entities by one of their concerned items.
/// Shared by every entity kind that links to concerned items.
pub trait ConcernedItemFilter: Send + Sync {
    fn apply(
        &self,
        builder: &mut QueryBuilder,
        subject_var: &str,
        concerns: &str,
        item_uri: Option<&str>,
        item_label: Option<&str>,
    );
}

/// Regex match on the concerned item identifier and/or label. Nothing is
/// appended when neither is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexConcernedItemFilter;

impl ConcernedItemFilter for RegexConcernedItemFilter {
    fn apply(
        &self,
        builder: &mut QueryBuilder,
        subject_var: &str,
        concerns: &str,
        item_uri: Option<&str>,
        item_label: Option<&str>,
    ) {
        if item_uri.is_none() && item_label.is_none() {
            return;
        }

        builder.add_triple_pattern(TriplePattern::link(
            Term::var(subject_var),
            concerns,
            Term::var(CONCERNED_ITEM_URI),
        ));
        if let Some(pattern) = item_uri {
            builder.add_filter(FilterClause::regex(CONCERNED_ITEM_URI, pattern));
        }
        if let Some(pattern) = item_label {
            builder
                .add_triple_pattern(TriplePattern::link(
                    Term::var(CONCERNED_ITEM_URI),
                    rdfs::LABEL,
                    Term::var(CONCERNED_ITEM_LABEL),
                ))
                .add_filter(FilterClause::regex(CONCERNED_ITEM_LABEL, pattern));
        }
    }
}

use crate::error::CoordError;
use crate::model::{Iri, Node};
use crate::query::filter::{escape, FilterClause};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Subject or object position of a triple pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "term", content = "value", rename_all = "lowercase")]
pub enum Term {
    Var(String),
    Iri(Iri),
    Literal(String),
}

impl Term {
    pub fn var<T: Into<String>>(name: T) -> Self {
        Term::Var(name.into())
    }

    pub fn iri<T: Into<String>>(value: T) -> Self {
        Term::Iri(value.into())
    }

    pub fn literal<T: Into<String>>(value: T) -> Self {
        Term::Literal(value.into())
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Term::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Constant value of the term, if it is not a variable
    pub fn as_node(&self) -> Option<Node> {
        match self {
            Term::Var(_) => None,
            Term::Iri(value) => Some(Node::Iri(value.clone())),
            Term::Literal(value) => Some(Node::Literal(value.clone())),
        }
    }
}

impl From<Node> for Term {
    fn from(node: Node) -> Self {
        match node {
            Node::Iri(value) => Term::Iri(value),
            Node::Literal(value) => Term::Literal(value),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "?{}", name),
            Term::Iri(value) => write!(f, "<{}>", value),
            Term::Literal(value) => write!(f, "\"{}\"", escape(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "path", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    Var(String),
    Iri(Iri),
    /// Zero or more hops along the predicate (`p*`)
    ZeroOrMore(Iri),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Var(name) => write!(f, "?{}", name),
            Predicate::Iri(value) => write!(f, "<{}>", value),
            Predicate::ZeroOrMore(value) => write!(f, "<{}>*", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Predicate,
    pub object: Term,
}

impl TriplePattern {
    pub fn new(subject: Term, predicate: Predicate, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// `subject <predicate> object`
    pub fn link<P: Into<String>>(subject: Term, predicate: P, object: Term) -> Self {
        Self::new(subject, Predicate::Iri(predicate.into()), object)
    }

    pub fn variables(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        if let Some(var) = self.subject.as_var() {
            vars.push(var);
        }
        if let Predicate::Var(var) = &self.predicate {
            vars.push(var.as_str());
        }
        if let Some(var) = self.object.as_var() {
            vars.push(var);
        }
        vars
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "projection", rename_all = "snake_case")]
pub enum Projection {
    Var { var: String },
    CountDistinct { var: String, alias: String },
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Var { var } => write!(f, "?{}", var),
            Projection::CountDistinct { var, alias } => {
                write!(f, "(COUNT(DISTINCT ?{}) AS ?{})", var, alias)
            }
        }
    }
}

/// A built select query, ready to be sent to a graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub distinct: bool,
    pub projection: Vec<Projection>,
    pub patterns: Vec<TriplePattern>,
    /// Each group is left-joined independently
    pub optional: Vec<Vec<TriplePattern>>,
    pub filters: Vec<FilterClause>,
    pub group_by: Vec<String>,
    pub order_by: Vec<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    /// Names bound in the result rows
    pub fn output_names(&self) -> Vec<&str> {
        self.projection
            .iter()
            .map(|p| match p {
                Projection::Var { var } => var.as_str(),
                Projection::CountDistinct { alias, .. } => alias.as_str(),
            })
            .collect()
    }

    pub fn is_count(&self) -> bool {
        self.projection
            .iter()
            .any(|p| matches!(p, Projection::CountDistinct { .. }))
    }

    /// Same filters, projected to `COUNT(DISTINCT ?var)` without paging,
    /// grouping or ordering.
    pub fn as_count_query(&self, var: &str, alias: &str) -> Query {
        Query {
            distinct: false,
            projection: vec![Projection::CountDistinct {
                var: var.to_string(),
                alias: alias.to_string(),
            }],
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            ..self.clone()
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT {}{} WHERE {{ ",
            if self.distinct { "DISTINCT " } else { "" },
            self.projection.iter().join(" ")
        )?;
        for pattern in &self.patterns {
            write!(f, "{} ", pattern)?;
        }
        for group in &self.optional {
            write!(f, "OPTIONAL {{ {} }} ", group.iter().join(" "))?;
        }
        for filter in &self.filters {
            if filter.is_pattern() {
                write!(f, "{} ", filter)?;
            } else {
                write!(f, "FILTER({}) ", filter)?;
            }
        }
        write!(f, "}}")?;
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.iter().map(|v| format!("?{}", v)).join(" "))?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", self.order_by.iter().map(|v| format!("?{}", v)).join(" "))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        Ok(())
    }
}

/// Accumulates patterns and clauses for one select query.
///
/// Used once per request; `build` checks the grouping invariant and hands
/// back an immutable `Query`.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    distinct: bool,
    projection: Vec<Projection>,
    patterns: Vec<TriplePattern>,
    optional: Vec<Vec<TriplePattern>>,
    filters: Vec<FilterClause>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

impl QueryBuilder {
    pub fn new_query() -> Self {
        Self {
            distinct: true,
            ..Self::default()
        }
    }

    pub fn select_variable<T: Into<String>>(&mut self, var: T) -> &mut Self {
        let var = var.into();
        let projected = Projection::Var { var };
        if !self.projection.contains(&projected) {
            self.projection.push(projected);
        }
        self
    }

    pub fn add_triple_pattern(&mut self, pattern: TriplePattern) -> &mut Self {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
        self
    }

    pub fn add_optional_pattern(&mut self, group: Vec<TriplePattern>) -> &mut Self {
        if !group.is_empty() {
            self.optional.push(group);
        }
        self
    }

    pub fn add_filter(&mut self, clause: FilterClause) -> &mut Self {
        self.filters.push(clause);
        self
    }

    /// Binds `?var` to a single constant
    pub fn set_identifier<T: Into<String>>(&mut self, var: T, value: Node) -> &mut Self {
        self.filters.push(FilterClause::equals(var, value));
        self
    }

    pub fn group_by<T: Into<String>>(&mut self, var: T) -> &mut Self {
        let var = var.into();
        if !self.group_by.contains(&var) {
            self.group_by.push(var);
        }
        self
    }

    pub fn order_by<T: Into<String>>(&mut self, var: T) -> &mut Self {
        self.order_by.push(var.into());
        self
    }

    pub fn set_page(&mut self, page: usize) -> &mut Self {
        self.page = Some(page);
        self
    }

    /// Zero clears the limit
    pub fn set_page_size(&mut self, page_size: usize) -> &mut Self {
        self.page_size = if page_size > 0 { Some(page_size) } else { None };
        self
    }

    pub fn build(&self) -> Result<Query, CoordError> {
        if self.projection.is_empty() {
            return Err(CoordError::query("query selects no variable"));
        }

        let bound: BTreeSet<&str> = self
            .patterns
            .iter()
            .chain(self.optional.iter().flatten())
            .flat_map(|p| p.variables())
            .collect();
        for projected in &self.projection {
            if let Projection::Var { var } = projected {
                if !bound.contains(var.as_str()) {
                    return Err(CoordError::query(format!(
                        "selected variable ?{} is not bound by any pattern",
                        var
                    )));
                }
            }
        }

        if !self.group_by.is_empty() {
            let missing = self
                .projection
                .iter()
                .filter_map(|p| match p {
                    Projection::Var { var } if !self.group_by.contains(var) => Some(var),
                    _ => None,
                })
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                return Err(CoordError::query(format!(
                    "selected variables not grouped: {}",
                    missing.iter().map(|v| format!("?{}", v)).join(", ")
                )));
            }
        }

        let (limit, offset) = match self.page_size {
            // an out-of-range page yields an empty result
            Some(size) => (Some(size), Some(self.page.unwrap_or(0).saturating_mul(size))),
            None => (None, None),
        };

        Ok(Query {
            distinct: self.distinct,
            projection: self.projection.clone(),
            patterns: self.patterns.clone(),
            optional: self.optional.clone(),
            filters: self.filters.clone(),
            group_by: self.group_by.clone(),
            order_by: self.order_by.clone(),
            limit,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vocabulary::{rdf, rdfs};

    fn typed_builder() -> QueryBuilder {
        let mut builder = QueryBuilder::new_query();
        builder
            .select_variable("uri")
            .select_variable("rdfType")
            .add_triple_pattern(TriplePattern::link(
                Term::var("uri"),
                rdf::TYPE,
                Term::var("rdfType"),
            ));
        builder
    }

    #[test]
    fn test_group_by_must_cover_selection() {
        let mut builder = typed_builder();
        builder.group_by("uri");
        let err = builder.build().unwrap_err();
        assert!(matches!(err, CoordError::Query(msg) if msg.contains("?rdfType")));

        builder.group_by("rdfType");
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_unbound_selection_is_rejected() {
        let mut builder = typed_builder();
        builder.select_variable("label");
        assert!(builder.build().is_err());

        builder.add_optional_pattern(vec![TriplePattern::link(
            Term::var("uri"),
            rdfs::LABEL,
            Term::var("label"),
        )]);
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_paging_translates_to_limit_offset() {
        let mut builder = typed_builder();
        builder.set_page(3).set_page_size(10);
        let query = builder.build().unwrap();
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(30));

        builder.set_page_size(0);
        let query = builder.build().unwrap();
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, None);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let mut builder = typed_builder();
        builder.set_page(usize::MAX / 2).set_page_size(4);
        let query = builder.build().unwrap();
        assert_eq!(query.limit, Some(4));
        assert_eq!(query.offset, Some(usize::MAX));
    }

    #[test]
    fn test_literal_rendering_escapes_backslash_and_quote() {
        let term = Term::literal(r#"C:\plots "north""#);
        assert_eq!(term.to_string(), r#""C:\\plots \"north\"""#);
    }

    #[test]
    fn test_count_query_drops_paging_and_grouping() {
        let mut builder = typed_builder();
        builder
            .add_filter(FilterClause::regex("uri", "plot"))
            .group_by("uri")
            .group_by("rdfType")
            .order_by("uri")
            .set_page_size(5);
        let count = builder.build().unwrap().as_count_query("uri", "count");

        assert!(count.is_count());
        assert_eq!(count.output_names(), vec!["count"]);
        assert_eq!(count.limit, None);
        assert!(count.group_by.is_empty());
        assert_eq!(count.filters.len(), 1);
        assert!(count.to_string().starts_with("SELECT (COUNT(DISTINCT ?uri) AS ?count)"));
    }
}

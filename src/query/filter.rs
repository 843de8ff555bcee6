use crate::model::vocabulary::rdfs;
use crate::model::{Iri, Node};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a timestamp comparison, read as `?var <op> bound`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    AtLeast,
    AtMost,
}

/// Atomic predicate over one query variable. Clauses in a query are
/// conjunctive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "clause", rename_all = "snake_case")]
pub enum FilterClause {
    /// Case-insensitive regex over the lexical form of `?var`
    Regex { var: String, pattern: String },
    /// `?var` is `root` or one of its subtypes (`rdfs:subClassOf*`)
    SubtypeOf { var: String, root: Iri },
    /// Compares `?var`, read as an RFC 3339 timestamp, against a bound
    DateTime {
        var: String,
        comparison: Comparison,
        bound: DateTime<FixedOffset>,
    },
    Equals { var: String, value: Node },
    NotOneOf { var: String, values: Vec<Node> },
}

impl FilterClause {
    pub fn regex<V: Into<String>, P: Into<String>>(var: V, pattern: P) -> Self {
        FilterClause::Regex {
            var: var.into(),
            pattern: pattern.into(),
        }
    }

    pub fn subtype_of<V: Into<String>, R: Into<String>>(var: V, root: R) -> Self {
        FilterClause::SubtypeOf {
            var: var.into(),
            root: root.into(),
        }
    }

    pub fn equals<V: Into<String>>(var: V, value: Node) -> Self {
        FilterClause::Equals {
            var: var.into(),
            value,
        }
    }

    pub fn not_one_of<V: Into<String>>(var: V, values: Vec<Node>) -> Self {
        FilterClause::NotOneOf {
            var: var.into(),
            values,
        }
    }

    /// Translates an inclusive date range into `start <= ?var` and
    /// `end >= ?var`. Missing bounds produce no clause.
    pub fn date_range(
        var: &str,
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) -> Vec<Self> {
        let mut clauses = Vec::new();
        if let Some(start) = start {
            clauses.push(FilterClause::DateTime {
                var: var.to_string(),
                comparison: Comparison::AtLeast,
                bound: start,
            });
        }
        if let Some(end) = end {
            clauses.push(FilterClause::DateTime {
                var: var.to_string(),
                comparison: Comparison::AtMost,
                bound: end,
            });
        }
        clauses
    }

    /// The variable this clause constrains
    pub fn var(&self) -> &str {
        match self {
            FilterClause::Regex { var, .. }
            | FilterClause::SubtypeOf { var, .. }
            | FilterClause::DateTime { var, .. }
            | FilterClause::Equals { var, .. }
            | FilterClause::NotOneOf { var, .. } => var,
        }
    }

    /// Whether the clause renders as a graph pattern rather than a FILTER
    pub fn is_pattern(&self) -> bool {
        matches!(self, FilterClause::SubtypeOf { .. })
    }
}

/// Quote and backslash escaping for literals in rendered query text
pub(crate) fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterClause::Regex { var, pattern } => {
                write!(f, "regex(str(?{}), \"{}\", \"i\")", var, escape(pattern))
            }
            FilterClause::SubtypeOf { var, root } => {
                write!(f, "?{} <{}>* <{}> .", var, rdfs::SUBCLASS_OF, root)
            }
            FilterClause::DateTime {
                var,
                comparison,
                bound,
            } => {
                let op = match comparison {
                    Comparison::AtLeast => "<=",
                    Comparison::AtMost => ">=",
                };
                write!(
                    f,
                    "xsd:dateTime(\"{}\") {} xsd:dateTime(str(?{}))",
                    bound.to_rfc3339_opts(SecondsFormat::Secs, false),
                    op,
                    var
                )
            }
            FilterClause::Equals { var, value } => write!(f, "?{} = {}", var, value),
            FilterClause::NotOneOf { var, values } => {
                write!(f, "?{} NOT IN ({})", var, values.iter().join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_skips_missing_bounds() {
        let start = DateTime::parse_from_rfc3339("2019-03-01T00:00:00Z").unwrap();
        assert!(FilterClause::date_range("dateTimeStamp", None, None).is_empty());

        let clauses = FilterClause::date_range("dateTimeStamp", Some(start), None);
        assert_eq!(clauses.len(), 1);
        assert!(matches!(
            clauses[0],
            FilterClause::DateTime {
                comparison: Comparison::AtLeast,
                ..
            }
        ));
    }

    #[test]
    fn test_regex_rendering_escapes_quotes() {
        let clause = FilterClause::regex("label", "Plot \"A\"");
        assert_eq!(
            clause.to_string(),
            "regex(str(?label), \"Plot \\\"A\\\"\", \"i\")"
        );
    }
}

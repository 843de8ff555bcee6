use crate::error::{StoreError, StoreResult};
use crate::model::vocabulary::rdfs;
use crate::model::{Node, Triple};
use crate::query::{
    Comparison, FilterClause, Predicate, Projection, Query, Term, TriplePattern,
};
use crate::store::memory::faults::FaultPlan;
use crate::store::traits::{GraphStore, GraphUpdate, Row};
use chrono::DateTime;
use itertools::Itertools;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

type Binding = BTreeMap<String, Node>;

#[derive(Default)]
struct GraphState {
    triples: BTreeSet<Triple>,
    /// Statements as they were when the open transaction began
    snapshot: Option<BTreeSet<Triple>>,
    updates_applied: usize,
}

/// Triple store held in memory, evaluating the pattern queries produced by
/// `QueryBuilder`.
#[derive(Default)]
pub struct MemoryGraphStore {
    state: RwLock<GraphState>,
    pub update_faults: FaultPlan<GraphUpdate>,
    pub query_faults: FaultPlan<Query>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.state.read().triples.contains(triple)
    }

    /// Statements whose subject is `id`
    pub fn describe(&self, id: &str) -> Vec<Triple> {
        self.state
            .read()
            .triples
            .iter()
            .filter(|t| t.subject == id)
            .cloned()
            .collect()
    }

    /// Number of non-empty updates applied so far
    pub fn updates_applied(&self) -> usize {
        self.state.read().updates_applied
    }

    fn evaluate(&self, query: &Query) -> StoreResult<Vec<Row>> {
        let regexes = compile_regexes(&query.filters)?;
        let state = self.state.read();
        let triples = &state.triples;

        let mut solutions = vec![Binding::new()];
        for pattern in &query.patterns {
            solutions = join(triples, solutions, pattern)?;
        }
        for clause in &query.filters {
            if let FilterClause::SubtypeOf { var, root } = clause {
                let pattern = TriplePattern::new(
                    Term::var(var.as_str()),
                    Predicate::ZeroOrMore(rdfs::SUBCLASS_OF.to_string()),
                    Term::iri(root.as_str()),
                );
                solutions = join(triples, solutions, &pattern)?;
            }
        }
        for group in &query.optional {
            let mut extended = Vec::with_capacity(solutions.len());
            for binding in solutions {
                let mut matched = vec![binding.clone()];
                for pattern in group {
                    matched = join(triples, matched, pattern)?;
                }
                if matched.is_empty() {
                    extended.push(binding);
                } else {
                    extended.extend(matched);
                }
            }
            solutions = extended;
        }
        solutions.retain(|binding| {
            query
                .filters
                .iter()
                .filter(|c| !c.is_pattern())
                .all(|c| satisfies(c, binding, &regexes))
        });

        if query.is_count() {
            return Ok(count_rows(query, &solutions));
        }

        let names = query.output_names();
        let mut rows: Vec<Row> = solutions
            .into_iter()
            .map(|binding| {
                binding
                    .into_iter()
                    .filter(|(name, _)| names.contains(&name.as_str()))
                    .collect::<Row>()
            })
            .collect();
        if query.distinct || !query.group_by.is_empty() {
            rows = rows.into_iter().unique().collect();
        }
        if !query.order_by.is_empty() {
            rows.sort_by(|a, b| {
                let key = |row: &Row| {
                    query
                        .order_by
                        .iter()
                        .map(|var| row.get(var).cloned())
                        .collect::<Vec<_>>()
                };
                key(a).cmp(&key(b))
            });
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

fn count_rows(query: &Query, solutions: &[Binding]) -> Vec<Row> {
    let row = query
        .projection
        .iter()
        .filter_map(|p| match p {
            Projection::CountDistinct { var, alias } => {
                let count = solutions
                    .iter()
                    .filter_map(|b| b.get(var))
                    .unique()
                    .count();
                Some((alias.clone(), Node::literal(count.to_string())))
            }
            Projection::Var { .. } => None,
        })
        .collect::<Row>();
    vec![row]
}

fn compile_regexes(filters: &[FilterClause]) -> StoreResult<HashMap<String, Regex>> {
    let mut compiled = HashMap::new();
    for clause in filters {
        if let FilterClause::Regex { pattern, .. } = clause {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| StoreError::malformed(format!("invalid regex '{}': {}", pattern, e)))?;
            compiled.insert(pattern.clone(), regex);
        }
    }
    Ok(compiled)
}

fn satisfies(clause: &FilterClause, binding: &Binding, regexes: &HashMap<String, Regex>) -> bool {
    let Some(value) = binding.get(clause.var()) else {
        return false;
    };
    match clause {
        FilterClause::Regex { pattern, .. } => regexes
            .get(pattern)
            .map_or(false, |regex| regex.is_match(value.as_str())),
        FilterClause::SubtypeOf { .. } => true,
        FilterClause::DateTime {
            comparison, bound, ..
        } => match DateTime::parse_from_rfc3339(value.as_str()) {
            Ok(timestamp) => match comparison {
                Comparison::AtLeast => *bound <= timestamp,
                Comparison::AtMost => *bound >= timestamp,
            },
            Err(_) => false,
        },
        FilterClause::Equals { value: expected, .. } => value == expected,
        FilterClause::NotOneOf { values, .. } => !values.contains(value),
    }
}

/// Resolves a term under a binding: `Ok` is a constant, `Err` an unbound
/// variable name.
fn resolve<'a>(term: &'a Term, binding: &Binding) -> Result<Node, &'a str> {
    match term {
        Term::Var(name) => binding.get(name).cloned().ok_or(name.as_str()),
        other => other.as_node().ok_or(""),
    }
}

fn bind(binding: &mut Binding, term: &Term, value: Node) -> bool {
    match term {
        Term::Var(name) => match binding.get(name) {
            Some(existing) => *existing == value,
            None => {
                binding.insert(name.clone(), value);
                true
            }
        },
        other => other.as_node().as_ref() == Some(&value),
    }
}

fn join(
    triples: &BTreeSet<Triple>,
    solutions: Vec<Binding>,
    pattern: &TriplePattern,
) -> StoreResult<Vec<Binding>> {
    let mut joined = Vec::new();
    for binding in solutions {
        match &pattern.predicate {
            Predicate::ZeroOrMore(predicate) => {
                joined.extend(closure(triples, &binding, pattern, predicate)?);
            }
            Predicate::Iri(_) | Predicate::Var(_) => {
                for triple in triples {
                    let mut candidate = binding.clone();
                    let predicate_ok = match &pattern.predicate {
                        Predicate::Iri(iri) => *iri == triple.predicate,
                        Predicate::Var(name) => bind(
                            &mut candidate,
                            &Term::Var(name.clone()),
                            Node::iri(triple.predicate.as_str()),
                        ),
                        Predicate::ZeroOrMore(_) => false,
                    };
                    if predicate_ok
                        && bind(&mut candidate, &pattern.subject, Node::iri(triple.subject.as_str()))
                        && bind(&mut candidate, &pattern.object, triple.object.clone())
                    {
                        joined.push(candidate);
                    }
                }
            }
        }
    }
    Ok(joined)
}

/// `subject predicate* object`, walked from whichever end is bound
fn closure(
    triples: &BTreeSet<Triple>,
    binding: &Binding,
    pattern: &TriplePattern,
    predicate: &str,
) -> StoreResult<Vec<Binding>> {
    let (start, forward, free) = match (
        resolve(&pattern.subject, binding),
        resolve(&pattern.object, binding),
    ) {
        (Ok(subject), _) => (subject, true, &pattern.object),
        (Err(_), Ok(object)) => (object, false, &pattern.subject),
        (Err(_), Err(_)) => {
            return Err(StoreError::malformed(format!(
                "path pattern {} needs a bound end",
                pattern
            )))
        }
    };

    let mut reached = BTreeSet::from([start.clone()]);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        let next = triples.iter().filter(|t| t.predicate == predicate).filter_map(|t| {
            if forward && t.subject == current.as_str() && t.object.is_iri() {
                Some(t.object.clone())
            } else if !forward && t.object == current {
                Some(Node::iri(t.subject.as_str()))
            } else {
                None
            }
        });
        for node in next.collect::<Vec<_>>() {
            if reached.insert(node.clone()) {
                queue.push_back(node);
            }
        }
    }

    Ok(reached
        .into_iter()
        .filter_map(|node| {
            let mut candidate = binding.clone();
            bind(&mut candidate, free, node).then_some(candidate)
        })
        .collect())
}

#[async_trait::async_trait]
impl GraphStore for MemoryGraphStore {
    async fn query(&self, query: &Query) -> StoreResult<Vec<Row>> {
        self.query_faults.check(query)?;
        self.evaluate(query)
    }

    async fn update(&self, update: &GraphUpdate) -> StoreResult<()> {
        self.update_faults.check(update)?;
        if update.is_empty() {
            return Ok(());
        }
        let mut state = self.state.write();
        for triple in &update.delete {
            state.triples.remove(triple);
        }
        for triple in &update.insert {
            state.triples.insert(triple.clone());
        }
        state.updates_applied += 1;
        Ok(())
    }

    async fn begin(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        if state.snapshot.is_some() {
            return Err(StoreError::rejected("a transaction is already open"));
        }
        state.snapshot = Some(state.triples.clone());
        Ok(())
    }

    async fn commit(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        match state.snapshot.take() {
            Some(_) => Ok(()),
            None => Err(StoreError::rejected("no open transaction to commit")),
        }
    }

    async fn rollback(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        match state.snapshot.take() {
            Some(snapshot) => {
                state.triples = snapshot;
                Ok(())
            }
            None => Err(StoreError::rejected("no open transaction to roll back")),
        }
    }
}

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Filter over documents of the document store, serialized as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocFilter {
    /// Logical AND - all conditions must be true
    All { all: Vec<DocFilter> },
    /// Equality check; an array field matches when any element is equal
    Eq { eq: (FieldPath, Value) },
    /// Greater than or equal check
    Gte { gte: (FieldPath, Value) },
    /// Less than or equal check
    Lte { lte: (FieldPath, Value) },
    /// At least one element of an array field matches the nested filter
    ElemMatch { elem_match: (FieldPath, Box<DocFilter>) },
    /// Check if field exists
    Exists { exists: FieldPath },
}

/// Dotted path into a document, e.g. `shootingConfiguration.date`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(pub String);

impl FieldPath {
    pub fn new<T: Into<String>>(path: T) -> Self {
        FieldPath(path.into())
    }

    /// Extract the value at this path from a document
    pub fn extract<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.0
            .split('.')
            .try_fold(document, |current, segment| current.get(segment))
    }
}

impl DocFilter {
    pub fn all(filters: Vec<DocFilter>) -> Self {
        DocFilter::All { all: filters }
    }

    pub fn eq<P: Into<String>, V: Into<Value>>(path: P, value: V) -> Self {
        DocFilter::Eq {
            eq: (FieldPath::new(path), value.into()),
        }
    }

    pub fn gte<P: Into<String>, V: Into<Value>>(path: P, value: V) -> Self {
        DocFilter::Gte {
            gte: (FieldPath::new(path), value.into()),
        }
    }

    pub fn lte<P: Into<String>, V: Into<Value>>(path: P, value: V) -> Self {
        DocFilter::Lte {
            lte: (FieldPath::new(path), value.into()),
        }
    }

    pub fn elem_match<P: Into<String>>(path: P, filter: DocFilter) -> Self {
        DocFilter::ElemMatch {
            elem_match: (FieldPath::new(path), Box::new(filter)),
        }
    }

    /// Matches every document
    pub fn any_document() -> Self {
        DocFilter::All { all: Vec::new() }
    }

    /// Evaluate the filter against a single document
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            DocFilter::All { all } => all.iter().all(|f| f.matches(document)),

            DocFilter::Eq { eq: (path, value) } => match path.extract(document) {
                Some(Value::Array(items)) if !value.is_array() => items.contains(value),
                Some(found) => found == value,
                None => false,
            },

            DocFilter::Gte { gte: (path, value) } => {
                compare_values(path.extract(document), value)
                    .map_or(false, |ord| ord != Ordering::Less)
            }

            DocFilter::Lte { lte: (path, value) } => {
                compare_values(path.extract(document), value)
                    .map_or(false, |ord| ord != Ordering::Greater)
            }

            DocFilter::ElemMatch {
                elem_match: (path, nested),
            } => match path.extract(document) {
                Some(Value::Array(items)) => items.iter().any(|item| nested.matches(item)),
                _ => false,
            },

            DocFilter::Exists { exists: path } => path.extract(document).is_some(),
        }
    }
}

/// Orders two JSON values: numbers numerically, timestamps chronologically,
/// other strings lexicographically. Mismatched kinds do not compare.
pub fn compare_values(left: Option<&Value>, right: &Value) -> Option<Ordering> {
    match (left?, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => {
            match (
                DateTime::parse_from_rfc3339(l),
                DateTime::parse_from_rfc3339(r),
            ) {
                (Ok(lt), Ok(rt)) => Some(lt.cmp(&rt)),
                _ => Some(l.cmp(r)),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image_document() -> Value {
        json!({
            "uri": "http://example.org/id/image/i1",
            "rdfType": "http://www.opensilex.org/vocabulary/oeso#RGBImage",
            "concernedItems": [
                {"uri": "http://example.org/plot-42", "rdfType": "Plot"},
                {"uri": "http://example.org/plot-43", "rdfType": "Plot"}
            ],
            "shootingConfiguration": {
                "date": "2019-03-05T10:00:00+01:00",
                "sensor": "http://example.org/camera-1"
            }
        })
    }

    #[test]
    fn test_eq_on_nested_path() {
        let filter = DocFilter::eq("shootingConfiguration.sensor", "http://example.org/camera-1");
        assert!(filter.matches(&image_document()));
        let filter = DocFilter::eq("shootingConfiguration.sensor", "http://example.org/camera-2");
        assert!(!filter.matches(&image_document()));
    }

    #[test]
    fn test_elem_match_requires_every_clause() {
        let filter = DocFilter::all(vec![
            DocFilter::elem_match("concernedItems", DocFilter::eq("uri", "http://example.org/plot-42")),
            DocFilter::elem_match("concernedItems", DocFilter::eq("uri", "http://example.org/plot-43")),
        ]);
        assert!(filter.matches(&image_document()));

        let filter = DocFilter::all(vec![
            DocFilter::elem_match("concernedItems", DocFilter::eq("uri", "http://example.org/plot-42")),
            DocFilter::elem_match("concernedItems", DocFilter::eq("uri", "http://example.org/plot-99")),
        ]);
        assert!(!filter.matches(&image_document()));
    }

    #[test]
    fn test_date_bounds_are_inclusive_across_offsets() {
        // 10:00+01:00 is 09:00Z
        let filter = DocFilter::all(vec![
            DocFilter::gte("shootingConfiguration.date", "2019-03-05T09:00:00Z"),
            DocFilter::lte("shootingConfiguration.date", "2019-03-05T09:00:00Z"),
        ]);
        assert!(filter.matches(&image_document()));
    }

    #[test]
    fn test_direct_json_deserialization() {
        let json_str = r#"{
            "all": [
                {"eq": ["rdfType", "http://www.opensilex.org/vocabulary/oeso#RGBImage"]},
                {"gte": ["shootingConfiguration.date", "2019-01-01T00:00:00Z"]}
            ]
        }"#;

        let filter: DocFilter = serde_json::from_str(json_str).unwrap();
        assert!(filter.matches(&image_document()));
    }
}

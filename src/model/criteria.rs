use crate::error::CoordError;
use crate::model::{Id, Iri};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Optional search inputs. An absent field means "no constraint".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Case-insensitive regex over the identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Type to match, subtypes included; defaults to the kind's root type
    #[serde(rename = "rdfType", skip_serializing_if = "Option::is_none")]
    pub rdf_type: Option<Iri>,

    /// Case-insensitive regex over the label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Case-insensitive regex over a concerned item identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concerned_item_uri: Option<String>,

    /// Case-insensitive regex over a concerned item label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concerned_item_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,

    /// Zero-based page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,

    /// Zero or absent means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type<T: Into<String>>(mut self, rdf_type: T) -> Self {
        self.rdf_type = Some(rdf_type.into());
        self
    }

    pub fn with_uri<T: Into<String>>(mut self, uri: T) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_label<T: Into<String>>(mut self, label: T) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_concerned_item<T: Into<String>>(mut self, uri: T) -> Self {
        self.concerned_item_uri = Some(uri.into());
        self
    }

    pub fn with_concerned_item_label<T: Into<String>>(mut self, label: T) -> Self {
        self.concerned_item_label = Some(label.into());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn paginate(mut self, page: usize, page_size: usize) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }
}

/// Inclusive bounds on the entity timestamp. Either bound may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<FixedOffset>>,
}

impl DateRange {
    pub fn between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Parses bounds given as RFC 3339 timestamps or plain `YYYY-MM-DD` dates.
    /// A plain start date covers the day from midnight UTC, a plain end date
    /// up to its last nanosecond.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, CoordError> {
        Ok(Self {
            start: start
                .map(|s| parse_bound(s, NaiveTime::MIN))
                .transpose()?,
            end: end
                .map(|s| parse_bound(s, end_of_day()))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, value: &DateTime<FixedOffset>) -> bool {
        self.start.map_or(true, |start| start <= *value)
            && self.end.map_or(true, |end| end >= *value)
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

fn parse_bound(value: &str, day_time: NaiveTime) -> Result<DateTime<FixedOffset>, CoordError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp);
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| CoordError::query(format!("invalid date '{}': {}", value, e)))?;
    Ok(Utc.from_utc_datetime(&date.and_time(day_time)).fixed_offset())
}

/// Search inputs for image metadata held in the document store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<Id>,
    #[serde(rename = "rdfType", skip_serializing_if = "Option::is_none")]
    pub rdf_type: Option<Iri>,
    /// Every listed item must be concerned by the image
    #[serde(default)]
    pub concerned_items: Vec<Id>,
    /// Only applied when both bounds are present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_only_bounds_cover_whole_days() {
        let range = DateRange::parse(Some("2019-03-01"), Some("2019-03-10")).unwrap();
        let first = DateTime::parse_from_rfc3339("2019-03-01T00:00:00Z").unwrap();
        let last = DateTime::parse_from_rfc3339("2019-03-10T23:59:59Z").unwrap();
        let fraction = DateTime::parse_from_rfc3339("2019-03-10T23:59:59.5Z").unwrap();
        let after = DateTime::parse_from_rfc3339("2019-03-11T00:00:00Z").unwrap();
        assert!(range.contains(&first));
        assert!(range.contains(&last));
        assert!(range.contains(&fraction));
        assert!(!range.contains(&after));
    }

    #[test]
    fn test_invalid_bound_is_a_query_error() {
        let err = DateRange::parse(Some("yesterday"), None).unwrap_err();
        assert!(matches!(err, CoordError::Query(_)));
    }
}

use crate::error::CoordError;
use crate::model::{Id, ImageCriteria, Iri};
use crate::query::{compare_values, DocFilter, FieldPath};
use crate::store::traits::DocumentStore;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

const SHOOTING_DATE: &str = "shootingConfiguration.date";
const SHOOTING_SENSOR: &str = "shootingConfiguration.sensor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootingConfiguration {
    pub date: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConcernedItem {
    pub uri: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdf_type: Option<Iri>,
}

/// Image metadata document as stored in the images collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub uri: Id,
    pub rdf_type: Iri,
    #[serde(default)]
    pub concerned_items: Vec<ImageConcernedItem>,
    pub shooting_configuration: ShootingConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Value>,
}

/// Searches image metadata in the document store
#[derive(Clone)]
pub struct ImageMetadataReader {
    documents: Arc<dyn DocumentStore>,
    collection: String,
}

impl ImageMetadataReader {
    pub fn new<C: Into<String>>(documents: Arc<dyn DocumentStore>, collection: C) -> Self {
        Self {
            documents,
            collection: collection.into(),
        }
    }

    /// Equality on uri, type and sensor; one element match per concerned
    /// item; the date range only when both bounds are given
    pub fn filter(criteria: &ImageCriteria) -> DocFilter {
        let mut clauses = Vec::new();
        if let Some(uri) = &criteria.uri {
            clauses.push(DocFilter::eq("uri", uri.as_str()));
        }
        if let Some(rdf_type) = &criteria.rdf_type {
            clauses.push(DocFilter::eq("rdfType", rdf_type.as_str()));
        }
        for item in &criteria.concerned_items {
            clauses.push(DocFilter::elem_match(
                "concernedItems",
                DocFilter::eq("uri", item.as_str()),
            ));
        }
        if let (Some(start), Some(end)) = (criteria.start_date, criteria.end_date) {
            clauses.push(DocFilter::gte(
                SHOOTING_DATE,
                start.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            ));
            clauses.push(DocFilter::lte(
                SHOOTING_DATE,
                end.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            ));
        }
        if let Some(sensor) = &criteria.sensor {
            clauses.push(DocFilter::eq(SHOOTING_SENSOR, sensor.as_str()));
        }
        DocFilter::all(clauses)
    }

    /// One page sorted by shooting date, plus the number of matches
    pub async fn find(
        &self,
        criteria: &ImageCriteria,
    ) -> Result<(Vec<ImageMetadata>, usize), CoordError> {
        let filter = Self::filter(criteria);
        debug!(
            "Image metadata lookup in {}: {}",
            self.collection,
            serde_json::to_string(&filter).unwrap_or_default()
        );
        let mut documents = self.documents.find(&self.collection, &filter).await?;
        let total = documents.len();

        let date = FieldPath::new(SHOOTING_DATE);
        documents.sort_by(|a, b| match (date.extract(a), date.extract(b)) {
            (Some(left), Some(right)) => {
                compare_values(Some(left), right).unwrap_or(Ordering::Equal)
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        let page: Vec<Value> = match criteria.page_size {
            Some(size) if size > 0 => documents
                .into_iter()
                .skip(criteria.page.unwrap_or(0).saturating_mul(size))
                .take(size)
                .collect(),
            _ => documents,
        };
        let images = page
            .into_iter()
            .map(|doc| {
                serde_json::from_value::<ImageMetadata>(doc)
                    .map_err(|e| CoordError::query(format!("unreadable image metadata: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((images, total))
    }
}

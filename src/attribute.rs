use std::collections::HashMap;

use crate::dataset::{EmbeddingRecord, RESERVED_KEYS};

const MISSING_CATEGORY: &str = "unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    None,
    Numeric,
    Categorical,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeMeta {
    None,
    Numeric { min: f64, max: f64 },
    Categorical { categories: Vec<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    pub key: Option<String>,
    pub color_values: Vec<f32>,
    pub meta: AttributeMeta,
}

impl Classification {
    pub fn kind(&self) -> AttributeKind {
        match self.meta {
            AttributeMeta::None => AttributeKind::None,
            AttributeMeta::Numeric { .. } => AttributeKind::Numeric,
            AttributeMeta::Categorical { .. } => AttributeKind::Categorical,
        }
    }

    pub fn category_index(&self, color_value: f32) -> Option<usize> {
        let AttributeMeta::Categorical { categories } = &self.meta else {
            return None;
        };
        let span = categories.len().saturating_sub(1).max(1) as f32;
        Some((color_value * span).round() as usize)
    }
}

/// The column is numeric only when every record has a finite numeric value;
/// anything partial or mixed is categorical.
pub fn classify(records: &[EmbeddingRecord], key: Option<&str>) -> Classification {
    let Some(key) = key.filter(|_| !records.is_empty()) else {
        return Classification {
            key: key.map(str::to_owned),
            color_values: vec![0.0; records.len()],
            meta: AttributeMeta::None,
        };
    };

    let numeric = records
        .iter()
        .map(|record| record.attribute(key).and_then(|value| value.as_finite_number()))
        .collect::<Option<Vec<_>>>();

    match numeric {
        Some(values) => classify_numeric(key, &values),
        None => classify_categorical(key, records),
    }
}

fn classify_numeric(key: &str, values: &[f64]) -> Classification {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Halved so `max - min` stays finite across the whole f64 range.
    let (low, high) = (min / 2.0, max / 2.0);
    let range = high - low;

    let color_values = if range == 0.0 {
        vec![0.0; values.len()]
    } else {
        values
            .iter()
            .map(|value| ((value / 2.0 - low) / range).clamp(0.0, 1.0) as f32)
            .collect()
    };

    Classification {
        key: Some(key.to_owned()),
        color_values,
        meta: AttributeMeta::Numeric { min, max },
    }
}

fn classify_categorical(key: &str, records: &[EmbeddingRecord]) -> Classification {
    let labels = records
        .iter()
        .map(|record| {
            record
                .attribute(key)
                .map(|value| value.to_string())
                .unwrap_or_else(|| MISSING_CATEGORY.to_owned())
        })
        .collect::<Vec<_>>();

    let mut categories: Vec<String> = Vec::new();
    let mut index_by_label: HashMap<&str, usize> = HashMap::new();
    for label in &labels {
        if !index_by_label.contains_key(label.as_str()) {
            index_by_label.insert(label.as_str(), categories.len());
            categories.push(label.clone());
        }
    }

    let span = categories.len().saturating_sub(1).max(1) as f32;
    let color_values = labels
        .iter()
        .map(|label| {
            index_by_label
                .get(label.as_str())
                .map(|index| *index as f32 / span)
                .unwrap_or(0.0)
        })
        .collect();

    Classification {
        key: Some(key.to_owned()),
        color_values,
        meta: AttributeMeta::Categorical { categories },
    }
}

/// Only the first record is inspected; datasets are expected to share one
/// schema across records.
pub fn available_attribute_keys(records: &[EmbeddingRecord]) -> Vec<String> {
    records
        .first()
        .map(|record| {
            record
                .attributes
                .keys()
                .filter(|key| !RESERVED_KEYS.contains(&key.as_str()))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

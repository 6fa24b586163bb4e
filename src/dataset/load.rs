use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::record::{AttributeValue, EmbeddingRecord, RESERVED_KEYS};
use super::sample::synthetic_sample;

const DATASET_EXTENSION: &str = "json";
pub(crate) const VECTOR_FILE_SUFFIX: &str = "_vector.json";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of records")]
    NotAnArray,

    #[error("dataset contains no records")]
    Empty,

    #[error("first record must have an `embedding` array and a `text` string")]
    MissingFields,

    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("record {index} has an invalid embedding: {reason}")]
    InvalidEmbedding { index: usize, reason: &'static str },

    #[error("record {index} has {found} embedding dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        found: usize,
        expected: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum DatasetOrigin {
    File(PathBuf),
    Synthetic { reason: String },
}

#[derive(Clone, Debug)]
pub struct LoadedDataset {
    pub name: String,
    pub records: Vec<EmbeddingRecord>,
    pub origin: DatasetOrigin,
}

/// Dataset files found in the data directory, keyed by file stem.
#[derive(Clone, Debug)]
pub struct DatasetCatalog {
    data_dir: PathBuf,
    names: Vec<String>,
    sample_seed: Option<u64>,
}

impl DatasetCatalog {
    pub const SAMPLE_RECORDS: usize = 240;
    pub const SAMPLE_DIMENSIONS: usize = 32;

    pub fn discover(data_dir: impl Into<PathBuf>, sample_seed: Option<u64>) -> Self {
        let data_dir = data_dir.into();
        let names = match list_dataset_names(&data_dir) {
            Ok(names) => names,
            Err(error) => {
                warn!("could not scan {}: {error:#}", data_dir.display());
                Vec::new()
            }
        };
        info!(
            "found {} dataset(s) in {}",
            names.len(),
            data_dir.display()
        );

        Self {
            data_dir,
            names,
            sample_seed,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.{DATASET_EXTENSION}"))
    }

    /// Loads `name`, substituting synthetic records when the file is missing
    /// or malformed so the view is never left empty.
    pub fn load_or_sample(&self, name: &str) -> LoadedDataset {
        let outcome = if self.names.iter().any(|known| known == name) {
            let path = self.path_for(name);
            load_dataset(&path).map(|records| (records, path))
        } else {
            Err(anyhow::anyhow!("dataset `{name}` is not in {}", self.data_dir.display()))
        };

        match outcome {
            Ok((records, path)) => {
                info!("loaded {} records from {}", records.len(), path.display());
                LoadedDataset {
                    name: name.to_owned(),
                    records,
                    origin: DatasetOrigin::File(path),
                }
            }
            Err(error) => {
                let reason = format!("{error:#}");
                warn!("falling back to synthetic sample data: {reason}");
                LoadedDataset {
                    name: name.to_owned(),
                    records: synthetic_sample(
                        Self::SAMPLE_RECORDS,
                        Self::SAMPLE_DIMENSIONS,
                        self.sample_seed,
                    ),
                    origin: DatasetOrigin::Synthetic { reason },
                }
            }
        }
    }
}

fn list_dataset_names(data_dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("failed to read data directory {}", data_dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if file_name.ends_with(VECTOR_FILE_SUFFIX) {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(DATASET_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            names.push(stem.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

pub fn load_dataset(path: &Path) -> Result<Vec<EmbeddingRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    parse_dataset(&raw).with_context(|| format!("invalid dataset {}", path.display()))
}

pub fn parse_dataset(raw: &str) -> Result<Vec<EmbeddingRecord>, FormatError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = parsed else {
        return Err(FormatError::NotAnArray);
    };
    let Some(first) = items.first() else {
        return Err(FormatError::Empty);
    };

    let has_fields = first.get("embedding").is_some_and(Value::is_array)
        && first.get("text").is_some_and(Value::is_string);
    if !has_fields {
        return Err(FormatError::MissingFields);
    }

    let mut records = Vec::with_capacity(items.len());
    let mut dimensions = None;
    for (index, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or(FormatError::NotAnObject { index })?;
        let embedding = parse_embedding(index, object)?;

        match dimensions {
            None => dimensions = Some(embedding.len()),
            Some(expected) if expected != embedding.len() => {
                return Err(FormatError::DimensionMismatch {
                    index,
                    found: embedding.len(),
                    expected,
                });
            }
            Some(_) => {}
        }

        let text = object
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let attributes = object
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| {
                AttributeValue::from_json(value).map(|value| (key.clone(), value))
            })
            .collect();

        records.push(EmbeddingRecord {
            id: index,
            embedding,
            text,
            attributes,
        });
    }

    debug!(
        "parsed {} records with {} dimensions",
        records.len(),
        dimensions.unwrap_or_default()
    );
    Ok(records)
}

fn parse_embedding(index: usize, object: &Map<String, Value>) -> Result<Vec<f32>, FormatError> {
    let values = object
        .get("embedding")
        .and_then(Value::as_array)
        .ok_or(FormatError::InvalidEmbedding {
            index,
            reason: "missing embedding array",
        })?;
    if values.is_empty() {
        return Err(FormatError::InvalidEmbedding {
            index,
            reason: "embedding is empty",
        });
    }

    values
        .iter()
        .map(|value| {
            value
                .as_f64()
                .filter(|number| number.is_finite())
                .map(|number| number as f32)
                .ok_or(FormatError::InvalidEmbedding {
                    index,
                    reason: "embedding values must be finite numbers",
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_records_and_attributes() {
        let raw = r#"[
            {"embedding": [1, 0, 0], "text": "hello", "lang": "en", "score": 3, "id": 99},
            {"embedding": [0, 1, 0], "text": "hola", "lang": "es", "score": null}
        ]"#;

        let records = parse_dataset(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 0);
        assert_eq!(records[1].id, 1);
        assert_eq!(records[0].embedding, vec![1.0, 0.0, 0.0]);
        assert_eq!(
            records[0].attribute("lang"),
            Some(&AttributeValue::Text("en".to_owned()))
        );
        assert_eq!(
            records[0].attribute("score"),
            Some(&AttributeValue::Number(3.0))
        );
        assert_eq!(records[0].attribute("id"), None);
        assert_eq!(records[1].attribute("score"), None);
    }

    #[test]
    fn rejects_payloads_without_required_fields() {
        assert!(matches!(
            parse_dataset(r#"{"embedding": []}"#),
            Err(FormatError::NotAnArray)
        ));
        assert!(matches!(parse_dataset("[]"), Err(FormatError::Empty)));
        assert!(matches!(
            parse_dataset(r#"[{"embedding": [1, 2]}]"#),
            Err(FormatError::MissingFields)
        ));
        assert!(matches!(
            parse_dataset(r#"[{"embedding": "x", "text": "a"}]"#),
            Err(FormatError::MissingFields)
        ));
        assert!(matches!(parse_dataset("not json"), Err(FormatError::Json(_))));
    }

    #[test]
    fn rejects_ragged_embeddings() {
        let raw = r#"[
            {"embedding": [1, 2], "text": "a"},
            {"embedding": [1, 2, 3], "text": "b"}
        ]"#;
        assert!(matches!(
            parse_dataset(raw),
            Err(FormatError::DimensionMismatch {
                index: 1,
                found: 3,
                expected: 2
            })
        ));
    }

    #[test]
    fn catalog_skips_vector_files_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("reviews.json"),
            r#"[{"embedding": [1, 2], "text": "a"}, {"embedding": [3, 4], "text": "b"}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "[]").unwrap();
        fs::write(dir.path().join("sentiment_vector.json"), "[1, 0]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = DatasetCatalog::discover(dir.path(), Some(7));
        assert_eq!(catalog.names(), ["broken".to_owned(), "reviews".to_owned()]);

        let loaded = catalog.load_or_sample("reviews");
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(
            loaded.origin,
            DatasetOrigin::File(dir.path().join("reviews.json"))
        );

        let fallback = catalog.load_or_sample("broken");
        assert!(matches!(fallback.origin, DatasetOrigin::Synthetic { .. }));
        assert_eq!(fallback.records.len(), DatasetCatalog::SAMPLE_RECORDS);

        let unknown = catalog.load_or_sample("missing");
        assert!(matches!(unknown.origin, DatasetOrigin::Synthetic { .. }));
    }

    #[test]
    fn missing_directory_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = DatasetCatalog::discover(dir.path().join("absent"), None);
        assert!(catalog.names().is_empty());
    }
}

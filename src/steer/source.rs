use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::dataset::VECTOR_FILE_SUFFIX;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not a JSON array of numbers: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies the raw steering vector for a concept. `Ok(None)` means the
/// concept has no vector.
pub trait VectorSource: Send + Sync {
    fn load(&self, concept: &str) -> Result<Option<Vec<f32>>, SourceError>;
}

pub struct FileVectorSource {
    data_dir: PathBuf,
}

impl FileVectorSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path_for(&self, concept: &str) -> PathBuf {
        self.data_dir.join(format!("{concept}{VECTOR_FILE_SUFFIX}"))
    }
}

impl VectorSource for FileVectorSource {
    fn load(&self, concept: &str) -> Result<Option<Vec<f32>>, SourceError> {
        let path = self.path_for(concept);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SourceError::Io { path, source }),
        };

        let vector = serde_json::from_str::<Vec<f32>>(&raw)
            .map_err(|source| SourceError::Json { path: path.clone(), source })?;
        info!(
            "loaded steering vector `{concept}` ({} dims) from {}",
            vector.len(),
            path.display()
        );
        Ok(Some(vector))
    }
}

/// Session cache of steering vectors, filled on first use of each concept.
///
/// Absent vectors are cached too; failed loads are not and are retried on
/// the next request.
pub struct SteeringCache {
    source: Arc<dyn VectorSource>,
    entries: Mutex<HashMap<String, Option<Arc<[f32]>>>>,
}

impl SteeringCache {
    pub fn new(source: Arc<dyn VectorSource>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, concept: &str) -> Result<Option<Arc<[f32]>>, SourceError> {
        if let Some(entry) = self.entries.lock().get(concept) {
            return Ok(entry.clone());
        }

        debug!("steering vector `{concept}` not cached, loading");
        let loaded = self.source.load(concept)?.map(Arc::<[f32]>::from);
        self.entries
            .lock()
            .insert(concept.to_owned(), loaded.clone());
        Ok(loaded)
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn cached_concepts(&self) -> Vec<String> {
        let mut concepts = self.entries.lock().keys().cloned().collect::<Vec<_>>();
        concepts.sort();
        concepts
    }
}

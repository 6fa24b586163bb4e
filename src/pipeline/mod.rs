mod request;
mod worker;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use crate::attribute::available_attribute_keys;
use crate::dataset::EmbeddingRecord;
use crate::reduce::{ReductionConfig, ReductionError, Reducer};
use crate::steer::{AdjustmentConfig, SteeringCache, ValidationError, project};

pub use request::Debouncer;
pub use worker::PipelineWorker;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineConfig {
    pub reduction: ReductionConfig,
    pub adjustments: AdjustmentConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedPoint {
    pub record: EmbeddingRecord,
    pub x: f32,
    pub y: f32,
}

impl ProjectedPoint {
    pub fn id(&self) -> usize {
        self.record.id
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PipelineWarning {
    DegenerateSteering { concept: String },
    MissingSteering { concept: String },
    SteeringUnavailable { concept: String, reason: String },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateSteering { concept } => {
                write!(f, "`{concept}` steering vector has zero norm; adjustment skipped")
            }
            Self::MissingSteering { concept } => {
                write!(f, "no steering vector for `{concept}`; adjustment skipped")
            }
            Self::SteeringUnavailable { concept, reason } => {
                write!(
                    f,
                    "`{concept}` steering vector could not be loaded ({reason}); adjustment skipped"
                )
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("steering `{concept}` failed: {source}")]
    Steering {
        concept: String,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Reduction(#[from] ReductionError),

    #[error("reduction returned {found} coordinates for {expected} records")]
    CoordinateCount { expected: usize, found: usize },
}

#[derive(Clone, Debug)]
pub struct ProcessOutput {
    pub points: Vec<ProjectedPoint>,
    pub available_attributes: Vec<String>,
    pub warnings: Vec<PipelineWarning>,
}

#[derive(Clone)]
pub struct ProcessingPipeline {
    steering: Arc<SteeringCache>,
    reducer: Arc<dyn Reducer>,
}

impl ProcessingPipeline {
    pub fn new(steering: Arc<SteeringCache>, reducer: Arc<dyn Reducer>) -> Self {
        Self { steering, reducer }
    }

    pub fn steering(&self) -> &SteeringCache {
        &self.steering
    }

    /// `records` is left untouched; the first failing stage aborts the call.
    pub fn process(
        &self,
        records: &[EmbeddingRecord],
        config: &PipelineConfig,
    ) -> Result<ProcessOutput, PipelineError> {
        let started = Instant::now();
        let embeddings = records
            .iter()
            .map(|record| record.embedding.clone())
            .collect::<Vec<_>>();

        let (adjusted, warnings) = self.adjust(embeddings, &config.adjustments)?;
        let coordinates = self.reducer.reduce(&adjusted, &config.reduction)?;
        if coordinates.len() != records.len() {
            return Err(PipelineError::CoordinateCount {
                expected: records.len(),
                found: coordinates.len(),
            });
        }

        let points = records
            .iter()
            .zip(coordinates)
            .enumerate()
            .map(|(index, (record, [x, y]))| {
                let mut record = record.clone();
                record.id = index;
                ProjectedPoint { record, x, y }
            })
            .collect::<Vec<_>>();

        info!(
            "processed {} records with {} (neighbors {}, min distance {}) in {:.1?}",
            points.len(),
            self.reducer.name(),
            config.reduction.neighbors,
            config.reduction.min_distance,
            started.elapsed()
        );

        Ok(ProcessOutput {
            available_attributes: available_attribute_keys(records),
            points,
            warnings,
        })
    }

    fn adjust(
        &self,
        mut embeddings: Vec<Vec<f32>>,
        adjustments: &AdjustmentConfig,
    ) -> Result<(Vec<Vec<f32>>, Vec<PipelineWarning>), PipelineError> {
        let mut warnings = Vec::new();

        for adjustment in adjustments.active() {
            let concept = adjustment.concept.clone();
            let steering = match self.steering.get(&concept) {
                Ok(Some(steering)) => steering,
                Ok(None) => {
                    warnings.push(PipelineWarning::MissingSteering { concept });
                    continue;
                }
                Err(error) => {
                    warnings.push(PipelineWarning::SteeringUnavailable {
                        concept,
                        reason: error.to_string(),
                    });
                    continue;
                }
            };

            let projection = project(&embeddings, &steering, adjustment.strength)
                .map_err(|source| PipelineError::Steering {
                    concept: concept.clone(),
                    source,
                })?;
            if projection.warning.is_some() {
                warnings.push(PipelineWarning::DegenerateSteering { concept });
                continue;
            }
            embeddings = projection.embeddings;
        }

        for warning in &warnings {
            warn!("{warning}");
        }
        Ok((embeddings, warnings))
    }
}

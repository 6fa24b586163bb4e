//! Dimensionality reduction contract and the native layout routine behind it.

mod forces;
mod layout;
mod neighbors;
mod quadtree;

use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReductionConfig {
    pub neighbors: usize,
    pub min_distance: f32,
    /// Fixes the routine's randomness; `None` draws fresh entropy per call.
    pub seed: Option<u64>,
}

impl ReductionConfig {
    pub const MIN_NEIGHBORS: usize = 2;
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            neighbors: 15,
            min_distance: 0.1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReductionError {
    #[error("neighbor count {neighbors} must be smaller than the sample count {samples}")]
    TooFewSamples { neighbors: usize, samples: usize },

    #[error("neighbor count must be at least 2, got {0}")]
    TooFewNeighbors(usize),

    #[error("minimum distance must lie in (0, 1], got {0}")]
    InvalidMinDistance(f32),

    #[error("vector {index} has {found} dimensions, expected {expected}")]
    RaggedInput {
        index: usize,
        found: usize,
        expected: usize,
    },

    #[error("vector {index} contains a non-finite value")]
    NonFinite { index: usize },

    #[error("reduction routine failed: {0}")]
    Routine(String),
}

pub trait Reducer: Send + Sync {
    fn name(&self) -> &'static str;

    fn reduce(
        &self,
        vectors: &[Vec<f32>],
        config: &ReductionConfig,
    ) -> Result<Vec<[f32; 2]>, ReductionError>;
}

/// Rejects parameters the routine cannot honor instead of clamping them.
pub fn validate_input(
    vectors: &[Vec<f32>],
    config: &ReductionConfig,
) -> Result<(), ReductionError> {
    if config.neighbors < ReductionConfig::MIN_NEIGHBORS {
        return Err(ReductionError::TooFewNeighbors(config.neighbors));
    }
    if config.neighbors >= vectors.len() {
        return Err(ReductionError::TooFewSamples {
            neighbors: config.neighbors,
            samples: vectors.len(),
        });
    }
    if !(config.min_distance > 0.0 && config.min_distance <= 1.0) {
        return Err(ReductionError::InvalidMinDistance(config.min_distance));
    }

    let expected = vectors[0].len();
    for (index, vector) in vectors.iter().enumerate() {
        if vector.len() != expected {
            return Err(ReductionError::RaggedInput {
                index,
                found: vector.len(),
                expected,
            });
        }
        if vector.iter().any(|value| !value.is_finite()) {
            return Err(ReductionError::NonFinite { index });
        }
    }
    Ok(())
}

/// Native neighbor-graph layout: fuzzy k-NN graph plus a force-directed
/// embedding of that graph.
pub struct NeighborLayout {
    epochs: usize,
}

impl NeighborLayout {
    pub const DEFAULT_EPOCHS: usize = 300;

    pub fn new(epochs: usize) -> Self {
        Self {
            epochs: epochs.max(1),
        }
    }
}

impl Default for NeighborLayout {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EPOCHS)
    }
}

impl Reducer for NeighborLayout {
    fn name(&self) -> &'static str {
        "neighbor-layout"
    }

    fn reduce(
        &self,
        vectors: &[Vec<f32>],
        config: &ReductionConfig,
    ) -> Result<Vec<[f32; 2]>, ReductionError> {
        validate_input(vectors, config)?;
        let started = Instant::now();

        let edges = neighbors::fuzzy_graph(vectors, config.neighbors);
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let positions = layout::embed(
            vectors.len(),
            &edges,
            config.min_distance,
            self.epochs,
            &mut rng,
        );

        if positions
            .iter()
            .any(|point| !point.x.is_finite() || !point.y.is_finite())
        {
            return Err(ReductionError::Routine(
                "layout diverged to non-finite coordinates".to_owned(),
            ));
        }

        debug!(
            "reduced {} vectors over {} edges in {:.1?}",
            vectors.len(),
            edges.len(),
            started.elapsed()
        );
        Ok(positions.into_iter().map(|point| [point.x, point.y]).collect())
    }
}

mod app;
mod attribute;
mod canvas;
mod dataset;
mod pipeline;
mod reduce;
mod steer;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::app::{AppConfig, EmbeddingLensApp};
use crate::pipeline::{PipelineConfig, ProcessingPipeline};
use crate::reduce::{NeighborLayout, ReductionConfig};
use crate::steer::{AdjustmentConfig, DEFAULT_CONCEPTS, FileVectorSource, SteeringCache};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding `<name>.json` datasets and `<concept>_vector.json` steering vectors.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Dataset to open first; defaults to the first one found.
    #[arg(long)]
    dataset: Option<String>,

    #[arg(long, default_value_t = 15)]
    neighbors: usize,

    #[arg(long, default_value_t = 0.1)]
    min_dist: f32,

    /// Steering concept, in application order. Repeat for several.
    #[arg(long = "concept", value_name = "NAME")]
    concepts: Vec<String>,

    /// Initial strength of a declared concept, e.g. `sentiment=0.5`.
    #[arg(long = "strength", value_name = "CONCEPT=VALUE", value_parser = parse_strength)]
    strengths: Vec<(String, f32)>,

    /// Seed for the layout and for synthetic sample data.
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter such as `info` or `embedding_lens=debug`; overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_strength(raw: &str) -> Result<(String, f32), String> {
    let (concept, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CONCEPT=VALUE, got `{raw}`"))?;
    let strength = value
        .trim()
        .parse::<f32>()
        .map_err(|error| format!("invalid strength `{value}`: {error}"))?;
    Ok((concept.trim().to_owned(), strength))
}

impl Args {
    fn app_config(&self) -> AppConfig {
        let mut adjustments = if self.concepts.is_empty() {
            AdjustmentConfig::with_concepts(DEFAULT_CONCEPTS)
        } else {
            AdjustmentConfig::with_concepts(self.concepts.iter().cloned())
        };
        for (concept, strength) in &self.strengths {
            if !adjustments.set_strength(concept, *strength) {
                warn!("ignoring strength for undeclared concept `{concept}`");
            }
        }

        AppConfig {
            data_dir: self.data_dir.clone(),
            initial_dataset: self.dataset.clone(),
            pipeline: PipelineConfig {
                reduction: ReductionConfig {
                    neighbors: self.neighbors,
                    min_distance: self.min_dist,
                    seed: self.seed,
                },
                adjustments,
            },
            sample_seed: self.seed,
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let config = args.app_config();
    let steering = Arc::new(SteeringCache::new(Arc::new(FileVectorSource::new(
        &config.data_dir,
    ))));
    let pipeline = ProcessingPipeline::new(steering, Arc::new(NeighborLayout::default()));

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "embedding-lens",
        options,
        Box::new(move |cc| Ok(Box::new(EmbeddingLensApp::new(cc, config, pipeline)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let args = Args::parse_from(["embedding-lens"]);
        let config = args.app_config();

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.pipeline.reduction.neighbors, 15);
        assert_eq!(config.pipeline.reduction.min_distance, 0.1);
        assert_eq!(
            config
                .pipeline
                .adjustments
                .iter()
                .map(|adjustment| adjustment.concept.as_str())
                .collect::<Vec<_>>(),
            vec!["language", "sentiment", "bio"]
        );
    }

    #[test]
    fn concepts_keep_command_line_order() {
        let args = Args::parse_from([
            "embedding-lens",
            "--concept",
            "bio",
            "--concept",
            "language",
            "--seed",
            "7",
        ]);
        let config = args.app_config();

        assert_eq!(
            config
                .pipeline
                .adjustments
                .iter()
                .map(|adjustment| adjustment.concept.clone())
                .collect::<Vec<_>>(),
            vec!["bio".to_owned(), "language".to_owned()]
        );
        assert_eq!(config.pipeline.reduction.seed, Some(7));
        assert!(config.pipeline.adjustments.is_identity());
    }

    #[test]
    fn strengths_apply_to_declared_concepts_only() {
        let args = Args::parse_from([
            "embedding-lens",
            "--strength",
            "sentiment=0.5",
            "--strength",
            "bio=7",
            "--strength",
            "weather=1",
        ]);
        let adjustments = args.app_config().pipeline.adjustments;

        assert_eq!(adjustments.strength("sentiment"), Some(0.5));
        assert_eq!(adjustments.strength("bio"), Some(2.0));
        assert_eq!(adjustments.strength("language"), Some(0.0));
        assert_eq!(adjustments.strength("weather"), None);
    }

    #[test]
    fn malformed_strength_is_rejected() {
        assert!(parse_strength("sentiment").is_err());
        assert!(parse_strength("sentiment=strong").is_err());
        assert_eq!(parse_strength(" bio = -1.5"), Ok(("bio".to_owned(), -1.5)));
    }
}

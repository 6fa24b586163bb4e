use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use crate::attribute::{Classification, classify};
use crate::canvas::{InteractiveCanvas, Margins};
use crate::dataset::{DatasetCatalog, DatasetOrigin, EmbeddingRecord, LoadedDataset};
use crate::pipeline::{
    Debouncer, PipelineConfig, PipelineWarning, PipelineWorker, ProcessOutput, ProcessingPipeline,
    ProjectedPoint,
};
use crate::reduce::ReductionConfig;

mod plot;
mod render_utils;
mod ui;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub initial_dataset: Option<String>,
    pub pipeline: PipelineConfig,
    pub sample_seed: Option<u64>,
}

pub struct EmbeddingLensApp {
    catalog: Arc<DatasetCatalog>,
    pipeline: ProcessingPipeline,
    initial_config: PipelineConfig,
    dataset_name: String,
    state: AppState,
    reload_rx: Option<Receiver<LoadedDataset>>,
}

enum AppState {
    Loading { rx: Receiver<LoadedDataset> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    dataset_name: String,
    dataset_origin: DatasetOrigin,
    dataset_names: Vec<String>,
    records: Arc<Vec<EmbeddingRecord>>,
    points: Vec<ProjectedPoint>,
    points_revision: u64,
    available_attributes: Vec<String>,
    color_by: Option<String>,
    classification: Classification,
    config: PipelineConfig,
    worker: PipelineWorker,
    debouncer: Debouncer,
    warnings: Vec<PipelineWarning>,
    last_error: Option<String>,
    canvas: InteractiveCanvas,
    plot_revision: Option<(u64, Vec2)>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

struct SearchMatchCache {
    query: String,
    points_revision: u64,
    matches: Arc<HashSet<usize>>,
}

impl EmbeddingLensApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        pipeline: ProcessingPipeline,
    ) -> Self {
        let catalog = Arc::new(DatasetCatalog::discover(&config.data_dir, config.sample_seed));
        let dataset_name = config
            .initial_dataset
            .clone()
            .or_else(|| catalog.names().first().cloned())
            .unwrap_or_else(|| "sample".to_owned());

        let state = Self::start_load(Arc::clone(&catalog), dataset_name.clone());
        Self {
            catalog,
            pipeline,
            initial_config: config.pipeline,
            dataset_name,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(catalog: Arc<DatasetCatalog>, name: String) -> Receiver<LoadedDataset> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _ = tx.send(catalog.load_or_sample(&name));
        });

        rx
    }

    fn start_load(catalog: Arc<DatasetCatalog>, name: String) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(catalog, name),
        }
    }

    fn draw_loading(ctx: &Context, name: &str) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(120.0);
                ui.heading(format!("Loading dataset `{name}`..."));
                ui.add_space(8.0);
                ui.spinner();
            });
        });
    }
}

impl eframe::App for EmbeddingLensApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(dataset) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            dataset,
                            self.catalog.names().to_vec(),
                            self.pipeline.clone(),
                            self.initial_config.clone(),
                        ))));
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                Self::draw_loading(ctx, &self.dataset_name);
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load dataset");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(
                            Arc::clone(&self.catalog),
                            self.dataset_name.clone(),
                        ));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut dataset_request = None;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut dataset_request, is_reloading);

                if let Some(name) = dataset_request
                    && self.reload_rx.is_none()
                {
                    info!("switching to dataset `{name}`");
                    self.dataset_name = name.clone();
                    self.reload_rx = Some(Self::spawn_load(Arc::clone(&self.catalog), name));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(dataset) => model.replace_dataset(dataset),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            warn!("dataset load worker disconnected");
                            model.last_error =
                                Some("Background load worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(
        dataset: LoadedDataset,
        dataset_names: Vec<String>,
        pipeline: ProcessingPipeline,
        config: PipelineConfig,
    ) -> Self {
        let mut model = Self {
            dataset_name: dataset.name,
            dataset_origin: dataset.origin,
            dataset_names,
            records: Arc::new(dataset.records),
            points: Vec::new(),
            points_revision: 0,
            available_attributes: Vec::new(),
            color_by: None,
            classification: classify(&[], None),
            config,
            worker: PipelineWorker::new(pipeline),
            debouncer: Debouncer::default(),
            warnings: Vec::new(),
            last_error: None,
            canvas: InteractiveCanvas::new(Margins::default()),
            plot_revision: None,
            search: String::new(),
            search_match_cache: None,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        };
        model.fit_neighbors_to_dataset();
        model.submit();
        model
    }

    fn neighbor_limit(&self) -> usize {
        self.records
            .len()
            .saturating_sub(1)
            .max(ReductionConfig::MIN_NEIGHBORS)
    }

    fn fit_neighbors_to_dataset(&mut self) {
        let limit = self.neighbor_limit();
        if self.config.reduction.neighbors > limit {
            info!(
                "lowering neighbors from {} to {limit} for {} records",
                self.config.reduction.neighbors,
                self.records.len()
            );
            self.config.reduction.neighbors = limit;
        }
    }

    /// Swaps in a freshly loaded dataset. Selection and lasso state refer to
    /// the old records, so they go; the view transform stays.
    fn replace_dataset(&mut self, dataset: LoadedDataset) {
        self.worker.discard_pending();
        self.canvas.reset_for_reload();
        self.dataset_name = dataset.name;
        self.dataset_origin = dataset.origin;
        self.records = Arc::new(dataset.records);
        self.fit_neighbors_to_dataset();
        self.points.clear();
        self.points_revision += 1;
        self.available_attributes.clear();
        self.color_by = None;
        self.recolor();
        self.warnings.clear();
        self.last_error = None;
        self.submit();
    }

    fn reload_vectors(&mut self) {
        self.worker.pipeline().steering().clear();
        self.canvas.reset_for_reload();
        info!("steering vector cache cleared");
        self.submit();
    }

    fn submit(&mut self) {
        self.debouncer.cancel();
        self.worker
            .submit(Arc::clone(&self.records), self.config.clone());
    }

    fn apply_output(&mut self, output: ProcessOutput) {
        self.points = output.points;
        self.points_revision += 1;
        self.available_attributes = output.available_attributes;
        if let Some(key) = &self.color_by
            && !self.available_attributes.contains(key)
        {
            self.color_by = None;
        }
        self.recolor();
        self.warnings = output.warnings;
        self.last_error = None;
    }

    /// `records[i]` and `points[i]` describe the same item, so the color
    /// values line up with the plotted points.
    fn recolor(&mut self) {
        self.classification = classify(&self.records, self.color_by.as_deref());
    }

    fn pump_pipeline(&mut self, ctx: &Context) {
        let now = std::time::Instant::now();
        if self.debouncer.ready(now) {
            self.submit();
        } else if let Some(remaining) = self.debouncer.remaining(now) {
            ctx.request_repaint_after(remaining);
        }

        self.commit_finished();

        if self.worker.awaiting_latest() {
            ctx.request_repaint();
        }
    }

    fn commit_finished(&mut self) {
        if let Some((_token, result)) = self.worker.poll() {
            match result {
                Ok(output) => self.apply_output(output),
                Err(error) => {
                    warn!("processing failed: {error}");
                    self.last_error = Some(error.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{InteractionMode, PlotLayout};
    use crate::reduce::{ReductionError, Reducer};
    use crate::steer::{MemorySource, SteeringCache};
    use eframe::egui::{pos2, vec2};
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    struct DelayReducer;

    impl Reducer for DelayReducer {
        fn name(&self) -> &'static str {
            "delay"
        }

        fn reduce(
            &self,
            vectors: &[Vec<f32>],
            config: &ReductionConfig,
        ) -> Result<Vec<[f32; 2]>, ReductionError> {
            crate::reduce::validate_input(vectors, config)?;
            thread::sleep(Duration::from_millis(vectors[0][0] as u64));
            Ok(vectors
                .iter()
                .enumerate()
                .map(|(index, vector)| [index as f32, vector[1]])
                .collect())
        }
    }

    fn dataset(name: &str, count: usize, delay_ms: f32) -> LoadedDataset {
        LoadedDataset {
            name: name.to_owned(),
            records: (0..count)
                .map(|index| {
                    EmbeddingRecord::new(
                        index,
                        vec![delay_ms, index as f32],
                        format!("{name} {index}"),
                    )
                })
                .collect(),
            origin: DatasetOrigin::Synthetic {
                reason: "test".to_owned(),
            },
        }
    }

    fn model(initial: LoadedDataset) -> ViewModel {
        let cache = Arc::new(SteeringCache::new(Arc::new(MemorySource::with(&[(
            "bio",
            vec![0.0, 1.0],
        )]))));
        let pipeline = ProcessingPipeline::new(cache, Arc::new(DelayReducer));
        ViewModel::new(initial, Vec::new(), pipeline, PipelineConfig::default())
    }

    fn settle(model: &mut ViewModel) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while model.worker.awaiting_latest() && Instant::now() < deadline {
            model.commit_finished();
            thread::sleep(Duration::from_millis(5));
        }
        model.commit_finished();
    }

    fn lasso_everything(model: &mut ViewModel) {
        let positions = (0..model.records.len())
            .map(|index| pos2(10.0 + index as f32, 10.0))
            .collect();
        model
            .canvas
            .set_layout(PlotLayout::from_local(positions, vec2(200.0, 200.0)));
        model.canvas.set_mode(InteractionMode::Lasso);
        let offset = model.canvas.margins().offset();
        model.canvas.pointer_down(pos2(0.0, 0.0) + offset);
        for corner in [pos2(100.0, 0.0), pos2(100.0, 100.0), pos2(0.0, 100.0)] {
            model.canvas.pointer_move(corner + offset);
        }
        assert!(model.canvas.pointer_up());
        assert_eq!(model.canvas.selection().len(), model.records.len());
    }

    #[test]
    fn dataset_swap_resets_selection_and_drops_pending_result() {
        let mut model = model(dataset("slow", 4, 200.0));
        lasso_everything(&mut model);
        model.canvas.pointer_down(pos2(50.0, 50.0));

        model.replace_dataset(dataset("fast", 6, 0.0));
        assert!(model.canvas.selection().is_empty());
        assert!(model.canvas.lasso_path().is_empty());

        settle(&mut model);
        thread::sleep(Duration::from_millis(300));
        model.commit_finished();

        assert_eq!(model.dataset_name, "fast");
        assert_eq!(model.points.len(), 6);
        assert!(
            model
                .points
                .iter()
                .all(|point| point.record.text.starts_with("fast"))
        );
        assert_eq!(model.last_error, None);
    }

    #[test]
    fn vector_reload_resets_selection_and_cache() {
        let mut model = model(dataset("base", 5, 0.0));
        model.config.adjustments = crate::steer::AdjustmentConfig::with_concepts(["bio"]);
        model.config.adjustments.set_strength("bio", 1.0);
        model.submit();
        settle(&mut model);
        assert_eq!(
            model.worker.pipeline().steering().cached_concepts(),
            vec!["bio".to_owned()]
        );

        lasso_everything(&mut model);
        model.reload_vectors();

        assert!(model.canvas.selection().is_empty());
        assert!(model.worker.awaiting_latest());
        settle(&mut model);
        assert_eq!(model.points.len(), 5);
        assert!(model.points.iter().all(|point| point.y == 0.0));
    }

    #[test]
    fn neighbors_are_lowered_to_fit_small_datasets() {
        let mut model = model(dataset("tiny", 5, 0.0));
        assert_eq!(model.config.reduction.neighbors, 4);
        settle(&mut model);
        assert_eq!(model.points.len(), 5);
        assert_eq!(model.last_error, None);

        model.config.reduction.neighbors = 4;
        model.replace_dataset(dataset("smaller", 3, 0.0));
        assert_eq!(model.config.reduction.neighbors, 2);
    }
}

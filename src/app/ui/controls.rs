use std::time::Instant;

use eframe::egui::{self, Align, Layout, Sense, Ui, vec2};

use crate::attribute::AttributeMeta;
use crate::canvas::InteractionMode;
use crate::reduce::ReductionConfig;
use crate::steer::AdjustmentConfig;

use super::super::ViewModel;
use super::super::render_utils::{category_color, gradient_color};

const MAX_NEIGHBORS: usize = 100;
const MIN_DISTANCE_RANGE: std::ops::RangeInclusive<f32> = 0.01..=1.0;
const STRENGTH_STEP: f64 = 0.1;

impl ViewModel {
    pub(in crate::app) fn draw_controls(
        &mut self,
        ui: &mut Ui,
        dataset_request: &mut Option<String>,
        is_loading: bool,
    ) {
        ui.heading("Projection Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_dataset_picker(ui, dataset_request, is_loading);
        ui.separator();

        let mut changed = false;

        let neighbor_range =
            ReductionConfig::MIN_NEIGHBORS..=self.neighbor_limit().min(MAX_NEIGHBORS);
        let neighbors_slider = ui
            .add(
                egui::Slider::new(&mut self.config.reduction.neighbors, neighbor_range)
                    .text("Neighbors"),
            )
            .on_hover_text(
                "Neighborhood size of the layout graph. Must stay below the point count.",
            );
        changed |= neighbors_slider.changed();

        let min_distance_slider = ui
            .add(
                egui::Slider::new(&mut self.config.reduction.min_distance, MIN_DISTANCE_RANGE)
                    .text("Min distance"),
            )
            .on_hover_text("How tightly the layout may pack neighboring points.");
        changed |= min_distance_slider.changed();

        ui.add_space(6.0);
        ui.label("Steering").on_hover_text(
            "Positive strength removes a concept's direction from every embedding; \
             negative amplifies it.",
        );
        for adjustment in self.config.adjustments.iter_mut() {
            let slider = ui.add(
                egui::Slider::new(
                    &mut adjustment.strength,
                    AdjustmentConfig::MIN_STRENGTH..=AdjustmentConfig::MAX_STRENGTH,
                )
                .step_by(STRENGTH_STEP)
                .text(adjustment.concept.as_str()),
            );
            changed |= slider.changed();
        }

        ui.horizontal(|ui| {
            if ui
                .button("Reset steering")
                .on_hover_text("Set every concept strength back to zero.")
                .clicked()
            {
                for adjustment in self.config.adjustments.iter_mut() {
                    adjustment.strength = 0.0;
                }
                changed = true;
            }
            let cached = self.worker.pipeline().steering().cached_concepts();
            let reload_hint = if cached.is_empty() {
                "Forget cached steering vectors and read them from disk again.".to_owned()
            } else {
                format!(
                    "Forget cached steering vectors ({}) and read them from disk again.",
                    cached.join(", ")
                )
            };
            if ui
                .button("Reload vectors")
                .on_hover_text(reload_hint)
                .clicked()
            {
                self.reload_vectors();
            }
        });

        if changed {
            self.debouncer.touch(Instant::now());
        }

        ui.separator();
        self.draw_color_controls(ui);

        ui.separator();
        ui.label("Pointer mode");
        ui.horizontal(|ui| {
            let mut mode = self.canvas.mode();
            ui.selectable_value(&mut mode, InteractionMode::Pan, "Pan / zoom")
                .on_hover_text("Drag to pan, scroll to zoom.");
            ui.selectable_value(&mut mode, InteractionMode::Lasso, "Lasso")
                .on_hover_text("Drag a closed path to select the points inside it.");
            self.canvas.set_mode(mode);
        });
        ui.horizontal(|ui| {
            let has_selection = !self.canvas.selection().is_empty();
            if ui
                .add_enabled(has_selection, egui::Button::new("Clear selection"))
                .clicked()
            {
                self.canvas.clear_selection();
            }
            if ui.button("Reset view").clicked() {
                self.canvas.reset_view();
            }
        });

        ui.separator();
        ui.label("Search text")
            .on_hover_text("Fuzzy-highlight points whose text matches, without selecting them.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");
    }

    fn draw_dataset_picker(
        &self,
        ui: &mut Ui,
        dataset_request: &mut Option<String>,
        is_loading: bool,
    ) {
        if self.dataset_names.is_empty() {
            ui.label("No dataset files found; showing synthetic sample data.");
            return;
        }

        ui.add_enabled_ui(!is_loading, |ui| {
            egui::ComboBox::from_label("Dataset")
                .selected_text(self.dataset_name.as_str())
                .show_ui(ui, |ui| {
                    for name in &self.dataset_names {
                        let is_current = *name == self.dataset_name;
                        if ui.selectable_label(is_current, name.as_str()).clicked() && !is_current {
                            *dataset_request = Some(name.clone());
                        }
                    }
                });
        });
    }

    fn draw_color_controls(&mut self, ui: &mut Ui) {
        let mut color_by = self.color_by.clone();
        egui::ComboBox::from_label("Color by")
            .selected_text(color_by.as_deref().unwrap_or("none"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut color_by, None, "none");
                for key in &self.available_attributes {
                    ui.selectable_value(&mut color_by, Some(key.clone()), key.as_str());
                }
            });
        if color_by != self.color_by {
            self.color_by = color_by;
            self.recolor();
        }

        ui.add_space(4.0);
        match &self.classification.meta {
            AttributeMeta::None => {}
            AttributeMeta::Numeric { min, max } => {
                ui.horizontal(|ui| {
                    ui.label(format!("{min:.3}"));
                    let (rect, _) = ui.allocate_exact_size(vec2(120.0, 12.0), Sense::hover());
                    let painter = ui.painter_at(rect);
                    const STEPS: usize = 24;
                    let step_width = rect.width() / STEPS as f32;
                    for step in 0..STEPS {
                        let left = rect.left() + step as f32 * step_width;
                        let swatch = egui::Rect::from_min_size(
                            egui::pos2(left, rect.top()),
                            vec2(step_width + 0.5, rect.height()),
                        );
                        let t = step as f32 / (STEPS - 1) as f32;
                        painter.rect_filled(swatch, 0.0, gradient_color(t));
                    }
                    ui.label(format!("{max:.3}"));
                });
            }
            AttributeMeta::Categorical { categories } => {
                egui::ScrollArea::vertical()
                    .id_salt("legend_scroll")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        for (index, category) in categories.iter().enumerate() {
                            ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                                let (rect, _) =
                                    ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                                ui.painter().rect_filled(rect, 2.0, category_color(index));
                                ui.label(category.as_str());
                            });
                        }
                    });
            }
        }
    }
}

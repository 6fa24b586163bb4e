use eframe::egui::{self, Align, Color32, Context, Layout, RichText};

use crate::dataset::DatasetOrigin;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        dataset_request: &mut Option<String>,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);
        self.pump_pipeline(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("embedding-lens");
                    ui.separator();
                    ui.label(format!("dataset: {}", self.dataset_name));
                    if let DatasetOrigin::Synthetic { reason } = &self.dataset_origin {
                        ui.label(
                            RichText::new("synthetic sample")
                                .color(Color32::from_rgb(241, 146, 94)),
                        )
                        .on_hover_text(reason.as_str());
                    }
                    ui.label(format!("points: {}", self.points.len()));
                    ui.label(format!("selected: {}", self.canvas.selection().len()));
                    ui.label(format!("zoom: {:.2}x", self.canvas.transform().scale));

                    if self.worker.is_busy() || self.debouncer.is_pending() || is_loading {
                        ui.spinner();
                    }
                    if let Some(error) = &self.last_error {
                        ui.label(
                            RichText::new(format!("error: {error}"))
                                .color(Color32::from_rgb(235, 95, 95)),
                        );
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });

                for warning in &self.warnings {
                    ui.label(
                        RichText::new(warning.to_string()).color(Color32::from_rgb(246, 206, 104)),
                    );
                }
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.draw_controls(ui, dataset_request, is_loading));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.points.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    if self.last_error.is_some() {
                        ui.heading("Processing failed; adjust the parameters to retry.");
                    } else {
                        ui.heading("Projecting embeddings...");
                        ui.add_space(8.0);
                        ui.spinner();
                    }
                });
            } else {
                self.draw_plot(ui);
            }
        });
    }
}

use eframe::egui::{self, Align, Layout, RichText, Ui};

use crate::util::{one_line, truncate_text};

use super::super::ViewModel;

const SELECTED_TEXT_CHARS: usize = 50;
const ROW_HEIGHT: f32 = 22.0;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selected Points");
        ui.add_space(6.0);

        let selected = self.canvas.selection().iter().copied().collect::<Vec<_>>();
        if selected.is_empty() {
            ui.label("Switch to lasso mode and draw around points to select them.");
            return;
        }

        ui.label(format!("{} selected", selected.len()));
        ui.add_space(4.0);

        egui::ScrollArea::vertical()
            .id_salt("selected_points_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, ROW_HEIGHT, selected.len(), |ui, row_range| {
                for id in &selected[row_range] {
                    let Some(point) = self.points.get(*id) else {
                        continue;
                    };

                    let color_label = self
                        .color_by
                        .as_deref()
                        .and_then(|key| point.record.attribute(key))
                        .map(|value| value.to_string());

                    ui.horizontal(|ui| {
                        ui.label(RichText::new(format!("#{}", point.id())).monospace())
                            .on_hover_text(point.record.text.as_str());
                        ui.label(truncate_text(&one_line(&point.record.text), SELECTED_TEXT_CHARS));
                        if let Some(color_label) = color_label {
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                ui.label(RichText::new(color_label).weak());
                            });
                        }
                    });
                }
            });
    }
}

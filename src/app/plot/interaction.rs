use eframe::egui::{self, Pos2, Rect, Ui};
use tracing::debug;

use crate::canvas::InteractionMode;

use super::super::ViewModel;

fn to_canvas(rect: Rect, screen: Pos2) -> Pos2 {
    (screen - rect.min).to_pos2()
}

impl ViewModel {
    pub(in crate::app) fn handle_plot_input(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        match self.canvas.mode() {
            InteractionMode::Pan => self.handle_pan_zoom(ui, rect, response),
            InteractionMode::Lasso => self.handle_lasso(ui, rect, response),
        }

        match response.hover_pos() {
            Some(pointer) => {
                self.canvas.hover_at(to_canvas(rect, pointer));
            }
            None => self.canvas.hover_out(),
        }
    }

    fn handle_pan_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.canvas.pan(response.drag_delta());
        }

        if !response.hovered() {
            return;
        }
        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.canvas.zoom(to_canvas(rect, pointer), zoom_factor);
    }

    fn handle_lasso(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(origin) = ui.input(|input| input.pointer.press_origin())
        {
            self.canvas.pointer_down(to_canvas(rect, origin));
        }

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.canvas.pointer_move(to_canvas(rect, pointer));
            ui.ctx().request_repaint();
        }

        if response.drag_stopped() && self.canvas.pointer_up() {
            debug!("lasso selected {} points", self.canvas.selection().len());
        }
    }
}

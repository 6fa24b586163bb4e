//! Plot-space interaction model: view transform, lasso gesture, hover and
//! selection. Nothing here draws; the app layer renders from this state.
//!
//! Three coordinate spaces are involved. *Local* positions are axis-scaled
//! plot positions, before pan/zoom. *View* positions have the transform
//! applied. *Canvas* positions are relative to the widget's top-left corner,
//! i.e. view positions shifted by the margins.

mod lasso;
mod scale;
mod transform;

use std::collections::BTreeSet;

use eframe::egui::{Pos2, Vec2};

pub use lasso::{Lasso, point_in_polygon};
pub use scale::{Margins, PlotLayout};
pub use transform::ViewTransform;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Pan,
    Lasso,
}

#[derive(Debug, Default)]
pub struct InteractiveCanvas {
    mode: InteractionMode,
    transform: ViewTransform,
    margins: Margins,
    layout: PlotLayout,
    lasso: Lasso,
    selection: BTreeSet<usize>,
    hovered: Option<usize>,
}

impl InteractiveCanvas {
    pub const POINT_RADIUS: f32 = 5.0;

    pub fn new(margins: Margins) -> Self {
        Self {
            margins,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        if self.mode != mode {
            self.lasso.cancel();
            self.mode = mode;
        }
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn layout(&self) -> &PlotLayout {
        &self.layout
    }

    /// Replaces the plotted positions. Point ids are their indices.
    ///
    /// Selection survives so reprocessing the same dataset keeps it; hover
    /// and any open lasso path do not.
    pub fn set_layout(&mut self, layout: PlotLayout) {
        self.selection.retain(|id| *id < layout.positions.len());
        self.layout = layout;
        self.hovered = None;
        self.lasso.cancel();
    }

    pub fn point_count(&self) -> usize {
        self.layout.positions.len()
    }

    pub fn to_local(&self, canvas: Pos2) -> Pos2 {
        self.transform.invert(canvas - self.margins.offset())
    }

    pub fn screen_position(&self, id: usize) -> Option<Pos2> {
        self.layout
            .positions
            .get(id)
            .map(|local| self.transform.apply(*local) + self.margins.offset())
    }

    pub fn pointer_down(&mut self, canvas: Pos2) {
        if self.mode == InteractionMode::Lasso {
            self.lasso.begin(self.to_local(canvas));
        }
    }

    pub fn pointer_move(&mut self, canvas: Pos2) {
        if self.lasso.is_drawing() {
            let local = self.to_local(canvas);
            self.lasso.extend(local);
        }
    }

    /// Ends a lasso gesture. Returns `true` when the selection was replaced.
    pub fn pointer_up(&mut self) -> bool {
        let Some(path) = self.lasso.finish() else {
            return false;
        };

        self.selection = self
            .layout
            .positions
            .iter()
            .enumerate()
            .filter(|(_, position)| point_in_polygon(**position, &path))
            .map(|(id, _)| id)
            .collect();
        true
    }

    pub fn lasso_path(&self) -> Vec<Pos2> {
        self.lasso
            .path()
            .iter()
            .map(|local| self.transform.apply(*local) + self.margins.offset())
            .collect()
    }

    pub fn pan(&mut self, delta: Vec2) {
        if self.mode == InteractionMode::Pan {
            self.transform.pan_by(delta);
        }
    }

    pub fn zoom(&mut self, anchor: Pos2, factor: f32) {
        if self.mode == InteractionMode::Pan {
            self.transform
                .zoom_about(anchor - self.margins.offset(), factor);
        }
    }

    pub fn reset_view(&mut self) {
        self.transform.reset();
    }

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    pub fn is_selected(&self, id: usize) -> bool {
        self.selection.contains(&id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Nearest point whose drawn disc contains `canvas`.
    pub fn hover_at(&mut self, canvas: Pos2) -> Option<usize> {
        let radius = Self::POINT_RADIUS + 1.0;
        self.hovered = (0..self.point_count())
            .filter_map(|id| {
                let distance = self.screen_position(id)?.distance(canvas);
                (distance <= radius).then_some((id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);
        self.hovered
    }

    pub fn hover_out(&mut self) {
        self.hovered = None;
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn reset_for_reload(&mut self) {
        self.selection.clear();
        self.hovered = None;
        self.lasso.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};
    use pretty_assertions::assert_eq;

    fn canvas_with_points() -> InteractiveCanvas {
        let mut canvas = InteractiveCanvas::new(Margins::default());
        canvas.set_layout(PlotLayout::from_local(
            vec![pos2(10.0, 10.0), pos2(50.0, 50.0), pos2(90.0, 90.0)],
            vec2(100.0, 100.0),
        ));
        canvas
    }

    fn draw_box(canvas: &mut InteractiveCanvas, min: Pos2, max: Pos2) -> bool {
        canvas.pointer_down(min);
        canvas.pointer_move(pos2(max.x, min.y));
        canvas.pointer_move(max);
        canvas.pointer_move(pos2(min.x, max.y));
        canvas.pointer_up()
    }

    fn ids(canvas: &InteractiveCanvas) -> Vec<usize> {
        canvas.selection().iter().copied().collect()
    }

    #[test]
    fn lasso_selects_points_inside_path() {
        let mut canvas = canvas_with_points();
        canvas.set_mode(InteractionMode::Lasso);

        assert!(draw_box(&mut canvas, pos2(40.0, 20.0), pos2(100.0, 80.0)));
        assert_eq!(ids(&canvas), vec![0, 1]);
        assert!(canvas.is_selected(1));
        assert!(!canvas.is_selected(2));
        assert!(canvas.lasso_path().is_empty());
    }

    #[test]
    fn new_lasso_replaces_selection() {
        let mut canvas = canvas_with_points();
        canvas.set_mode(InteractionMode::Lasso);

        draw_box(&mut canvas, pos2(40.0, 20.0), pos2(100.0, 80.0));
        draw_box(&mut canvas, pos2(120.0, 100.0), pos2(140.0, 120.0));
        assert_eq!(ids(&canvas), vec![2]);

        draw_box(&mut canvas, pos2(0.0, 0.0), pos2(5.0, 5.0));
        assert!(canvas.selection().is_empty());
    }

    #[test]
    fn lasso_accounts_for_pan_and_zoom() {
        let mut canvas = canvas_with_points();
        canvas.zoom(pos2(40.0, 20.0), 2.0);
        canvas.pan(vec2(-30.0, -30.0));
        canvas.set_mode(InteractionMode::Lasso);

        let Some(target) = canvas.screen_position(1) else {
            panic!("point 1 is plotted");
        };
        draw_box(
            &mut canvas,
            target - vec2(4.0, 4.0),
            target + vec2(4.0, 4.0),
        );
        assert_eq!(ids(&canvas), vec![1]);
    }

    #[test]
    fn pan_mode_ignores_lasso_gestures() {
        let mut canvas = canvas_with_points();
        assert_eq!(canvas.mode(), InteractionMode::Pan);

        assert!(!draw_box(&mut canvas, pos2(0.0, 0.0), pos2(200.0, 200.0)));
        assert!(canvas.selection().is_empty());
    }

    #[test]
    fn lasso_mode_disables_pan_and_zoom() {
        let mut canvas = canvas_with_points();
        canvas.set_mode(InteractionMode::Lasso);
        canvas.pan(vec2(10.0, 0.0));
        canvas.zoom(pos2(50.0, 50.0), 3.0);
        assert_eq!(canvas.transform(), ViewTransform::default());
    }

    #[test]
    fn short_path_keeps_previous_selection() {
        let mut canvas = canvas_with_points();
        canvas.set_mode(InteractionMode::Lasso);
        draw_box(&mut canvas, pos2(40.0, 20.0), pos2(100.0, 80.0));

        canvas.pointer_down(pos2(0.0, 0.0));
        canvas.pointer_move(pos2(200.0, 200.0));
        assert!(!canvas.pointer_up());
        assert_eq!(ids(&canvas), vec![0, 1]);
    }

    #[test]
    fn clear_and_reload_reset_selection() {
        let mut canvas = canvas_with_points();
        canvas.set_mode(InteractionMode::Lasso);
        draw_box(&mut canvas, pos2(40.0, 20.0), pos2(100.0, 80.0));
        canvas.clear_selection();
        assert!(canvas.selection().is_empty());

        draw_box(&mut canvas, pos2(40.0, 20.0), pos2(100.0, 80.0));
        canvas.pointer_down(pos2(0.0, 0.0));
        canvas.reset_for_reload();
        assert!(canvas.selection().is_empty());
        assert!(canvas.lasso_path().is_empty());
    }

    #[test]
    fn hover_finds_nearest_point_and_leaves_selection_alone() {
        let mut canvas = canvas_with_points();
        assert_eq!(canvas.hover_at(pos2(52.0, 32.0)), Some(0));
        assert_eq!(canvas.hover_at(pos2(75.0, 75.0)), None);
        assert!(canvas.selection().is_empty());

        canvas.hover_at(pos2(90.0, 70.0));
        assert_eq!(canvas.hovered(), Some(1));
        canvas.hover_out();
        assert_eq!(canvas.hovered(), None);
    }

    #[test]
    fn zoom_is_clamped_to_bounds() {
        let mut canvas = canvas_with_points();
        canvas.zoom(pos2(50.0, 50.0), 1000.0);
        assert_eq!(canvas.transform().scale, ViewTransform::MAX_SCALE);
        canvas.zoom(pos2(50.0, 50.0), 0.0001);
        assert_eq!(canvas.transform().scale, ViewTransform::MIN_SCALE);
    }
}

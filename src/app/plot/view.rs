use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Rect, RichText, Sense, Shape, Stroke, Ui, Vec2, vec2,
};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::canvas::{InteractiveCanvas, PlotLayout};
use crate::util::truncate_text;

use super::super::render_utils::{
    SEARCH_STROKE, SELECTED_STROKE, circle_visible, dim_color, draw_background, point_color,
};
use super::super::{SearchMatchCache, ViewModel};

const TOOLTIP_TEXT_CHARS: usize = 150;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    fn refit_plot(&mut self, inner: Vec2) {
        let key = (self.points_revision, inner);
        if self.plot_revision == Some(key) {
            return;
        }

        let coordinates = self
            .points
            .iter()
            .map(|point| [point.x, point.y])
            .collect::<Vec<_>>();
        self.canvas.set_layout(PlotLayout::fit(&coordinates, inner));
        self.plot_revision = Some(key);
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.points_revision == self.points_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .points
            .iter()
            .filter(|point| fuzzy_match_score(&matcher, &point.record.text, query).is_some())
            .map(|point| point.id())
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            points_revision: self.points_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    fn draw_axes(&self, painter: &Painter, plot: Rect) {
        let layout = self.canvas.layout();
        let label_color = Color32::from_gray(150);
        let font = FontId::proportional(11.0);

        let label = |position, align, value: f32| {
            painter.text(position, align, format!("{value}"), font.clone(), label_color);
        };

        if let Some(x) = layout.x {
            let (low, high) = x.domain();
            label(plot.left_bottom() + vec2(0.0, 6.0), Align2::LEFT_TOP, low);
            label(plot.right_bottom() + vec2(0.0, 6.0), Align2::RIGHT_TOP, high);
        }
        if let Some(y) = layout.y {
            let (low, high) = y.domain();
            label(plot.left_bottom() - vec2(6.0, 0.0), Align2::RIGHT_BOTTOM, low);
            label(plot.left_top() - vec2(6.0, 0.0), Align2::RIGHT_TOP, high);
        }
    }

    pub(in crate::app) fn draw_plot(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let margins = self.canvas.margins();
        let inner = margins.inner_size(rect.size());
        let plot_rect = Rect::from_min_size(rect.min + margins.offset(), inner);

        self.refit_plot(inner);
        draw_background(&painter, rect, plot_rect);
        self.draw_axes(&painter, plot_rect);

        self.handle_plot_input(ui, rect, &response);

        let search_matches = self.cached_search_matches();
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());
        let hovered = self.canvas.hovered();
        let offset = rect.min.to_vec2();
        let plot_painter = painter.with_clip_rect(plot_rect);

        // Selected points paint last so they stay on top.
        let (selected, unselected): (Vec<usize>, Vec<usize>) =
            (0..self.points.len()).partition(|id| self.canvas.is_selected(*id));
        for id in unselected.into_iter().chain(selected) {
            let Some(position) = self.canvas.screen_position(id).map(|local| local + offset) else {
                continue;
            };
            let is_selected = self.canvas.is_selected(id);
            let is_hovered = hovered == Some(id);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&id));

            let mut radius = InteractiveCanvas::POINT_RADIUS;
            if is_selected {
                radius += 1.5;
            }
            if is_hovered {
                radius += 2.0;
            }
            if !circle_visible(plot_rect, position, radius) {
                continue;
            }

            let base_color = point_color(&self.classification, id);
            let color = if search_active && !is_match && !is_selected {
                dim_color(base_color, 0.2)
            } else {
                base_color
            };
            let stroke = if is_selected {
                Stroke::new(2.0, SELECTED_STROKE)
            } else if is_match {
                Stroke::new(1.5, SEARCH_STROKE)
            } else {
                Stroke::new(0.6, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };

            plot_painter.circle_filled(position, radius, color);
            plot_painter.circle_stroke(position, radius, stroke);
        }

        let lasso_path = self
            .canvas
            .lasso_path()
            .into_iter()
            .map(|point| point + offset)
            .collect::<Vec<_>>();
        if lasso_path.len() >= 2 {
            plot_painter.add(Shape::line(
                lasso_path,
                Stroke::new(1.5, Color32::from_rgb(241, 146, 94)),
            ));
        }

        if let Some(point) = hovered.and_then(|id| self.points.get(id)) {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
            response.on_hover_ui_at_pointer(|ui| {
                ui.set_max_width(320.0);
                ui.label(RichText::new(format!("#{}", point.id())).monospace());
                ui.label(truncate_text(&point.record.text, TOOLTIP_TEXT_CHARS));
                if !point.record.attributes.is_empty() {
                    ui.separator();
                }
                for (key, value) in &point.record.attributes {
                    ui.label(format!("{key}: {value}"));
                }
            });
        }
    }
}

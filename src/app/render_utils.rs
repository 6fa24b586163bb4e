use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, StrokeKind};

use crate::attribute::{AttributeKind, Classification};

const CATEGORY10: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(23, 190, 207),
];

pub(super) const NEUTRAL_POINT: Color32 = Color32::from_rgb(100, 116, 139);
pub(super) const SELECTED_STROKE: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const SEARCH_STROKE: Color32 = Color32::from_rgb(103, 196, 255);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;
    let mix = |a: u8, b: u8| ((a as f32 * inverse) + (b as f32 * amount)) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * (0.25 + (factor * 0.75))) as u8,
    )
}

pub(super) fn category_color(index: usize) -> Color32 {
    CATEGORY10[index % CATEGORY10.len()]
}

pub(super) fn gradient_color(t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    blend_color(
        Color32::from_rgb(68, 1, 84),
        Color32::from_rgb(253, 231, 37),
        t,
    )
}

pub(super) fn point_color(classification: &Classification, index: usize) -> Color32 {
    let Some(&value) = classification.color_values.get(index) else {
        return NEUTRAL_POINT;
    };
    match classification.kind() {
        AttributeKind::None => NEUTRAL_POINT,
        AttributeKind::Numeric => gradient_color(value),
        AttributeKind::Categorical => classification
            .category_index(value)
            .map_or(NEUTRAL_POINT, category_color),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, plot: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));
    painter.rect_stroke(
        plot,
        0.0,
        Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 160)),
        StrokeKind::Inside,
    );
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

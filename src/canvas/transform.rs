use eframe::egui::{Pos2, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl ViewTransform {
    pub const MIN_SCALE: f32 = 0.5;
    pub const MAX_SCALE: f32 = 10.0;

    pub fn apply(&self, local: Pos2) -> Pos2 {
        (local.to_vec2() * self.scale + self.translate).to_pos2()
    }

    pub fn invert(&self, view: Pos2) -> Pos2 {
        ((view.to_vec2() - self.translate) / self.scale).to_pos2()
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.translate += delta;
    }

    /// Scales by `factor` keeping `anchor` (in view space) fixed.
    pub fn zoom_about(&mut self, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let scale = (self.scale * factor).clamp(Self::MIN_SCALE, Self::MAX_SCALE);
        let under_anchor = self.invert(anchor);
        self.scale = scale;
        self.translate = anchor.to_vec2() - under_anchor.to_vec2() * scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    #[test]
    fn invert_undoes_apply() {
        let transform = ViewTransform {
            translate: vec2(12.0, -4.0),
            scale: 2.5,
        };
        let local = pos2(3.0, 7.0);
        let back = transform.invert(transform.apply(local));
        assert!((back - local).length() < 1e-5);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut transform = ViewTransform::default();
        let anchor = pos2(100.0, 50.0);
        let before = transform.invert(anchor);

        transform.zoom_about(anchor, 2.0);

        assert_eq!(transform.scale, 2.0);
        assert!((transform.invert(anchor) - before).length() < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut transform = ViewTransform::default();
        transform.zoom_about(Pos2::ZERO, 100.0);
        assert_eq!(transform.scale, ViewTransform::MAX_SCALE);
        transform.zoom_about(Pos2::ZERO, 0.001);
        assert_eq!(transform.scale, ViewTransform::MIN_SCALE);
        transform.zoom_about(Pos2::ZERO, f32::NAN);
        assert_eq!(transform.scale, ViewTransform::MIN_SCALE);
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut transform = ViewTransform::default();
        transform.pan_by(vec2(5.0, 5.0));
        transform.zoom_about(pos2(1.0, 1.0), 3.0);
        transform.reset();
        assert_eq!(transform, ViewTransform::default());
    }
}

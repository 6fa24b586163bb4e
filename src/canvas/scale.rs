use eframe::egui::{Pos2, Vec2, pos2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f32, f32),
    range: (f32, f32),
}

impl LinearScale {
    const TICK_COUNT: f32 = 10.0;

    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f32, f32) {
        self.domain
    }

    /// Widens the domain outward to round tick steps of 1, 2 or 5 times a power of ten.
    pub fn nice(mut self) -> Self {
        let (start, stop) = self.domain;
        let span = stop - start;
        if !span.is_finite() || span <= 0.0 {
            return self;
        }

        let raw_step = span / Self::TICK_COUNT;
        let power = raw_step.log10().floor();
        let error = raw_step / 10f32.powf(power);
        let factor = if error >= 50f32.sqrt() {
            10.0
        } else if error >= 10f32.sqrt() {
            5.0
        } else if error >= 2f32.sqrt() {
            2.0
        } else {
            1.0
        };

        // Sub-unit steps divide by an exact inverse to avoid drift like 0.30000001.
        self.domain = if power >= 0.0 {
            let step = factor * 10f32.powi(power as i32);
            ((start / step).floor() * step, (stop / step).ceil() * step)
        } else {
            let inverse = 10f32.powi(-(power as i32)) / factor;
            ((start * inverse).floor() / inverse, (stop * inverse).ceil() / inverse)
        };
        self
    }

    /// A collapsed domain maps every value to the middle of the range.
    pub fn map(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span.abs() <= f32::EPSILON {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    pub fn inner_size(&self, outer: Vec2) -> Vec2 {
        Vec2::new(
            (outer.x - self.left - self.right).max(1.0),
            (outer.y - self.top - self.bottom).max(1.0),
        )
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 40.0,
            left: 40.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlotLayout {
    pub size: Vec2,
    pub x: Option<LinearScale>,
    pub y: Option<LinearScale>,
    pub positions: Vec<Pos2>,
}

impl PlotLayout {
    /// Fits `coordinates` into `size`, y pointing up.
    pub fn fit(coordinates: &[[f32; 2]], size: Vec2) -> Self {
        if coordinates.is_empty() {
            return Self {
                size,
                ..Self::default()
            };
        }

        let extent = |axis: usize| {
            coordinates
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(low, high), point| {
                    (low.min(point[axis]), high.max(point[axis]))
                })
        };
        let x = LinearScale::new(extent(0), (0.0, size.x)).nice();
        let y = LinearScale::new(extent(1), (size.y, 0.0)).nice();
        let positions = coordinates
            .iter()
            .map(|point| pos2(x.map(point[0]), y.map(point[1])))
            .collect();

        Self {
            size,
            x: Some(x),
            y: Some(y),
            positions,
        }
    }

    #[cfg(test)]
    pub fn from_local(positions: Vec<Pos2>, size: Vec2) -> Self {
        Self {
            size,
            x: None,
            y: None,
            positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nice_rounds_domain_outward() {
        let scale = LinearScale::new((0.13, 9.71), (0.0, 100.0)).nice();
        assert_eq!(scale.domain(), (0.0, 10.0));

        let scale = LinearScale::new((-3.2, 47.0), (0.0, 1.0)).nice();
        assert_eq!(scale.domain(), (-5.0, 50.0));
    }

    #[test]
    fn collapsed_domain_maps_to_range_midpoint() {
        let scale = LinearScale::new((2.0, 2.0), (0.0, 80.0)).nice();
        assert_eq!(scale.map(2.0), 40.0);
    }

    #[test]
    fn fit_flips_y_and_spans_plot() {
        let layout = PlotLayout::fit(&[[0.0, 0.0], [10.0, 10.0]], Vec2::new(100.0, 50.0));
        assert_eq!(layout.positions, vec![pos2(0.0, 50.0), pos2(100.0, 0.0)]);
    }

    #[test]
    fn margins_shrink_inner_area() {
        let margins = Margins::default();
        assert_eq!(margins.inner_size(Vec2::new(460.0, 360.0)), Vec2::new(400.0, 300.0));
        assert_eq!(margins.offset(), Vec2::new(40.0, 20.0));
    }
}

use std::mem;

use eframe::egui::Pos2;

/// Even-odd ray casting. Polygons with fewer than 3 vertices contain nothing.
pub fn point_in_polygon(point: Pos2, polygon: &[Pos2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut previous = polygon[polygon.len() - 1];
    for &current in polygon {
        let crosses = (current.y > point.y) != (previous.y > point.y);
        if crosses {
            let slope = (previous.x - current.x) / (previous.y - current.y);
            let intersect_x = slope * (point.y - current.y) + current.x;
            if point.x < intersect_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Lasso {
    #[default]
    Idle,
    Drawing(Vec<Pos2>),
}

impl Lasso {
    pub const MIN_CLOSED_POINTS: usize = 3;

    pub fn begin(&mut self, start: Pos2) {
        *self = Self::Drawing(vec![start]);
    }

    pub fn extend(&mut self, point: Pos2) {
        if let Self::Drawing(path) = self {
            path.push(point);
        }
    }

    /// Ends the gesture, returning the path only if it can enclose an area.
    pub fn finish(&mut self) -> Option<Vec<Pos2>> {
        match mem::take(self) {
            Self::Drawing(path) if path.len() >= Self::MIN_CLOSED_POINTS => Some(path),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing(_))
    }

    pub fn path(&self) -> &[Pos2] {
        match self {
            Self::Idle => &[],
            Self::Drawing(path) => path,
        }
    }
}

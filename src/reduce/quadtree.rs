use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let span = (max - min).max_elem().max(1e-3);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1e-3,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Squared distance from `point` to the closest point of the square.
    pub(super) fn distance_sq_to(self, point: Vec2) -> f32 {
        let dx = ((point.x - self.center.x).abs() - self.half_extent).max(0.0);
        let dy = ((point.y - self.center.y).abs() - self.half_extent).max(0.0);
        dx * dx + dy * dy
    }

    fn quadrant(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset_x = if quadrant & 1 == 0 { -quarter } else { quarter };
        let offset_y = if quadrant & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(offset_x, offset_y),
            half_extent: quarter,
        }
    }
}

pub(super) struct QuadTree {
    pub(super) bounds: Square,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: [Option<Box<QuadTree>>; 4],
}

impl QuadTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = Square::enclosing(positions)?;
        Some(Self::node(bounds, (0..positions.len()).collect(), positions, 0))
    }

    fn node(bounds: Square, members: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = members.len() as f32;
        let mut center_of_mass = members
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + positions[index]);
        if mass > 0.0 {
            center_of_mass /= mass;
        }

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            members,
            children: std::array::from_fn(|_| None),
        };
        if depth >= MAX_DEPTH || node.members.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
        for &index in &node.members {
            buckets[bounds.quadrant(positions[index])].push(index);
        }
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::node(
                    bounds.child(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        node.members.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn for_each_within(
        &self,
        point: Vec2,
        radius: f32,
        positions: &[Vec2],
        visit: &mut impl FnMut(usize),
    ) {
        if self.bounds.distance_sq_to(point) > radius * radius {
            return;
        }
        if self.is_leaf() {
            for &index in &self.members {
                if (positions[index] - point).length_sq() <= radius * radius {
                    visit(index);
                }
            }
            return;
        }
        for child in self.children.iter().flatten() {
            child.for_each_within(point, radius, positions, visit);
        }
    }
}

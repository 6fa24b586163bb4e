use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadTree;

/// Deterministic escape direction for coincident points.
fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

#[derive(Clone, Copy)]
pub(super) struct Repulsion {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

impl Repulsion {
    pub(super) fn force_on(&self, tree: &QuadTree, index: usize, positions: &[Vec2]) -> Vec2 {
        let mut force = Vec2::ZERO;
        self.accumulate(tree, index, positions, &mut force);
        force
    }

    fn accumulate(&self, node: &QuadTree, index: usize, positions: &[Vec2], force: &mut Vec2) {
        if node.mass <= 0.0 {
            return;
        }

        let point = positions[index];
        if node.is_leaf() {
            for &other in &node.members {
                if other != index {
                    *force += self.push(point - positions[other], 1.0, index, other);
                }
            }
            return;
        }

        let delta = point - node.center_of_mass;
        let distance = delta.length().max(1e-4);
        let far_enough = !node.bounds.contains(point) && node.bounds.side() / distance < self.theta;
        if far_enough {
            *force += self.push(delta, node.mass, index, index);
            return;
        }

        for child in node.children.iter().flatten() {
            self.accumulate(child, index, positions, force);
        }
    }

    fn push(&self, delta: Vec2, mass: f32, from: usize, to: usize) -> Vec2 {
        let distance_sq = delta.length_sq();
        let direction = if distance_sq > 1e-8 {
            delta / distance_sq.sqrt()
        } else {
            separation_direction(from, to)
        };
        direction * (self.strength * mass / (distance_sq + self.softening))
    }
}

/// Pushes `index` away from every point closer than `min_distance`.
pub(super) fn collision_force(
    tree: &QuadTree,
    index: usize,
    positions: &[Vec2],
    min_distance: f32,
    strength: f32,
) -> Vec2 {
    let point = positions[index];
    let mut force = Vec2::ZERO;
    tree.for_each_within(point, min_distance, positions, &mut |other| {
        if other == index {
            return;
        }
        let delta = point - positions[other];
        let distance = delta.length();
        let direction = if distance > 1e-4 {
            delta / distance
        } else {
            separation_direction(index, other)
        };
        force += direction * (min_distance - distance) * strength;
    });
    force
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repulsion_points_away_from_neighbors() {
        let positions = vec![vec2(0.0, 0.0), vec2(1.0, 0.0)];
        let tree = QuadTree::build(&positions).unwrap();
        let repulsion = Repulsion {
            strength: 1.0,
            softening: 0.01,
            theta: 0.8,
        };

        assert!(repulsion.force_on(&tree, 0, &positions).x < 0.0);
        assert!(repulsion.force_on(&tree, 1, &positions).x > 0.0);
    }

    #[test]
    fn collision_only_acts_inside_min_distance() {
        let positions = vec![vec2(0.0, 0.0), vec2(0.05, 0.0), vec2(3.0, 0.0)];
        let tree = QuadTree::build(&positions).unwrap();

        let close = collision_force(&tree, 0, &positions, 0.1, 1.0);
        assert!(close.x < 0.0);
        let far = collision_force(&tree, 2, &positions, 0.1, 1.0);
        assert_eq!(far, Vec2::ZERO);
    }
}

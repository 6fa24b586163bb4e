use eframe::egui::{Vec2, vec2};
use rand::Rng;

use super::forces::{Repulsion, collision_force};
use super::neighbors::WeightedEdge;
use super::quadtree::QuadTree;

const ATTRACTION: f32 = 1.0;
const REPULSION: f32 = 0.08;
const SOFTENING: f32 = 0.05;
const BARNES_HUT_THETA: f32 = 0.8;
const COLLISION: f32 = 1.5;
const CENTER_PULL: f32 = 0.002;
const DAMPING: f32 = 0.82;
const TIME_STEP: f32 = 0.12;
const MAX_FORCE: f32 = 40.0;
const START_SPEED: f32 = 1.0;
const END_SPEED: f32 = 0.01;

/// Lays out `count` points in 2-D so weighted edges pull their endpoints
/// together while every pair repels and no two points sit closer than
/// `min_distance`.
pub(super) fn embed(
    count: usize,
    edges: &[WeightedEdge],
    min_distance: f32,
    epochs: usize,
    rng: &mut impl Rng,
) -> Vec<Vec2> {
    let spread = (count as f32).sqrt().max(1.0) * 2.0;
    let mut positions = (0..count)
        .map(|_| vec2(rng.gen_range(-spread..spread), rng.gen_range(-spread..spread)))
        .collect::<Vec<_>>();
    if count < 2 {
        return positions;
    }

    let mut velocities = vec![Vec2::ZERO; count];
    let mut forces = vec![Vec2::ZERO; count];
    let repulsion = Repulsion {
        strength: REPULSION,
        softening: SOFTENING,
        theta: BARNES_HUT_THETA,
    };
    let epochs = epochs.max(1);

    for epoch in 0..epochs {
        let progress = epoch as f32 / epochs as f32;
        let max_speed = START_SPEED + (END_SPEED - START_SPEED) * progress;
        forces.fill(Vec2::ZERO);

        if let Some(tree) = QuadTree::build(&positions) {
            for (index, force) in forces.iter_mut().enumerate() {
                *force += repulsion.force_on(&tree, index, &positions);
                *force += collision_force(&tree, index, &positions, min_distance, COLLISION);
            }
        }

        for edge in edges {
            let delta = positions[edge.from] - positions[edge.to];
            let distance = delta.length();
            if distance <= min_distance || distance <= 1e-6 {
                continue;
            }
            let pull = (delta / distance) * ((distance - min_distance) * edge.weight * ATTRACTION);
            forces[edge.from] -= pull;
            forces[edge.to] += pull;
        }

        let mut mean_velocity = Vec2::ZERO;
        for index in 0..count {
            let mut force = forces[index] - positions[index] * CENTER_PULL;
            let magnitude = force.length();
            if magnitude > MAX_FORCE {
                force *= MAX_FORCE / magnitude;
            }

            let mut velocity = (velocities[index] + force * TIME_STEP) * DAMPING;
            let speed = velocity.length();
            if speed > max_speed {
                velocity *= max_speed / speed;
            }
            velocities[index] = velocity;
            positions[index] += velocity;
            mean_velocity += velocity;
        }

        mean_velocity /= count as f32;
        for velocity in &mut velocities {
            *velocity -= mean_velocity;
        }
    }

    let centroid = positions.iter().fold(Vec2::ZERO, |sum, point| sum + *point) / count as f32;
    for point in &mut positions {
        *point -= centroid;
    }
    positions
}

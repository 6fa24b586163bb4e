use std::collections::BTreeMap;

const SIGMA_SEARCH_STEPS: usize = 64;
const SIGMA_TOLERANCE: f64 = 1e-5;
const MIN_SIGMA: f64 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct WeightedEdge {
    pub(super) from: usize,
    pub(super) to: usize,
    pub(super) weight: f32,
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let delta = f64::from(*x) - f64::from(*y);
            delta * delta
        })
        .sum::<f64>()
        .sqrt()
}

/// Indices and distances of the `k` nearest other points, closest first.
fn nearest_neighbors(vectors: &[Vec<f32>], index: usize, k: usize) -> Vec<(usize, f64)> {
    let mut candidates = vectors
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != index)
        .map(|(other, vector)| (other, euclidean(&vectors[index], vector)))
        .collect::<Vec<_>>();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    candidates.truncate(k);
    candidates
}

/// Finds `sigma` so the membership strengths of one neighborhood sum to `log2(k)`.
fn smooth_sigma(distances: &[f64], rho: f64, target: f64) -> f64 {
    let mut low = 0.0;
    let mut high = f64::INFINITY;
    let mut sigma = 1.0;

    for _ in 0..SIGMA_SEARCH_STEPS {
        let total = distances
            .iter()
            .map(|distance| (-(distance - rho).max(0.0) / sigma).exp())
            .sum::<f64>();

        if (total - target).abs() < SIGMA_TOLERANCE {
            break;
        }
        if total > target {
            high = sigma;
            sigma = (low + high) / 2.0;
        } else {
            low = sigma;
            sigma = if high.is_finite() {
                (low + high) / 2.0
            } else {
                sigma * 2.0
            };
        }
    }

    sigma.max(MIN_SIGMA)
}

/// Fuzzy k-nearest-neighbor graph with symmetric membership weights.
///
/// Directed memberships `exp(-(d - rho) / sigma)` are merged with the
/// probabilistic union `a + b - a * b`. Edges come out ordered by endpoints.
pub(super) fn fuzzy_graph(vectors: &[Vec<f32>], k: usize) -> Vec<WeightedEdge> {
    let target = (k as f64).log2().max(1.0);
    let mut merged: BTreeMap<(usize, usize), (f64, f64)> = BTreeMap::new();

    for index in 0..vectors.len() {
        let neighbors = nearest_neighbors(vectors, index, k);
        let distances = neighbors
            .iter()
            .map(|(_, distance)| *distance)
            .collect::<Vec<_>>();
        let rho = distances
            .iter()
            .copied()
            .find(|distance| *distance > 0.0)
            .unwrap_or(0.0);
        let sigma = smooth_sigma(&distances, rho, target);

        for (other, distance) in neighbors {
            let membership = (-(distance - rho).max(0.0) / sigma).exp();
            let entry = merged
                .entry((index.min(other), index.max(other)))
                .or_insert((0.0, 0.0));
            if index < other {
                entry.0 = membership;
            } else {
                entry.1 = membership;
            }
        }
    }

    merged
        .into_iter()
        .map(|((from, to), (forward, backward))| WeightedEdge {
            from,
            to,
            weight: (forward + backward - forward * backward) as f32,
        })
        .filter(|edge| edge.weight > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_are_sorted_by_distance() {
        let vectors = vec![vec![0.0], vec![5.0], vec![1.0], vec![2.0]];
        let neighbors = nearest_neighbors(&vectors, 0, 2);
        assert_eq!(
            neighbors.iter().map(|(index, _)| *index).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn graph_has_no_self_loops_and_bounded_weights() {
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ];
        let edges = fuzzy_graph(&vectors, 2);

        assert!(!edges.is_empty());
        for edge in &edges {
            assert!(edge.from < edge.to);
            assert!(edge.weight > 0.0 && edge.weight <= 1.0, "{edge:?}");
        }
    }

    #[test]
    fn nearest_neighbor_gets_full_membership() {
        let vectors = vec![vec![0.0], vec![1.0], vec![10.0]];
        let edges = fuzzy_graph(&vectors, 2);
        let closest = edges
            .iter()
            .find(|edge| edge.from == 0 && edge.to == 1)
            .unwrap();
        assert!((closest.weight - 1.0).abs() < 1e-6);
    }
}

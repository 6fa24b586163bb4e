use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::record::{AttributeValue, EmbeddingRecord};

const SAMPLE_CLUSTERS: usize = 4;
const CLUSTER_SPREAD: f32 = 0.35;
const CLUSTER_NAMES: [&str; SAMPLE_CLUSTERS] = ["travel", "cooking", "finance", "sports"];

/// Gaussian blobs standing in for a real dataset when loading fails.
///
/// Every record carries a categorical `cluster` and a numeric `score`
/// attribute so coloring can be exercised without real data.
pub fn synthetic_sample(
    count: usize,
    dimensions: usize,
    seed: Option<u64>,
) -> Vec<EmbeddingRecord> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let dimensions = dimensions.max(2);

    let centers = (0..SAMPLE_CLUSTERS)
        .map(|_| {
            (0..dimensions)
                .map(|_| rng.sample::<f32, _>(StandardNormal) * 2.0)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    (0..count)
        .map(|index| {
            let cluster = index % SAMPLE_CLUSTERS;
            let embedding = centers[cluster]
                .iter()
                .map(|center| center + rng.sample::<f32, _>(StandardNormal) * CLUSTER_SPREAD)
                .collect();
            let score = (rng.gen_range(0.0..100.0_f64) * 10.0).round() / 10.0;

            EmbeddingRecord::new(
                index,
                embedding,
                format!("Sample item {index} about {}", CLUSTER_NAMES[cluster]),
            )
            .with_attribute(
                "cluster",
                AttributeValue::Text(CLUSTER_NAMES[cluster].to_owned()),
            )
            .with_attribute("score", AttributeValue::Number(score))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_has_uniform_dimensions_and_sequential_ids() {
        let records = synthetic_sample(10, 8, Some(3));
        assert_eq!(records.len(), 10);
        for (index, record) in records.iter().enumerate() {
            assert_eq!(record.id, index);
            assert_eq!(record.embedding.len(), 8);
            assert!(record.embedding.iter().all(|value| value.is_finite()));
            assert!(record.attribute("cluster").is_some());
            assert!(record.attribute("score").is_some());
        }
    }

    #[test]
    fn seeded_samples_are_reproducible() {
        assert_eq!(
            synthetic_sample(6, 4, Some(11)),
            synthetic_sample(6, 4, Some(11))
        );
    }
}

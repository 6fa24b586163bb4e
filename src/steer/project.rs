use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("embedding {index} has {found} dimensions but the steering vector has {expected}")]
    DimensionMismatch {
        index: usize,
        found: usize,
        expected: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegenerateInputWarning;

impl fmt::Display for DegenerateInputWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("steering vector has zero norm; embeddings left unchanged")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub embeddings: Vec<Vec<f32>>,
    pub warning: Option<DegenerateInputWarning>,
}

impl Projection {
    fn without_warning(embeddings: Vec<Vec<f32>>) -> Self {
        Self {
            embeddings,
            warning: None,
        }
    }
}

/// Moves every embedding along the unit steering direction `u`:
/// `e - strength * (e . u) * u`.
///
/// `strength == 1` removes the component exactly, values above or below
/// over- or under-remove it and negative values amplify it. A strength of
/// zero returns the input values untouched.
pub fn project(
    embeddings: &[Vec<f32>],
    steering: &[f32],
    strength: f32,
) -> Result<Projection, ValidationError> {
    if embeddings.is_empty() {
        return Ok(Projection::without_warning(Vec::new()));
    }

    if let Some((index, embedding)) = embeddings
        .iter()
        .enumerate()
        .find(|(_, embedding)| embedding.len() != steering.len())
    {
        return Err(ValidationError::DimensionMismatch {
            index,
            found: embedding.len(),
            expected: steering.len(),
        });
    }

    if strength == 0.0 {
        return Ok(Projection::without_warning(embeddings.to_vec()));
    }

    let norm = steering
        .iter()
        .map(|value| f64::from(*value).powi(2))
        .sum::<f64>()
        .sqrt();
    if norm == 0.0 {
        return Ok(Projection {
            embeddings: embeddings.to_vec(),
            warning: Some(DegenerateInputWarning),
        });
    }

    let unit = steering
        .iter()
        .map(|value| f64::from(*value) / norm)
        .collect::<Vec<_>>();
    let strength = f64::from(strength);

    let adjusted = embeddings
        .iter()
        .map(|embedding| {
            let coefficient = embedding
                .iter()
                .zip(&unit)
                .map(|(value, direction)| f64::from(*value) * direction)
                .sum::<f64>();
            let shift = strength * coefficient;
            embedding
                .iter()
                .zip(&unit)
                .map(|(value, direction)| (f64::from(*value) - shift * direction) as f32)
                .collect()
        })
        .collect();

    Ok(Projection::without_warning(adjusted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn full_strength_removes_the_direction() {
        let steering = [1.0, 2.0, 2.0];
        let embeddings = vec![vec![3.0, 4.0, 5.0], vec![-1.0, 0.5, 7.0]];

        let projection = project(&embeddings, &steering, 1.0).unwrap();
        for embedding in &projection.embeddings {
            assert!(dot(embedding, &steering).abs() < 1e-4, "{embedding:?}");
        }
        assert_eq!(projection.warning, None);
    }

    #[test]
    fn zero_strength_is_identity() {
        let embeddings = vec![vec![0.1, 0.2, 0.3], vec![1.0, -1.0, 0.0]];
        let projection = project(&embeddings, &[0.0, 1.0, 0.0], 0.0).unwrap();
        assert_eq!(projection.embeddings, embeddings);
    }

    #[test]
    fn adjustment_is_linear_in_strength() {
        let embedding = vec![vec![0.7, -1.3, 2.1, 0.4]];
        let steering = [0.5, 0.5, -0.25, 1.0];
        let strength = 0.35;

        let single = project(&embedding, &steering, strength).unwrap();
        let double = project(&embedding, &steering, strength * 2.0).unwrap();

        for dim in 0..embedding[0].len() {
            let single_shift = single.embeddings[0][dim] - embedding[0][dim];
            let double_shift = double.embeddings[0][dim] - embedding[0][dim];
            assert!((double_shift - 2.0 * single_shift).abs() < 1e-5);
        }
    }

    #[test]
    fn negative_strength_amplifies() {
        let projection = project(&[vec![1.0, 1.0]], &[2.0, 0.0], -1.0).unwrap();
        assert_eq!(projection.embeddings, vec![vec![2.0, 1.0]]);
    }

    #[test]
    fn zero_norm_steering_warns_and_keeps_input() {
        let embeddings = vec![vec![1.0, 2.0]];
        let projection = project(&embeddings, &[0.0, 0.0], 1.5).unwrap();
        assert_eq!(projection.embeddings, embeddings);
        assert_eq!(projection.warning, Some(DegenerateInputWarning));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let embeddings = vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]];
        assert_eq!(
            project(&embeddings, &[1.0, 0.0], 1.0),
            Err(ValidationError::DimensionMismatch {
                index: 1,
                found: 3,
                expected: 2
            })
        );
    }

    #[test]
    fn empty_dataset_is_a_no_op() {
        let projection = project(&[], &[1.0, 0.0], 1.0).unwrap();
        assert!(projection.embeddings.is_empty());
    }
}

mod project;
mod source;

pub use project::{ValidationError, project};
pub use source::{FileVectorSource, SteeringCache};

#[cfg(test)]
pub(crate) use source::tests::MemorySource;

pub const DEFAULT_CONCEPTS: [&str; 3] = ["language", "sentiment", "bio"];

#[derive(Clone, Debug, PartialEq)]
pub struct ConceptAdjustment {
    pub concept: String,
    pub strength: f32,
}

/// Adjustments are applied in this order and do not commute in general, so
/// the order is part of the contract.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdjustmentConfig {
    adjustments: Vec<ConceptAdjustment>,
}

impl AdjustmentConfig {
    pub const MIN_STRENGTH: f32 = -2.0;
    pub const MAX_STRENGTH: f32 = 2.0;

    /// Declares `concepts` with zero strength. Duplicates keep their first position.
    pub fn with_concepts<I, S>(concepts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut adjustments: Vec<ConceptAdjustment> = Vec::new();
        for concept in concepts {
            let concept = concept.into();
            if adjustments.iter().any(|existing| existing.concept == concept) {
                continue;
            }
            adjustments.push(ConceptAdjustment {
                concept,
                strength: 0.0,
            });
        }
        Self { adjustments }
    }

    pub fn clamp_strength(strength: f32) -> f32 {
        if strength.is_finite() {
            strength.clamp(Self::MIN_STRENGTH, Self::MAX_STRENGTH)
        } else {
            0.0
        }
    }

    /// Returns `false` when `concept` was never declared.
    pub fn set_strength(&mut self, concept: &str, strength: f32) -> bool {
        let Some(entry) = self
            .adjustments
            .iter_mut()
            .find(|entry| entry.concept == concept)
        else {
            return false;
        };
        entry.strength = Self::clamp_strength(strength);
        true
    }

    #[cfg(test)]
    pub fn strength(&self, concept: &str) -> Option<f32> {
        self.adjustments
            .iter()
            .find(|entry| entry.concept == concept)
            .map(|entry| entry.strength)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConceptAdjustment> {
        self.adjustments.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConceptAdjustment> {
        self.adjustments.iter_mut()
    }

    pub fn active(&self) -> impl Iterator<Item = &ConceptAdjustment> {
        self.adjustments.iter().filter(|entry| entry.strength != 0.0)
    }

    pub fn is_identity(&self) -> bool {
        self.active().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_order_is_preserved() {
        let mut config = AdjustmentConfig::with_concepts(["sentiment", "language", "sentiment"]);
        assert!(config.is_identity());
        assert!(config.set_strength("language", 0.5));
        assert!(config.set_strength("sentiment", -1.0));

        let active = config
            .active()
            .map(|entry| entry.concept.as_str())
            .collect::<Vec<_>>();
        assert_eq!(active, ["sentiment", "language"]);
    }

    #[test]
    fn strengths_are_clamped() {
        let mut config = AdjustmentConfig::with_concepts(DEFAULT_CONCEPTS);
        config.set_strength("bio", 9.0);
        config.set_strength("language", f32::NAN);
        assert_eq!(config.strength("bio"), Some(2.0));
        assert_eq!(config.strength("language"), Some(0.0));
        assert!(!config.set_strength("unknown", 1.0));
        assert_eq!(config.strength("unknown"), None);
    }
}

use std::path::Path;

use shared::LabelScore;

use crate::config::CONFIDENCE_THRESHOLD;
use crate::inference::labels::{self, NormalizedScores};
use crate::inference::{ClassifierModel, InferenceError};

/// Outcome of the authenticity stage for one media file.
#[derive(Debug, Clone)]
pub struct AuthenticityVerdict {
    pub is_synthetic: bool,
    pub detected_label: String,
    pub authenticity_score: f32,
    pub real_score: f32,
    pub fake_score: f32,
    pub all_predictions: Vec<LabelScore>,
}

/// Deepfake classifier plus the fixed-threshold decision rule.
#[derive(Clone)]
pub struct DeepfakeDetector {
    model: ClassifierModel,
}

impl DeepfakeDetector {
    pub fn load(model_dir: &Path) -> Result<Self, InferenceError> {
        let model = ClassifierModel::load(model_dir)?;
        Ok(Self { model })
    }

    pub fn detect_path(&self, path: &Path) -> Result<AuthenticityVerdict, InferenceError> {
        let distribution = self.model.predict_path(path)?;
        Ok(verdict_from(distribution))
    }

    pub fn detect_bytes(&self, bytes: &[u8]) -> Result<AuthenticityVerdict, InferenceError> {
        let distribution = self.model.predict_bytes(bytes)?;
        Ok(verdict_from(distribution))
    }
}

/// Media is synthetic iff the detected label is a synthetic alias and its
/// probability meets the configured threshold.
pub fn verdict_from(distribution: Vec<LabelScore>) -> AuthenticityVerdict {
    let NormalizedScores {
        detected_label,
        authenticity_score,
        real_score,
        fake_score,
    } = labels::normalize(&distribution);

    let is_synthetic =
        labels::is_synthetic_alias(&detected_label) && authenticity_score >= CONFIDENCE_THRESHOLD;

    AuthenticityVerdict {
        is_synthetic,
        detected_label,
        authenticity_score,
        real_score,
        fake_score,
        all_predictions: distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(entries: &[(&str, f32)]) -> Vec<LabelScore> {
        entries
            .iter()
            .map(|(label, score)| LabelScore {
                label: label.to_string(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn confident_fake_is_synthetic() {
        let verdict = verdict_from(dist(&[("Deepfake", 0.95), ("Realism", 0.05)]));
        assert!(verdict.is_synthetic);
        assert_eq!(verdict.detected_label, "FAKE");
        assert_eq!(verdict.authenticity_score, 0.95);
    }

    #[test]
    fn fake_below_threshold_is_not_synthetic() {
        let verdict = verdict_from(dist(&[("FAKE", 0.79), ("REAL", 0.21)]));
        assert!(!verdict.is_synthetic);
        assert_eq!(verdict.detected_label, "FAKE");
    }

    #[test]
    fn fake_at_exact_threshold_is_synthetic() {
        let verdict = verdict_from(dist(&[("FAKE", 0.8), ("REAL", 0.2)]));
        assert!(verdict.is_synthetic);
    }

    #[test]
    fn confident_real_is_not_synthetic() {
        let verdict = verdict_from(dist(&[("Realism", 0.95), ("Deepfake", 0.05)]));
        assert!(!verdict.is_synthetic);
        assert_eq!(verdict.detected_label, "REAL");
        assert_eq!(verdict.authenticity_score, 0.95);
    }

    #[test]
    fn generic_label_one_counts_as_synthetic() {
        let verdict = verdict_from(dist(&[("LABEL_1", 0.9), ("LABEL_0", 0.1)]));
        assert!(verdict.is_synthetic);
        assert_eq!(verdict.detected_label, "FAKE");
    }

    #[test]
    fn unknown_vocabulary_is_never_synthetic() {
        let verdict = verdict_from(dist(&[("landscape", 0.99), ("portrait", 0.01)]));
        assert!(!verdict.is_synthetic);
        assert_eq!(verdict.detected_label, "LANDSCAPE");
    }

    #[test]
    fn raw_distribution_is_kept_for_debugging() {
        let verdict = verdict_from(dist(&[("Deepfake", 0.9), ("Realism", 0.1)]));
        assert_eq!(verdict.all_predictions.len(), 2);
        assert_eq!(verdict.all_predictions[0].label, "Deepfake");
    }
}

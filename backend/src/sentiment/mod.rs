use std::path::Path;

use shared::SentimentResult;

use crate::inference::labels::round4;
use crate::inference::{ClassifierModel, InferenceError};

/// Visual emotion classifier over the shared model backend.
///
/// This stage is best-effort: every failure degrades to `None` so the
/// analysis request itself never fails on sentiment.
#[derive(Clone)]
pub struct SentimentAnalyzer {
    model: ClassifierModel,
}

impl SentimentAnalyzer {
    pub fn load(model_dir: &Path) -> Result<Self, InferenceError> {
        let model = ClassifierModel::load(model_dir)?;
        Ok(Self { model })
    }

    pub fn analyze_path(&self, path: &Path) -> Option<SentimentResult> {
        match self.model.predict_path(path) {
            Ok(distribution) => result_from(distribution),
            Err(e) => {
                log::warn!("Sentiment inference failed: {e}");
                None
            }
        }
    }
}

fn result_from(distribution: Vec<shared::LabelScore>) -> Option<SentimentResult> {
    // predict() returns the distribution best-first.
    let best = distribution.first()?.clone();
    Some(SentimentResult {
        sentiment_label: best.label,
        sentiment_score: round4(best.score),
        all_sentiments: distribution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::LabelScore;

    #[test]
    fn top_emotion_is_reported_with_full_distribution() {
        let result = result_from(vec![
            LabelScore {
                label: "happy".into(),
                score: 0.812_345,
            },
            LabelScore {
                label: "neutral".into(),
                score: 0.1,
            },
            LabelScore {
                label: "sad".into(),
                score: 0.087_655,
            },
        ])
        .unwrap();
        assert_eq!(result.sentiment_label, "happy");
        assert_eq!(result.sentiment_score, 0.8123);
        assert_eq!(result.all_sentiments.len(), 3);
    }

    #[test]
    fn empty_distribution_degrades_to_none() {
        assert!(result_from(Vec::new()).is_none());
    }
}

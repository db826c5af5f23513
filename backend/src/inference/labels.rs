use lazy_static::lazy_static;
use std::collections::HashSet;

use shared::LabelScore;

lazy_static! {
    static ref AUTHENTIC_ALIASES: HashSet<&'static str> =
        ["REAL", "REALISM", "AUTHENTIC", "HUMAN", "LABEL_0"]
            .into_iter()
            .collect();
    static ref SYNTHETIC_ALIASES: HashSet<&'static str> = [
        "FAKE",
        "DEEPFAKE",
        "SYNTHETIC",
        "GENERATED",
        "AI_GENERATED",
        "ARTIFICIAL",
        "LABEL_1",
    ]
    .into_iter()
    .collect();
}

pub const REAL_LABEL: &str = "REAL";
pub const FAKE_LABEL: &str = "FAKE";

/// A raw classifier distribution folded into the canonical REAL/FAKE schema.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedScores {
    pub detected_label: String,
    /// Probability of the detected label, rounded to 4 decimals.
    pub authenticity_score: f32,
    pub real_score: f32,
    pub fake_score: f32,
}

pub fn is_synthetic_alias(label: &str) -> bool {
    SYNTHETIC_ALIASES.contains(alias_key(label).as_str())
}

pub fn is_authentic_alias(label: &str) -> bool {
    AUTHENTIC_ALIASES.contains(alias_key(label).as_str())
}

/// Folds a label distribution into canonical scores.
///
/// Checkpoints disagree on vocabulary (REAL/FAKE, Realism/Deepfake,
/// LABEL_0/LABEL_1); every known alias contributes to `real_score` or
/// `fake_score`, and the reported label is the canonical name of whichever
/// raw label scored best. Unknown vocabularies pass through uppercased and
/// can never be judged synthetic.
pub fn normalize(distribution: &[LabelScore]) -> NormalizedScores {
    let mut real_score = 0.0f32;
    let mut fake_score = 0.0f32;
    for entry in distribution {
        let key = alias_key(&entry.label);
        if AUTHENTIC_ALIASES.contains(key.as_str()) {
            real_score += entry.score;
        } else if SYNTHETIC_ALIASES.contains(key.as_str()) {
            fake_score += entry.score;
        }
    }

    let best = distribution.iter().max_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let (detected_label, score) = match best {
        Some(best) if is_synthetic_alias(&best.label) => (FAKE_LABEL.to_string(), fake_score),
        Some(best) if is_authentic_alias(&best.label) => (REAL_LABEL.to_string(), real_score),
        Some(best) => (alias_key(&best.label), best.score),
        None => (String::new(), 0.0),
    };

    NormalizedScores {
        detected_label,
        authenticity_score: round4(score),
        real_score: round4(real_score),
        fake_score: round4(fake_score),
    }
}

fn alias_key(label: &str) -> String {
    label.trim().to_uppercase().replace([' ', '-'], "_")
}

pub(crate) fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

use serde::{Deserialize, Serialize};

/// One entry of a classifier's label/score distribution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SentimentResult {
    pub sentiment_label: String,
    pub sentiment_score: f32,
    pub all_sentiments: Vec<LabelScore>,
}

/// Unified response for a single media analysis request.
///
/// `moderation` is either the verdict object returned by the vision model or
/// a `{"status": "error"|"skipped", "reason": ...}` object; it is absent when
/// the media was not judged synthetic.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalysisResponse {
    pub is_synthetic: bool,
    pub authenticity_score: f32,
    pub detected_label: String,
    pub file_name: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<Vec<LabelScore>>,
}

use std::env;

/// Minimum fake-class probability before media is reported as synthetic.
pub const CONFIDENCE_THRESHOLD: f32 = 0.8;

pub const MODERATION_TIMEOUT_SECS: u64 = 30;

pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Input resolution the classifier checkpoints were exported with.
pub const CLASSIFIER_INPUT_SIZE: u32 = 224;

#[derive(Clone, Debug)]
pub struct Settings {
    pub ollama_url: String,
    pub ollama_model: String,
    pub deepfake_model_dir: String,
    pub sentiment_model_dir: String,
    pub port: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434/api/chat".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llava-llama3".to_string()),
            deepfake_model_dir: env::var("DEEPFAKE_MODEL_DIR")
                .unwrap_or_else(|_| "models/deepfake-detector".to_string()),
            sentiment_model_dir: env::var("SENTIMENT_MODEL_DIR")
                .unwrap_or_else(|_| "models/facial-emotions".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "8081".to_string()),
        }
    }
}

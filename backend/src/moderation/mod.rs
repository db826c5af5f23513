use std::path::Path;
use std::time::Duration;

use base64::Engine;
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::MODERATION_TIMEOUT_SECS;

const SAFETY_PROMPT: &str =
    "Is this image safe for work? Please respond with a single word: 'safe' or 'unsafe'.";

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Ollama service unreachable")]
    Unreachable,
    #[error("Ollama request timed out")]
    Timeout,
    #[error("Model '{0}' not found on Ollama server")]
    ModelNotFound(String),
    #[error("Ollama returned status {0}")]
    Status(u16),
    #[error("Invalid JSON response from Ollama")]
    InvalidJson,
    #[error("Failed to read media file: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for the safe-for-work verdict from a vision model behind an
/// Ollama-style chat endpoint.
#[derive(Clone)]
pub struct ModerationEngine {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl ModerationEngine {
    pub fn new(url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(MODERATION_TIMEOUT_SECS))
            .build()
            .expect("failed to build moderation HTTP client");
        Self { client, url, model }
    }

    /// Evaluates an image and always produces a JSON object: the parsed
    /// verdict on success, `{"status": "error", "reason": ...}` otherwise.
    /// Moderation trouble degrades the response, it never fails the request.
    pub async fn evaluate_safety(&self, path: &Path) -> Value {
        match self.query_model(path).await {
            Ok(verdict) => verdict,
            Err(e) => {
                log::error!("Error querying Ollama: {e}");
                json!({"status": "error", "reason": e.to_string()})
            }
        }
    }

    async fn query_model(&self, path: &Path) -> Result<Value, ModerationError> {
        let bytes = std::fs::read(path)?;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": SAFETY_PROMPT,
                    "images": [image_base64],
                }
            ],
            "stream": false,
            "format": "json",
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModerationError::Timeout
                } else {
                    ModerationError::Unreachable
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|_| ModerationError::Unreachable)?;

        if !status.is_success() {
            if status == reqwest::StatusCode::NOT_FOUND && body.contains("not found") {
                return Err(ModerationError::ModelNotFound(self.model.clone()));
            }
            return Err(ModerationError::Status(status.as_u16()));
        }

        let envelope: Value =
            serde_json::from_str(&body).map_err(|_| ModerationError::InvalidJson)?;
        extract_verdict(&envelope)
    }
}

/// With `format: "json"` the verdict arrives as a JSON string inside the
/// chat envelope's `message.content`.
fn extract_verdict(envelope: &Value) -> Result<Value, ModerationError> {
    let content = envelope
        .pointer("/message/content")
        .and_then(Value::as_str)
        .ok_or(ModerationError::InvalidJson)?;
    serde_json::from_str(content).map_err(|_| ModerationError::InvalidJson)
}

/// Placeholder returned for synthetic videos instead of a model call.
pub fn video_moderation_placeholder() -> Value {
    json!({
        "status": "skipped",
        "reason": "Video moderation requires frame extraction and is not yet implemented.",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn verdict_is_parsed_from_chat_envelope() {
        let envelope = json!({
            "model": "llava-llama3",
            "message": {"role": "assistant", "content": "{\"safe\": false, \"reason\": \"nudity\"}"},
            "done": true,
        });
        let verdict = extract_verdict(&envelope).unwrap();
        assert_eq!(verdict["safe"], false);
        assert_eq!(verdict["reason"], "nudity");
    }

    #[test]
    fn malformed_content_is_invalid_json() {
        let envelope = json!({"message": {"content": "not json at all"}});
        assert!(matches!(
            extract_verdict(&envelope),
            Err(ModerationError::InvalidJson)
        ));
    }

    #[test]
    fn missing_message_is_invalid_json() {
        let envelope = json!({"done": true});
        assert!(matches!(
            extract_verdict(&envelope),
            Err(ModerationError::InvalidJson)
        ));
    }

    #[test]
    fn video_placeholder_is_marked_skipped() {
        let placeholder = video_moderation_placeholder();
        assert_eq!(placeholder["status"], "skipped");
    }

    #[actix_web::test]
    async fn unreachable_endpoint_degrades_to_error_object() {
        let engine = ModerationEngine::new(
            // Discard port: nothing listens there.
            "http://127.0.0.1:9/api/chat".to_string(),
            "llava-llama3".to_string(),
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not really a png").unwrap();

        let verdict = engine.evaluate_safety(file.path()).await;
        assert_eq!(verdict["status"], "error");
        assert_eq!(verdict["reason"], "Ollama service unreachable");
    }

    #[actix_web::test]
    async fn missing_file_degrades_to_error_object() {
        let engine = ModerationEngine::new(
            "http://127.0.0.1:9/api/chat".to_string(),
            "llava-llama3".to_string(),
        );
        let verdict = engine
            .evaluate_safety(Path::new("/nonexistent/image.png"))
            .await;
        assert_eq!(verdict["status"], "error");
    }
}

use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use std::io::Write;

use shared::AnalysisResponse;

use crate::detection::DeepfakeDetector;
use crate::inference::InferenceError;
use crate::media::{self, MediaError, TempMedia};
use crate::moderation::{self, ModerationEngine};
use crate::sentiment::SentimentAnalyzer;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: String) {
    cfg.service(web::resource("/api/v1/analyze-media").route(web::post().to(analyze_media)))
        .service(web::resource("/api/v1/health").route(web::get().to(health)))
        .service(Files::new("/static", frontend_dir).show_files_listing());
}

async fn health(sentiment: web::Data<Option<SentimentAnalyzer>>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "sentiment_enabled": sentiment.get_ref().is_some(),
    }))
}

struct Upload {
    bytes: Vec<u8>,
    file_name: String,
    content_type: String,
}

async fn read_upload(payload: &mut Multipart) -> Result<Option<Upload>, Error> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or("upload")
            .to_string();
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            bytes.write_all(&data)?;
        }
        if !bytes.is_empty() {
            return Ok(Some(Upload {
                bytes,
                file_name,
                content_type,
            }));
        }
    }
    Ok(None)
}

#[derive(Debug, PartialEq)]
enum ModerationGate {
    Evaluate,
    SkipVideo,
    Off,
}

/// Moderation runs only for synthetic images; synthetic videos get the
/// skipped placeholder until frame-level moderation lands.
fn moderation_gate(is_synthetic: bool, content_type: &str) -> ModerationGate {
    if !is_synthetic {
        return ModerationGate::Off;
    }
    if content_type.starts_with("image/") {
        ModerationGate::Evaluate
    } else if content_type.starts_with("video/") {
        ModerationGate::SkipVideo
    } else {
        ModerationGate::Off
    }
}

async fn analyze_media(
    detector: web::Data<DeepfakeDetector>,
    sentiment: web::Data<Option<SentimentAnalyzer>>,
    moderator: web::Data<ModerationEngine>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let upload = match read_upload(&mut payload).await? {
        Some(upload) => upload,
        None => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: "No file field in multipart payload".into(),
            }));
        }
    };

    // Temp files live in RAII guards: every exit path below deletes them.
    let temp = match TempMedia::persist_upload(&upload.bytes, &upload.file_name) {
        Ok(temp) => temp,
        Err(MediaError::Empty) => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: "Uploaded file is empty".into(),
            }));
        }
        Err(MediaError::TooLarge(limit)) => {
            return Ok(HttpResponse::PayloadTooLarge().json(ErrorResponse {
                error: format!("Uploaded file exceeds {} bytes", limit),
            }));
        }
        Err(e) => {
            error!("Failed to persist upload {}: {e}", upload.file_name);
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to store uploaded file".into(),
            }));
        }
    };

    // Videos are analyzed through a single representative frame.
    let frame = if upload.content_type.starts_with("video/") {
        match media::extract_first_frame(temp.path()) {
            Ok(frame) => Some(frame),
            Err(e) => {
                info!("Frame extraction failed for {}: {e}", upload.file_name);
                return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Unsupported media: could not extract a video frame".into(),
                }));
            }
        }
    } else {
        None
    };

    let first_try = frame.as_ref().map_or(temp.path(), |f| f.path());
    let (frame, verdict) = match detector.detect_path(first_try) {
        Ok(verdict) => (frame, verdict),
        // Uploads sometimes declare an image content type but only decode
        // as video containers; try a frame before giving up.
        Err(InferenceError::Decode(e)) if frame.is_none() => {
            info!(
                "Image decode failed for {}, trying frame extraction: {e}",
                upload.file_name
            );
            let extracted = match media::extract_first_frame(temp.path()) {
                Ok(extracted) => extracted,
                Err(_) => {
                    return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                        error: "Unsupported media: file is neither a decodable image nor a video"
                            .into(),
                    }));
                }
            };
            match detector.detect_path(extracted.path()) {
                Ok(verdict) => (Some(extracted), verdict),
                Err(e) => {
                    error!("Authenticity analysis failed for {}: {e}", upload.file_name);
                    return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                        error: "Authenticity analysis failed.".into(),
                    }));
                }
            }
        }
        Err(e) => {
            error!("Authenticity analysis failed for {}: {e}", upload.file_name);
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Authenticity analysis failed.".into(),
            }));
        }
    };
    let analysis_path = frame.as_ref().map_or(temp.path(), |f| f.path());

    let sentiment_result = sentiment
        .get_ref()
        .as_ref()
        .and_then(|analyzer| analyzer.analyze_path(analysis_path));

    let moderation = match moderation_gate(verdict.is_synthetic, &upload.content_type) {
        ModerationGate::Evaluate => Some(moderator.evaluate_safety(temp.path()).await),
        ModerationGate::SkipVideo => Some(moderation::video_moderation_placeholder()),
        ModerationGate::Off => None,
    };

    info!(
        "Analyzed {}: label={} score={:.4} synthetic={}",
        upload.file_name, verdict.detected_label, verdict.authenticity_score, verdict.is_synthetic
    );

    Ok(HttpResponse::Ok().json(AnalysisResponse {
        is_synthetic: verdict.is_synthetic,
        authenticity_score: verdict.authenticity_score,
        detected_label: verdict.detected_label,
        file_name: upload.file_name,
        content_type: upload.content_type,
        sentiment: sentiment_result,
        moderation,
        debug_info: Some(verdict.all_predictions),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_requires_synthetic_verdict() {
        assert_eq!(moderation_gate(false, "image/png"), ModerationGate::Off);
        assert_eq!(moderation_gate(false, "video/mp4"), ModerationGate::Off);
    }

    #[test]
    fn synthetic_images_are_moderated() {
        assert_eq!(
            moderation_gate(true, "image/png"),
            ModerationGate::Evaluate
        );
        assert_eq!(
            moderation_gate(true, "image/jpeg"),
            ModerationGate::Evaluate
        );
    }

    #[test]
    fn synthetic_videos_are_skipped_not_moderated() {
        assert_eq!(moderation_gate(true, "video/mp4"), ModerationGate::SkipVideo);
    }

    #[test]
    fn unknown_content_types_are_not_moderated() {
        assert_eq!(
            moderation_gate(true, "application/octet-stream"),
            ModerationGate::Off
        );
    }
}

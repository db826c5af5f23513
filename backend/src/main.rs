use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use std::env;
use std::path::Path;

use backend::config::Settings;
use backend::detection::DeepfakeDetector;
use backend::moderation::ModerationEngine;
use backend::routes::configure_routes;
use backend::sentiment::SentimentAnalyzer;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let settings = Settings::from_env();

    let frontend_dir = if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        format!("{}/../static", manifest_dir)
    } else {
        "/usr/src/app/static".to_string()
    };

    let detector = match DeepfakeDetector::load(Path::new(&settings.deepfake_model_dir)) {
        Ok(detector) => detector,
        Err(e) => {
            log::error!("Failed to preload deepfake model at startup: {e}");
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Model loading failed: {e}"),
            ));
        }
    };
    log::info!(
        "Deepfake model loaded from {}",
        settings.deepfake_model_dir
    );

    // Sentiment is optional: a missing checkpoint disables the stage.
    let sentiment = match SentimentAnalyzer::load(Path::new(&settings.sentiment_model_dir)) {
        Ok(analyzer) => {
            log::info!("Sentiment model loaded from {}", settings.sentiment_model_dir);
            Some(analyzer)
        }
        Err(e) => {
            log::warn!("Sentiment model unavailable, stage disabled: {e}");
            None
        }
    };

    let moderator = ModerationEngine::new(settings.ollama_url.clone(), settings.ollama_model.clone());
    log::info!(
        "Moderation endpoint: {} (model {})",
        settings.ollama_url,
        settings.ollama_model
    );

    let bind_address = format!("0.0.0.0:{}", settings.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(detector.clone()))
            .app_data(web::Data::new(sentiment.clone()))
            .app_data(web::Data::new(moderator.clone()))
            .configure(|cfg| configure_routes(cfg, frontend_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}

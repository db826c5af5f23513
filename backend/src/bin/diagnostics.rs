//! Environment diagnostic for the media analysis service: verifies the
//! classifier checkpoints load, the Ollama server answers, and the analysis
//! pipeline runs end to end on a generated test image.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};

use backend::config::Settings;
use backend::detection::DeepfakeDetector;
use backend::media::TempMedia;
use backend::sentiment::SentimentAnalyzer;

fn print_check(name: &str, success: bool, message: &str) {
    let status = if success { "[PASS]" } else { "[FAIL]" };
    println!("{status:8} {name}");
    if !message.is_empty() {
        println!("   -> {message}");
    }
    println!("{}", "-".repeat(50));
}

fn red_test_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(100, 100, Rgb([255, 0, 0]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("failed to encode diagnostic PNG");
    bytes
}

#[actix_web::main]
async fn main() {
    dotenv::dotenv().ok();
    let settings = Settings::from_env();

    println!("--- Starting Full System Diagnostic ---");

    println!("1. Checking deepfake model...");
    let detector = match DeepfakeDetector::load(Path::new(&settings.deepfake_model_dir)) {
        Ok(detector) => {
            print_check(
                "Deepfake Model Loading",
                true,
                &format!("Successfully loaded '{}'.", settings.deepfake_model_dir),
            );
            Some(detector)
        }
        Err(e) => {
            print_check(
                "Deepfake Model Loading",
                false,
                &format!("Could not load model. Check DEEPFAKE_MODEL_DIR. Error: {e}"),
            );
            None
        }
    };

    println!("2. Checking sentiment model...");
    match SentimentAnalyzer::load(Path::new(&settings.sentiment_model_dir)) {
        Ok(_) => print_check(
            "Sentiment Model Loading",
            true,
            &format!("Successfully loaded '{}'.", settings.sentiment_model_dir),
        ),
        Err(e) => print_check(
            "Sentiment Model Loading",
            false,
            &format!("Sentiment stage will be disabled. Error: {e}"),
        ),
    }

    println!("3. Checking Ollama server connection...");
    let base_url = settings.ollama_url.trim_end_matches("/api/chat");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("failed to build diagnostic HTTP client");
    match client.get(base_url).send().await {
        Ok(response) if response.status().is_success() => print_check(
            "Ollama Connection",
            true,
            &format!("Successfully connected to Ollama at {base_url}."),
        ),
        Ok(response) => print_check(
            "Ollama Connection",
            false,
            &format!(
                "Received an error from Ollama server: {}",
                response.status()
            ),
        ),
        Err(_) => print_check(
            "Ollama Connection",
            false,
            "Connection failed. Is the Ollama server running locally?",
        ),
    }

    println!("4. Testing core analysis pipeline...");
    let Some(detector) = detector else {
        print_check(
            "Core Logic Test",
            false,
            "Skipping test because the deepfake detector failed to load.",
        );
        return;
    };

    let png = red_test_png();
    let result = TempMedia::persist_upload(&png, "diagnostic_test.png")
        .map_err(|e| e.to_string())
        .and_then(|temp| {
            detector
                .detect_path(temp.path())
                .map_err(|e| e.to_string())
        });

    match result {
        Ok(verdict) => {
            print_check(
                "Core Logic Test",
                true,
                "Pipeline executed and returned the expected structure.",
            );
            println!(
                "   -> Sample Result: {{'is_synthetic': {}, 'authenticity_score': {}, 'detected_label': '{}'}}",
                verdict.is_synthetic, verdict.authenticity_score, verdict.detected_label
            );
        }
        Err(e) => print_check(
            "Core Logic Test",
            false,
            &format!("An unexpected error occurred: {e}"),
        ),
    }

    println!("--- Diagnostic Complete ---");
    println!("If all checks passed, the application is likely configured correctly.");
}

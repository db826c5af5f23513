use std::path::Path;
use std::process::Command;

use tempfile::Builder;

use super::{MediaError, TempMedia};

/// Extracts the first frame of a video into its own temp file via ffmpeg.
///
/// The returned guard cleans the frame up alongside the upload's own temp
/// file when the request ends.
pub fn extract_first_frame(video_path: &Path) -> Result<TempMedia, MediaError> {
    let frame = Builder::new()
        .prefix("media-analysis-frame-")
        .suffix(".png")
        .tempfile()?;

    let video = video_path.to_str().ok_or(MediaError::FrameExtraction)?;
    let target = frame
        .path()
        .to_str()
        .ok_or(MediaError::FrameExtraction)?
        .to_string();

    // -y: ffmpeg must overwrite the already-created temp file.
    let output = Command::new("ffmpeg")
        .args(["-y", "-i", video, "-frames:v", "1", "-f", "image2", &target])
        .output();

    match output {
        Ok(result) if result.status.success() => {}
        Ok(result) => {
            log::warn!("ffmpeg failed: {}", String::from_utf8_lossy(&result.stderr));
            return Err(MediaError::FrameExtraction);
        }
        Err(e) => {
            log::warn!("ffmpeg not available: {}", e);
            return Err(MediaError::FrameExtraction);
        }
    }

    // ffmpeg can exit zero without producing output for audio-only input.
    if std::fs::metadata(frame.path()).map(|m| m.len()).unwrap_or(0) == 0 {
        return Err(MediaError::FrameExtraction);
    }

    Ok(TempMedia { file: frame })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn garbage_input_does_not_yield_a_frame() {
        let mut bogus = tempfile::Builder::new()
            .suffix(".mp4")
            .tempfile()
            .unwrap();
        bogus.write_all(b"this is not a video container").unwrap();

        assert!(matches!(
            extract_first_frame(bogus.path()),
            Err(MediaError::FrameExtraction)
        ));
    }
}

pub mod frames;

use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::config::MAX_UPLOAD_BYTES;

pub use frames::extract_first_frame;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Empty upload")]
    Empty,
    #[error("Upload exceeds {0} bytes")]
    TooLarge(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not extract a frame from the video")]
    FrameExtraction,
}

/// An uploaded file persisted to a scoped temporary path.
///
/// The file is deleted when this guard drops, so a request can never leak
/// its temp file regardless of which path it exits through.
pub struct TempMedia {
    file: NamedTempFile,
}

impl TempMedia {
    /// Writes the upload to a temp file carrying the original extension so
    /// downstream decoders can sniff the container type from the name.
    pub fn persist_upload(bytes: &[u8], original_name: &str) -> Result<Self, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(MediaError::TooLarge(MAX_UPLOAD_BYTES));
        }

        let suffix = Path::new(original_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut file = Builder::new()
            .prefix("media-analysis-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn upload_is_written_with_original_extension() {
        let media = TempMedia::persist_upload(b"png bytes", "holiday photo.PNG").unwrap();
        assert!(media.path().exists());
        assert!(media.path().to_string_lossy().ends_with(".PNG"));
        assert_eq!(std::fs::read(media.path()).unwrap(), b"png bytes");
    }

    #[test]
    fn extensionless_uploads_still_persist() {
        let media = TempMedia::persist_upload(b"raw", "upload").unwrap();
        assert!(media.path().exists());
    }

    #[test]
    fn temp_file_is_removed_on_drop() {
        let path: PathBuf;
        {
            let media = TempMedia::persist_upload(b"ephemeral", "clip.mp4").unwrap();
            path = media.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn empty_upload_is_rejected() {
        assert!(matches!(
            TempMedia::persist_upload(b"", "empty.png"),
            Err(MediaError::Empty)
        ));
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let bytes = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            TempMedia::persist_upload(&bytes, "huge.png"),
            Err(MediaError::TooLarge(_))
        ));
    }
}

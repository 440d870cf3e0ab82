//! Resolution of image references to bytes for the CV stage.

use crate::errors::ExecutorError;
use crate::models::ImageReference;
use async_trait::async_trait;

/// Outcome of resolving an image reference.
#[derive(Debug)]
pub enum ImageLoad {
    /// The reference carries no byte source this loader understands.
    /// The CV stage is skipped with the given reason.
    NoSource(String),
    /// Raw image bytes.
    Loaded(Vec<u8>),
    /// The source exists but could not be read. The CV stage fails.
    Failed(ExecutorError),
}

/// Turns an [`ImageReference`] into bytes.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Loads the referenced image.
    async fn load(&self, reference: &ImageReference) -> ImageLoad;
}

/// Reads `file_path` from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageSource;

#[async_trait]
impl ImageSource for FileImageSource {
    async fn load(&self, reference: &ImageReference) -> ImageLoad {
        let Some(path) = reference.path() else {
            return ImageLoad::NoSource("No file_path in image_references".to_string());
        };

        match tokio::fs::read(path).await {
            Ok(bytes) if bytes.is_empty() => ImageLoad::Failed(ExecutorError::invalid_output(
                format!("Image file is empty: {}", path.display()),
            )),
            Ok(bytes) => ImageLoad::Loaded(bytes),
            Err(e) => ImageLoad::Failed(ExecutorError::failed(format!(
                "Failed to read image {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        let reference = ImageReference::from_path(file.path());
        match FileImageSource.load(&reference).await {
            ImageLoad::Loaded(bytes) => assert_eq!(bytes, b"\x89PNG fake"),
            other => panic!("expected bytes, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_without_path() {
        let reference = ImageReference::from_attributes(
            [("url".to_string(), serde_json::json!("http://pacs/1"))]
                .into_iter()
                .collect(),
        );
        match FileImageSource.load(&reference).await {
            ImageLoad::NoSource(reason) => assert_eq!(reason, "No file_path in image_references"),
            other => panic!("expected NoSource, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let reference = ImageReference::from_path(dir.path().join("missing.png"));

        match FileImageSource.load(&reference).await {
            ImageLoad::Failed(err) => assert!(err.to_string().contains("missing.png")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_empty_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let reference = ImageReference::from_path(file.path());

        match FileImageSource.load(&reference).await {
            ImageLoad::Failed(err) => assert_eq!(err.kind(), "invalid_output"),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}

//! Error types for the fovea capture pipeline.

use thiserror::Error;

/// Result type alias using fovea's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fovea operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Image bytes could not be decoded.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// The photo source could not be enumerated.
    #[error("Photo source error: {0}")]
    PhotoSource(String),

    /// Extraction response was structurally unusable.
    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),

    /// Extraction produced empty content for a non-skip write.
    #[error("Extraction returned no content for asset {0}")]
    NoContent(String),

    /// HTTP/network request failed.
    #[error("Request error: {0}")]
    Request(String),

    /// Vault write or merge failed.
    #[error("Write error: {0}")]
    Write(String),

    /// Persistent state could not be loaded or saved.
    #[error("State error: {0}")]
    State(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_image_decode() {
        let err = Error::ImageDecode("truncated JPEG".to_string());
        assert_eq!(err.to_string(), "Image decode error: truncated JPEG");
    }

    #[test]
    fn test_error_display_no_content() {
        let err = Error::NoContent("ASSET-42".to_string());
        assert_eq!(
            err.to_string(),
            "Extraction returned no content for asset ASSET-42"
        );
    }

    #[test]
    fn test_error_display_invalid_response() {
        let err = Error::InvalidResponse("not JSON".to_string());
        assert_eq!(err.to_string(), "Invalid extraction response: not JSON");
    }

    #[test]
    fn test_error_display_write() {
        let err = Error::Write("rename failed".to_string());
        assert_eq!(err.to_string(), "Write error: rename failed");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}

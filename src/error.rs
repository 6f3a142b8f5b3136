//! Error types for scribed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribedError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Startup errors
    #[error("Model '{model}' is not loaded; restart the server")]
    ModelNotLoaded { model: String },

    #[error("Model sidecar failed to start: {message}")]
    SidecarStartup { message: String },

    #[error("Model sidecar protocol error: {message}")]
    SidecarProtocol { message: String },

    // Job processing errors
    #[error("Media transcode failed: {message}")]
    MediaTranscodeFailed { message: String },

    #[error("Processing failed: {message}")]
    ProcessingFailed { message: String },

    // Callback delivery (logged only, never surfaced to the job outcome)
    #[error("Callback delivery failed: {message}")]
    CallbackDeliveryFailed { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScribedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = ScribedError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_model_not_loaded_display() {
        let error = ScribedError::ModelNotLoaded {
            model: "large-v3".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Model 'large-v3' is not loaded; restart the server"
        );
    }

    #[test]
    fn test_transcode_failed_display() {
        let error = ScribedError::MediaTranscodeFailed {
            message: "unsupported codec".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Media transcode failed: unsupported codec"
        );
    }

    #[test]
    fn test_processing_failed_display() {
        let error = ScribedError::ProcessingFailed {
            message: "CUDA out of memory".to_string(),
        };
        assert_eq!(error.to_string(), "Processing failed: CUDA out of memory");
    }

    #[test]
    fn test_callback_delivery_failed_display() {
        let error = ScribedError::CallbackDeliveryFailed {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Callback delivery failed: connection refused"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: ScribedError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: ScribedError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ScribedError>();
        assert_sync::<ScribedError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}

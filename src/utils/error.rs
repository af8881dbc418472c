use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Model artifact load failed: {0}")]
    ArtifactLoad(String),

    #[error("Compute device error: {0}")]
    Device(String),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PredictError {
    pub fn shape_mismatch(expected: impl std::fmt::Debug, actual: impl std::fmt::Debug) -> Self {
        PredictError::ShapeMismatch {
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PredictError::ArtifactLoad(_) => "ARTIFACT_LOAD_ERROR",
            PredictError::Device(_) => "DEVICE_ERROR",
            PredictError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            PredictError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            PredictError::Inference(_) => "INFERENCE_ERROR",
            PredictError::InvalidInput(_) => "INVALID_INPUT",
            PredictError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            PredictError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            PredictError::Config(_) => "CONFIG_ERROR",
            PredictError::Io(_) => "IO_ERROR",
            PredictError::Ort(_) => "ORT_ERROR",
            PredictError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Per-call input problems; the caller may retry with another image.
    /// Everything else means the loaded model or device cannot be trusted.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PredictError::ImageDecode(_)
                | PredictError::InvalidInput(_)
                | PredictError::FileTooLarge(_, _)
                | PredictError::UnsupportedFormat(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_recoverable() {
        let err = PredictError::ImageDecode(image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        )));
        assert!(err.is_recoverable());
        assert_eq!(err.error_code(), "IMAGE_DECODE_ERROR");
    }

    #[test]
    fn model_errors_are_fatal() {
        assert!(!PredictError::ArtifactLoad("gone".into()).is_recoverable());
        assert!(!PredictError::Device("cuda".into()).is_recoverable());
        assert!(!PredictError::shape_mismatch([1, 2], [1, 3]).is_recoverable());
    }

    #[test]
    fn shape_mismatch_message_lists_both_shapes() {
        let err = PredictError::shape_mismatch([1, 2], vec![1usize, 1000]);
        assert_eq!(
            err.to_string(),
            "Shape mismatch: expected [1, 2], got [1, 1000]"
        );
    }
}

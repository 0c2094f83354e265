use miette::Diagnostic;
use thiserror::Error;

/// Main error type for qrstyle operations
#[derive(Error, Diagnostic, Debug)]
pub enum QrError {
    #[error("QR code is not ready: the current frame has not finished drawing")]
    #[diagnostic(
        code(qrstyle::not_ready),
        help("Wait for the draw to complete and try the export again")
    )]
    NotReady,

    #[error("Drawable surface unavailable: {message}")]
    #[diagnostic(code(qrstyle::surface))]
    SurfaceUnavailable { message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(qrstyle::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(qrstyle::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(qrstyle::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation error: {message}")]
    #[diagnostic(code(qrstyle::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Encode error: {message}")]
    #[diagnostic(code(qrstyle::encode))]
    Encode { message: String },

    #[error("Build error: {message}")]
    #[diagnostic(code(qrstyle::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl QrError {
    /// Whether retrying the same operation later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QrError::NotReady)
    }
}

pub type Result<T> = std::result::Result<T, QrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_is_retryable() {
        assert!(QrError::NotReady.is_retryable());
        assert!(!QrError::SurfaceUnavailable {
            message: "never mounted".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_messages_are_actionable() {
        let err = QrError::SurfaceUnavailable {
            message: "renderer was never mounted".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Drawable surface unavailable: renderer was never mounted"
        );
    }
}

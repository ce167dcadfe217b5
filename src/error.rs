//! Error types for RAW preview extraction.
//!
//! Errors are values: every public operation returns `Result<_, ExtractError>`
//! and every `ExtractError` maps to exactly one [`ErrorCode`] for hosts that
//! need a stable status tag. Internal structural parse failures use
//! [`TiffError`] and are never fatal to an extraction; they terminate the
//! traversal that hit them and the candidates accumulated so far survive.

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// TiffError
// =============================================================================

/// Structural TIFF parse errors.
///
/// These surface from the header/IFD layer. Callers in the scan layer treat
/// them as "stop this traversal", not as extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TiffError {
    /// Buffer is shorter than a declared structure.
    #[error("file too small: need {required} bytes, have {actual}")]
    FileTooSmall { required: usize, actual: usize },

    /// Bytes 2..4 are not the TIFF magic 0x002A.
    #[error("invalid TIFF magic: {0:#06x}")]
    InvalidMagic(u16),

    /// An IFD offset points outside the buffer.
    #[error("IFD offset {0:#010x} out of bounds")]
    InvalidIfdOffset(u32),

    /// An IFD's declared entry table extends past the end of the buffer.
    #[error("truncated IFD at {0:#010x}")]
    TruncatedIfd(u32),
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Stable status tag for extraction failures.
///
/// `Success` exists for hosts mirroring the full status enum; the library
/// itself only produces the failure codes (success is the `Ok` arm).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Success,
    FileNotFound,
    FileAccessDenied,
    InvalidFormat,
    CorruptedFile,
    TimeoutExceeded,
    MemoryLimitExceeded,
    NoPreviewsFound,
    ValidationFailed,
    UnknownError,
}

// =============================================================================
// ExtractError
// =============================================================================

/// Failure of a public extraction operation.
///
/// Each variant corresponds to one [`ErrorCode`]; path-carrying variants keep
/// the path as context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The file could not be opened.
    #[error("failed to open file: {path}")]
    FileNotFound { path: String },

    /// The file exists but could not be read.
    #[error("access denied: {path}")]
    AccessDenied { path: String },

    /// The buffer is absent, too small, or carries no recognized header.
    #[error("{0}")]
    InvalidFormat(String),

    /// The file is shorter than its declared internal structures.
    #[error("{0}")]
    CorruptedFile(String),

    /// The wall-clock deadline expired at a pipeline checkpoint.
    #[error("operation timed out during {stage}")]
    TimeoutExceeded { stage: &'static str },

    /// An allocation attributable to this call would exceed the limit.
    #[error("{0}")]
    MemoryLimitExceeded(String),

    /// The format was recognized but no preview candidate survived.
    #[error("no previews found in RAW file")]
    NoPreviewsFound,

    /// The selected candidate failed JPEG validation.
    #[error("selected preview failed validation")]
    ValidationFailed,

    /// Anything that does not fit the codes above.
    #[error("{0}")]
    Unknown(String),
}

impl ExtractError {
    /// The stable status code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ExtractError::FileNotFound { .. } => ErrorCode::FileNotFound,
            ExtractError::AccessDenied { .. } => ErrorCode::FileAccessDenied,
            ExtractError::InvalidFormat(_) => ErrorCode::InvalidFormat,
            ExtractError::CorruptedFile(_) => ErrorCode::CorruptedFile,
            ExtractError::TimeoutExceeded { .. } => ErrorCode::TimeoutExceeded,
            ExtractError::MemoryLimitExceeded(_) => ErrorCode::MemoryLimitExceeded,
            ExtractError::NoPreviewsFound => ErrorCode::NoPreviewsFound,
            ExtractError::ValidationFailed => ErrorCode::ValidationFailed,
            ExtractError::Unknown(_) => ErrorCode::UnknownError,
        }
    }

    /// Optional context (the file path, when the operation had one).
    pub fn context(&self) -> Option<&str> {
        match self {
            ExtractError::FileNotFound { path } | ExtractError::AccessDenied { path } => {
                Some(path.as_str())
            }
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ExtractError::FileNotFound { path: "a.nef".into() }.code(),
            ErrorCode::FileNotFound
        );
        assert_eq!(
            ExtractError::InvalidFormat("bad".into()).code(),
            ErrorCode::InvalidFormat
        );
        assert_eq!(
            ExtractError::TimeoutExceeded { stage: "validation" }.code(),
            ErrorCode::TimeoutExceeded
        );
        assert_eq!(ExtractError::NoPreviewsFound.code(), ErrorCode::NoPreviewsFound);
        assert_eq!(ExtractError::ValidationFailed.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_error_context() {
        let err = ExtractError::FileNotFound { path: "shots/a.cr2".into() };
        assert_eq!(err.context(), Some("shots/a.cr2"));
        assert_eq!(ExtractError::NoPreviewsFound.context(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ExtractError::TimeoutExceeded { stage: "preview extraction" };
        assert_eq!(err.to_string(), "operation timed out during preview extraction");

        let err = TiffError::FileTooSmall { required: 8, actual: 4 };
        assert_eq!(err.to_string(), "file too small: need 8 bytes, have 4");
    }
}

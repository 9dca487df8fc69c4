//! Error type for the autodox library.
//!
//! Every failure in the pipeline is fatal to the request: there is no
//! partial document and no fallback formatting. [`AutodoxError`] still keeps
//! the stages apart so the cause can be logged precisely, while the HTTP
//! layer collapses everything except the upload errors into one
//! generic 500 response.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the autodox library.
#[derive(Debug, Error)]
pub enum AutodoxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The upload was missing, unnamed, or not a `.docx` file name.
    #[error("Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// The upload exceeded the server's body size limit.
    #[error("Upload exceeds the {limit}-byte limit")]
    UploadTooLarge { limit: usize },

    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The payload does not start with the ZIP signature every .docx has.
    #[error("Payload is not a .docx document (first bytes: {magic:?})")]
    NotADocx { magic: Vec<u8> },

    /// The archive opened but its WordprocessingML could not be read.
    #[error("Document is corrupt: {detail}")]
    CorruptDocx { detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API call failed.
    #[error("LLM API error after {attempts} attempt(s): {message}")]
    LlmApiError { attempts: u32, message: String },

    /// The LLM API call exceeded the configured timeout.
    #[error("LLM API call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Structure errors ──────────────────────────────────────────────────
    /// The model's answer is not JSON of the expected shape.
    #[error("Model response is not valid structure JSON: {detail}")]
    InvalidJson { detail: String },

    /// The model's answer parsed but violates a structural constraint.
    #[error("Model response has an invalid '{field}': {reason}")]
    InvalidStructure { field: String, reason: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Building or packaging the generated document failed.
    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutodoxError {
    /// Whether the caller sent something unusable (maps to HTTP 4xx).
    ///
    /// Everything else is a downstream failure and maps to HTTP 500.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AutodoxError::InvalidUpload { .. } | AutodoxError::UploadTooLarge { .. }
        )
    }

    /// Short stable label for the failing stage, used in log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            AutodoxError::InvalidUpload { .. } | AutodoxError::UploadTooLarge { .. } => {
                "validate"
            }
            AutodoxError::FileNotFound { .. }
            | AutodoxError::NotADocx { .. }
            | AutodoxError::CorruptDocx { .. } => "extract",
            AutodoxError::ProviderNotConfigured { .. }
            | AutodoxError::LlmApiError { .. }
            | AutodoxError::ApiTimeout { .. }
            | AutodoxError::InvalidJson { .. }
            | AutodoxError::InvalidStructure { .. } => "infer",
            AutodoxError::RenderFailed(_) | AutodoxError::OutputWriteFailed { .. } => "render",
            AutodoxError::InvalidConfig(_) => "config",
            AutodoxError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_structure_display() {
        let e = AutodoxError::InvalidStructure {
            field: "romanPageCount".into(),
            reason: "must be at least 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("romanPageCount"), "got: {msg}");
        assert!(msg.contains("at least 1"), "got: {msg}");
    }

    #[test]
    fn llm_error_display_includes_attempts() {
        let e = AutodoxError::LlmApiError {
            attempts: 3,
            message: "503 unavailable".into(),
        };
        assert!(e.to_string().contains("3 attempt"));
        assert!(e.to_string().contains("503"));
    }

    #[test]
    fn only_upload_errors_are_client_errors() {
        assert!(AutodoxError::InvalidUpload {
            reason: "missing file".into()
        }
        .is_client_error());
        assert!(!AutodoxError::InvalidJson {
            detail: "eof".into()
        }
        .is_client_error());
        assert!(!AutodoxError::NotADocx { magic: vec![0, 1] }.is_client_error());
    }

    #[test]
    fn stage_labels() {
        assert_eq!(AutodoxError::ApiTimeout { secs: 5 }.stage(), "infer");
        assert_eq!(
            AutodoxError::CorruptDocx {
                detail: "x".into()
            }
            .stage(),
            "extract"
        );
        assert_eq!(AutodoxError::RenderFailed("zip".into()).stage(), "render");
    }
}

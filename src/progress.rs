//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn FormatProgressCallback>`] via
//! [`crate::config::FormatConfigBuilder::progress_callback`] to be told when
//! each stage (extract, infer, render) starts and finishes. The CLI uses it
//! to drive its spinner; the server does not install one.
//!
//! # Example
//!
//! ```rust
//! use autodox::{FormatConfig, FormatProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl FormatProgressCallback for Printer {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{} took {}ms", stage, elapsed_ms);
//!     }
//! }
//!
//! let config = FormatConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn FormatProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The three downstream stages of a reformatting run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    Infer,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extract => "extract",
            Stage::Infer => "infer",
            Stage::Render => "render",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// config holding them is shared across server tasks.
pub trait FormatProgressCallback: Send + Sync {
    /// Called once before extraction, with the size of the uploaded document.
    fn on_format_start(&self, input_bytes: usize) {
        let _ = input_bytes;
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails. The run stops after this.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the document has been rendered.
    fn on_format_complete(&self, output_bytes: usize) {
        let _ = output_bytes;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl FormatProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FormatConfig`].
pub type ProgressCallback = Arc<dyn FormatProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_format_start(1024);
        cb.on_stage_start(Stage::Extract);
        cb.on_stage_complete(Stage::Extract, 3);
        cb.on_stage_error(Stage::Infer, "boom");
        cb.on_format_complete(2048);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Render.to_string(), "render");
    }
}

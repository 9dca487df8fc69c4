//! # autodox
//!
//! Reformat `.docx` documents using structure extracted by an LLM.
//!
//! An uploaded document is reduced to its plain text, a language model
//! reads that text and answers with the document's structure as JSON, and
//! a fresh `.docx` is generated from that structure alone: a front-matter
//! section numbered in lower-case roman numerals, followed by a body
//! numbered in arabic numerals holding the table of contents, the lists of
//! figures, tables and appendices, and an alphabetised bibliography.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx upload
//!  │
//!  ├─ 1. Validate  file name must end in .docx (HTTP 400 otherwise)
//!  ├─ 2. Extract   word/document.xml → paragraph text (zip + quick-xml)
//!  ├─ 3. Infer     one completion call → StructuredDocument JSON
//!  ├─ 4. Render    two-section document via docx-rs, bibliography sorted
//!  └─ 5. Respond   attachment `formatted_autodox.docx`
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use autodox::{format_file, FormatConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Gemini provider by default; reads GEMINI_API_KEY
//!     let config = FormatConfig::default();
//!     let stats = format_file("thesis.docx", "formatted_autodox.docx", &config).await?;
//!     eprintln!("tokens: {} in / {} out", stats.input_tokens, stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | The axum router behind `POST /format` |
//! | `cli`    | on      | The `autodox` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable both when using only the library:
//! ```toml
//! autodox = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FormatConfig, FormatConfigBuilder, SectionLabels, ServerConfig};
pub use error::AutodoxError;
pub use format::{
    format_document, format_file, format_sync, format_with_backend, infer_document, infer_file,
    validate_upload_name, OUTPUT_FILENAME,
};
pub use model::{ListEntry, Reference, StructuredDocument};
pub use output::{FormatOutput, FormatStats};
pub use pipeline::infer::{BackendError, Completion, CompletionBackend, LlmBackend};
pub use progress::{FormatProgressCallback, NoopProgressCallback, ProgressCallback, Stage};

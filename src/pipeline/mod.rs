//! Pipeline stages for document reformatting.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the orchestration in [`crate::format`] stays a
//! straight line.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ infer ──▶ postprocess ──▶ render
//!  (.docx)    (LLM)     (JSON cleanup)   (.docx)
//! ```
//!
//! 1. [`extract`]: unzip the upload and collect the text of `word/document.xml`
//! 2. [`infer`]: prompt the model through a [`infer::CompletionBackend`];
//!    the only stage with network I/O
//! 3. [`postprocess`]: strip fences and invisible characters from the answer
//!    before it is parsed as JSON
//! 4. [`render`]: lay out front matter and body, package a new `.docx`

pub mod extract;
pub mod infer;
pub mod postprocess;
pub mod render;

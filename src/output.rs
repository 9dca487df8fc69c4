//! Result types of a reformatting run.

use crate::model::StructuredDocument;
use serde::{Deserialize, Serialize};

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct FormatOutput {
    /// The generated `.docx` bytes.
    pub document: Vec<u8>,
    /// The validated structure the document was rendered from.
    pub structure: StructuredDocument,
    pub stats: FormatStats,
}

/// Sizes, token usage and per-stage timings of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatStats {
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub paragraphs: usize,
    pub extracted_chars: usize,
    /// Whether the text was cut to `max_prompt_chars` before prompting.
    pub truncated: bool,
    pub input_tokens: usize,
    pub output_tokens: usize,
    /// Completion calls made, including the successful one.
    pub attempts: u32,
    pub extract_duration_ms: u64,
    pub infer_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}


//! Prompt for LLM-based structure extraction.
//!
//! The prompt lives here, apart from the call and retry logic in
//! [`crate::pipeline::infer`], so tests can inspect it without a model.
//! Callers can override the instruction via
//! [`crate::config::FormatConfig::system_prompt`]; the document text is
//! always appended by [`build_prompt`].

/// Default instruction for extracting document structure as JSON.
///
/// The schema shown here is the one [`crate::model::StructuredDocument`]
/// deserialises.
pub const STRUCTURE_PROMPT: &str = r#"Extract the structure of the document text below and return it as JSON.

Return ONLY a single JSON object with exactly these fields:
{
  "tableOfContents": [{"title": "...", "pageNumber": 1}],
  "figures": [{"title": "...", "pageNumber": 1}],
  "tables": [{"title": "...", "pageNumber": 1}],
  "appendices": [{"title": "...", "pageNumber": 1}],
  "references": [{"authors": "...", "year": 2024, "title": "...", "source": "..."}],
  "romanPageCount": 3
}

Rules:
- "tableOfContents" lists chapter and section headings in reading order.
- "figures", "tables" and "appendices" list captions in reading order.
- "pageNumber" is the estimated body page (starting at 1) where the item appears.
- "references" lists every bibliography entry; "year" is a number.
- "romanPageCount" is the number of preliminary pages (at least 1) needed
  before the body: title page plus front-matter lists.
- Use empty arrays for element kinds that do not occur.
- Do NOT wrap the JSON in Markdown fences and do NOT add commentary."#;

/// Assemble the full prompt: instruction followed by the document text.
pub fn build_prompt(instruction: &str, document_text: &str) -> String {
    format!("{}\n\nDocument:\n{}", instruction, document_text)
}

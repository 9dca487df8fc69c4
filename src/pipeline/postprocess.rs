//! Post-processing: deterministic cleanup of the model's raw answer.
//!
//! The prompt asks for bare JSON, but models regularly wrap it in a
//! ` ```json ` fence or prefix a byte-order mark. These rules remove that
//! packaging and nothing else: the JSON itself is never repaired, so a
//! malformed answer still fails parsing.
//!
//! ## Rule Order
//!
//! Invisible characters go first so a BOM in front of the fence does not
//! hide it; fences are stripped before the final trim.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw completion text.
///
/// Rules (applied in order):
/// 1. Strip invisible Unicode (BOM, zero-width spaces)
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip an outer Markdown code fence, with or without a language tag
/// 4. Trim surrounding whitespace
pub fn clean_response(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = normalise_line_endings(&s);
    let s = strip_code_fences(&s);
    s.trim().to_string()
}

// ── Rule 1: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{FEFF}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\n(.*?)\n?```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fence_no_lang() {
        let input = "```\n{\"a\": 1}\n```\n";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_no_fence_passthrough() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_inner_fence_untouched() {
        let input = "note:\n```json\n{}\n```";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_bom_before_fence() {
        let input = "\u{FEFF}```json\r\n{\"x\": [1, 2]}\r\n```";
        assert_eq!(clean_response(input), "{\"x\": [1, 2]}");
    }

    #[test]
    fn test_plain_json_trimmed() {
        assert_eq!(clean_response("  \n{\"ok\": true}\n\n"), "{\"ok\": true}");
    }

    #[test]
    fn test_non_json_left_alone() {
        let text = "I could not find any structure in this document.";
        assert_eq!(clean_response(text), text);
    }
}

//! The structured document returned by the model.
//!
//! A [`StructuredDocument`] lives for exactly one request: it is parsed from
//! the model's JSON answer, validated, rendered, and dropped. Field names on
//! the wire are camelCase (`tableOfContents`, `pageNumber`,
//! `romanPageCount`); the shorter names `toc`, `page` and `romanPages` are
//! accepted as aliases.

use crate::error::AutodoxError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Largest front-matter page count accepted from the model.
pub const MAX_ROMAN_PAGES: u32 = 100;

/// One line of a generated list: a caption and the page it appears on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub title: String,
    #[serde(alias = "page")]
    pub page_number: u32,
}

/// One bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub authors: String,
    pub year: i32,
    pub title: String,
    pub source: String,
}

impl Reference {
    /// Citation line as it appears in the bibliography.
    pub fn citation(&self) -> String {
        format!(
            "{} ({}). {}. {}.",
            self.authors, self.year, self.title, self.source
        )
    }
}

/// Document structure inferred from the uploaded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDocument {
    #[serde(alias = "toc")]
    pub table_of_contents: Vec<ListEntry>,
    pub figures: Vec<ListEntry>,
    pub tables: Vec<ListEntry>,
    pub appendices: Vec<ListEntry>,
    pub references: Vec<Reference>,
    #[serde(alias = "romanPages")]
    pub roman_page_count: u32,
}

impl StructuredDocument {
    /// Check the constraints serde cannot express.
    ///
    /// Serde already guarantees every field is present and correctly typed;
    /// this rejects values that would render nonsense.
    pub fn validate(&self) -> Result<(), AutodoxError> {
        if self.roman_page_count == 0 {
            return Err(invalid("romanPageCount", "must be at least 1".into()));
        }
        if self.roman_page_count > MAX_ROMAN_PAGES {
            return Err(invalid(
                "romanPageCount",
                format!(
                    "{} exceeds the maximum of {}",
                    self.roman_page_count, MAX_ROMAN_PAGES
                ),
            ));
        }

        for (field, entries) in [
            ("tableOfContents", &self.table_of_contents),
            ("figures", &self.figures),
            ("tables", &self.tables),
            ("appendices", &self.appendices),
        ] {
            if let Some(i) = entries.iter().position(|e| e.title.trim().is_empty()) {
                return Err(invalid(field, format!("entry {} has an empty title", i)));
            }
        }

        if let Some(i) = self
            .references
            .iter()
            .position(|r| r.authors.trim().is_empty())
        {
            return Err(invalid(
                "references",
                format!("entry {} has empty authors", i),
            ));
        }

        Ok(())
    }

    /// Number of entries across all generated lists.
    pub fn entry_count(&self) -> usize {
        self.table_of_contents.len()
            + self.figures.len()
            + self.tables.len()
            + self.appendices.len()
            + self.references.len()
    }

    /// References in bibliography order: by author, then by year.
    ///
    /// The sort is stable, so entries equal on both keys keep the model's
    /// order.
    pub fn sorted_references(&self) -> Vec<Reference> {
        let mut refs = self.references.clone();
        refs.sort_by(compare_references);
        refs
    }
}

/// Bibliography ordering: author (case-insensitive, then exact), then year.
pub fn compare_references(a: &Reference, b: &Reference) -> Ordering {
    compare_authors(&a.authors, &b.authors).then(a.year.cmp(&b.year))
}

fn compare_authors(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn invalid(field: &str, reason: String) -> AutodoxError {
    AutodoxError::InvalidStructure {
        field: field.to_string(),
        reason,
    }
}

//! Per-page PDF text extraction.
//!
//! Thin wrapper over `pdf-extract` that returns one text string per page
//! and enforces the "no silent empty success" rule: an unreadable PDF or
//! one with no extractable text (scanned images, empty pages only) fails
//! with [`PipelineError::Extraction`] instead of yielding zero chunks.

use crate::error::{PipelineError, Result};

/// Pages with fewer non-whitespace characters than this are treated as
/// empty (page numbers, decorative headers).
const MIN_PAGE_CHARS: usize = 50;

/// A page of extracted text with its 1-based page number. Pages below the
/// minimum text threshold are dropped before this struct is built.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: i64,
    pub text: String,
}

/// Extract per-page text from PDF bytes.
///
/// Returns pages in document order, skipping empty ones. Fails when the
/// PDF cannot be parsed or no page carries extractable text.
pub fn extract_pages(bytes: &[u8], path: &str) -> Result<Vec<Page>> {
    let raw_pages =
        pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| PipelineError::Extraction {
            path: path.to_string(),
            detail: e.to_string(),
        })?;

    let pages: Vec<Page> = raw_pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, text)| {
            let trimmed = text.trim();
            if trimmed.chars().filter(|c| !c.is_whitespace()).count() < MIN_PAGE_CHARS {
                return None;
            }
            Some(Page {
                number: i as i64 + 1,
                text: normalize_whitespace(trimmed),
            })
        })
        .collect();

    if pages.is_empty() {
        return Err(PipelineError::Extraction {
            path: path.to_string(),
            detail: "no text-based content found (scanned or empty PDF?)".to_string(),
        });
    }

    Ok(pages)
}

/// Collapse runs of spaces and tabs while keeping line structure, which the
/// chunker needs for heading detection.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let collapsed: Vec<&str> = line.split_whitespace().collect();
        if !collapsed.is_empty() {
            out.push_str(&collapsed.join(" "));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_is_an_extraction_error() {
        let err = extract_pages(b"not a pdf", "bad.pdf").unwrap_err();
        match err {
            PipelineError::Extraction { path, .. } => assert_eq!(path, "bad.pdf"),
            other => panic!("expected Extraction error, got {:?}", other),
        }
    }

    #[test]
    fn whitespace_normalization_keeps_lines() {
        let text = "Chapter  1:   Heat\n\n  Heat flows   from hot to cold.  ";
        let out = normalize_whitespace(text);
        assert_eq!(out, "Chapter 1: Heat\n\nHeat flows from hot to cold.");
    }
}

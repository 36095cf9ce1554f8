//! Overlapping fixed-window text chunker with heading inference.
//!
//! Splits each extracted page into windows of `chunk_size` characters with
//! `chunk_overlap` characters shared between consecutive windows; the final
//! partial window is kept. A page shorter than `chunk_size` yields exactly
//! one chunk. Chapter and topic labels are inferred from heading-like lines
//! and carried forward across pages until a new heading appears.
//!
//! Chunk IDs are derived from the source file stem, the ingestion run
//! timestamp, a running index, and a SHA-256 prefix of the content, so
//! repeated or overlapping ingests of different files never collide.

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::classify::classify;
use crate::config::ChunkingConfig;
use crate::extract::Page;
use crate::models::{Chunk, ChunkMetadata};

/// Placeholder used until the first recognized heading.
pub const UNCLASSIFIED: &str = "Unclassified";

pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_chars: usize,
    chapter_re: Regex,
    numbered_topic_re: Regex,
    labeled_topic_re: Regex,
    current_chapter: String,
    current_topic: String,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            min_chunk_chars: config.min_chunk_chars,
            chapter_re: Regex::new(r"(?i)^(?:chapter|unit|lesson)\s+(\d+)\s*[:.\-]?\s*(.*)$")
                .expect("chapter pattern"),
            numbered_topic_re: Regex::new(r"^(\d+\.\d+)\s+(\S.*)$").expect("topic pattern"),
            labeled_topic_re: Regex::new(r"(?i)^(?:topic|section)\s*[:\-]\s*(\S.*)$")
                .expect("labeled topic pattern"),
            current_chapter: UNCLASSIFIED.to_string(),
            current_topic: UNCLASSIFIED.to_string(),
        }
    }

    /// Chunk extracted pages in page order. `ingest_ts` identifies this
    /// ingestion run and becomes part of every chunk ID.
    pub fn chunk_pages(
        &mut self,
        pages: &[Page],
        class_num: i64,
        subject: &str,
        source_file: &str,
        ingest_ts: &str,
    ) -> Vec<Chunk> {
        let stem = file_stem(source_file);
        let authoritative = !source_file.is_empty() && !is_sentinel_subject(subject);

        let mut chunks = Vec::new();
        let mut index: usize = 0;

        for page in pages {
            self.scan_headings(&page.text);

            for (para_idx, window) in split_windows(
                &page.text,
                self.chunk_size,
                self.chunk_overlap,
            )
            .into_iter()
            .enumerate()
            {
                let content = window.trim().to_string();
                if content.chars().count() < self.min_chunk_chars {
                    continue;
                }

                let (content_type, difficulty) = classify(&content);
                let id = chunk_id(&stem, ingest_ts, index, &content);
                index += 1;

                chunks.push(Chunk {
                    id,
                    content,
                    metadata: ChunkMetadata {
                        class_num,
                        subject: subject.to_string(),
                        chapter: self.current_chapter.clone(),
                        topic: self.current_topic.clone(),
                        content_type,
                        difficulty,
                        page: page.number,
                        paragraph_index: para_idx as i64,
                        source_file: source_file.to_string(),
                        authoritative,
                    },
                });
            }
        }

        chunks
    }

    /// Update the chapter/topic state from heading-like lines on a page.
    /// The most recent recognized value wins; absent any heading the
    /// previous page's labels carry forward.
    fn scan_headings(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = self.chapter_re.captures(line) {
                let number = &caps[1];
                let title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                self.current_chapter = if title.is_empty() {
                    format!("Chapter {}", number)
                } else {
                    format!("Chapter {}: {}", number, title)
                };
                continue;
            }

            if let Some(caps) = self.numbered_topic_re.captures(line) {
                self.current_topic = caps[2].trim().to_string();
                continue;
            }

            if let Some(caps) = self.labeled_topic_re.captures(line) {
                self.current_topic = caps[1].trim().to_string();
                continue;
            }

            if is_title_case_heading(line) {
                self.current_topic = line.to_string();
            }
        }
    }
}

/// Split text into overlapping windows of `chunk_size` characters with
/// `chunk_overlap` characters of overlap. Boundaries fall on char
/// boundaries, never inside a code point. Window count per page is
/// `ceil((len - overlap) / (size - overlap))` for `len > size`, else 1.
pub fn split_windows(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    assert!(chunk_overlap < chunk_size, "overlap must be < chunk size");

    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    if len == 0 {
        return Vec::new();
    }
    if len <= chunk_size {
        return vec![chars.iter().collect()];
    }

    let step = chunk_size - chunk_overlap;
    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(len);
        windows.push(chars[start..end].iter().collect());
        if end == len {
            break;
        }
        start += step;
    }
    windows
}

/// Heading heuristic: a short line where every word starts uppercase and
/// which does not read as a sentence.
fn is_title_case_heading(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 2 || words.len() > 8 {
        return false;
    }
    if line.ends_with(['.', ',', ';', '?', '!']) {
        return false;
    }
    words.iter().all(|w| {
        w.chars()
            .next()
            .map(|c| c.is_uppercase() || c.is_numeric())
            .unwrap_or(false)
    })
}

fn is_sentinel_subject(subject: &str) -> bool {
    let lower = subject.trim().to_lowercase();
    lower.is_empty() || lower == "test" || lower.contains("test")
}

fn file_stem(source_file: &str) -> String {
    std::path::Path::new(source_file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn chunk_id(stem: &str, ingest_ts: &str, index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    format!("{}-{}-{}-{}", stem, ingest_ts, index, &hash[..8])
}

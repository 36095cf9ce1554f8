//! Export stored chunks for inspection outside the database.
//!
//! Two shapes: nested JSON (full chunk objects under an `export_info`
//! header) and flat CSV with one row per chunk and a fixed column set,
//! suitable for spreadsheets. The CSV path is lossless for everything
//! except `content_length`, which is derived.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::models::{Chunk, ChunkMetadata, ContentType, Difficulty};
use crate::store::StoreStats;

/// Fixed CSV header: identity and content first, then metadata columns
/// in alphabetical order.
pub const CSV_COLUMNS: [&str; 13] = [
    "id",
    "content",
    "content_length",
    "authoritative",
    "chapter",
    "class_num",
    "content_type",
    "difficulty",
    "page",
    "paragraph_index",
    "source_file",
    "subject",
    "topic",
];

#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub export_info: ExportInfo,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Serialize)]
pub struct ExportInfo {
    pub timestamp: String,
    pub total_chunks: usize,
    pub statistics: StoreStats,
}

/// Pretty-printed JSON export of every chunk plus store statistics.
pub fn to_json(chunks: Vec<Chunk>, statistics: StoreStats) -> Result<String> {
    let document = ExportDocument {
        export_info: ExportInfo {
            timestamp: Utc::now().to_rfc3339(),
            total_chunks: chunks.len(),
            statistics,
        },
        chunks,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Flat CSV export, one row per chunk, columns per [`CSV_COLUMNS`].
pub fn to_csv(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_COLUMNS.join(","));
    out.push('\n');

    for chunk in chunks {
        let m = &chunk.metadata;
        let fields = [
            chunk.id.clone(),
            chunk.content.clone(),
            chunk.content.chars().count().to_string(),
            m.authoritative.to_string(),
            m.chapter.clone(),
            m.class_num.to_string(),
            m.content_type.as_str().to_string(),
            m.difficulty.as_str().to_string(),
            m.page.to_string(),
            m.paragraph_index.to_string(),
            m.source_file.clone(),
            m.subject.clone(),
            m.topic.clone(),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Parse a CSV produced by [`to_csv`] back into chunks. Used to verify
/// exports are lossless.
pub fn parse_csv(csv: &str) -> Result<Vec<Chunk>> {
    let mut records = split_records(csv);
    if records.is_empty() {
        anyhow::bail!("CSV is empty");
    }
    let header = records.remove(0);
    if header != CSV_COLUMNS {
        anyhow::bail!("unexpected CSV header: {:?}", header);
    }

    records
        .into_iter()
        .map(|fields| {
            if fields.len() != CSV_COLUMNS.len() {
                anyhow::bail!("row has {} fields, expected {}", fields.len(), CSV_COLUMNS.len());
            }
            Ok(Chunk {
                id: fields[0].clone(),
                content: fields[1].clone(),
                metadata: ChunkMetadata {
                    authoritative: fields[3] == "true",
                    chapter: fields[4].clone(),
                    class_num: fields[5].parse()?,
                    content_type: ContentType::parse(&fields[6])
                        .ok_or_else(|| anyhow::anyhow!("unknown content_type '{}'", fields[6]))?,
                    difficulty: Difficulty::parse(&fields[7])
                        .ok_or_else(|| anyhow::anyhow!("unknown difficulty '{}'", fields[7]))?,
                    page: fields[8].parse()?,
                    paragraph_index: fields[9].parse()?,
                    source_file: fields[10].clone(),
                    subject: fields[11].clone(),
                    topic: fields[12].clone(),
                },
            })
        })
        .collect()
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split CSV text into records of fields, honoring quoted fields that
/// contain delimiters and newlines.
fn split_records(csv: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = csv.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                '\r' => {}
                '\n' => {
                    fields.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut fields));
                }
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                class_num: 6,
                subject: "Science".to_string(),
                chapter: "Chapter 1: Heat, Light, and Sound".to_string(),
                topic: "Temperature".to_string(),
                content_type: ContentType::Definition,
                difficulty: Difficulty::Easy,
                page: 3,
                paragraph_index: 2,
                source_file: "science6.pdf".to_string(),
                authoritative: true,
            },
        }
    }

    fn empty_stats() -> StoreStats {
        StoreStats {
            total_chunks: 0,
            by_class: BTreeMap::new(),
            by_subject: BTreeMap::new(),
            by_content_type: BTreeMap::new(),
            by_difficulty: BTreeMap::new(),
        }
    }

    #[test]
    fn csv_round_trip_is_lossless() {
        let chunks = vec![
            sample_chunk("a1", "Temperature is \"the measure\" of hotness."),
            sample_chunk("a2", "Line one.\nLine two, with a comma."),
        ];
        let csv = to_csv(&chunks);
        let restored = parse_csv(&csv).unwrap();
        assert_eq!(restored, chunks);
    }

    #[test]
    fn csv_header_matches_column_constant() {
        let csv = to_csv(&[sample_chunk("x", "y is defined as z here")]);
        let first_line = csv.lines().next().unwrap();
        assert_eq!(first_line, CSV_COLUMNS.join(","));
    }

    #[test]
    fn csv_rejects_foreign_header() {
        assert!(parse_csv("foo,bar\n1,2\n").is_err());
    }

    #[test]
    fn json_export_carries_chunks_and_counts() {
        let chunks = vec![sample_chunk("a1", "Heat flows from hot to cold.")];
        let json = to_json(chunks, empty_stats()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["export_info"]["total_chunks"], 1);
        assert_eq!(value["chunks"][0]["id"], "a1");
        assert_eq!(value["chunks"][0]["metadata"]["subject"], "Science");
        assert_eq!(value["chunks"][0]["metadata"]["content_type"], "definition");
    }
}

//! Pipeline error taxonomy.
//!
//! Each stage of the pipeline fails with a distinct variant so callers can
//! tell "ingest more data" apart from "fix your API key" apart from "the
//! model returned garbage". Orchestration code wraps these in `anyhow` at
//! the CLI boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The PDF could not be opened, or contained no extractable text.
    /// Scanned/image-only PDFs land here rather than producing zero chunks.
    #[error("no text-based content found in {path}: {detail}")]
    Extraction { path: String, detail: String },

    /// No authoritative chunks matched a generation request. Carries the
    /// exact missing combination so the caller can ingest targeted material
    /// instead of retrying blindly.
    #[error("no content found for class {class_num} {subject}{}; ingest matching PDFs first", fmt_topic(.topic))]
    NoContent {
        class_num: i64,
        subject: String,
        topic: Option<String>,
    },

    /// The remote model's output failed structured parsing (e.g. flashcard
    /// JSON). Distinct from an empty result on purpose.
    #[error("model output failed structured parsing: {0}")]
    MalformedOutput(String),

    /// The vector store rejected a batch write. The whole batch is aborted;
    /// nothing is silently half-ingested.
    #[error("vector store rejected batch: {0}")]
    StoreWrite(String),

    /// Auth, rate-limit, timeout, or other failure from the generation API.
    /// Provider detail is preserved verbatim; no fallback answer is
    /// fabricated locally.
    #[error("{provider} request failed: {detail}")]
    RemoteService { provider: String, detail: String },
}

fn fmt_topic(topic: &Option<String>) -> String {
    match topic {
        Some(t) => format!(" ({})", t),
        None => String::new(),
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_content_names_the_missing_combination() {
        let err = PipelineError::NoContent {
            class_num: 8,
            subject: "Science".to_string(),
            topic: Some("Friction".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("class 8"));
        assert!(msg.contains("Science"));
        assert!(msg.contains("Friction"));
    }

    #[test]
    fn remote_service_preserves_provider_detail() {
        let err = PipelineError::RemoteService {
            provider: "gemini".to_string(),
            detail: "HTTP 429: quota exceeded for minute".to_string(),
        };
        assert!(err.to_string().contains("quota exceeded"));
    }
}

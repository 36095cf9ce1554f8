//! Ingestion orchestration: PDF file to stored, embedded chunks.
//!
//! Extraction and store errors abort the whole call; a failed ingest
//! leaves no partial chunk set behind (store writes are one transaction).

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use crate::chunker::Chunker;
use crate::config::ChunkingConfig;
use crate::error::PipelineError;
use crate::extract;
use crate::store::ChunkStore;

/// Outcome of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source_file: String,
    pub pages: usize,
    pub chunks_added: usize,
}

/// Millisecond-resolution run timestamp; part of every chunk ID so
/// re-ingesting the same file never collides with earlier runs.
pub fn ingest_timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S%3f").to_string()
}

/// Ingest one PDF: extract pages, chunk and classify, embed, and store.
pub async fn ingest_file(
    store: &ChunkStore,
    chunking: &ChunkingConfig,
    path: &Path,
    class_num: i64,
    subject: &str,
) -> Result<IngestReport> {
    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = tokio::fs::read(path).await.map_err(|e| PipelineError::Extraction {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let pages = extract::extract_pages(&bytes, &path.display().to_string())?;

    let mut chunker = Chunker::new(chunking);
    let chunks = chunker.chunk_pages(&pages, class_num, subject, &source_file, &ingest_timestamp());

    let chunks_added = store.add(&chunks).await?;

    Ok(IngestReport {
        source_file,
        pages: pages.len(),
        chunks_added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use tempfile::TempDir;

    #[test]
    fn timestamp_has_millisecond_resolution() {
        let ts = ingest_timestamp();
        // YYYYMMDD_HHMMSSmmm
        assert_eq!(ts.len(), 18);
        assert_eq!(ts.as_bytes()[8], b'_');
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn unreadable_pdf_aborts_with_extraction_error() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::open(
            &tmp.path().join("qf.sqlite"),
            Box::new(MockEmbedder::default()),
            64,
        )
        .await
        .unwrap();

        let bad = tmp.path().join("scan.pdf");
        std::fs::write(&bad, b"not a pdf at all").unwrap();

        let err = ingest_file(&store, &ChunkingConfig::default(), &bad, 6, "Science")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Extraction { .. })
        ));

        // Nothing was stored.
        assert_eq!(store.stats().await.unwrap().total_chunks, 0);
    }

    #[tokio::test]
    async fn missing_file_is_an_extraction_error() {
        let tmp = TempDir::new().unwrap();
        let store = ChunkStore::open(
            &tmp.path().join("qf.sqlite"),
            Box::new(MockEmbedder::default()),
            64,
        )
        .await
        .unwrap();

        let err = ingest_file(
            &store,
            &ChunkingConfig::default(),
            &tmp.path().join("missing.pdf"),
            6,
            "Science",
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Extraction { .. })
        ));
    }
}

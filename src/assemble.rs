//! Retrieval-to-prompt assembly.
//!
//! Turns a generation request into a grounded prompt: build the retrieval
//! query, over-fetch candidates filtered by class and subject, drop
//! non-authoritative chunks after ranking, deduplicate overlap-created
//! copies, and size the context window and output token budget to the
//! requested quantity.

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::config::RetrievalConfig;
use crate::error::PipelineError;
use crate::models::{GenerationRequest, ScoredChunk};
use crate::prompt;
use crate::store::{ChunkStore, SearchFilters};

/// A prompt ready for the generation client, with the budget it should
/// be sent under.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub prompt: String,
    /// Ranked chunk contents that went into the context block.
    pub context: Vec<String>,
    pub output_token_budget: u32,
}

/// Candidate pool size: a generous over-fetch so authority filtering and
/// deduplication still leave a full context window.
pub fn candidate_count(retrieval: &RetrievalConfig, quantity: usize) -> usize {
    retrieval.candidate_floor.max(quantity * 3)
}

/// Context window size, scaling with the requested quantity between the
/// configured bounds. Monotonic in `quantity`.
pub fn context_size(retrieval: &RetrievalConfig, quantity: usize) -> usize {
    (quantity / 2)
        .max(retrieval.context_min)
        .min(retrieval.context_max)
}

/// Output token budget paired with the request: proportional to quantity,
/// floored so small requests still get room, capped by configuration.
pub fn output_token_budget(max_tokens: u32, quantity: usize) -> u32 {
    ((quantity as u32).saturating_mul(150)).max(1000).min(max_tokens)
}

/// Assemble the grounded prompt for `request`.
///
/// Fails with [`PipelineError::NoContent`] when no authoritative chunk
/// matches the request's class and subject; generation never proceeds on
/// fabricated or sentinel context.
pub async fn assemble(
    store: &ChunkStore,
    retrieval: &RetrievalConfig,
    max_tokens: u32,
    request: &GenerationRequest,
) -> Result<AssembledPrompt> {
    let query = prompt::search_query(request.kind, &request.topic);
    let filters = SearchFilters {
        class_num: Some(request.class_num),
        subject: Some(request.subject.clone()),
        ..Default::default()
    };

    let candidates = store
        .search(&query, &filters, candidate_count(retrieval, request.quantity))
        .await?;

    // Authority filtering happens after ranking so sentinel rows never
    // displace real textbook content.
    let authoritative: Vec<ScoredChunk> = candidates
        .into_iter()
        .filter(|scored| scored.chunk.metadata.authoritative)
        .collect();

    if authoritative.is_empty() {
        return Err(PipelineError::NoContent {
            class_num: request.class_num,
            subject: request.subject.clone(),
            topic: Some(request.topic.clone()),
        }
        .into());
    }

    // Overlapping windows can store near-identical text under distinct
    // ids; keep only the best-ranked copy of each exact content.
    let mut seen = HashSet::new();
    let deduped: Vec<ScoredChunk> = authoritative
        .into_iter()
        .filter(|scored| {
            let digest: [u8; 32] = Sha256::digest(scored.chunk.content.as_bytes()).into();
            seen.insert(digest)
        })
        .collect();

    let window = context_size(retrieval, request.quantity);
    let context: Vec<String> = deduped
        .into_iter()
        .take(window)
        .map(|scored| scored.chunk.content)
        .collect();

    Ok(AssembledPrompt {
        prompt: prompt::render(request, &context),
        context,
        output_token_budget: output_token_budget(max_tokens, request.quantity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use crate::models::{Chunk, ChunkMetadata, ContentKind, ContentType, Difficulty};
    use tempfile::TempDir;

    fn retrieval() -> RetrievalConfig {
        RetrievalConfig::default()
    }

    fn chunk(id: &str, content: &str, class_num: i64, subject: &str, authoritative: bool) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                class_num,
                subject: subject.to_string(),
                chapter: "Chapter 1: Heat".to_string(),
                topic: "Temperature".to_string(),
                content_type: ContentType::Explanation,
                difficulty: Difficulty::Easy,
                page: 1,
                paragraph_index: 0,
                source_file: (if authoritative { "science6.pdf" } else { "" }).to_string(),
                authoritative,
            },
        }
    }

    fn request(class_num: i64, subject: &str, quantity: usize) -> GenerationRequest {
        GenerationRequest {
            class_num,
            subject: subject.to_string(),
            topic: "Temperature".to_string(),
            kind: ContentKind::Mcq,
            difficulty: Some(Difficulty::Medium),
            quantity,
        }
    }

    async fn open_store(tmp: &TempDir) -> ChunkStore {
        ChunkStore::open(
            &tmp.path().join("qf.sqlite"),
            Box::new(MockEmbedder::default()),
            64,
        )
        .await
        .unwrap()
    }

    #[test]
    fn candidate_pool_has_a_floor() {
        let r = retrieval();
        assert_eq!(candidate_count(&r, 5), 50);
        assert_eq!(candidate_count(&r, 10), 50);
        assert_eq!(candidate_count(&r, 20), 60);
        assert_eq!(candidate_count(&r, 100), 300);
    }

    #[test]
    fn context_size_scales_and_clamps() {
        let r = retrieval();
        assert_eq!(context_size(&r, 1), 15);
        assert_eq!(context_size(&r, 10), 15);
        assert_eq!(context_size(&r, 40), 20);
        assert_eq!(context_size(&r, 60), 30);
        assert_eq!(context_size(&r, 500), 30);
    }

    #[test]
    fn context_size_is_monotonic() {
        let r = retrieval();
        let mut last = 0;
        for quantity in 0..200 {
            let size = context_size(&r, quantity);
            assert!(size >= last, "shrank at quantity {}", quantity);
            last = size;
        }
    }

    #[test]
    fn token_budget_scales_with_quantity() {
        assert_eq!(output_token_budget(8000, 1), 1000);
        assert_eq!(output_token_budget(8000, 10), 1500);
        assert_eq!(output_token_budget(8000, 50), 7500);
        assert_eq!(output_token_budget(8000, 100), 8000);
    }

    #[tokio::test]
    async fn sentinel_chunks_never_reach_the_context() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store
            .add(&[
                chunk("real", "Heat flows from hot to cold bodies.", 6, "Science", true),
                chunk("fake", "Sentinel row that must not appear.", 6, "Science", false),
            ])
            .await
            .unwrap();

        let assembled = assemble(&store, &retrieval(), 8000, &request(6, "Science", 10))
            .await
            .unwrap();
        assert_eq!(assembled.context.len(), 1);
        assert!(assembled.prompt.contains("Heat flows"));
        assert!(!assembled.prompt.contains("Sentinel row"));
    }

    #[tokio::test]
    async fn missing_class_fails_with_no_content() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store
            .add(&[chunk("real", "Heat flows from hot to cold.", 6, "Science", true)])
            .await
            .unwrap();

        let err = assemble(&store, &retrieval(), 8000, &request(8, "Science", 10))
            .await
            .unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::NoContent {
                class_num,
                subject,
                topic,
            }) => {
                assert_eq!(*class_num, 8);
                assert_eq!(subject, "Science");
                assert_eq!(topic.as_deref(), Some("Temperature"));
            }
            other => panic!("expected NoContent, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn only_sentinel_content_also_fails() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store
            .add(&[chunk("fake", "Sentinel only.", 6, "Science", false)])
            .await
            .unwrap();

        let err = assemble(&store, &retrieval(), 8000, &request(6, "Science", 5))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoContent { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_content_collapses_to_one_context_entry() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store
            .add(&[
                chunk("a", "Water boils at 100 degrees Celsius.", 6, "Science", true),
                chunk("b", "Water boils at 100 degrees Celsius.", 6, "Science", true),
                chunk("c", "Ice melts at zero degrees Celsius.", 6, "Science", true),
            ])
            .await
            .unwrap();

        let assembled = assemble(&store, &retrieval(), 8000, &request(6, "Science", 10))
            .await
            .unwrap();
        assert_eq!(assembled.context.len(), 2);
    }
}

//! SQLite-backed vector store adapter.
//!
//! Chunks live in a `chunks` table with their classification metadata as
//! plain columns; their embeddings live in `chunk_vectors` as little-endian
//! f32 BLOBs. Similarity search embeds the query with the store's own
//! embedder, scans candidate vectors, and ranks by cosine distance in Rust.
//!
//! The embedder is fixed at construction and is the only way vectors enter
//! the store, keeping ingest-time and query-time distances comparable.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;

use crate::embedding::{self, Embedder};
use crate::error::PipelineError;
use crate::migrate;
use crate::models::{Chunk, ChunkMetadata, ContentType, Difficulty, ScoredChunk};

/// Exact-match conjunction over metadata fields. Every set field must
/// match for a chunk to be a candidate.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub class_num: Option<i64>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub content_type: Option<ContentType>,
    pub difficulty: Option<Difficulty>,
}

/// Store statistics: totals plus per-field breakdowns.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub total_chunks: i64,
    pub by_class: BTreeMap<i64, i64>,
    pub by_subject: BTreeMap<String, i64>,
    pub by_content_type: BTreeMap<String, i64>,
    pub by_difficulty: BTreeMap<String, i64>,
}

pub struct ChunkStore {
    pool: SqlitePool,
    embedder: Box<dyn Embedder>,
    batch_size: usize,
}

impl ChunkStore {
    /// Open (or create) the store at `db_path`, binding it to `embedder`
    /// for its whole lifetime.
    pub async fn open(
        db_path: &Path,
        embedder: Box<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self> {
        let pool = crate::db::connect(db_path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self {
            pool,
            embedder,
            batch_size,
        })
    }

    /// Add a batch of chunks with their embeddings in one transaction.
    ///
    /// Fails fast: if embedding or any insert is rejected the whole batch
    /// rolls back and a `StoreWrite` error surfaces — there is no partial
    /// silent success. Insertion order follows the slice, so stored rowids
    /// reflect source page/paragraph order.
    pub async fn add(&self, chunks: &[Chunk]) -> Result<usize, PipelineError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let mut batch_vectors = self
                .embedder
                .embed(&texts)
                .await
                .map_err(|e| PipelineError::StoreWrite(format!("embedding failed: {}", e)))?;
            if batch_vectors.len() != batch.len() {
                return Err(PipelineError::StoreWrite(format!(
                    "embedder returned {} vectors for {} texts",
                    batch_vectors.len(),
                    batch.len()
                )));
            }
            vectors.append(&mut batch_vectors);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PipelineError::StoreWrite(e.to_string()))?;

        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            let m = &chunk.metadata;
            sqlx::query(
                r#"
                INSERT INTO chunks
                    (id, content, class_num, subject, chapter, topic,
                     content_type, difficulty, page, paragraph_index,
                     source_file, authoritative)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.content)
            .bind(m.class_num)
            .bind(&m.subject)
            .bind(&m.chapter)
            .bind(&m.topic)
            .bind(m.content_type.as_str())
            .bind(m.difficulty.as_str())
            .bind(m.page)
            .bind(m.paragraph_index)
            .bind(&m.source_file)
            .bind(m.authoritative as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| PipelineError::StoreWrite(format!("chunk {}: {}", chunk.id, e)))?;

            sqlx::query(
                "INSERT INTO chunk_vectors (chunk_id, model, dims, embedding) VALUES (?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(self.embedder.model_name())
            .bind(self.embedder.dims() as i64)
            .bind(embedding::vec_to_blob(vector))
            .execute(&mut *tx)
            .await
            .map_err(|e| PipelineError::StoreWrite(format!("vector {}: {}", chunk.id, e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| PipelineError::StoreWrite(e.to_string()))?;

        Ok(chunks.len())
    }

    /// Metadata-filtered similarity search.
    ///
    /// Embeds `query` with the store's embedder, ranks matching chunks by
    /// cosine distance ascending, and breaks ties by insertion order.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))?;

        let mut sql = String::from(
            "SELECT c.rowid AS seq, c.id, c.content, c.class_num, c.subject, c.chapter, \
             c.topic, c.content_type, c.difficulty, c.page, c.paragraph_index, \
             c.source_file, c.authoritative, v.embedding \
             FROM chunks c JOIN chunk_vectors v ON v.chunk_id = c.id WHERE 1=1",
        );
        if filters.class_num.is_some() {
            sql.push_str(" AND c.class_num = ?");
        }
        if filters.subject.is_some() {
            sql.push_str(" AND c.subject = ?");
        }
        if filters.topic.is_some() {
            sql.push_str(" AND c.topic = ?");
        }
        if filters.content_type.is_some() {
            sql.push_str(" AND c.content_type = ?");
        }
        if filters.difficulty.is_some() {
            sql.push_str(" AND c.difficulty = ?");
        }

        let mut q = sqlx::query(&sql);
        if let Some(class_num) = filters.class_num {
            q = q.bind(class_num);
        }
        if let Some(ref subject) = filters.subject {
            q = q.bind(subject);
        }
        if let Some(ref topic) = filters.topic {
            q = q.bind(topic);
        }
        if let Some(content_type) = filters.content_type {
            q = q.bind(content_type.as_str());
        }
        if let Some(difficulty) = filters.difficulty {
            q = q.bind(difficulty.as_str());
        }

        let rows = q.fetch_all(&self.pool).await?;

        struct Candidate {
            seq: i64,
            chunk: Chunk,
            distance: f32,
        }

        let mut candidates: Vec<Candidate> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = embedding::blob_to_vec(&blob);
                Candidate {
                    seq: row.get("seq"),
                    chunk: row_to_chunk(row),
                    distance: embedding::cosine_distance(&query_vec, &vec),
                }
            })
            .collect();

        // Ascending distance, insertion order on ties (stable).
        candidates.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });
        candidates.truncate(limit);

        Ok(candidates
            .into_iter()
            .map(|c| ScoredChunk {
                chunk: c.chunk,
                distance: c.distance,
            })
            .collect())
    }

    /// Totals plus counts by class, subject, content type, and difficulty.
    pub async fn stats(&self) -> Result<StoreStats> {
        let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;

        let by_class = sqlx::query("SELECT class_num, COUNT(*) AS n FROM chunks GROUP BY class_num")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| (row.get::<i64, _>("class_num"), row.get::<i64, _>("n")))
            .collect();

        let by_subject = group_counts(&self.pool, "subject").await?;
        let by_content_type = group_counts(&self.pool, "content_type").await?;
        let by_difficulty = group_counts(&self.pool, "difficulty").await?;

        Ok(StoreStats {
            total_chunks,
            by_class,
            by_subject,
            by_content_type,
            by_difficulty,
        })
    }

    /// Destructive: delete every chunk and vector. Confirmation is the
    /// caller's responsibility, not this component's.
    pub async fn reset(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM chunk_vectors")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM chunks").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// All chunks in insertion (source page/paragraph) order, for export.
    pub async fn all_chunks(&self) -> Result<Vec<Chunk>> {
        let rows = sqlx::query(
            "SELECT id, content, class_num, subject, chapter, topic, content_type, \
             difficulty, page, paragraph_index, source_file, authoritative \
             FROM chunks ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_chunk).collect())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> Chunk {
    let content_type: String = row.get("content_type");
    let difficulty: String = row.get("difficulty");
    Chunk {
        id: row.get("id"),
        content: row.get("content"),
        metadata: ChunkMetadata {
            class_num: row.get("class_num"),
            subject: row.get("subject"),
            chapter: row.get("chapter"),
            topic: row.get("topic"),
            content_type: ContentType::parse(&content_type).unwrap_or(ContentType::Explanation),
            difficulty: Difficulty::parse(&difficulty).unwrap_or(Difficulty::Medium),
            page: row.get("page"),
            paragraph_index: row.get("paragraph_index"),
            source_file: row.get("source_file"),
            authoritative: row.get::<i64, _>("authoritative") != 0,
        },
    }
}

async fn group_counts(pool: &SqlitePool, column: &str) -> Result<BTreeMap<String, i64>> {
    let sql = format!("SELECT {col}, COUNT(*) AS n FROM chunks GROUP BY {col}", col = column);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows
        .iter()
        .map(|row| (row.get::<String, _>(0), row.get::<i64, _>("n")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use tempfile::TempDir;

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

    async fn open_store(tmp: &TempDir) -> ChunkStore {
        ChunkStore::open(
            &tmp.path().join("qf.sqlite"),
            Box::new(MockEmbedder::default()),
            64,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn add_and_count() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        let chunks = vec![
            chunk("a1", "Heat flows from hot to cold.", 6, "Science", true),
            chunk("a2", "Temperature measures hotness.", 6, "Science", true),
        ];
        let added = store.add(&chunks).await.unwrap();
        assert_eq!(added, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 2);
        assert_eq!(stats.by_class.get(&6), Some(&2));
        assert_eq!(stats.by_subject.get("Science"), Some(&2));
    }

    #[tokio::test]
    async fn duplicate_id_fails_whole_batch() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        store
            .add(&[chunk("dup", "first text", 6, "Science", true)])
            .await
            .unwrap();

        let result = store
            .add(&[
                chunk("new", "second text", 6, "Science", true),
                chunk("dup", "colliding text", 6, "Science", true),
            ])
            .await;
        assert!(matches!(result, Err(PipelineError::StoreWrite(_))));

        // Rolled back: the non-colliding chunk was not kept either.
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 1);
    }

    #[tokio::test]
    async fn search_applies_filter_conjunction() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        store
            .add(&[
                chunk("s1", "Heat flows from hot to cold.", 6, "Science", true),
                chunk("m1", "Numbers can be added and multiplied.", 6, "Mathematics", true),
                chunk("s2", "Plants produce oxygen in sunlight.", 8, "Science", true),
            ])
            .await
            .unwrap();

        let filters = SearchFilters {
            class_num: Some(6),
            subject: Some("Science".to_string()),
            ..Default::default()
        };
        let results = store.search("heat", &filters, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "s1");
    }

    #[tokio::test]
    async fn search_ranks_exact_text_first() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        store
            .add(&[
                chunk("far", "Completely unrelated prose here.", 6, "Science", true),
                chunk("near", "boiling point of water", 6, "Science", true),
            ])
            .await
            .unwrap();

        // Mock embedder hashes content, so the identical text has distance 0.
        let results = store
            .search("boiling point of water", &SearchFilters::default(), 10)
            .await
            .unwrap();
        assert_eq!(results[0].chunk.id, "near");
        assert!(results[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn ties_break_by_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        // Identical content embeds identically: a guaranteed tie.
        store
            .add(&[
                chunk("first", "same text", 6, "Science", true),
                chunk("second", "same text", 6, "Science", true),
            ])
            .await
            .unwrap();

        let results = store
            .search("anything", &SearchFilters::default(), 10)
            .await
            .unwrap();
        assert_eq!(results[0].chunk.id, "first");
        assert_eq!(results[1].chunk.id, "second");
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        store
            .add(&[chunk("r1", "text to clear", 6, "Science", true)])
            .await
            .unwrap();
        store.reset().await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 0);
        assert!(store
            .search("text", &SearchFilters::default(), 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn all_chunks_preserves_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        let batch: Vec<Chunk> = (0..5)
            .map(|i| chunk(&format!("c{}", i), &format!("content {}", i), 6, "Science", true))
            .collect();
        store.add(&batch).await.unwrap();

        let all = store.all_chunks().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4"]);
    }
}

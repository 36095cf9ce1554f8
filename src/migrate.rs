use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Chunks with full classification metadata. rowid doubles as stable
    // insertion order for deterministic ranking tie-breaks.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            class_num INTEGER NOT NULL,
            subject TEXT NOT NULL,
            chapter TEXT NOT NULL,
            topic TEXT NOT NULL,
            content_type TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            page INTEGER NOT NULL,
            paragraph_index INTEGER NOT NULL,
            source_file TEXT NOT NULL,
            authoritative INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Embedding vectors, little-endian f32 BLOBs, one per chunk.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunk_vectors (
            chunk_id TEXT PRIMARY KEY,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            embedding BLOB NOT NULL,
            FOREIGN KEY (chunk_id) REFERENCES chunks(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_class_subject ON chunks(class_num, subject)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source_file ON chunks(source_file)")
        .execute(pool)
        .await?;

    Ok(())
}

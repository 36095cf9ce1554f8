//! Database statistics overview.
//!
//! Gives a quick summary of what's ingested: chunk counts broken down by
//! class, subject, content type, and difficulty. Used by `qf stats` to
//! confirm ingestion worked before spending tokens on generation.

use anyhow::Result;

use crate::config::Config;
use crate::embedding;
use crate::store::ChunkStore;

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let embedder = embedding::create_embedder(&config.embedding)?;
    let store = ChunkStore::open(&config.db.path, embedder, config.embedding.batch_size).await?;

    let stats = store.stats().await?;
    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("QuizForge — Database Stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Chunks:      {}", stats.total_chunks);

    if stats.total_chunks > 0 {
        println!();
        println!("  By class:");
        for (class_num, count) in &stats.by_class {
            println!("    Class {:<18} {:>6}", class_num, count);
        }
        println!();
        println!("  By subject:");
        for (subject, count) in &stats.by_subject {
            println!("    {:<24} {:>6}", subject, count);
        }
        println!();
        println!("  By content type:");
        for (content_type, count) in &stats.by_content_type {
            println!("    {:<24} {:>6}", content_type, count);
        }
        println!();
        println!("  By difficulty:");
        for (difficulty, count) in &stats.by_difficulty {
            println!("    {:<24} {:>6}", difficulty, count);
        }
    }

    println!();
    store.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}

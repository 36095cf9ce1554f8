//! # QuizForge CLI (`qf`)
//!
//! The `qf` binary is the primary interface for QuizForge. It provides
//! commands for database initialization, PDF ingestion, chunk search,
//! content generation, data export, and database maintenance.
//!
//! ## Usage
//!
//! ```bash
//! qf --config ./config/qf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `qf init` | Create the SQLite database and run schema migrations |
//! | `qf ingest <file.pdf>` | Extract, chunk, classify, embed, and store a textbook |
//! | `qf search "<query>"` | Metadata-filtered similarity search over stored chunks |
//! | `qf generate <kind>` | Generate MCQs, flashcards, notes, worksheets, or exams |
//! | `qf export` | Export all chunks as JSON or CSV |
//! | `qf stats` | Show chunk counts by class, subject, type, and difficulty |
//! | `qf reset` | Delete all stored chunks (requires `--yes`) |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! qf init --config ./config/qf.toml
//!
//! # Ingest a Class 6 Science textbook
//! qf ingest science6.pdf --class 6 --subject Science
//!
//! # Inspect what got stored
//! qf search "heat flow" --class 6 --subject Science
//!
//! # Generate 10 medium MCQs about Temperature
//! qf generate mcq --class 6 --subject Science --topic Temperature -n 10
//!
//! # Generate 20 flashcards
//! qf generate flashcards --class 6 --subject Science --topic Temperature -n 20
//!
//! # Full exam paper over two chapters
//! qf generate exam --class 6 --subject Science --chapter Heat --chapter Light
//!
//! # Export everything to CSV for spot-checking
//! qf export --format csv --out chunks.csv
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use quizforge::config;
use quizforge::embedding;
use quizforge::export;
use quizforge::generate::Generator;
use quizforge::ingest;
use quizforge::llm;
use quizforge::models::Difficulty;
use quizforge::stats;
use quizforge::store::{ChunkStore, SearchFilters};

/// QuizForge CLI — turn PDF textbooks into quizzes, flashcards, and exam
/// papers grounded in the ingested material.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/qf.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "qf",
    about = "QuizForge — a local-first pipeline for turning PDF textbooks into quizzes, flashcards, and exam papers",
    version,
    long_about = "QuizForge ingests PDF textbooks into an SQLite-backed vector store (chunked, \
    classified, and embedded locally), then generates MCQs, flashcards, revision notes, \
    worksheets, and exam papers by retrieving the most relevant chunks and prompting a \
    remote LLM with them. Generated content is always grounded in ingested textbook text."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/qf.toml`. Database, chunking, embedding,
    /// retrieval, and LLM settings are read from this file.
    #[arg(long, global = true, default_value = "./config/qf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (chunks, chunk_vectors). This command is idempotent — running it
    /// multiple times is safe.
    Init,

    /// Ingest a PDF textbook.
    ///
    /// Extracts text page by page, splits it into overlapping windows,
    /// classifies each chunk by content type and difficulty, embeds it
    /// locally, and stores everything in SQLite. Extraction or store
    /// failures abort the whole file; nothing is half-ingested.
    Ingest {
        /// Path to the PDF file.
        file: PathBuf,

        /// Class (grade) level the textbook is for, 5 through 10.
        #[arg(long = "class", value_parser = clap::value_parser!(i64).range(5..=10))]
        class_num: i64,

        /// Subject the textbook covers (e.g. Science, Mathematics).
        #[arg(long)]
        subject: String,
    },

    /// Search stored chunks.
    ///
    /// Embeds the query and ranks chunks by cosine distance, restricted
    /// to chunks matching every supplied metadata filter.
    Search {
        /// The search query string.
        query: String,

        /// Filter to a class level.
        #[arg(long = "class")]
        class_num: Option<i64>,

        /// Filter to a subject.
        #[arg(long)]
        subject: Option<String>,

        /// Filter to a topic label.
        #[arg(long)]
        topic: Option<String>,

        /// Maximum number of results to return.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Generate study content from ingested material.
    ///
    /// Retrieves the most relevant authoritative chunks for the request
    /// and prompts the configured LLM provider with them. Fails if no
    /// matching content has been ingested.
    Generate {
        #[command(subcommand)]
        kind: GenerateKind,
    },

    /// Export all stored chunks.
    ///
    /// Writes every chunk with its metadata as pretty-printed JSON or a
    /// flat CSV, to stdout or a file.
    Export {
        /// Output format: `json` or `csv`.
        #[arg(long, default_value = "json")]
        format: String,

        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show database statistics.
    ///
    /// Chunk counts broken down by class, subject, content type, and
    /// difficulty. Useful for confirming an ingest before generating.
    Stats,

    /// Delete all stored chunks and embeddings.
    ///
    /// Destructive and unrecoverable; refuses to run without `--yes`.
    Reset {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

/// Content generation subcommands, one per output kind.
#[derive(Subcommand)]
enum GenerateKind {
    /// Multiple-choice questions with answers and explanations.
    Mcq {
        #[command(flatten)]
        target: Target,
        /// Topic the questions should cover.
        #[arg(long)]
        topic: String,
        /// Question difficulty.
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Number of questions.
        #[arg(short = 'n', long = "num", default_value_t = 10)]
        quantity: usize,
    },

    /// Flashcards as structured front/back/hint JSON.
    Flashcards {
        #[command(flatten)]
        target: Target,
        /// Topic the cards should cover.
        #[arg(long)]
        topic: String,
        /// Number of cards.
        #[arg(short = 'n', long = "num", default_value_t = 20)]
        quantity: usize,
    },

    /// Concise revision notes for a chapter.
    Notes {
        #[command(flatten)]
        target: Target,
        /// Chapter to summarize.
        #[arg(long)]
        chapter: String,
    },

    /// Mixed MCQ worksheet over several topics.
    Worksheet {
        #[command(flatten)]
        target: Target,
        /// Topic to include (repeat for multiple topics).
        #[arg(long = "topic", required = true)]
        topics: Vec<String>,
        /// Question difficulty.
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Total number of questions across all topics.
        #[arg(short = 'n', long = "num", default_value_t = 15)]
        quantity: usize,
    },

    /// Full exam paper with easy/medium/hard sections.
    Exam {
        #[command(flatten)]
        target: Target,
        /// Chapter to draw questions from (repeat for multiple chapters).
        #[arg(long = "chapter", required = true)]
        chapters: Vec<String>,
        /// Total marks for the paper.
        #[arg(long, default_value_t = 100)]
        total_marks: u32,
        /// Exam duration in minutes.
        #[arg(long, default_value_t = 180)]
        duration: u32,
    },

    /// Fill-in-the-blanks questions with answers.
    FillBlanks {
        #[command(flatten)]
        target: Target,
        /// Topic the questions should cover.
        #[arg(long)]
        topic: String,
        /// Question difficulty.
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Number of questions.
        #[arg(short = 'n', long = "num", default_value_t = 20)]
        quantity: usize,
    },

    /// Short-answer questions (questions only, no answers).
    ShortAnswer {
        #[command(flatten)]
        target: Target,
        /// Topic the questions should cover.
        #[arg(long)]
        topic: String,
        /// Question difficulty.
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Number of questions.
        #[arg(short = 'n', long = "num", default_value_t = 20)]
        quantity: usize,
    },

    /// Long-answer questions requiring detailed responses (questions only).
    LongAnswer {
        #[command(flatten)]
        target: Target,
        /// Topic the questions should cover.
        #[arg(long)]
        topic: String,
        /// Question difficulty.
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Number of questions.
        #[arg(short = 'n', long = "num", default_value_t = 20)]
        quantity: usize,
    },

    /// Very-short-answer questions with 1-2 word answers (questions only).
    VeryShortAnswer {
        #[command(flatten)]
        target: Target,
        /// Topic the questions should cover.
        #[arg(long)]
        topic: String,
        /// Question difficulty.
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,
        /// Number of questions.
        #[arg(short = 'n', long = "num", default_value_t = 20)]
        quantity: usize,
    },
}

/// Class and subject shared by every generation command.
#[derive(clap::Args)]
struct Target {
    /// Class (grade) level to generate for, 5 through 10.
    #[arg(long = "class", value_parser = clap::value_parser!(i64).range(5..=10))]
    class_num: i64,

    /// Subject to generate for.
    #[arg(long)]
    subject: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = quizforge::db::connect(&cfg.db.path).await?;
            quizforge::migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            file,
            class_num,
            subject,
        } => {
            let store = open_store(&cfg).await?;
            let report =
                ingest::ingest_file(&store, &cfg.chunking, &file, class_num, &subject).await?;
            println!(
                "Ingested {}: {} pages, {} chunks stored.",
                report.source_file, report.pages, report.chunks_added
            );
            let stats = store.stats().await?;
            println!("Database now holds {} chunks.", stats.total_chunks);
            store.close().await;
        }
        Commands::Search {
            query,
            class_num,
            subject,
            topic,
            limit,
        } => {
            let store = open_store(&cfg).await?;
            let filters = SearchFilters {
                class_num,
                subject,
                topic,
                ..Default::default()
            };
            let results = store.search(&query, &filters, limit).await?;
            if results.is_empty() {
                println!("No results.");
            } else {
                for (i, scored) in results.iter().enumerate() {
                    let m = &scored.chunk.metadata;
                    println!(
                        "{}. [{:.4}] class {} {} — {} / {} ({}, {}, p.{})",
                        i + 1,
                        scored.distance,
                        m.class_num,
                        m.subject,
                        m.chapter,
                        m.topic,
                        m.content_type.as_str(),
                        m.difficulty.as_str(),
                        m.page,
                    );
                    println!("   {}", snippet(&scored.chunk.content, 200));
                }
            }
            store.close().await;
        }
        Commands::Generate { kind } => {
            let store = open_store(&cfg).await?;
            let client = llm::create_client(&cfg.llm)?;
            let generator =
                Generator::new(&store, client.as_ref(), cfg.retrieval.clone(), cfg.llm.max_tokens);
            run_generate(&generator, kind).await?;
            store.close().await;
        }
        Commands::Export { format, out } => {
            let store = open_store(&cfg).await?;
            let chunks = store.all_chunks().await?;
            if chunks.is_empty() {
                anyhow::bail!("No data to export; ingest some PDFs first.");
            }
            let rendered = match format.as_str() {
                "json" => export::to_json(chunks, store.stats().await?)?,
                "csv" => export::to_csv(&chunks),
                other => anyhow::bail!("Unknown export format: {}. Use json or csv.", other),
            };
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Export complete: {}", path.display());
                }
                None => print!("{}", rendered),
            }
            store.close().await;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Reset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to delete all data without --yes.");
            }
            let store = open_store(&cfg).await?;
            store.reset().await?;
            println!("All chunks and embeddings deleted.");
            store.close().await;
        }
    }

    Ok(())
}

async fn open_store(cfg: &config::Config) -> anyhow::Result<ChunkStore> {
    let embedder = embedding::create_embedder(&cfg.embedding)?;
    ChunkStore::open(&cfg.db.path, embedder, cfg.embedding.batch_size).await
}

async fn run_generate(generator: &Generator<'_>, kind: GenerateKind) -> anyhow::Result<()> {
    match kind {
        GenerateKind::Mcq {
            target,
            topic,
            difficulty,
            quantity,
        } => {
            let text = generator
                .mcq(target.class_num, &target.subject, &topic, difficulty, quantity)
                .await?;
            println!("{}", text);
        }
        GenerateKind::Flashcards {
            target,
            topic,
            quantity,
        } => {
            let cards = generator
                .flashcards(target.class_num, &target.subject, &topic, quantity)
                .await?;
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        GenerateKind::Notes { target, chapter } => {
            let text = generator
                .notes(target.class_num, &target.subject, &chapter)
                .await?;
            println!("{}", text);
        }
        GenerateKind::Worksheet {
            target,
            topics,
            difficulty,
            quantity,
        } => {
            let text = generator
                .worksheet(target.class_num, &target.subject, &topics, difficulty, quantity)
                .await?;
            println!("{}", text);
        }
        GenerateKind::Exam {
            target,
            chapters,
            total_marks,
            duration,
        } => {
            let text = generator
                .exam(target.class_num, &target.subject, &chapters, total_marks, duration)
                .await?;
            println!("{}", text);
        }
        GenerateKind::FillBlanks {
            target,
            topic,
            difficulty,
            quantity,
        } => {
            let text = generator
                .fill_blanks(target.class_num, &target.subject, &topic, difficulty, quantity)
                .await?;
            println!("{}", text);
        }
        GenerateKind::ShortAnswer {
            target,
            topic,
            difficulty,
            quantity,
        } => {
            let text = generator
                .short_answer(target.class_num, &target.subject, &topic, difficulty, quantity)
                .await?;
            println!("{}", text);
        }
        GenerateKind::LongAnswer {
            target,
            topic,
            difficulty,
            quantity,
        } => {
            let text = generator
                .long_answer(target.class_num, &target.subject, &topic, difficulty, quantity)
                .await?;
            println!("{}", text);
        }
        GenerateKind::VeryShortAnswer {
            target,
            topic,
            difficulty,
            quantity,
        } => {
            let text = generator
                .very_short_answer(target.class_num, &target.subject, &topic, difficulty, quantity)
                .await?;
            println!("{}", text);
        }
    }
    Ok(())
}

/// First `max` characters of a chunk on one line, for search output.
fn snippet(content: &str, max: usize) -> String {
    let one_line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if one_line.chars().count() <= max {
        one_line
    } else {
        let truncated: String = one_line.chars().take(max).collect();
        format!("{}…", truncated)
    }
}

//! # QuizForge
//!
//! An educational content pipeline: parse PDF textbooks, chunk and classify
//! their text, store chunks with embeddings in SQLite, retrieve relevant
//! chunks per request, and prompt a remote LLM to generate MCQs, flashcards,
//! revision notes, worksheets, and exam papers grounded in the ingested
//! material.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────┐
//! │   PDFs   │──▶│   Pipeline    │──▶│  SQLite   │
//! │          │   │ Chunk+Classify│   │ Chunks+Vec│
//! └──────────┘   │    +Embed     │   └────┬─────┘
//!                └──────────────┘        │
//!                    ┌───────────────────┤
//!                    ▼                   ▼
//!               ┌──────────┐       ┌──────────┐
//!               │ Retrieval │──────▶│  Remote  │
//!               │ +Assembly │       │   LLM    │
//!               └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! qf init                                       # create database
//! qf ingest science6.pdf --class 6 --subject Science
//! qf search "heat flow" --class 6 --subject Science
//! qf generate mcq --class 6 --subject Science --topic Temperature -n 10
//! qf export --format csv --out chunks.csv
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Per-page PDF text extraction |
//! | [`classify`] | Content-type and difficulty heuristics |
//! | [`chunker`] | Overlapping window chunking with heading inference |
//! | [`embedding`] | Embedding backend abstraction |
//! | [`store`] | SQLite-backed vector store |
//! | [`assemble`] | Retrieval-to-prompt assembly |
//! | [`prompt`] | Prompt templates per content kind |
//! | [`llm`] | Remote generation clients |
//! | [`generate`] | Per-kind content generation |
//! | [`export`] | JSON and CSV exports |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod assemble;
pub mod chunker;
pub mod classify;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod export;
pub mod extract;
pub mod generate;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod prompt;
pub mod stats;
pub mod store;

//! Core data models used throughout QuizForge.
//!
//! These types represent the classified chunks, generation requests, and
//! structured artifacts that flow through the ingestion and generation
//! pipeline.

use serde::{Deserialize, Serialize};

/// Content-type label assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Question,
    Formula,
    Definition,
    Example,
    Explanation,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Question => "question",
            ContentType::Formula => "formula",
            ContentType::Definition => "definition",
            ContentType::Example => "example",
            ContentType::Explanation => "explanation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "question" => Some(ContentType::Question),
            "formula" => Some(ContentType::Formula),
            "definition" => Some(ContentType::Definition),
            "example" => Some(ContentType::Example),
            "explanation" => Some(ContentType::Explanation),
            _ => None,
        }
    }
}

/// Difficulty label assigned by the classifier, also used in requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::parse(&s.to_lowercase())
            .ok_or_else(|| format!("unknown difficulty '{}': use easy, medium, or hard", s))
    }
}

/// Metadata attached to every stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub class_num: i64,
    pub subject: String,
    pub chapter: String,
    pub topic: String,
    pub content_type: ContentType,
    pub difficulty: Difficulty,
    pub page: i64,
    pub paragraph_index: i64,
    pub source_file: String,
    /// Set at ingestion time: traceable to a real source file and not
    /// sentinel/test data. Only authoritative chunks ground generation.
    pub authoritative: bool,
}

/// A bounded span of extracted PDF text with classification metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// A chunk returned from similarity search with its cosine distance
/// (lower is closer).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Requested output type for a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Mcq,
    Flashcards,
    Notes,
    Worksheet,
    Exam,
    FillBlanks,
    ShortAnswer,
    LongAnswer,
    VeryShortAnswer,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Mcq => "mcq",
            ContentKind::Flashcards => "flashcards",
            ContentKind::Notes => "notes",
            ContentKind::Worksheet => "worksheet",
            ContentKind::Exam => "exam",
            ContentKind::FillBlanks => "fill-blanks",
            ContentKind::ShortAnswer => "short-answer",
            ContentKind::LongAnswer => "long-answer",
            ContentKind::VeryShortAnswer => "very-short-answer",
        }
    }
}

/// Ephemeral generation request; never persisted.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub class_num: i64,
    pub subject: String,
    pub topic: String,
    pub kind: ContentKind,
    pub difficulty: Option<Difficulty>,
    pub quantity: usize,
}

/// One flashcard parsed from the model's JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub hint: Option<String>,
}

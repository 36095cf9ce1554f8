//! Prompt templates for the generation pipeline.
//!
//! Each content kind carries two pieces of template data: the cue words
//! appended to the topic to form the retrieval query, and the instruction
//! template wrapped around the retrieved context. Every template demands
//! UNIQUE, non-repeating items so large requests do not collapse into
//! rephrasings of the same chunk.

use crate::models::{ContentKind, Difficulty, GenerationRequest};

/// Retrieval query for a request: the topic plus kind-specific cue words
/// that bias similarity search toward usable source material.
pub fn search_query(kind: ContentKind, topic: &str) -> String {
    let cues = match kind {
        ContentKind::Mcq | ContentKind::Worksheet | ContentKind::Exam => {
            "concepts definitions examples formulas"
        }
        ContentKind::Flashcards => "definitions key terms formulas rules theorems",
        ContentKind::Notes => "key concepts main points important topics",
        ContentKind::FillBlanks => "definitions concepts key terms important facts",
        ContentKind::ShortAnswer => "concepts explanations applications why how",
        ContentKind::LongAnswer => "detailed explanations applications analysis evaluation",
        ContentKind::VeryShortAnswer => "terms definitions facts key points",
    };
    format!("{} {}", topic, cues)
}

/// Render the full prompt for a request from its ranked context chunks.
///
/// Worksheets and exams are composed from per-topic MCQ prompts by the
/// caller, so they render with the MCQ template here.
pub fn render(request: &GenerationRequest, context_chunks: &[String]) -> String {
    let context = context_block(context_chunks);
    let difficulty = request.difficulty.unwrap_or(Difficulty::Medium);
    match request.kind {
        ContentKind::Mcq | ContentKind::Worksheet | ContentKind::Exam => {
            mcq_prompt(request, difficulty, &context)
        }
        ContentKind::Flashcards => flashcards_prompt(request, &context),
        ContentKind::Notes => notes_prompt(request, &context),
        ContentKind::FillBlanks => fill_blanks_prompt(request, difficulty, &context),
        ContentKind::ShortAnswer => short_answer_prompt(request, difficulty, &context),
        ContentKind::LongAnswer => long_answer_prompt(request, difficulty, &context),
        ContentKind::VeryShortAnswer => very_short_answer_prompt(request, difficulty, &context),
    }
}

/// Number chunks as `[Context N]:` blocks, preserving rank order.
pub fn context_block(chunks: &[String]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Context {}]: {}", i + 1, chunk))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn mcq_prompt(request: &GenerationRequest, difficulty: Difficulty, context: &str) -> String {
    format!(
        r#"You are an expert educational content creator for Class {class} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {n} multiple-choice questions (MCQs) about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Each question must have exactly 4 options (A, B, C, D)
- Only ONE option should be correct
- Questions should test understanding and application, not just memorization
- Base all questions on the provided textbook content above
- Questions must be UNIQUE and non-repeating, covering distinct aspects of the topic
- Make questions clear and unambiguous
- Ensure wrong options are plausible but clearly incorrect
- Include variety: some conceptual, some numerical, some application-based

FORMAT (strictly follow this):
Question 1: [Clear, specific question text]
A) [First option]
B) [Second option]
C) [Third option]
D) [Fourth option]
Correct Answer: [A/B/C/D]
Explanation: [Brief 1-2 sentence explanation of why this is correct]

[Blank line between questions]

Generate all {n} UNIQUE questions now following this exact format:"#,
        class = request.class_num,
        subject = request.subject,
        context = context,
        n = request.quantity,
        topic = request.topic,
        difficulty = difficulty.as_str(),
    )
}

fn flashcards_prompt(request: &GenerationRequest, context: &str) -> String {
    format!(
        r#"Based on this Class {class} {subject} content about {topic}:

{context}

Create {n} flashcards for students to study.

Each flashcard should have:
- Front: A clear, specific question or term
- Back: Complete but concise answer or definition
- Hint (optional): A helpful memory aid or connection

Flashcards must be UNIQUE and non-repeating, covering distinct aspects of the topic.

Return as a JSON array in this exact format:
{{
  "flashcards": [
    {{
      "front": "What is the Pythagorean theorem?",
      "back": "In a right triangle, a² + b² = c² where c is the hypotenuse",
      "hint": "Think: 3-4-5 triangle"
    }}
  ]
}}

Generate all {n} flashcards now:"#,
        class = request.class_num,
        subject = request.subject,
        topic = request.topic,
        context = context,
        n = request.quantity,
    )
}

fn notes_prompt(request: &GenerationRequest, context: &str) -> String {
    format!(
        r#"Create comprehensive but concise revision notes for Class {class} students.

CHAPTER CONTENT:
{context}

Create structured notes covering:

1. KEY CONCEPTS (3-5 main ideas with brief explanations)
2. IMPORTANT DEFINITIONS (key terms with clear definitions)
3. FORMULAS & THEOREMS (list all important formulas)
4. QUICK TIPS (exam tips and memory aids)
5. COMMON MISTAKES (typical errors students make)

Keep it focused and exam-oriented. Maximum 2 pages. Use bullet points where appropriate.

Generate the complete notes now:"#,
        class = request.class_num,
        context = context,
    )
}

fn fill_blanks_prompt(request: &GenerationRequest, difficulty: Difficulty, context: &str) -> String {
    let depth = match difficulty {
        Difficulty::Easy => "basic recall",
        Difficulty::Medium => "moderate understanding",
        Difficulty::Hard => "deep analysis",
    };
    format!(
        r#"You are an expert educational content creator for Class {class} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {n} fill in the blanks questions about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Base all questions on the provided textbook content above
- Each question should have ONE blank marked with ________
- The blank should test key concepts, terms, or important facts
- Provide the correct answer after each question
- Questions must be UNIQUE and not repeat the same concept
- Make questions clear and unambiguous
- Include variety: definitions, facts, concepts, and relationships
- {difficulty} difficulty means: {depth}

FORMAT (strictly follow this):
1. [Statement with ________ representing the blank]
   Answer: [Correct word/phrase]

2. [Statement with ________ representing the blank]
   Answer: [Correct word/phrase]

Generate all {n} UNIQUE fill in the blanks questions now:"#,
        class = request.class_num,
        subject = request.subject,
        context = context,
        n = request.quantity,
        topic = request.topic,
        difficulty = difficulty.as_str(),
        depth = depth,
    )
}

fn short_answer_prompt(
    request: &GenerationRequest,
    difficulty: Difficulty,
    context: &str,
) -> String {
    let depth = match difficulty {
        Difficulty::Easy => "simple recall",
        Difficulty::Medium => "application of concepts",
        Difficulty::Hard => "analysis and evaluation",
    };
    format!(
        r#"You are an expert educational content creator for Class {class} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {n} short answer questions about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Base all questions on the provided textbook content above
- Each question should require 2-3 sentences to answer (50-80 words)
- Questions should test understanding, not just recall
- Questions must be UNIQUE and cover different aspects of the topic
- Use question words: What, Why, How, Explain, Describe, Define
- DO NOT provide answers - only questions
- Make questions clear and specific
- {difficulty} difficulty means: {depth}

FORMAT (strictly follow this):
1. [Clear, specific question]

2. [Clear, specific question]

Generate all {n} UNIQUE short answer questions now (QUESTIONS ONLY, NO ANSWERS):"#,
        class = request.class_num,
        subject = request.subject,
        context = context,
        n = request.quantity,
        topic = request.topic,
        difficulty = difficulty.as_str(),
        depth = depth,
    )
}

fn long_answer_prompt(
    request: &GenerationRequest,
    difficulty: Difficulty,
    context: &str,
) -> String {
    let depth = match difficulty {
        Difficulty::Easy => "straightforward explanations",
        Difficulty::Medium => "connections and applications",
        Difficulty::Hard => "critical thinking and synthesis",
    };
    format!(
        r#"You are an expert educational content creator for Class {class} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {n} long answer questions about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Base all questions on the provided textbook content above
- Each question should require detailed answers (150-200 words or more)
- Questions should test deep understanding, analysis, and application
- Questions must be UNIQUE and cover different major aspects
- Use prompts like: Explain in detail, Describe with examples, Analyze, Compare and contrast, Evaluate, Discuss
- DO NOT provide answers - only questions
- Make questions comprehensive and thought-provoking
- {difficulty} difficulty means: {depth}

FORMAT (strictly follow this):
1. [Comprehensive, detailed question]

2. [Comprehensive, detailed question]

Generate all {n} UNIQUE long answer questions now (QUESTIONS ONLY, NO ANSWERS):"#,
        class = request.class_num,
        subject = request.subject,
        context = context,
        n = request.quantity,
        topic = request.topic,
        difficulty = difficulty.as_str(),
        depth = depth,
    )
}

fn very_short_answer_prompt(
    request: &GenerationRequest,
    difficulty: Difficulty,
    context: &str,
) -> String {
    let depth = match difficulty {
        Difficulty::Easy => "common terms",
        Difficulty::Medium => "moderate vocabulary",
        Difficulty::Hard => "specialized terminology",
    };
    format!(
        r#"You are an expert educational content creator for Class {class} {subject}.

RETRIEVED TEXTBOOK CONTENT:
{context}

TASK: Create {n} very short answer questions about {topic}.

REQUIREMENTS:
- Difficulty level: {difficulty}
- Base all questions on the provided textbook content above
- Each question should require 1-2 word or one sentence answers (10-20 words max)
- Questions should be direct and specific
- Questions must be UNIQUE and not repeat concepts
- Focus on: definitions, names, terms, simple facts, dates, formulas
- DO NOT provide answers - only questions
- Make questions clear and concise
- {difficulty} difficulty means: {depth}

FORMAT (strictly follow this):
1. [Brief, specific question]

2. [Brief, specific question]

Generate all {n} UNIQUE very short answer questions now (QUESTIONS ONLY, NO ANSWERS):"#,
        class = request.class_num,
        subject = request.subject,
        context = context,
        n = request.quantity,
        topic = request.topic,
        difficulty = difficulty.as_str(),
        depth = depth,
    )
}

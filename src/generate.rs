//! Content generation: assemble a grounded prompt, call the remote
//! client, and post-process the response per content kind.
//!
//! Worksheets and exams are composed locally from per-topic MCQ calls;
//! everything else is a single prompt/response round trip.

use anyhow::Result;
use serde::Deserialize;

use crate::assemble;
use crate::config::RetrievalConfig;
use crate::error::PipelineError;
use crate::llm::LlmClient;
use crate::models::{ContentKind, Difficulty, Flashcard, GenerationRequest};
use crate::store::ChunkStore;

pub struct Generator<'a> {
    store: &'a ChunkStore,
    client: &'a dyn LlmClient,
    retrieval: RetrievalConfig,
    max_tokens: u32,
}

impl<'a> Generator<'a> {
    pub fn new(
        store: &'a ChunkStore,
        client: &'a dyn LlmClient,
        retrieval: RetrievalConfig,
        max_tokens: u32,
    ) -> Self {
        Self {
            store,
            client,
            retrieval,
            max_tokens,
        }
    }

    async fn run(&self, request: &GenerationRequest) -> Result<String> {
        let assembled =
            assemble::assemble(self.store, &self.retrieval, self.max_tokens, request).await?;
        let text = self
            .client
            .generate(&assembled.prompt, assembled.output_token_budget)
            .await?;
        Ok(text)
    }

    pub async fn mcq(
        &self,
        class_num: i64,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        self.run(&GenerationRequest {
            class_num,
            subject: subject.to_string(),
            topic: topic.to_string(),
            kind: ContentKind::Mcq,
            difficulty: Some(difficulty),
            quantity: num_questions,
        })
        .await
    }

    pub async fn fill_blanks(
        &self,
        class_num: i64,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        self.run(&GenerationRequest {
            class_num,
            subject: subject.to_string(),
            topic: topic.to_string(),
            kind: ContentKind::FillBlanks,
            difficulty: Some(difficulty),
            quantity: num_questions,
        })
        .await
    }

    pub async fn short_answer(
        &self,
        class_num: i64,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        self.run(&GenerationRequest {
            class_num,
            subject: subject.to_string(),
            topic: topic.to_string(),
            kind: ContentKind::ShortAnswer,
            difficulty: Some(difficulty),
            quantity: num_questions,
        })
        .await
    }

    pub async fn long_answer(
        &self,
        class_num: i64,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        self.run(&GenerationRequest {
            class_num,
            subject: subject.to_string(),
            topic: topic.to_string(),
            kind: ContentKind::LongAnswer,
            difficulty: Some(difficulty),
            quantity: num_questions,
        })
        .await
    }

    pub async fn very_short_answer(
        &self,
        class_num: i64,
        subject: &str,
        topic: &str,
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        self.run(&GenerationRequest {
            class_num,
            subject: subject.to_string(),
            topic: topic.to_string(),
            kind: ContentKind::VeryShortAnswer,
            difficulty: Some(difficulty),
            quantity: num_questions,
        })
        .await
    }

    /// Generate flashcards and parse the model's JSON envelope.
    ///
    /// A response that does not contain a parseable `{"flashcards": [...]}`
    /// object fails with [`PipelineError::MalformedOutput`]; it is never
    /// coerced into an empty deck.
    pub async fn flashcards(
        &self,
        class_num: i64,
        subject: &str,
        topic: &str,
        num_cards: usize,
    ) -> Result<Vec<Flashcard>> {
        let raw = self
            .run(&GenerationRequest {
                class_num,
                subject: subject.to_string(),
                topic: topic.to_string(),
                kind: ContentKind::Flashcards,
                difficulty: None,
                quantity: num_cards,
            })
            .await?;
        Ok(parse_flashcards(&raw)?)
    }

    /// Revision notes for a chapter. The chapter name drives retrieval
    /// the same way a topic does.
    pub async fn notes(&self, class_num: i64, subject: &str, chapter: &str) -> Result<String> {
        self.run(&GenerationRequest {
            class_num,
            subject: subject.to_string(),
            topic: chapter.to_string(),
            kind: ContentKind::Notes,
            difficulty: None,
            quantity: 1,
        })
        .await
    }

    /// Mixed worksheet over several topics, composed from per-topic MCQ
    /// batches with a shared header.
    pub async fn worksheet(
        &self,
        class_num: i64,
        subject: &str,
        topics: &[String],
        difficulty: Difficulty,
        num_questions: usize,
    ) -> Result<String> {
        if topics.is_empty() {
            anyhow::bail!("worksheet needs at least one topic");
        }
        let per_topic = (num_questions / topics.len()).max(1);

        let mut sections = Vec::with_capacity(topics.len());
        for topic in topics {
            sections.push(self.mcq(class_num, subject, topic, difficulty, per_topic).await?);
        }

        let rule = "=".repeat(60);
        let mut worksheet = format!(
            "{rule}\nWORKSHEET - CLASS {class} {subject}\nDifficulty: {difficulty}\nTotal Questions: {n}\nTopics: {topics}\n{rule}\n\n\
             Instructions:\n- Answer all questions\n- Each question carries equal marks\n- Select the most appropriate answer from the given options\n\n{rule}\n\n",
            rule = rule,
            class = class_num,
            subject = subject.to_uppercase(),
            difficulty = difficulty.as_str().to_uppercase(),
            n = num_questions,
            topics = topics.join(", "),
        );
        worksheet.push_str(&sections.join("\n\n"));
        worksheet.push_str(&format!("\n\n{rule}\nEND OF WORKSHEET\n{rule}", rule = rule));
        Ok(worksheet)
    }

    /// Full exam paper: easy/medium/hard sections carrying 30%/50%/20%
    /// of the marks, with question counts derived from per-question marks
    /// of 2, 3, and 5 respectively.
    pub async fn exam(
        &self,
        class_num: i64,
        subject: &str,
        chapters: &[String],
        total_marks: u32,
        duration_minutes: u32,
    ) -> Result<String> {
        let topic = chapters.first().map(String::as_str).unwrap_or("General");

        let easy_marks = total_marks * 30 / 100;
        let medium_marks = total_marks * 50 / 100;
        let hard_marks = total_marks - easy_marks - medium_marks;

        let rule = "=".repeat(70);
        let mut paper = format!(
            "{rule}\nCLASS {class} - {subject}\nEXAMINATION PAPER\n{rule}\n\n\
             Time Allowed: {duration} minutes\nMaximum Marks: {marks}\n\n\
             General Instructions:\n\
             1. All questions are compulsory\n\
             2. The paper consists of sections with varying difficulty levels\n\
             3. Read each question carefully before answering\n\
             4. Write your answers neatly and legibly\n\n{rule}\n\n",
            rule = rule,
            class = class_num,
            subject = subject.to_uppercase(),
            duration = duration_minutes,
            marks = total_marks,
        );

        let sections = [
            ("A", Difficulty::Easy, easy_marks, 2u32),
            ("B", Difficulty::Medium, medium_marks, 3u32),
            ("C", Difficulty::Hard, hard_marks, 5u32),
        ];
        for (label, difficulty, marks, marks_per_question) in sections {
            let count = ((marks / marks_per_question) as usize).max(1);
            let questions = self.mcq(class_num, subject, topic, difficulty, count).await?;
            paper.push_str(&format!(
                "\nSECTION {label} - {difficulty} ({marks} marks)\n{rule}\n\n{questions}\n\n",
                label = label,
                difficulty = difficulty.as_str().to_uppercase(),
                marks = marks,
                rule = rule,
                questions = questions,
            ));
        }

        paper.push_str(&format!("{rule}\nEND OF EXAMINATION\n{rule}", rule = rule));
        Ok(paper)
    }
}

#[derive(Deserialize)]
struct FlashcardEnvelope {
    flashcards: Vec<Flashcard>,
}

/// Extract and parse the flashcard JSON envelope from free-form model
/// output (the outermost `{...}` span, tolerating prose or code fences
/// around it).
pub fn parse_flashcards(raw: &str) -> Result<Vec<Flashcard>, PipelineError> {
    let start = raw
        .find('{')
        .ok_or_else(|| PipelineError::MalformedOutput("no JSON object in response".to_string()))?;
    let end = raw
        .rfind('}')
        .ok_or_else(|| PipelineError::MalformedOutput("unterminated JSON object".to_string()))?;
    if end < start {
        return Err(PipelineError::MalformedOutput(
            "unterminated JSON object".to_string(),
        ));
    }

    let envelope: FlashcardEnvelope = serde_json::from_str(&raw[start..=end])
        .map_err(|e| PipelineError::MalformedOutput(format!("flashcard JSON: {}", e)))?;

    if envelope.flashcards.is_empty() {
        return Err(PipelineError::MalformedOutput(
            "flashcard array was empty".to_string(),
        ));
    }
    Ok(envelope.flashcards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use crate::llm::MockClient;
    use crate::models::{Chunk, ChunkMetadata, ContentType};
    use tempfile::TempDir;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                class_num: 6,
                subject: "Science".to_string(),
                chapter: "Chapter 1: Heat".to_string(),
                topic: "Temperature".to_string(),
                content_type: ContentType::Explanation,
                difficulty: Difficulty::Easy,
                page: 1,
                paragraph_index: 0,
                source_file: "science6.pdf".to_string(),
                authoritative: true,
            },
        }
    }

    async fn seeded_store(tmp: &TempDir) -> ChunkStore {
        let store = ChunkStore::open(
            &tmp.path().join("qf.sqlite"),
            Box::new(MockEmbedder::default()),
            64,
        )
        .await
        .unwrap();
        store
            .add(&[
                chunk("h1", "Heat flows from hot bodies to cold bodies."),
                chunk("h2", "Temperature is measured with a thermometer."),
            ])
            .await
            .unwrap();
        store
    }

    #[test]
    fn flashcards_parse_from_json_with_surrounding_prose() {
        let raw = r#"Here are your cards:
{"flashcards": [
  {"front": "What is heat?", "back": "A form of energy", "hint": "Think thermometers"},
  {"front": "Unit of temperature?", "back": "Kelvin"}
]}
Hope that helps!"#;
        let cards = parse_flashcards(raw).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].front, "What is heat?");
        assert_eq!(cards[0].hint.as_deref(), Some("Think thermometers"));
        assert_eq!(cards[1].hint, None);
    }

    #[test]
    fn flashcards_reject_non_json_output() {
        let err = parse_flashcards("Sorry, I cannot do that.").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedOutput(_)));

        let err = parse_flashcards("{\"flashcards\": \"nope\"}").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedOutput(_)));

        let err = parse_flashcards("{\"flashcards\": []}").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn mcq_sends_grounded_prompt() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let client = MockClient::always("Question 1: ...");
        let generator = Generator::new(&store, &client, RetrievalConfig::default(), 8000);

        let result = generator
            .mcq(6, "Science", "Temperature", Difficulty::Easy, 5)
            .await
            .unwrap();
        assert_eq!(result, "Question 1: ...");

        let prompts = client.sent_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Heat flows from hot bodies"));
        assert!(prompts[0].contains("Create 5 multiple-choice questions"));
    }

    #[tokio::test]
    async fn question_kinds_send_kind_specific_prompts() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let client = MockClient::always("1. A question.");
        let generator = Generator::new(&store, &client, RetrievalConfig::default(), 8000);

        generator
            .very_short_answer(6, "Science", "Temperature", Difficulty::Easy, 5)
            .await
            .unwrap();
        generator
            .short_answer(6, "Science", "Temperature", Difficulty::Easy, 5)
            .await
            .unwrap();
        generator
            .long_answer(6, "Science", "Temperature", Difficulty::Easy, 5)
            .await
            .unwrap();

        let prompts = client.sent_prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("very short answer questions"));
        assert!(prompts[1].contains("short answer questions"));
        assert!(prompts[2].contains("long answer questions"));
        // Each kind biases retrieval differently, but all are grounded.
        for prompt in &prompts {
            assert!(prompt.contains("[Context 1]:"));
        }
    }

    #[tokio::test]
    async fn flashcard_generation_parses_model_json() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let client = MockClient::always(
            r#"{"flashcards": [{"front": "f", "back": "b", "hint": null}]}"#,
        );
        let generator = Generator::new(&store, &client, RetrievalConfig::default(), 8000);

        let cards = generator
            .flashcards(6, "Science", "Temperature", 1)
            .await
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].front, "f");
    }

    #[tokio::test]
    async fn malformed_flashcard_output_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let client = MockClient::always("I refuse to emit JSON today.");
        let generator = Generator::new(&store, &client, RetrievalConfig::default(), 8000);

        let err = generator
            .flashcards(6, "Science", "Temperature", 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::MalformedOutput(_))
        ));
    }

    #[tokio::test]
    async fn worksheet_composes_one_mcq_batch_per_topic() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let client = MockClient::always("Question 1: placeholder");
        let generator = Generator::new(&store, &client, RetrievalConfig::default(), 8000);

        let topics = vec!["Heat".to_string(), "Temperature".to_string()];
        let worksheet = generator
            .worksheet(6, "Science", &topics, Difficulty::Medium, 10)
            .await
            .unwrap();

        assert!(worksheet.contains("WORKSHEET - CLASS 6 SCIENCE"));
        assert!(worksheet.contains("Topics: Heat, Temperature"));
        assert!(worksheet.contains("END OF WORKSHEET"));
        assert_eq!(client.sent_prompts().len(), 2);
    }

    #[tokio::test]
    async fn exam_splits_marks_thirty_fifty_twenty() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let client = MockClient::always("Question 1: placeholder");
        let generator = Generator::new(&store, &client, RetrievalConfig::default(), 8000);

        let paper = generator
            .exam(6, "Science", &["Heat".to_string()], 100, 180)
            .await
            .unwrap();

        assert!(paper.contains("SECTION A - EASY (30 marks)"));
        assert!(paper.contains("SECTION B - MEDIUM (50 marks)"));
        assert!(paper.contains("SECTION C - HARD (20 marks)"));
        assert!(paper.contains("Time Allowed: 180 minutes"));
        assert!(paper.contains("Maximum Marks: 100"));
        assert!(paper.contains("END OF EXAMINATION"));
        // One MCQ batch per section.
        assert_eq!(client.sent_prompts().len(), 3);
    }

    #[tokio::test]
    async fn exam_on_empty_class_fails_with_no_content() {
        let tmp = TempDir::new().unwrap();
        let store = seeded_store(&tmp).await;
        let client = MockClient::always("unused");
        let generator = Generator::new(&store, &client, RetrievalConfig::default(), 8000);

        let err = generator
            .exam(9, "History", &["Empires".to_string()], 100, 180)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoContent { .. })
        ));
    }
}

use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::category::Category;
use crate::model::ids::{LevelId, QuestionId};
use crate::model::question::{Question, QuestionError, Scoring};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question bank contains no questions")]
    Empty,

    #[error("level {level} has an empty name")]
    EmptyLevelName { level: LevelId },

    #[error("question {question} is invalid: {source}")]
    Question {
        question: QuestionId,
        #[source]
        source: QuestionError,
    },
}

//
// ─── BANK TYPES ────────────────────────────────────────────────────────────────
//

/// Informational header of a bank document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankMetadata {
    pub total_questions: Option<u32>,
    pub version: Option<String>,
}

/// Named group of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    id: LevelId,
    name: String,
    questions: Vec<Question>,
}

impl Level {
    /// # Errors
    ///
    /// Returns `BankError::EmptyLevelName` if the name is blank.
    pub fn new(
        id: LevelId,
        name: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, BankError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BankError::EmptyLevelName { level: id });
        }
        Ok(Self {
            id,
            name: name.trim().to_string(),
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> LevelId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

/// A validated question bank: levels of questions plus metadata.
///
/// A bank always holds at least one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    metadata: BankMetadata,
    levels: Vec<Level>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `BankError::Empty` if no level holds a question.
    pub fn new(metadata: BankMetadata, levels: Vec<Level>) -> Result<Self, BankError> {
        if levels.iter().all(|level| level.questions.is_empty()) {
            return Err(BankError::Empty);
        }
        Ok(Self { metadata, levels })
    }

    /// Parse and validate a bank document.
    ///
    /// Accepts English keys (`levels`, `questions`, `text`, `options`, `correct`,
    /// `explanation`, `points`, `category`) and the Portuguese keys used by the
    /// driving-exam data files (`niveis`, `questoes`, `texto`, `alternativas`,
    /// `respostaCorreta`, `explicacao`).
    ///
    /// # Errors
    ///
    /// Returns `BankError` for malformed JSON, invalid questions or an empty bank.
    pub fn from_json_str(raw: &str) -> Result<Self, BankError> {
        let doc: BankDocument = serde_json::from_str(raw)?;
        doc.into_bank()
    }

    #[must_use]
    pub fn metadata(&self) -> &BankMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of questions across all levels, duplicates included.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.levels.iter().map(|level| level.questions.len()).sum()
    }

    /// Flatten every level into one ordered pool, keeping the first question per id.
    #[must_use]
    pub fn pool(&self) -> Vec<Question> {
        let mut seen = HashSet::new();
        self.levels
            .iter()
            .flat_map(|level| level.questions.iter())
            .filter(|question| seen.insert(question.id()))
            .cloned()
            .collect()
    }
}

//
// ─── DOCUMENT SCHEMA ───────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct BankDocument {
    #[serde(default)]
    metadata: Option<MetadataRecord>,
    #[serde(alias = "niveis")]
    levels: Vec<LevelRecord>,
}

#[derive(Debug, Deserialize)]
struct MetadataRecord {
    #[serde(default, alias = "total_questoes")]
    total_questions: Option<u32>,
    #[serde(default, alias = "versao")]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LevelRecord {
    id: u64,
    #[serde(alias = "nome")]
    name: String,
    #[serde(alias = "questoes")]
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Deserialize)]
struct QuestionRecord {
    id: u64,
    #[serde(alias = "texto")]
    text: String,
    #[serde(alias = "alternativas")]
    options: Vec<String>,
    #[serde(default, alias = "respostaCorreta")]
    correct: Option<usize>,
    #[serde(default, alias = "explicacao")]
    explanation: Option<String>,
    #[serde(default)]
    points: Option<Vec<u32>>,
    #[serde(default)]
    category: Option<Category>,
}

impl BankDocument {
    fn into_bank(self) -> Result<QuestionBank, BankError> {
        let metadata = self
            .metadata
            .map(|m| BankMetadata {
                total_questions: m.total_questions,
                version: m.version,
            })
            .unwrap_or_default();

        let levels = self
            .levels
            .into_iter()
            .map(LevelRecord::into_level)
            .collect::<Result<Vec<_>, _>>()?;

        QuestionBank::new(metadata, levels)
    }
}

impl LevelRecord {
    fn into_level(self) -> Result<Level, BankError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionRecord::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        Level::new(LevelId::new(self.id), self.name, questions)
    }
}

impl QuestionRecord {
    fn into_question(self) -> Result<Question, BankError> {
        let id = QuestionId::new(self.id);
        let wrap = |source: QuestionError| BankError::Question {
            question: id,
            source,
        };

        let scoring = match (self.correct, self.points, self.category) {
            (Some(_), Some(_), _) => return Err(wrap(QuestionError::AmbiguousScoring)),
            (Some(correct), None, _) => Scoring::Binary {
                correct,
                explanation: self.explanation.unwrap_or_default(),
            },
            (None, Some(points), Some(category)) => Scoring::Weighted { points, category },
            (None, _, _) => return Err(wrap(QuestionError::MissingScoring)),
        };

        Question::new(id, self.text, self.options, scoring).map_err(wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVING_BANK: &str = r#"{
        "metadata": { "total_questoes": 3, "versao": "2026.1" },
        "niveis": [
            {
                "id": 1,
                "nome": "Basico",
                "questoes": [
                    { "id": 1, "texto": "Q1", "alternativas": ["a", "b"], "respostaCorreta": 0, "explicacao": "E1" },
                    { "id": 2, "texto": "Q2", "alternativas": ["a", "b"], "respostaCorreta": 1, "explicacao": "E2" }
                ]
            },
            {
                "id": 2,
                "nome": "Avancado",
                "questoes": [
                    { "id": 2, "texto": "Q2 again", "alternativas": ["a"], "respostaCorreta": 0, "explicacao": "" },
                    { "id": 3, "texto": "Q3", "alternativas": ["a", "b", "c"], "respostaCorreta": 2, "explicacao": "E3" }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_portuguese_bank_and_flattens_pool() {
        let bank = QuestionBank::from_json_str(DRIVING_BANK).unwrap();

        assert_eq!(bank.metadata().version.as_deref(), Some("2026.1"));
        assert_eq!(bank.metadata().total_questions, Some(3));
        assert_eq!(bank.levels().len(), 2);
        assert_eq!(bank.levels()[1].name(), "Avancado");
        assert_eq!(bank.question_count(), 4);

        let pool = bank.pool();
        let ids: Vec<u64> = pool.iter().map(|q| q.id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(pool[1].prompt(), "Q2");
    }

    #[test]
    fn parses_weighted_english_bank() {
        let raw = r#"{
            "levels": [{
                "id": 1,
                "name": "Brain",
                "questions": [
                    { "id": 7, "text": "Pick one", "options": ["x", "y", "z"], "points": [10, 5, 0], "category": "analytical" }
                ]
            }]
        }"#;
        let bank = QuestionBank::from_json_str(raw).unwrap();
        let pool = bank.pool();
        assert_eq!(pool[0].category(), Some(Category::Analytical));
        assert_eq!(pool[0].points_for(1), 5);
        assert_eq!(bank.metadata(), &BankMetadata::default());
    }

    #[test]
    fn empty_bank_is_rejected() {
        let raw = r#"{ "levels": [{ "id": 1, "name": "L", "questions": [] }] }"#;
        assert!(matches!(
            QuestionBank::from_json_str(raw),
            Err(BankError::Empty)
        ));
        assert!(matches!(
            QuestionBank::from_json_str(r#"{ "levels": [] }"#),
            Err(BankError::Empty)
        ));
    }

    #[test]
    fn invalid_question_reports_its_id() {
        let raw = r#"{ "levels": [{ "id": 1, "name": "L", "questions": [
            { "id": 9, "text": "Q", "options": ["a"], "correct": 3 }
        ] }] }"#;
        let err = QuestionBank::from_json_str(raw).unwrap_err();
        match err {
            BankError::Question { question, source } => {
                assert_eq!(question, QuestionId::new(9));
                assert_eq!(
                    source,
                    QuestionError::CorrectOutOfRange { correct: 3, len: 1 }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scoring_must_be_exactly_one_kind() {
        let missing = r#"{ "levels": [{ "id": 1, "name": "L", "questions": [
            { "id": 1, "text": "Q", "options": ["a"] }
        ] }] }"#;
        assert!(matches!(
            QuestionBank::from_json_str(missing),
            Err(BankError::Question {
                source: QuestionError::MissingScoring,
                ..
            })
        ));

        let both = r#"{ "levels": [{ "id": 1, "name": "L", "questions": [
            { "id": 1, "text": "Q", "options": ["a"], "correct": 0, "points": [1], "category": "social" }
        ] }] }"#;
        assert!(matches!(
            QuestionBank::from_json_str(both),
            Err(BankError::Question {
                source: QuestionError::AmbiguousScoring,
                ..
            })
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            QuestionBank::from_json_str("{ not json"),
            Err(BankError::Json(_))
        ));
    }
}

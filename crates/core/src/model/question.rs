use thiserror::Error;

use crate::model::category::Category;
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must have at least one option")]
    NoOptions,

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct option {correct} is out of range for {len} options")]
    CorrectOutOfRange { correct: usize, len: usize },

    #[error("expected {expected} point values, got {actual}")]
    PointsMismatch { expected: usize, actual: usize },

    #[error("question has neither a correct option nor point values")]
    MissingScoring,

    #[error("question has both a correct option and point values")]
    AmbiguousScoring,
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// How a question turns a chosen option into points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scoring {
    /// One correct option worth a single point, with an explanation shown as feedback.
    Binary { correct: usize, explanation: String },
    /// Every option carries its own point value; the question belongs to a category.
    Weighted { points: Vec<u32>, category: Category },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// Options are stored in their original order. Display shuffling never touches
/// this order, so `Scoring::Binary::correct` always refers to the stored option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    scoring: Scoring,
}

impl Question {
    /// Create a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or an option is blank, if there are no
    /// options, or if the scoring rule does not fit the option list.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        scoring: Scoring,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }

        match &scoring {
            Scoring::Binary { correct, .. } if *correct >= options.len() => {
                return Err(QuestionError::CorrectOutOfRange {
                    correct: *correct,
                    len: options.len(),
                });
            }
            Scoring::Weighted { points, .. } if points.len() != options.len() => {
                return Err(QuestionError::PointsMismatch {
                    expected: options.len(),
                    actual: points.len(),
                });
            }
            _ => {}
        }

        Ok(Self {
            id,
            prompt,
            options,
            scoring,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    #[must_use]
    pub fn is_weighted(&self) -> bool {
        matches!(self.scoring, Scoring::Weighted { .. })
    }

    /// Original index of the correct option, for binary questions.
    #[must_use]
    pub fn correct_option(&self) -> Option<usize> {
        match &self.scoring {
            Scoring::Binary { correct, .. } => Some(*correct),
            Scoring::Weighted { .. } => None,
        }
    }

    /// Whether `option` is correct; `None` for weighted questions.
    #[must_use]
    pub fn is_correct(&self, option: usize) -> Option<bool> {
        self.correct_option().map(|correct| correct == option)
    }

    /// Points awarded for choosing the option at original index `option`.
    ///
    /// Out-of-range options score zero.
    #[must_use]
    pub fn points_for(&self, option: usize) -> u32 {
        match &self.scoring {
            Scoring::Binary { correct, .. } => u32::from(*correct == option),
            Scoring::Weighted { points, .. } => points.get(option).copied().unwrap_or(0),
        }
    }

    /// Best score reachable on this question.
    #[must_use]
    pub fn max_points(&self) -> u32 {
        match &self.scoring {
            Scoring::Binary { .. } => 1,
            Scoring::Weighted { points, .. } => points.iter().copied().max().unwrap_or(0),
        }
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        match &self.scoring {
            Scoring::Binary { explanation, .. } if !explanation.trim().is_empty() => {
                Some(explanation)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn category(&self) -> Option<Category> {
        match &self.scoring {
            Scoring::Weighted { category, .. } => Some(*category),
            Scoring::Binary { .. } => None,
        }
    }
}

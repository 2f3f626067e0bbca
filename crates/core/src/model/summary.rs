use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::answer::AnswerRecord;
use crate::model::category::Category;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many answers for a single quiz: {len}")]
    TooManyAnswers { len: usize },
}

/// Result of a finished quiz run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total_questions: u32,
    answered: u32,
    correct: u32,
    score: u32,
    max_score: u32,
    category_points: BTreeMap<Category, u32>,
    carried_over: u32,
}

impl QuizSummary {
    /// Build a summary from the answers given during a run.
    ///
    /// `max_score` is the best reachable score over the whole working sequence.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SummaryError::TooManyAnswers` if the answer count cannot fit in `u32`.
    pub fn from_answers(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total_questions: u32,
        max_score: u32,
        answers: &[AnswerRecord],
    ) -> Result<Self, SummaryError> {
        if completed_at < started_at {
            return Err(SummaryError::InvalidTimeRange);
        }
        let answered = u32::try_from(answers.len())
            .map_err(|_| SummaryError::TooManyAnswers { len: answers.len() })?;

        let mut correct = 0_u32;
        let mut score = 0_u32;
        let mut category_points = BTreeMap::new();
        for answer in answers {
            if answer.correct == Some(true) {
                correct = correct.saturating_add(1);
            }
            score = score.saturating_add(answer.points);
            if let Some(category) = answer.category {
                let entry = category_points.entry(category).or_insert(0_u32);
                *entry = entry.saturating_add(answer.points);
            }
        }

        Ok(Self {
            started_at,
            completed_at,
            total_questions,
            answered,
            correct,
            score,
            max_score,
            category_points,
            carried_over: 0,
        })
    }

    /// Fold in progress restored from an earlier run that left no answer records.
    ///
    /// Only totals carry over. The earlier answers' categories are unknown, so
    /// `category_points` covers this run alone and `dominant_category` reports
    /// `None` once anything was carried.
    #[must_use]
    pub fn with_carried_over(mut self, answered: u32, correct: u32, score: u32) -> Self {
        self.carried_over = self.carried_over.saturating_add(answered);
        self.answered = self.answered.saturating_add(answered);
        self.correct = self.correct.saturating_add(correct);
        self.score = self.score.saturating_add(score);
        self
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Answers restored from an earlier run rather than given in this one.
    #[must_use]
    pub fn carried_over(&self) -> u32 {
        self.carried_over
    }

    #[must_use]
    pub fn category_points(&self) -> &BTreeMap<Category, u32> {
        &self.category_points
    }

    /// Category with the most points; ties go to the first in `Category::ALL` order.
    ///
    /// `None` without weighted answers, or when answers were carried over.
    #[must_use]
    pub fn dominant_category(&self) -> Option<Category> {
        if self.carried_over > 0 {
            return None;
        }
        let mut best: Option<(Category, u32)> = None;
        for category in Category::ALL {
            let Some(&points) = self.category_points.get(&category) else {
                continue;
            };
            if best.is_none_or(|(_, top)| points > top) {
                best = Some((category, points));
            }
        }
        best.map(|(category, _)| category)
    }

    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuestionId;
    use crate::time::fixed_now;

    fn weighted(id: u64, points: u32, category: Category) -> AnswerRecord {
        AnswerRecord {
            question_id: QuestionId::new(id),
            option: 0,
            points,
            correct: None,
            category: Some(category),
        }
    }

    #[test]
    fn counts_correct_binary_answers() {
        let now = fixed_now();
        let answers = vec![
            AnswerRecord {
                question_id: QuestionId::new(1),
                option: 0,
                points: 1,
                correct: Some(true),
                category: None,
            },
            AnswerRecord {
                question_id: QuestionId::new(2),
                option: 1,
                points: 0,
                correct: Some(false),
                category: None,
            },
        ];

        let summary = QuizSummary::from_answers(now, now, 2, 2, &answers).unwrap();
        assert_eq!(summary.answered(), 2);
        assert_eq!(summary.correct(), 1);
        assert_eq!(summary.score(), 1);
        assert_eq!(summary.dominant_category(), None);
    }

    #[test]
    fn tallies_points_per_category() {
        let now = fixed_now();
        let answers = vec![
            weighted(1, 10, Category::Creative),
            weighted(2, 5, Category::Analytical),
            weighted(3, 10, Category::Analytical),
        ];

        let summary = QuizSummary::from_answers(now, now, 3, 30, &answers).unwrap();
        assert_eq!(summary.score(), 25);
        assert_eq!(summary.category_points()[&Category::Analytical], 15);
        assert_eq!(summary.dominant_category(), Some(Category::Analytical));
    }

    #[test]
    fn dominant_category_tie_prefers_enum_order() {
        let now = fixed_now();
        let answers = vec![
            weighted(1, 5, Category::Practical),
            weighted(2, 5, Category::Creative),
        ];
        let summary = QuizSummary::from_answers(now, now, 2, 20, &answers).unwrap();
        assert_eq!(summary.dominant_category(), Some(Category::Creative));
    }

    #[test]
    fn carried_over_progress_adds_to_totals() {
        let now = fixed_now();
        let answers = vec![weighted(1, 10, Category::Social)];
        let summary = QuizSummary::from_answers(now, now, 5, 50, &answers)
            .unwrap()
            .with_carried_over(3, 0, 20);
        assert_eq!(summary.answered(), 4);
        assert_eq!(summary.correct(), 0);
        assert_eq!(summary.score(), 30);
        assert_eq!(summary.category_points()[&Category::Social], 10);
        assert_eq!(summary.carried_over(), 3);
        assert_eq!(summary.dominant_category(), None);
    }

    #[test]
    fn rejects_inverted_time_range() {
        let now = fixed_now();
        let err = QuizSummary::from_answers(now, now - chrono::Duration::seconds(1), 1, 1, &[])
            .unwrap_err();
        assert_eq!(err, SummaryError::InvalidTimeRange);
    }
}

use crate::model::category::Category;
use crate::model::ids::QuestionId;
use crate::model::question::Question;

/// Record of one answered question.
///
/// `option` is the original (stored) option index, never a display position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub option: usize,
    pub points: u32,
    pub correct: Option<bool>,
    pub category: Option<Category>,
}

impl AnswerRecord {
    /// Score `option` against `question`.
    #[must_use]
    pub fn score(question: &Question, option: usize) -> Self {
        Self {
            question_id: question.id(),
            option,
            points: question.points_for(option),
            correct: question.is_correct(option),
            category: question.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::Scoring;

    #[test]
    fn records_binary_outcome() {
        let q = Question::new(
            QuestionId::new(1),
            "Q",
            vec!["a".into(), "b".into()],
            Scoring::Binary {
                correct: 1,
                explanation: String::new(),
            },
        )
        .unwrap();

        let wrong = AnswerRecord::score(&q, 0);
        assert_eq!(wrong.points, 0);
        assert_eq!(wrong.correct, Some(false));

        let right = AnswerRecord::score(&q, 1);
        assert_eq!(right.points, 1);
        assert_eq!(right.correct, Some(true));
        assert_eq!(right.category, None);
    }
}

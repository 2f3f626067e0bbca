use quiz_core::model::{QuestionId, QuizSummary};

use super::progress::SessionProgress;
use super::service::{QuizPhase, QuizSession};
use crate::effects::ShareOutcome;

/// How one option should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionState {
    Idle,
    SelectedCorrect,
    SelectedWrong,
    /// Correct option the user did not pick.
    RevealedCorrect,
    /// Picked option of a weighted question.
    Selected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub label: char,
    pub text: String,
    pub original_index: usize,
    pub state: OptionState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub prompt: String,
    /// Options in display order.
    pub options: Vec<OptionView>,
    pub category_icon: Option<&'static str>,
    /// Only set while feedback is visible.
    pub explanation: Option<String>,
}

/// Snapshot handed to the renderer after every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub phase: QuizPhase,
    pub position: usize,
    pub total: usize,
    pub score: u32,
    pub max_score: u32,
    pub question: Option<QuestionView>,
    /// Feedback is showing a correct binary answer.
    pub highlight: bool,
    pub progress: SessionProgress,
    pub summary: Option<QuizSummary>,
}

/// Letter shown next to the option at display position `pos`.
#[must_use]
pub fn option_label(pos: usize) -> char {
    u8::try_from(pos)
        .ok()
        .filter(|&p| p < 26)
        .map_or('?', |p| char::from(b'A' + p))
}

impl QuizView {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let phase = session.phase();
        let selected = session.selected_option();
        let question = session.current_question().map(|question| {
            let correct = question.correct_option();
            let options = session
                .option_order()
                .iter()
                .enumerate()
                .map(|(pos, original)| {
                    let state = match (selected, correct) {
                        (None, _) => OptionState::Idle,
                        (Some(pick), None) if pick == original => OptionState::Selected,
                        (Some(_), None) => OptionState::Idle,
                        (Some(pick), Some(right)) if pick == original && pick == right => {
                            OptionState::SelectedCorrect
                        }
                        (Some(pick), Some(_)) if pick == original => OptionState::SelectedWrong,
                        (Some(_), Some(right)) if right == original => OptionState::RevealedCorrect,
                        (Some(_), Some(_)) => OptionState::Idle,
                    };
                    OptionView {
                        label: option_label(pos),
                        text: question.options()[original].clone(),
                        original_index: original,
                        state,
                    }
                })
                .collect();

            QuestionView {
                id: question.id(),
                prompt: question.prompt().to_string(),
                options,
                category_icon: question.category().map(|c| c.icon()),
                explanation: selected
                    .and(question.explanation())
                    .map(str::to_string),
            }
        });

        let highlight = matches!(
            (selected, session.current_question()),
            (Some(pick), Some(q)) if q.is_correct(pick) == Some(true)
        );

        Self {
            phase,
            position: session.position(),
            total: session.total(),
            score: session.score(),
            max_score: session.max_score(),
            question,
            highlight,
            progress: session.progress(),
            summary: session.summary().ok(),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == QuizPhase::Finished
    }
}

/// Front-end that draws snapshots and reports share results.
pub trait Renderer: Send {
    fn render(&mut self, view: &QuizView);

    /// Called once a share request has settled.
    fn share_completed(&mut self, _outcome: ShareOutcome) {}
}

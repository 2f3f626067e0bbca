use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use std::fmt;

use quiz_core::model::{AnswerRecord, Question, QuestionBank, QuizConfig, QuizSummary};

use super::plan::{OptionOrder, SequenceBuilder};
use super::progress::{SavedProgress, SessionProgress};
use crate::Clock;
use crate::error::SessionError;
use crate::random::RandomSource;

//
// ─── PHASE AND OUTCOMES ────────────────────────────────────────────────────────
//

/// Where the session is in its question loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizPhase {
    /// Current question shown, no option picked yet.
    Answering,
    /// An option was picked and feedback is visible until the next advance.
    Feedback,
    /// No questions left.
    Finished,
}

/// Handle on one feedback phase.
///
/// Every submit and restart hands out a new ticket, so a stale one (for
/// example from an auto-advance timer that outlived its question) advances nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedbackTicket(u64);

/// Result of a successful `submit_answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub answer: AnswerRecord,
    pub display_position: usize,
    pub ticket: FeedbackTicket,
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Next { position: usize },
    Finished,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through a question bank.
///
/// Owns its pool, working sequence and random generator. Transitions that do
/// not apply to the current phase are no-ops and return `None`.
pub struct QuizSession {
    pool: Vec<Question>,
    config: QuizConfig,
    rng: StdRng,
    clock: Clock,
    sequence: Vec<Question>,
    order: OptionOrder,
    position: usize,
    score: u32,
    selected: Option<usize>,
    phase: QuizPhase,
    epoch: u64,
    answers: Vec<AnswerRecord>,
    carried_answered: u32,
    carried_score: u32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over every question in `bank`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the bank yields no questions.
    pub fn start(
        bank: &QuestionBank,
        config: QuizConfig,
        random: RandomSource,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        Self::from_questions(bank.pool(), config, random, clock)
    }

    /// Start a session over an already flattened pool.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `pool` is empty.
    pub fn from_questions(
        pool: Vec<Question>,
        config: QuizConfig,
        random: RandomSource,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        if pool.is_empty() {
            return Err(SessionError::Empty);
        }

        let mut rng = random.rng();
        let sequence = SequenceBuilder::new(&config).build(&pool, &mut rng);
        let Some(first) = sequence.first() else {
            return Err(SessionError::Empty);
        };
        let order = OptionOrder::for_question(first, &config, &mut rng);
        let started_at = clock.now();

        tracing::debug!(
            pool = pool.len(),
            sequence = sequence.len(),
            "quiz session started"
        );

        Ok(Self {
            pool,
            config,
            rng,
            clock,
            sequence,
            order,
            position: 0,
            score: 0,
            selected: None,
            phase: QuizPhase::Answering,
            epoch: 0,
            answers: Vec::new(),
            carried_answered: 0,
            carried_score: 0,
            started_at,
            completed_at: None,
        })
    }

    // ─── Accessors ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == QuizPhase::Finished
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Length of the working sequence.
    #[must_use]
    pub fn total(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn sequence(&self) -> &[Question] {
        &self.sequence
    }

    /// Question being asked or reviewed; `None` once finished.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_finished() {
            return None;
        }
        self.sequence.get(self.position)
    }

    #[must_use]
    pub fn option_order(&self) -> &OptionOrder {
        &self.order
    }

    /// Original index of the picked option while feedback is visible.
    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn selected_display_position(&self) -> Option<usize> {
        self.selected
            .and_then(|original| self.order.display_position(original))
    }

    /// Ticket of the visible feedback, if any.
    #[must_use]
    pub fn feedback_ticket(&self) -> Option<FeedbackTicket> {
        (self.phase == QuizPhase::Feedback).then_some(FeedbackTicket(self.epoch))
    }

    /// Answers given in this run, oldest first.
    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Best reachable score over the working sequence.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.sequence
            .iter()
            .fold(0_u32, |acc, q| acc.saturating_add(q.max_points()))
    }

    /// Number of questions already answered, counting the one under feedback.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        match self.phase {
            QuizPhase::Answering => self.position,
            QuizPhase::Feedback => self.position + 1,
            QuizPhase::Finished => self.sequence.len(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.total();
        let answered = self.answered_count().min(total);
        SessionProgress {
            total,
            answered,
            remaining: total - answered,
            is_complete: self.is_finished(),
        }
    }

    /// What to persist so a later session resumes at the next unanswered question.
    #[must_use]
    pub fn saved_progress(&self) -> SavedProgress {
        SavedProgress {
            position: self.answered_count(),
            score: self.score,
        }
    }

    // ─── Transitions ───────────────────────────────────────────────────────────

    /// Pick the option shown at `display_position` for the current question.
    ///
    /// Scores against the option's original index. Returns `None` without
    /// touching state when an option is already picked, the session is
    /// finished, or the position is out of range.
    pub fn submit_answer(&mut self, display_position: usize) -> Option<SubmitOutcome> {
        if self.phase != QuizPhase::Answering {
            return None;
        }
        let question = self.sequence.get(self.position)?;
        let original = self.order.original_index(display_position)?;

        let answer = AnswerRecord::score(question, original);
        self.score = self.score.saturating_add(answer.points);
        self.selected = Some(original);
        self.phase = QuizPhase::Feedback;
        self.epoch = self.epoch.wrapping_add(1);
        self.answers.push(answer.clone());

        Some(SubmitOutcome {
            answer,
            display_position,
            ticket: FeedbackTicket(self.epoch),
        })
    }

    /// Leave feedback and move to the next question, or finish.
    pub fn advance(&mut self) -> Option<AdvanceOutcome> {
        if self.phase != QuizPhase::Feedback {
            return None;
        }
        self.selected = None;

        let next = self.position + 1;
        if next < self.sequence.len() {
            self.position = next;
            self.order =
                OptionOrder::for_question(&self.sequence[next], &self.config, &mut self.rng);
            self.phase = QuizPhase::Answering;
            return Some(AdvanceOutcome::Next { position: next });
        }

        self.finish();
        Some(AdvanceOutcome::Finished)
    }

    /// Advance only if `ticket` still names the visible feedback.
    pub fn advance_with_ticket(&mut self, ticket: FeedbackTicket) -> Option<AdvanceOutcome> {
        if self.feedback_ticket() != Some(ticket) {
            return None;
        }
        self.advance()
    }

    /// Throw away the run and start over, re-sampling and re-shuffling as configured.
    pub fn restart(&mut self) {
        self.sequence = SequenceBuilder::new(&self.config).build(&self.pool, &mut self.rng);
        self.order = match self.sequence.first() {
            Some(first) => OptionOrder::for_question(first, &self.config, &mut self.rng),
            None => OptionOrder::identity(0),
        };
        self.position = 0;
        self.score = 0;
        self.selected = None;
        self.phase = QuizPhase::Answering;
        self.epoch = self.epoch.wrapping_add(1);
        self.answers.clear();
        self.carried_answered = 0;
        self.carried_score = 0;
        self.started_at = self.clock.now();
        self.completed_at = None;

        tracing::debug!(sequence = self.sequence.len(), "quiz session restarted");
    }

    /// Continue from progress saved by an earlier run.
    ///
    /// Only applies to a session that has not been answered yet; returns
    /// whether it took effect. A position at or past the end finishes the session.
    /// A score no run could reach in `saved.position` answers is rejected.
    pub fn resume(&mut self, saved: SavedProgress) -> bool {
        if self.phase != QuizPhase::Answering || self.position != 0 || !self.answers.is_empty() {
            return false;
        }

        let len = self.sequence.len();
        let answered = saved.position.min(len);
        let reachable = self.reachable_score(answered);
        if saved.score > reachable {
            tracing::warn!(
                position = saved.position,
                score = saved.score,
                reachable,
                "stored progress is impossible, starting fresh"
            );
            return false;
        }
        self.score = saved.score;
        self.carried_score = saved.score;
        self.carried_answered = u32::try_from(answered).unwrap_or(u32::MAX);

        if saved.position >= len {
            self.position = len.saturating_sub(1);
            self.finish();
        } else if saved.position > 0 {
            self.position = saved.position;
            self.order = OptionOrder::for_question(
                &self.sequence[saved.position],
                &self.config,
                &mut self.rng,
            );
        }

        tracing::debug!(
            position = saved.position,
            score = saved.score,
            finished = self.is_finished(),
            "quiz session resumed"
        );
        true
    }

    /// Summary of a finished run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` before the last question is advanced past.
    /// Propagates `SummaryError` via `SessionError::Summary`.
    pub fn summary(&self) -> Result<QuizSummary, SessionError> {
        let Some(completed_at) = self.completed_at else {
            return Err(SessionError::NotFinished);
        };
        let total = u32::try_from(self.sequence.len()).unwrap_or(u32::MAX);
        let summary = QuizSummary::from_answers(
            self.started_at,
            completed_at,
            total,
            self.max_score(),
            &self.answers,
        )?;
        // On an all-binary sequence every point is one correct answer.
        let carried_correct = if self.sequence.iter().any(Question::is_weighted) {
            0
        } else {
            self.carried_score
        };
        Ok(summary.with_carried_over(self.carried_answered, carried_correct, self.carried_score))
    }

    /// Upper bound on the points `answered` questions drawn from the pool can earn.
    ///
    /// Bounded by the pool rather than the current sequence, which may have
    /// been re-sampled since the progress was saved.
    fn reachable_score(&self, answered: usize) -> u32 {
        let best = self.pool.iter().map(Question::max_points).max().unwrap_or(0);
        let answered = u32::try_from(answered).unwrap_or(u32::MAX);
        best.saturating_mul(answered)
    }

    fn finish(&mut self) {
        self.selected = None;
        self.phase = QuizPhase::Finished;
        self.completed_at = Some(self.clock.now().max(self.started_at));
        tracing::debug!(score = self.score, "quiz session finished");
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("pool_len", &self.pool.len())
            .field("sequence_len", &self.sequence.len())
            .field("position", &self.position)
            .field("score", &self.score)
            .field("phase", &self.phase)
            .field("selected", &self.selected)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

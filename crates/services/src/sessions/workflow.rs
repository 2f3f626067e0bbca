use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuizConfig, QuizVariant, SessionKey};
use storage::repository::ProgressStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::progress::SavedProgress;
use super::service::{AdvanceOutcome, FeedbackTicket, QuizSession, SubmitOutcome};
use crate::Clock;
use crate::effects::{
    AudioPlayer, NoShare, ShareOutcome, ShareTarget, SilentAudio, Sound, share_with_fallback,
};
use crate::error::SessionError;
use crate::random::RandomSource;

/// Runs quiz sessions with their side effects: progress writes, sound cues, sharing.
///
/// Side-effect failures are logged and swallowed; they never change what the
/// session does next.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    random: RandomSource,
    variant: QuizVariant,
    config: QuizConfig,
    session_key: SessionKey,
    progress: Arc<dyn ProgressStore>,
    audio: Arc<dyn AudioPlayer>,
    share: Arc<dyn ShareTarget>,
}

impl QuizLoopService {
    /// Service for `variant` with its preset config, no sound and no share target.
    #[must_use]
    pub fn new(clock: Clock, variant: QuizVariant, progress: Arc<dyn ProgressStore>) -> Self {
        Self {
            clock,
            random: RandomSource::default(),
            variant,
            config: variant.default_config(),
            session_key: variant.session_key(),
            progress,
            audio: Arc::new(SilentAudio),
            share: Arc::new(NoShare),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: QuizConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_random(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    #[must_use]
    pub fn with_session_key(mut self, session_key: SessionKey) -> Self {
        self.session_key = session_key;
        self
    }

    #[must_use]
    pub fn with_audio(mut self, audio: Arc<dyn AudioPlayer>) -> Self {
        self.audio = audio;
        self
    }

    #[must_use]
    pub fn with_share(mut self, share: Arc<dyn ShareTarget>) -> Self {
        self.share = share;
        self
    }

    #[must_use]
    pub fn variant(&self) -> QuizVariant {
        self.variant
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// Start a session for `bank`, resuming stored progress when it is readable.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the bank has no questions.
    pub async fn start_session(&self, bank: &QuestionBank) -> Result<QuizSession, SessionError> {
        let mut session = QuizSession::start(bank, self.config.clone(), self.random, self.clock)?;
        if let Some(saved) = self.load_progress().await {
            session.resume(saved);
        }
        tracing::info!(
            variant = %self.variant,
            key = %self.session_key,
            total = session.total(),
            position = session.position(),
            "quiz ready"
        );
        Ok(session)
    }

    /// Submit the option at `display_position`, then play its cue and save progress.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        display_position: usize,
    ) -> Option<SubmitOutcome> {
        let outcome = self.apply_answer(session, display_position)?;
        self.save_progress(session).await;
        Some(outcome)
    }

    pub async fn advance(&self, session: &mut QuizSession) -> Option<AdvanceOutcome> {
        let outcome = self.apply_advance(session)?;
        self.save_progress(session).await;
        Some(outcome)
    }

    /// Timer-driven advance; inert once `ticket` is stale.
    pub async fn advance_with_ticket(
        &self,
        session: &mut QuizSession,
        ticket: FeedbackTicket,
    ) -> Option<AdvanceOutcome> {
        let outcome = self.apply_advance_with_ticket(session, ticket)?;
        self.save_progress(session).await;
        Some(outcome)
    }

    pub async fn restart(&self, session: &mut QuizSession) {
        session.restart();
        self.save_progress(session).await;
    }

    // The `apply_*` variants run the transition and its sound cue but leave
    // persistence to the caller, e.g. a `ProgressWriter`.

    pub fn apply_answer(
        &self,
        session: &mut QuizSession,
        display_position: usize,
    ) -> Option<SubmitOutcome> {
        let outcome = session.submit_answer(display_position)?;
        self.play(Sound::for_answer(outcome.answer.correct));
        Some(outcome)
    }

    pub fn apply_advance(&self, session: &mut QuizSession) -> Option<AdvanceOutcome> {
        let outcome = session.advance()?;
        self.after_advance(session, outcome);
        Some(outcome)
    }

    pub fn apply_advance_with_ticket(
        &self,
        session: &mut QuizSession,
        ticket: FeedbackTicket,
    ) -> Option<AdvanceOutcome> {
        let outcome = session.advance_with_ticket(ticket)?;
        self.after_advance(session, outcome);
        Some(outcome)
    }

    /// Spawn a background writer for this service's store and session key.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn progress_writer(&self) -> ProgressWriter {
        ProgressWriter::spawn(self.progress.clone(), self.session_key.clone())
    }

    /// Share the result of a finished session.
    ///
    /// Returns `ShareOutcome::Failed` if the session is still running.
    pub async fn share_result(&self, session: &QuizSession) -> ShareOutcome {
        let summary = match session.summary() {
            Ok(summary) => summary,
            Err(err) => {
                tracing::debug!(error = %err, "nothing to share yet");
                return ShareOutcome::Failed;
            }
        };
        let message = self
            .variant
            .share_message(&summary, self.config.share_url());
        share_with_fallback(self.share.as_ref(), &message).await
    }

    /// Drop stored progress so the next start is fresh.
    pub async fn forget_progress(&self) {
        for key in [
            SavedProgress::position_key(&self.session_key),
            SavedProgress::score_key(&self.session_key),
        ] {
            if let Err(err) = self.progress.remove_value(&key).await {
                tracing::warn!(error = %err, key = %key, "failed to clear progress");
            }
        }
    }

    fn after_advance(&self, session: &QuizSession, outcome: AdvanceOutcome) {
        if outcome == AdvanceOutcome::Finished {
            self.play(Sound::Finish);
            tracing::info!(score = session.score(), total = session.total(), "quiz finished");
        }
    }

    async fn load_progress(&self) -> Option<SavedProgress> {
        let position_key = SavedProgress::position_key(&self.session_key);
        let score_key = SavedProgress::score_key(&self.session_key);

        let read = async {
            let position = self.progress.get_value(&position_key).await?;
            let score = self.progress.get_value(&score_key).await?;
            Ok::<_, storage::repository::StorageError>((position, score))
        };
        let (position, score) = match read.await {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read progress, starting fresh");
                return None;
            }
        };
        if position.is_none() && score.is_none() {
            return None;
        }

        let saved = SavedProgress::decode(position.as_deref(), score.as_deref());
        if saved.is_none() {
            tracing::warn!(
                key = %self.session_key,
                "stored progress is unreadable, starting fresh"
            );
        }
        saved
    }

    async fn save_progress(&self, session: &QuizSession) {
        write_progress(
            self.progress.as_ref(),
            &self.session_key,
            session.saved_progress(),
        )
        .await;
    }

    fn play(&self, sound: Sound) {
        if let Err(err) = self.audio.play(sound) {
            tracing::warn!(error = %err, sound = sound.name(), "failed to play sound");
        }
    }
}

async fn write_progress(
    store: &dyn ProgressStore,
    session_key: &SessionKey,
    saved: SavedProgress,
) {
    let (position, score) = saved.encode();
    let writes = [
        (SavedProgress::position_key(session_key), position),
        (SavedProgress::score_key(session_key), score),
    ];
    for (key, value) in writes {
        if let Err(err) = store.set_value(&key, &value).await {
            tracing::warn!(error = %err, key = %key, "failed to save progress");
        }
    }
}

/// Persists progress off the transition path.
///
/// Holds at most one pending snapshot: anything queued while a write is in
/// flight collapses into the newest value, so the last write wins.
pub struct ProgressWriter {
    tx: watch::Sender<Option<SavedProgress>>,
    task: JoinHandle<()>,
}

impl ProgressWriter {
    fn spawn(store: Arc<dyn ProgressStore>, session_key: SessionKey) -> Self {
        let (tx, mut rx) = watch::channel(None);
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let latest = *rx.borrow_and_update();
                if let Some(saved) = latest {
                    write_progress(store.as_ref(), &session_key, saved).await;
                }
            }
        });
        Self { tx, task }
    }

    /// Queue `saved` for writing. Never waits on the store.
    pub fn queue(&self, saved: SavedProgress) {
        self.tx.send_replace(Some(saved));
    }

    /// Stop accepting snapshots and wait for the pending one to be written.
    pub async fn finish(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(err) = task.await {
            tracing::warn!(error = %err, "progress writer stopped unexpectedly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::RecordingAudio;
    use async_trait::async_trait;
    use quiz_core::model::{BankMetadata, Level, LevelId, Question, QuestionId, Scoring};
    use quiz_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, StorageError};

    struct BrokenStore;

    #[async_trait]
    impl ProgressStore for BrokenStore {
        async fn get_value(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("disk gone".into()))
        }

        async fn set_value(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk gone".into()))
        }

        async fn remove_value(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("disk gone".into()))
        }
    }

    fn bank() -> QuestionBank {
        let questions = (1..=3)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Q{id}"),
                    vec!["yes".into(), "no".into()],
                    Scoring::Binary {
                        correct: 0,
                        explanation: String::new(),
                    },
                )
                .unwrap()
            })
            .collect();
        QuestionBank::new(
            BankMetadata::default(),
            vec![Level::new(LevelId::new(1), "Basics", questions).unwrap()],
        )
        .unwrap()
    }

    fn service(progress: Arc<dyn ProgressStore>) -> QuizLoopService {
        QuizLoopService::new(fixed_clock(), QuizVariant::AntiBullying, progress)
            .with_config(QuizConfig::default())
            .with_random(RandomSource::seeded(4))
    }

    #[tokio::test]
    async fn storage_failures_do_not_block_the_quiz() {
        let audio = Arc::new(RecordingAudio::new());
        let svc = service(Arc::new(BrokenStore)).with_audio(audio.clone());
        let mut session = svc.start_session(&bank()).await.unwrap();

        for _ in 0..3 {
            svc.submit_answer(&mut session, 0).await.unwrap();
            svc.advance(&mut session).await.unwrap();
        }
        assert!(session.is_finished());
        assert_eq!(session.score(), 3);
        assert_eq!(
            audio.played(),
            vec![Sound::Correct, Sound::Correct, Sound::Correct, Sound::Finish]
        );
    }

    #[tokio::test]
    async fn corrupt_progress_starts_fresh() {
        let store = Arc::new(InMemoryRepository::new());
        store
            .set_value("anti-bullying:position", "banana")
            .await
            .unwrap();
        store.set_value("anti-bullying:score", "2").await.unwrap();

        let svc = service(store);
        let session = svc.start_session(&bank()).await.unwrap();
        assert_eq!(session.position(), 0);
        assert_eq!(session.score(), 0);
    }

    #[tokio::test]
    async fn every_transition_saves_progress() {
        let store = Arc::new(InMemoryRepository::new());
        let svc = service(store.clone());
        let mut session = svc.start_session(&bank()).await.unwrap();

        svc.submit_answer(&mut session, 1).await.unwrap();
        assert_eq!(
            store.get_value("anti-bullying:position").await.unwrap(),
            Some("1".into())
        );
        assert_eq!(
            store.get_value("anti-bullying:score").await.unwrap(),
            Some("0".into())
        );

        svc.advance(&mut session).await.unwrap();
        svc.submit_answer(&mut session, 0).await.unwrap();
        svc.restart(&mut session).await;
        assert_eq!(
            store.get_value("anti-bullying:position").await.unwrap(),
            Some("0".into())
        );
        assert_eq!(
            store.get_value("anti-bullying:score").await.unwrap(),
            Some("0".into())
        );

        svc.forget_progress().await;
        assert_eq!(store.get_value("anti-bullying:score").await.unwrap(), None);
    }

    #[tokio::test]
    async fn impossible_progress_starts_fresh() {
        let store = Arc::new(InMemoryRepository::new());
        store.set_value("anti-bullying:position", "1").await.unwrap();
        store.set_value("anti-bullying:score", "999").await.unwrap();

        let svc = service(store);
        let session = svc.start_session(&bank()).await.unwrap();
        assert_eq!(session.position(), 0);
        assert_eq!(session.score(), 0);
    }

    #[tokio::test]
    async fn progress_writer_keeps_the_latest_snapshot() {
        let store = Arc::new(InMemoryRepository::new());
        let svc = service(store.clone());
        let writer = svc.progress_writer();

        writer.queue(SavedProgress {
            position: 1,
            score: 1,
        });
        writer.queue(SavedProgress {
            position: 2,
            score: 1,
        });
        writer.finish().await;

        assert_eq!(
            store.get_value("anti-bullying:position").await.unwrap(),
            Some("2".into())
        );
        assert_eq!(
            store.get_value("anti-bullying:score").await.unwrap(),
            Some("1".into())
        );
    }

    #[tokio::test]
    async fn sharing_requires_a_finished_session() {
        let svc = service(Arc::new(InMemoryRepository::new()));
        let session = svc.start_session(&bank()).await.unwrap();
        assert_eq!(svc.share_result(&session).await, ShareOutcome::Failed);
    }
}

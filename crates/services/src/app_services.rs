use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuizConfig, QuizVariant};
use storage::repository::Storage;

use crate::Clock;
use crate::effects::{AudioPlayer, ShareTarget};
use crate::error::AppServicesError;
use crate::random::RandomSource;
use crate::sessions::{QuizLoopService, QuizSession};

/// Bank plus a ready-to-use loop service for one quiz variant.
#[derive(Clone)]
pub struct AppServices {
    bank: Arc<QuestionBank>,
    quiz_loop: Arc<QuizLoopService>,
}

/// Front-end adapters and knobs the binary hands over at startup.
pub struct AppServicesConfig {
    pub variant: QuizVariant,
    pub config: QuizConfig,
    pub random: RandomSource,
    pub clock: Clock,
    pub audio: Arc<dyn AudioPlayer>,
    pub share: Arc<dyn ShareTarget>,
}

impl AppServices {
    /// Build services backed by `SQLite` progress storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        bank: QuestionBank,
        settings: AppServicesConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, bank, settings))
    }

    /// Build services whose progress lives only as long as the process.
    #[must_use]
    pub fn in_memory(bank: QuestionBank, settings: AppServicesConfig) -> Self {
        Self::from_storage(&Storage::in_memory(), bank, settings)
    }

    fn from_storage(storage: &Storage, bank: QuestionBank, settings: AppServicesConfig) -> Self {
        let quiz_loop = QuizLoopService::new(
            settings.clock,
            settings.variant,
            Arc::clone(&storage.progress),
        )
        .with_config(settings.config)
        .with_random(settings.random)
        .with_audio(settings.audio)
        .with_share(settings.share);

        Self {
            bank: Arc::new(bank),
            quiz_loop: Arc::new(quiz_loop),
        }
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    /// Start (or resume) a session over the loaded bank.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Session` if the session cannot start.
    pub async fn start_session(&self) -> Result<QuizSession, AppServicesError> {
        Ok(self.quiz_loop.start_session(&self.bank).await?)
    }
}

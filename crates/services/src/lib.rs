#![forbid(unsafe_code)]

pub mod app_services;
pub mod effects;
pub mod error;
pub mod random;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::{AppServices, AppServicesConfig};
pub use effects::{AudioPlayer, ShareOutcome, ShareTarget, SilentAudio, Sound};
pub use error::{AppServicesError, EffectError, SessionError};
pub use random::RandomSource;

pub use sessions::{
    AdvanceOutcome, FeedbackTicket, IntentSender, QuizDriver, QuizIntent, QuizLoopService,
    QuizPhase, QuizSession, QuizView, Renderer, SavedProgress, SessionProgress,
};

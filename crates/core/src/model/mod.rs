mod answer;
mod bank;
mod category;
mod config;
mod ids;
mod question;
mod summary;
mod variant;

pub use ids::{LevelId, ParseIdError, QuestionId, SessionKey};

pub use answer::AnswerRecord;
pub use bank::{BankError, BankMetadata, Level, QuestionBank};
pub use category::{Category, UnknownCategory};
pub use config::{ConfigError, QuizConfig, QuizConfigDraft};
pub use question::{Question, QuestionError, Scoring};
pub use summary::{QuizSummary, SummaryError};
pub use variant::{QuizVariant, ShareMessage, UnknownVariant};

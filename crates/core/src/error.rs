use thiserror::Error;

use crate::model::{BankError, ConfigError, QuestionError, SummaryError};

/// Umbrella error for callers that do not care which part of the model failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

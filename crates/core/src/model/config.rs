use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Bounds for the automatic feedback → next-question delay.
pub const MIN_AUTO_ADVANCE_MS: u32 = 250;
pub const MAX_AUTO_ADVANCE_MS: u32 = 60_000;

/// Largest working sequence a sampled session may draw.
pub const MAX_SAMPLE_SIZE: u32 = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("sample size must be between 1 and 10000")]
    InvalidSampleSize,

    #[error("auto advance delay must be between 250 and 60000 ms, got {0}")]
    InvalidAutoAdvance(u32),

    #[error("invalid share URL")]
    InvalidShareUrl,
}

/// Validated settings for one quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizConfig {
    sample_size: Option<u32>,
    shuffle_questions: bool,
    shuffle_options: bool,
    auto_advance_ms: Option<u32>,
    share_url: Option<String>,
}

/// Unvalidated settings, e.g. straight from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct QuizConfigDraft {
    pub sample_size: Option<u32>,
    pub shuffle_questions: bool,
    pub shuffle_options: bool,
    pub auto_advance_ms: Option<u32>,
    pub share_url: Option<String>,
}

impl QuizConfigDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a sample size out of bounds, an auto-advance delay out of
    /// bounds, or a share URL that does not parse.
    pub fn validate(self) -> Result<QuizConfig, ConfigError> {
        if self
            .sample_size
            .is_some_and(|n| n == 0 || n > MAX_SAMPLE_SIZE)
        {
            return Err(ConfigError::InvalidSampleSize);
        }
        if let Some(ms) = self.auto_advance_ms {
            if !(MIN_AUTO_ADVANCE_MS..=MAX_AUTO_ADVANCE_MS).contains(&ms) {
                return Err(ConfigError::InvalidAutoAdvance(ms));
            }
        }

        let share_url = self
            .share_url
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty());
        if let Some(url) = share_url.as_ref() {
            if Url::parse(url).is_err() {
                return Err(ConfigError::InvalidShareUrl);
            }
        }

        Ok(QuizConfig {
            sample_size: self.sample_size,
            shuffle_questions: self.shuffle_questions,
            shuffle_options: self.shuffle_options,
            auto_advance_ms: self.auto_advance_ms,
            share_url,
        })
    }
}

impl QuizConfig {
    /// Fixed length of the working sequence, drawn with replacement.
    #[must_use]
    pub fn sample_size(&self) -> Option<u32> {
        self.sample_size
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }

    #[must_use]
    pub fn shuffle_options(&self) -> bool {
        self.shuffle_options
    }

    #[must_use]
    pub fn auto_advance(&self) -> Option<Duration> {
        self.auto_advance_ms.map(|ms| Duration::from_millis(u64::from(ms)))
    }

    #[must_use]
    pub fn share_url(&self) -> Option<&str> {
        self.share_url.as_deref()
    }

    /// Reopen the config as a draft for editing.
    #[must_use]
    pub fn to_draft(&self) -> QuizConfigDraft {
        QuizConfigDraft {
            sample_size: self.sample_size,
            shuffle_questions: self.shuffle_questions,
            shuffle_options: self.shuffle_options,
            auto_advance_ms: self.auto_advance_ms,
            share_url: self.share_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_draft_is_valid() {
        let config = QuizConfigDraft::new().validate().unwrap();
        assert_eq!(config, QuizConfig::default());
        assert_eq!(config.auto_advance(), None);
    }

    #[test]
    fn rejects_zero_sample_and_bad_delay() {
        let draft = QuizConfigDraft {
            sample_size: Some(0),
            ..QuizConfigDraft::default()
        };
        assert_eq!(draft.validate(), Err(ConfigError::InvalidSampleSize));

        let draft = QuizConfigDraft {
            sample_size: Some(4_000_000_000),
            ..QuizConfigDraft::default()
        };
        assert_eq!(draft.validate(), Err(ConfigError::InvalidSampleSize));

        let draft = QuizConfigDraft {
            sample_size: Some(MAX_SAMPLE_SIZE),
            ..QuizConfigDraft::default()
        };
        assert_eq!(draft.validate().unwrap().sample_size(), Some(MAX_SAMPLE_SIZE));

        let draft = QuizConfigDraft {
            auto_advance_ms: Some(10),
            ..QuizConfigDraft::default()
        };
        assert_eq!(draft.validate(), Err(ConfigError::InvalidAutoAdvance(10)));
    }

    #[test]
    fn share_url_is_trimmed_and_checked() {
        let draft = QuizConfigDraft {
            share_url: Some("  https://example.org/quiz ".into()),
            ..QuizConfigDraft::default()
        };
        let config = draft.validate().unwrap();
        assert_eq!(config.share_url(), Some("https://example.org/quiz"));

        let draft = QuizConfigDraft {
            share_url: Some("not a url".into()),
            ..QuizConfigDraft::default()
        };
        assert_eq!(draft.validate(), Err(ConfigError::InvalidShareUrl));

        let blank = QuizConfigDraft {
            share_url: Some("   ".into()),
            ..QuizConfigDraft::default()
        };
        assert_eq!(blank.validate().unwrap().share_url(), None);
    }

    #[test]
    fn auto_advance_converts_to_duration() {
        let draft = QuizConfigDraft {
            auto_advance_ms: Some(1500),
            ..QuizConfigDraft::default()
        };
        let config = draft.validate().unwrap();
        assert_eq!(config.auto_advance(), Some(Duration::from_millis(1500)));
        assert_eq!(config.to_draft().auto_advance_ms, Some(1500));
    }
}

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::config::{QuizConfig, QuizConfigDraft};
use crate::model::ids::SessionKey;
use crate::model::summary::QuizSummary;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz variant: {0}")]
pub struct UnknownVariant(pub String);

/// The quiz flavors shipped with the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizVariant {
    /// Driving licence exam simulator: 100 questions resampled from the bank.
    DrivingExam,
    /// Personality quiz with weighted answers and a dominant category.
    BrainType,
    /// Educational quiz with shuffled options and timed feedback.
    AntiBullying,
}

/// Text handed to the share collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareMessage {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
}

impl QuizVariant {
    pub const ALL: [QuizVariant; 3] = [
        QuizVariant::DrivingExam,
        QuizVariant::BrainType,
        QuizVariant::AntiBullying,
    ];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            QuizVariant::DrivingExam => "driving-exam",
            QuizVariant::BrainType => "brain-type",
            QuizVariant::AntiBullying => "anti-bullying",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            QuizVariant::DrivingExam => "Driving Exam Simulator",
            QuizVariant::BrainType => "What Is Your Brain Type?",
            QuizVariant::AntiBullying => "Stand Up to Bullying",
        }
    }

    /// Progress key for this variant.
    #[must_use]
    pub fn session_key(self) -> SessionKey {
        SessionKey(self.slug().to_string())
    }

    /// Unvalidated defaults, for callers that want to tweak before validating.
    #[must_use]
    pub fn default_draft(self) -> QuizConfigDraft {
        match self {
            QuizVariant::DrivingExam => QuizConfigDraft {
                sample_size: Some(100),
                ..QuizConfigDraft::default()
            },
            QuizVariant::BrainType => QuizConfigDraft {
                auto_advance_ms: Some(1_200),
                ..QuizConfigDraft::default()
            },
            QuizVariant::AntiBullying => QuizConfigDraft {
                shuffle_questions: true,
                shuffle_options: true,
                auto_advance_ms: Some(3_000),
                ..QuizConfigDraft::default()
            },
        }
    }

    #[must_use]
    pub fn default_config(self) -> QuizConfig {
        // Presets are constants within the validated ranges.
        self.default_draft().validate().unwrap_or_default()
    }

    #[must_use]
    pub fn share_message(self, summary: &QuizSummary, url: Option<&str>) -> ShareMessage {
        let text = match self {
            QuizVariant::DrivingExam => format!(
                "I'm studying for the driving exam and got {} of {} questions right! 🚗💨",
                summary.correct(),
                summary.total_questions()
            ),
            QuizVariant::BrainType => match summary.dominant_category() {
                Some(category) => format!(
                    "My brain type is {category}! I scored {} points. 🧠",
                    summary.score()
                ),
                None => format!("I scored {} points on the brain type quiz! 🧠", summary.score()),
            },
            QuizVariant::AntiBullying => format!(
                "I scored {}/{} on the anti-bullying quiz. Be kind, online and offline! 💙",
                summary.score(),
                summary.max_score()
            ),
        };

        ShareMessage {
            title: format!("My result: {}", self.title()),
            text,
            url: url.map(str::to_string),
        }
    }
}

impl fmt::Display for QuizVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for QuizVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving-exam" | "driving" | "cnh" => Ok(Self::DrivingExam),
            "brain-type" | "brain" => Ok(Self::BrainType),
            "anti-bullying" | "bullying" => Ok(Self::AntiBullying),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

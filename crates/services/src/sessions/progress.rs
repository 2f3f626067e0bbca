use quiz_core::model::SessionKey;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Share of the working sequence already answered, in whole percent.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.answered.saturating_mul(100) / self.total;
        u8::try_from(pct.min(100)).unwrap_or(100)
    }
}

const POSITION_FIELD: &str = "position";
const SCORE_FIELD: &str = "score";

/// `{position, score}` as written to the key-value store.
///
/// `position` is the index of the next question to present, so a resumed
/// session never re-scores an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedProgress {
    pub position: usize,
    pub score: u32,
}

impl SavedProgress {
    #[must_use]
    pub fn position_key(key: &SessionKey) -> String {
        key.field(POSITION_FIELD)
    }

    #[must_use]
    pub fn score_key(key: &SessionKey) -> String {
        key.field(SCORE_FIELD)
    }

    /// Decode stored strings. Missing or unparseable fields yield `None`.
    #[must_use]
    pub fn decode(position: Option<&str>, score: Option<&str>) -> Option<Self> {
        let position = position?.trim().parse::<usize>().ok()?;
        let score = score?.trim().parse::<u32>().ok()?;
        Some(Self { position, score })
    }

    #[must_use]
    pub fn encode(&self) -> (String, String) {
        (self.position.to_string(), self.score.to_string())
    }
}

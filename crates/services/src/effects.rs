//! Side-effect ports: sound cues and result sharing.
//!
//! Failures here are reported to the caller and never alter session state.

use std::sync::Mutex;

use async_trait::async_trait;

use quiz_core::model::ShareMessage;

use crate::error::EffectError;

/// Sound cues emitted by the quiz flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    Correct,
    Wrong,
    Finish,
    /// Acknowledges a weighted answer, which is neither right nor wrong.
    Select,
}

impl Sound {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Sound::Correct => "correct",
            Sound::Wrong => "wrong",
            Sound::Finish => "finish",
            Sound::Select => "select",
        }
    }

    /// Cue for a scored answer; weighted answers have no correctness and get `Select`.
    #[must_use]
    pub fn for_answer(correct: Option<bool>) -> Self {
        match correct {
            Some(true) => Sound::Correct,
            Some(false) => Sound::Wrong,
            None => Sound::Select,
        }
    }
}

pub trait AudioPlayer: Send + Sync {
    /// Start playing `sound` without waiting for it to end.
    ///
    /// # Errors
    ///
    /// Returns `EffectError::Audio` when the device refuses playback.
    fn play(&self, sound: Sound) -> Result<(), EffectError>;
}

/// Audio port that plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioPlayer for SilentAudio {
    fn play(&self, _sound: Sound) -> Result<(), EffectError> {
        Ok(())
    }
}

/// Platform share sheet plus clipboard.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// # Errors
    ///
    /// Returns `EffectError::ShareUnsupported` when no native share exists.
    async fn share_native(&self, message: &ShareMessage) -> Result<(), EffectError>;

    /// # Errors
    ///
    /// Returns `EffectError::Clipboard` when the clipboard cannot be written.
    async fn copy_to_clipboard(&self, text: &str) -> Result<(), EffectError>;
}

/// How a share request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    CopiedToClipboard,
    Failed,
}

/// Plain-text form of a share message, as written to the clipboard.
#[must_use]
pub fn clipboard_text(message: &ShareMessage) -> String {
    let mut text = format!("{}\n{}", message.title, message.text);
    if let Some(url) = &message.url {
        text.push('\n');
        text.push_str(url);
    }
    text
}

/// Try the native share first and fall back to the clipboard only when it is unsupported.
pub async fn share_with_fallback(target: &dyn ShareTarget, message: &ShareMessage) -> ShareOutcome {
    match target.share_native(message).await {
        Ok(()) => return ShareOutcome::Shared,
        Err(EffectError::ShareUnsupported) => {}
        Err(EffectError::ShareCancelled) => {
            tracing::debug!("native share cancelled");
            return ShareOutcome::Failed;
        }
        Err(err) => {
            tracing::warn!(error = %err, "native share failed");
            return ShareOutcome::Failed;
        }
    }

    match target.copy_to_clipboard(&clipboard_text(message)).await {
        Ok(()) => ShareOutcome::CopiedToClipboard,
        Err(err) => {
            tracing::warn!(error = %err, "clipboard fallback failed");
            ShareOutcome::Failed
        }
    }
}

/// Share port with neither a share sheet nor a clipboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShare;

#[async_trait]
impl ShareTarget for NoShare {
    async fn share_native(&self, _message: &ShareMessage) -> Result<(), EffectError> {
        Err(EffectError::ShareUnsupported)
    }

    async fn copy_to_clipboard(&self, _text: &str) -> Result<(), EffectError> {
        Err(EffectError::Clipboard("no clipboard available".into()))
    }
}

/// Audio port that records every cue, for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    played: Mutex<Vec<Sound>>,
}

impl RecordingAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn played(&self) -> Vec<Sound> {
        self.played
            .lock()
            .map(|played| played.clone())
            .unwrap_or_default()
    }
}

impl AudioPlayer for RecordingAudio {
    fn play(&self, sound: Sound) -> Result<(), EffectError> {
        let mut played = self
            .played
            .lock()
            .map_err(|_| EffectError::Audio("recorder lock poisoned".into()))?;
        played.push(sound);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClipboardOnly {
        copied: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ShareTarget for ClipboardOnly {
        async fn share_native(&self, _message: &ShareMessage) -> Result<(), EffectError> {
            Err(EffectError::ShareUnsupported)
        }

        async fn copy_to_clipboard(&self, text: &str) -> Result<(), EffectError> {
            *self.copied.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    struct Cancelling;

    #[async_trait]
    impl ShareTarget for Cancelling {
        async fn share_native(&self, _message: &ShareMessage) -> Result<(), EffectError> {
            Err(EffectError::ShareCancelled)
        }

        async fn copy_to_clipboard(&self, _text: &str) -> Result<(), EffectError> {
            panic!("clipboard must not be used after a cancelled share");
        }
    }

    fn message() -> ShareMessage {
        ShareMessage {
            title: "My result".into(),
            text: "I scored 3 points".into(),
            url: Some("https://quiz.example/".into()),
        }
    }

    #[tokio::test]
    async fn falls_back_to_clipboard_when_native_share_is_missing() {
        let target = ClipboardOnly {
            copied: Mutex::new(None),
        };
        let outcome = share_with_fallback(&target, &message()).await;
        assert_eq!(outcome, ShareOutcome::CopiedToClipboard);
        assert_eq!(
            target.copied.lock().unwrap().as_deref(),
            Some("My result\nI scored 3 points\nhttps://quiz.example/")
        );
    }

    #[tokio::test]
    async fn cancelled_share_is_not_retried() {
        assert_eq!(
            share_with_fallback(&Cancelling, &message()).await,
            ShareOutcome::Failed
        );
    }

    #[tokio::test]
    async fn no_share_target_reports_failure() {
        assert_eq!(
            share_with_fallback(&NoShare, &message()).await,
            ShareOutcome::Failed
        );
    }

    #[test]
    fn answer_cues_follow_correctness() {
        assert_eq!(Sound::for_answer(Some(true)), Sound::Correct);
        assert_eq!(Sound::for_answer(Some(false)), Sound::Wrong);
        assert_eq!(Sound::for_answer(None).name(), "select");

        let audio = RecordingAudio::new();
        audio.play(Sound::Finish).unwrap();
        assert_eq!(audio.played(), vec![Sound::Finish]);
    }
}

//! Terminal adapters: renderer, sound cues, share target and the stdin intent reader.

use std::io::Write;

use async_trait::async_trait;
use quiz_core::model::{QuizSummary, QuizVariant, ShareMessage};
use services::session::{OptionState, QuizView, option_label};
use services::{
    AudioPlayer, EffectError, IntentSender, QuizIntent, QuizPhase, Renderer, ShareOutcome,
    ShareTarget, Sound,
};
use tokio::io::{AsyncBufReadExt, BufReader};

pub struct TerminalRenderer {
    variant: QuizVariant,
}

impl TerminalRenderer {
    pub fn new(variant: QuizVariant) -> Self {
        Self { variant }
    }

    fn print_summary(&self, summary: &QuizSummary) {
        println!("=== {} ===", self.variant.title());
        println!(
            "Score: {}/{}  ({} answered, {} correct)",
            summary.score(),
            summary.max_score(),
            summary.answered(),
            summary.correct()
        );
        if let Some(category) = summary.dominant_category() {
            println!("Brain type: {category} [{}]", category.icon());
        }
        println!("Time: {}s", summary.duration().num_seconds());
        println!("(r) restart  (s) share  (q) quit");
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &QuizView) {
        println!();
        if view.is_finished() {
            match &view.summary {
                Some(summary) => self.print_summary(summary),
                None => println!("Quiz finished. Score: {}", view.score),
            }
            return;
        }

        let Some(question) = &view.question else {
            return;
        };
        println!(
            "[{}/{}] score {}  {}% done",
            view.position + 1,
            view.total,
            view.score,
            view.progress.percent()
        );
        match question.category_icon {
            Some(icon) => println!("[{icon}] {}", question.prompt),
            None => println!("{}", question.prompt),
        }
        for option in &question.options {
            let marker = match option.state {
                OptionState::Idle => "",
                OptionState::SelectedCorrect => "  <- correct!",
                OptionState::SelectedWrong => "  <- your answer",
                OptionState::RevealedCorrect => "  <- right answer",
                OptionState::Selected => "  <- your pick",
            };
            println!("  {}) {}{marker}", option.label, option.text);
        }

        if view.phase == QuizPhase::Feedback {
            if view.highlight {
                println!("*** Well done! ***");
            }
            if let Some(explanation) = &question.explanation {
                println!("{explanation}");
            }
            println!("(n) next  (r) restart  (q) quit");
        } else {
            let last = option_label(question.options.len().saturating_sub(1));
            println!("Answer with a letter (A-{last}), or (r) restart  (q) quit");
        }
    }

    fn share_completed(&mut self, outcome: ShareOutcome) {
        match outcome {
            ShareOutcome::Shared => println!("Result shared."),
            ShareOutcome::CopiedToClipboard => println!("Result copied to clipboard!"),
            ShareOutcome::Failed => println!("Could not share the result."),
        }
    }
}

/// Sound port for terminals: rings the bell on a wrong answer.
pub struct TerminalBell;

impl AudioPlayer for TerminalBell {
    fn play(&self, sound: Sound) -> Result<(), EffectError> {
        tracing::debug!(sound = sound.name(), "sound cue");
        if sound == Sound::Wrong {
            let mut stderr = std::io::stderr();
            stderr
                .write_all(b"\x07")
                .and_then(|()| stderr.flush())
                .map_err(|e| EffectError::Audio(e.to_string()))?;
        }
        Ok(())
    }
}

/// Terminals have no share sheet; the "clipboard" is standard output.
pub struct StdoutShare;

#[async_trait]
impl ShareTarget for StdoutShare {
    async fn share_native(&self, _message: &ShareMessage) -> Result<(), EffectError> {
        Err(EffectError::ShareUnsupported)
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), EffectError> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "----\n{text}\n----")
            .and_then(|()| stdout.flush())
            .map_err(|e| EffectError::Clipboard(e.to_string()))
    }
}

/// Map one input line to an intent.
pub fn parse_intent(line: &str) -> Option<QuizIntent> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Some(QuizIntent::Advance),
        "r" | "restart" => Some(QuizIntent::Restart),
        "s" | "share" => Some(QuizIntent::Share),
        "q" | "quit" | "exit" => Some(QuizIntent::Quit),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c @ 'a'..='z'), None) => Some(QuizIntent::Select(c as usize - 'a' as usize)),
                _ => None,
            }
        }
    }
}

/// Read stdin line by line and forward intents until quit or end of input.
pub async fn read_intents(intents: IntentSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read input");
                break;
            }
        };
        let Some(intent) = parse_intent(&line) else {
            println!("Unrecognized input: {line:?}");
            continue;
        };
        if !intents.send(intent) || intent == QuizIntent::Quit {
            return;
        }
    }
    intents.send(QuizIntent::Quit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_select_by_display_position() {
        assert_eq!(parse_intent("a"), Some(QuizIntent::Select(0)));
        assert_eq!(parse_intent(" C "), Some(QuizIntent::Select(2)));
        assert_eq!(parse_intent(""), Some(QuizIntent::Advance));
        assert_eq!(parse_intent("q"), Some(QuizIntent::Quit));
        assert_eq!(parse_intent("ab"), None);
        assert_eq!(parse_intent("7"), None);
    }
}

mod driver;
mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use driver::{IntentSender, QuizDriver, QuizIntent};
pub use plan::{OptionOrder, ResampleStream, SequenceBuilder};
pub use progress::{SavedProgress, SessionProgress};
pub use service::{AdvanceOutcome, FeedbackTicket, QuizPhase, QuizSession, SubmitOutcome};
pub use view::{OptionState, OptionView, QuestionView, QuizView, Renderer, option_label};
pub use workflow::{ProgressWriter, QuizLoopService};

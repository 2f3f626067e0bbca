use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::service::{FeedbackTicket, QuizSession};
use super::view::{QuizView, Renderer};
use super::workflow::{ProgressWriter, QuizLoopService};

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizIntent {
    /// Pick the option at this display position.
    Select(usize),
    Advance,
    Restart,
    Share,
    Quit,
}

#[derive(Debug)]
enum DriverEvent {
    Intent(QuizIntent),
    AutoAdvance(FeedbackTicket),
}

/// Handle front-ends use to feed intents into a running driver.
///
/// The driver stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct IntentSender {
    tx: mpsc::UnboundedSender<DriverEvent>,
}

impl IntentSender {
    /// Queue `intent`; returns `false` if the driver has stopped.
    pub fn send(&self, intent: QuizIntent) -> bool {
        self.tx.send(DriverEvent::Intent(intent)).is_ok()
    }
}

/// Event loop around one session.
///
/// Handles one event at a time, renders after every transition, and owns the
/// auto-advance timer. A pending timer is aborted by a manual advance or a
/// restart; if it fires anyway its stale ticket makes it inert. Progress is
/// handed to a `ProgressWriter` after rendering, so a slow store never holds
/// up the next phase.
pub struct QuizDriver<R: Renderer> {
    service: Arc<QuizLoopService>,
    session: QuizSession,
    renderer: R,
    events: mpsc::UnboundedReceiver<DriverEvent>,
    timer_tx: mpsc::WeakUnboundedSender<DriverEvent>,
    timer: Option<JoinHandle<()>>,
}

impl<R: Renderer> QuizDriver<R> {
    #[must_use]
    pub fn new(
        service: Arc<QuizLoopService>,
        session: QuizSession,
        renderer: R,
    ) -> (Self, IntentSender) {
        let (tx, events) = mpsc::unbounded_channel();
        let driver = Self {
            service,
            session,
            renderer,
            events,
            timer_tx: tx.downgrade(),
            timer: None,
        };
        (driver, IntentSender { tx })
    }

    /// Run until `Quit` or until every `IntentSender` is gone.
    ///
    /// Waits for the last progress snapshot to be written before returning.
    pub async fn run(mut self) -> (QuizSession, R) {
        let writer = self.service.progress_writer();
        self.render();
        while let Some(event) = self.events.recv().await {
            match event {
                DriverEvent::Intent(QuizIntent::Quit) => break,
                DriverEvent::Intent(intent) => self.handle(intent, &writer).await,
                DriverEvent::AutoAdvance(ticket) => {
                    if self
                        .service
                        .apply_advance_with_ticket(&mut self.session, ticket)
                        .is_some()
                    {
                        self.timer = None;
                        self.render();
                        writer.queue(self.session.saved_progress());
                    }
                }
            }
        }
        self.cancel_timer();
        writer.finish().await;
        (self.session, self.renderer)
    }

    async fn handle(&mut self, intent: QuizIntent, writer: &ProgressWriter) {
        match intent {
            QuizIntent::Select(pos) => {
                if let Some(outcome) = self.service.apply_answer(&mut self.session, pos) {
                    self.schedule_auto_advance(outcome.ticket);
                    self.render();
                    writer.queue(self.session.saved_progress());
                }
            }
            QuizIntent::Advance => {
                if self.service.apply_advance(&mut self.session).is_some() {
                    self.cancel_timer();
                    self.render();
                    writer.queue(self.session.saved_progress());
                }
            }
            QuizIntent::Restart => {
                self.cancel_timer();
                self.session.restart();
                self.render();
                writer.queue(self.session.saved_progress());
            }
            QuizIntent::Share => {
                let outcome = self.service.share_result(&self.session).await;
                self.renderer.share_completed(outcome);
            }
            QuizIntent::Quit => {}
        }
    }

    fn schedule_auto_advance(&mut self, ticket: FeedbackTicket) {
        let Some(delay) = self.service.config().auto_advance() else {
            return;
        };
        self.cancel_timer();
        let tx = self.timer_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(DriverEvent::AutoAdvance(ticket));
            }
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn render(&mut self) {
        let view = QuizView::from_session(&self.session);
        self.renderer.render(&view);
    }
}

//! Session runtime executor

use super::traits::{ChatOutbox, QuizSource, SessionStore};
use crate::state_machine::{
    transition, ChatId, Effect, Event, MessageRef, Reply, Session, SessionContext,
};
use crate::transport::render;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// An event plus where it came from: the chat that replies go to, and the
/// transport message whose control produced it
#[derive(Debug, Clone)]
pub struct Envelope {
    pub event: Event,
    pub chat: ChatId,
    pub origin: Option<MessageRef>,
}

impl Envelope {
    pub fn new(event: Event, chat: ChatId) -> Self {
        Self {
            event,
            chat,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Option<MessageRef>) -> Self {
        self.origin = origin;
        self
    }
}

/// Single-user actor: applies events in arrival order and performs the
/// resulting effects. Only this task ever writes its user's session.
pub struct SessionRuntime<S, Q, O>
where
    S: SessionStore + 'static,
    Q: QuizSource + 'static,
    O: ChatOutbox + 'static,
{
    context: SessionContext,
    store: Arc<S>,
    quiz_source: Arc<Q>,
    outbox: Arc<O>,
    event_rx: mpsc::Receiver<Envelope>,
    event_tx: mpsc::Sender<Envelope>,
}

impl<S, Q, O> SessionRuntime<S, Q, O>
where
    S: SessionStore + 'static,
    Q: QuizSource + 'static,
    O: ChatOutbox + 'static,
{
    pub fn new(
        context: SessionContext,
        store: Arc<S>,
        quiz_source: Arc<Q>,
        outbox: Arc<O>,
        event_rx: mpsc::Receiver<Envelope>,
        event_tx: mpsc::Sender<Envelope>,
    ) -> Self {
        Self {
            context,
            store,
            quiz_source,
            outbox,
            event_rx,
            event_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(user_id = %self.context.user_id, "Starting session runtime");

        while let Some(envelope) = self.event_rx.recv().await {
            if let Err(e) = self.process_event(envelope).await {
                tracing::error!(user_id = %self.context.user_id, error = %e, "Error handling event");
            }
        }

        tracing::info!(user_id = %self.context.user_id, "Session runtime stopped");
    }

    async fn process_event(&mut self, envelope: Envelope) -> Result<(), String> {
        let user_id = self.context.user_id;
        let Envelope {
            event,
            chat,
            origin,
        } = envelope;

        // Generator results are fed back through the machine in order
        let mut events_to_process = VecDeque::from([event]);

        while let Some(event) = events_to_process.pop_front() {
            let session = self.store.get_or_create(user_id).await;
            let event_name = event.name();

            let result = match transition(&session, &self.context, event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::info!(
                        user_id = %user_id,
                        event = event_name,
                        state = session.state.name(),
                        reason = %e,
                        "Event rejected"
                    );
                    self.deliver(Effect::send(e.guidance()), chat, origin).await;
                    continue;
                }
            };

            tracing::debug!(
                user_id = %user_id,
                event = event_name,
                from = session.state.name(),
                to = result.new_session.state.name(),
                cycle = %result.new_session.cycle,
                quiz_count = result.new_session.quiz_count,
                "Transition applied"
            );

            self.persist(&session, &result.new_session).await?;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect, chat, origin).await {
                    events_to_process.push_back(generated_event);
                }
            }
        }

        Ok(())
    }

    /// Store the new session; Start and Stop go through the store's reset
    async fn persist(&self, previous: &Session, next: &Session) -> Result<(), String> {
        let user_id = self.context.user_id;
        if *next == previous.reset() {
            return self.store.reset(user_id).await;
        }
        self.store.update(user_id, next).await
    }

    async fn execute_effect(
        &self,
        effect: Effect,
        chat: ChatId,
        origin: Option<MessageRef>,
    ) -> Option<Event> {
        match effect {
            Effect::RequestQuiz { topic, cycle } => {
                tracing::info!(
                    user_id = %self.context.user_id,
                    topic = topic.slug(),
                    cycle = %cycle,
                    "Requesting quiz"
                );
                match self.quiz_source.generate(topic).await {
                    Ok(quiz) => Some(Event::QuizGenerated { cycle, quiz }),
                    Err(e) => {
                        tracing::warn!(
                            user_id = %self.context.user_id,
                            topic = topic.slug(),
                            error = %e,
                            "Quiz generation failed"
                        );
                        Some(Event::GenerationFailed {
                            cycle,
                            reason: e.to_string(),
                        })
                    }
                }
            }

            Effect::ScheduleAdvance { delay, cycle } => {
                let event_tx = self.event_tx.clone();
                let user_id = self.context.user_id;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if event_tx
                        .send(Envelope::new(Event::AdvanceDue { cycle }, chat))
                        .await
                        .is_err()
                    {
                        tracing::debug!(user_id = %user_id, "Session runtime gone before advance fired");
                    }
                });
                None
            }

            effect @ (Effect::Send(_) | Effect::EditOrigin(_)) => {
                self.deliver(effect, chat, origin).await;
                None
            }
        }
    }

    /// Render and deliver a reply. Delivery failures are logged, never fatal.
    async fn deliver(&self, effect: Effect, chat: ChatId, origin: Option<MessageRef>) {
        let (reply, edit_target) = match effect {
            Effect::Send(reply) => (reply, None),
            Effect::EditOrigin(reply) => (reply, origin),
            _ => return,
        };
        let message = render::render(&reply);

        if let Some(target) = edit_target {
            match self.outbox.edit_message(chat, target, &message.text).await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(error = %e, "Edit failed, sending a new message instead");
                }
            }
        }

        if let Err(e) = self.outbox.send_message(chat, &message).await {
            tracing::error!(
                user_id = %self.context.user_id,
                reply = reply_name(&reply),
                error = %e,
                "Failed to deliver reply"
            );
        }
    }
}

fn reply_name(reply: &Reply) -> &'static str {
    match reply {
        Reply::Welcome => "welcome",
        Reply::TopicStarted { .. } => "topic_started",
        Reply::Question { .. } => "question",
        Reply::Verdict { .. } => "verdict",
        Reply::CapReached { .. } => "cap_reached",
        Reply::GenerationFailed => "generation_failed",
        Reply::Stopped => "stopped",
        Reply::ChooseTopicFirst => "choose_topic_first",
        Reply::NoActiveQuiz => "no_active_quiz",
    }
}

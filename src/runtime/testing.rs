//! Mock implementations for testing
//!
//! These mocks enable end-to-end session tests without a chat transport or a
//! generation backend.

use super::traits::*;
use super::{RuntimeSettings, SessionManager};
use crate::llm::LlmError;
use crate::quiz::{GenerationError, OptionLabel, Quiz, Topic};
use crate::state_machine::{ChatId, Event, MessageRef, Session, UserId};
use crate::store::InMemorySessionStore;
use crate::transport::OutgoingMessage;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock Quiz Source
// ============================================================================

/// Quiz source that returns queued results
pub struct MockQuizSource {
    results: Mutex<VecDeque<Result<Quiz, GenerationError>>>,
    delay: Option<Duration>,
    /// Topics of every generate call, in order
    pub requests: Mutex<Vec<Topic>>,
}

#[allow(dead_code)]
impl MockQuizSource {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Delay every generate call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful result
    pub fn queue_quiz(&self, quiz: Quiz) {
        self.results.lock().unwrap().push_back(Ok(quiz));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: GenerationError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<Topic> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockQuizSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuizSource for MockQuizSource {
    async fn generate(&self, topic: Topic) -> Result<Quiz, GenerationError> {
        self.requests.lock().unwrap().push(topic);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock quiz queued").into()))
    }
}

// ============================================================================
// Recording Outbox
// ============================================================================

/// Something the runtime delivered to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent {
        chat: ChatId,
        message: OutgoingMessage,
    },
    Edited {
        chat: ChatId,
        message: MessageRef,
        text: String,
    },
}

impl Delivery {
    pub fn text(&self) -> &str {
        match self {
            Delivery::Sent { message, .. } => &message.text,
            Delivery::Edited { text, .. } => text,
        }
    }

    pub fn chat(&self) -> ChatId {
        match self {
            Delivery::Sent { chat, .. } | Delivery::Edited { chat, .. } => *chat,
        }
    }
}

/// Outbox that records every delivery
#[derive(Default)]
pub struct RecordingOutbox {
    deliveries: Mutex<Vec<Delivery>>,
    fail_edits: AtomicBool,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every edit fail, as when the original message was deleted
    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatOutbox for RecordingOutbox {
    async fn send_message(&self, chat: ChatId, message: &OutgoingMessage) -> Result<(), String> {
        self.deliveries.lock().unwrap().push(Delivery::Sent {
            chat,
            message: message.clone(),
        });
        Ok(())
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageRef,
        text: &str,
    ) -> Result<(), String> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err("message to edit not found".to_string());
        }
        self.deliveries.lock().unwrap().push(Delivery::Edited {
            chat,
            message,
            text: text.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Test Runtime Harness
// ============================================================================

/// A session manager wired to mocks, with a short advance delay
pub struct TestRuntime {
    pub manager: SessionManager<InMemorySessionStore, MockQuizSource, RecordingOutbox>,
    pub store: Arc<InMemorySessionStore>,
    pub quiz_source: Arc<MockQuizSource>,
    pub outbox: Arc<RecordingOutbox>,
    pub settings: RuntimeSettings,
}

impl TestRuntime {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> TestRuntimeBuilder {
        TestRuntimeBuilder::default()
    }

    /// Dispatch an event from `user` in their private chat (whose id equals the user id)
    pub async fn send(&self, user: u64, event: Event, origin: Option<MessageRef>) {
        self.send_from(user, chat_of(user), event, origin).await;
    }

    /// Dispatch an event from `user` in `chat`
    pub async fn send_from(
        &self,
        user: u64,
        chat: ChatId,
        event: Event,
        origin: Option<MessageRef>,
    ) {
        self.manager
            .dispatch(UserId(user), chat, event, origin)
            .await
            .unwrap();
    }

    pub async fn session(&self, user: u64) -> Option<Session> {
        self.manager.session(UserId(user)).await
    }

    /// Deliveries addressed to `user`'s chat
    pub fn deliveries_to(&self, user: u64) -> Vec<Delivery> {
        self.outbox
            .deliveries()
            .into_iter()
            .filter(|d| d.chat() == chat_of(user))
            .collect()
    }

    /// Wait until `user` has received at least `count` deliveries
    pub async fn wait_for_deliveries(&self, user: u64, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.deliveries_to(user).len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    /// Wait until at least `count` deliveries have been made to any chat
    pub async fn wait_for_deliveries_total(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.outbox.deliveries().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    /// Wait until `user`'s session satisfies `check`
    pub async fn wait_for_session(
        &self,
        user: u64,
        check: impl Fn(&Session) -> bool,
        timeout: Duration,
    ) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.session(user).await.as_ref().is_some_and(&check) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

fn chat_of(user: u64) -> ChatId {
    ChatId(i64::try_from(user).unwrap())
}

pub struct TestRuntimeBuilder {
    quiz_source: MockQuizSource,
    settings: RuntimeSettings,
}

impl Default for TestRuntimeBuilder {
    fn default() -> Self {
        Self {
            quiz_source: MockQuizSource::new(),
            settings: RuntimeSettings {
                advance_delay: Duration::from_millis(50),
                ..RuntimeSettings::default()
            },
        }
    }
}

#[allow(dead_code)]
impl TestRuntimeBuilder {
    pub fn quiz_source(mut self, quiz_source: MockQuizSource) -> Self {
        self.quiz_source = quiz_source;
        self
    }

    pub fn max_quizzes(mut self, max_quizzes: u32) -> Self {
        self.settings.max_quizzes = max_quizzes;
        self
    }

    pub fn advance_delay(mut self, delay: Duration) -> Self {
        self.settings.advance_delay = delay;
        self
    }

    pub fn build(self) -> TestRuntime {
        let store = Arc::new(InMemorySessionStore::new());
        let quiz_source = Arc::new(self.quiz_source);
        let outbox = Arc::new(RecordingOutbox::new());
        let manager = SessionManager::new(
            store.clone(),
            quiz_source.clone(),
            outbox.clone(),
            self.settings,
        );
        TestRuntime {
            manager,
            store,
            quiz_source,
            outbox,
            settings: self.settings,
        }
    }
}

/// A valid quiz whose correct answer is `correct`
pub fn sample_quiz(question: &str, correct: OptionLabel) -> Quiz {
    Quiz::new(
        question.to_string(),
        [
            "पहला".to_string(),
            "दूसरा".to_string(),
            "तीसरा".to_string(),
            "चौथा".to_string(),
        ],
        correct,
        format!("{question} की व्याख्या"),
    )
    .unwrap()
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{SessionState, MAX_QUIZZES};

    const WAIT: Duration = Duration::from_secs(2);

    fn answer(text: &str) -> Event {
        Event::SubmitAnswer {
            text: text.to_string(),
        }
    }

    fn choose(topic: Topic) -> Event {
        Event::ChooseTopic { topic }
    }

    #[tokio::test]
    async fn test_start_shows_topic_picker() {
        let rt = TestRuntime::new().build();
        rt.send(1, Event::Start, None).await;

        assert!(rt.wait_for_deliveries(1, 1, WAIT).await);
        match &rt.deliveries_to(1)[0] {
            Delivery::Sent { message, .. } => {
                assert!(message.text.starts_with("नमस्ते!"));
                assert_eq!(message.controls.len(), 6);
                assert_eq!(message.controls[1].payload, "topic:science");
            }
            other => panic!("expected a new message, got {other:?}"),
        }

        let session = rt.session(1).await.unwrap();
        assert_eq!(session.state, SessionState::Idle);
        assert_eq!(session.quiz_count, 0);
        assert!(rt.quiz_source.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_full_round_with_auto_advance() {
        let source = MockQuizSource::new();
        source.queue_quiz(sample_quiz("पहला सवाल", OptionLabel::B));
        source.queue_quiz(sample_quiz("दूसरा सवाल", OptionLabel::C));
        let rt = TestRuntime::new().quiz_source(source).build();

        rt.send(7, Event::Start, None).await;
        rt.send(7, choose(Topic::Science), Some(MessageRef(40))).await;

        assert!(
            rt.wait_for_session(7, |s| s.quiz_count == 1 && s.active_quiz().is_some(), WAIT)
                .await
        );
        let deliveries = rt.deliveries_to(7);
        assert_eq!(
            deliveries[1],
            Delivery::Edited {
                chat: ChatId(7),
                message: MessageRef(40),
                text: "ठीक है, हम विज्ञान पर क्विज़ शुरू कर रहे हैं...".to_string(),
            }
        );
        assert!(deliveries[2].text().contains("सवाल 1/100:</b> पहला सवाल"));

        // Case and whitespace are ignored
        rt.send(7, answer(" b "), None).await;
        assert!(rt.wait_for_deliveries(7, 4, WAIT).await);
        assert!(rt.deliveries_to(7)[3].text().starts_with("सही जवाब! 🎉"));

        // The next quiz arrives on its own after the delay
        assert!(rt.wait_for_session(7, |s| s.quiz_count == 2, WAIT).await);
        assert!(rt.wait_for_deliveries(7, 5, WAIT).await);
        assert!(rt.deliveries_to(7)[4].text().contains("सवाल 2/100:</b> दूसरा सवाल"));
        assert_eq!(
            rt.quiz_source.recorded_requests(),
            vec![Topic::Science, Topic::Science]
        );

        rt.send(7, answer("a"), None).await;
        assert!(rt.wait_for_deliveries(7, 6, WAIT).await);
        let verdict = rt.deliveries_to(7)[5].text().to_string();
        assert!(verdict.starts_with("ग़लत जवाब! 😔"));
        assert!(verdict.contains("सही जवाब था: <b>C</b>"));
    }

    #[tokio::test]
    async fn test_generation_failure_then_retry() {
        let source = MockQuizSource::new();
        source.queue_error(GenerationError::Timeout(Duration::from_secs(30)));
        source.queue_quiz(sample_quiz("सवाल", OptionLabel::A));
        let rt = TestRuntime::new().quiz_source(source).build();

        rt.send(3, choose(Topic::History), None).await;
        assert!(rt.wait_for_deliveries(3, 2, WAIT).await);

        let failure = &rt.deliveries_to(3)[1];
        assert!(failure.text().starts_with("माफ़ कीजिए"));
        match failure {
            Delivery::Sent { message, .. } => assert_eq!(message.controls.len(), 6),
            other => panic!("expected a new message, got {other:?}"),
        }
        let session = rt.session(3).await.unwrap();
        assert_eq!(session.quiz_count, 0);
        assert_eq!(session.current_topic(), Some(Topic::History));
        assert!(session.active_quiz().is_none());

        // Picking the topic again retries
        rt.send(3, choose(Topic::History), None).await;
        assert!(
            rt.wait_for_session(3, |s| s.quiz_count == 1 && s.active_quiz().is_some(), WAIT)
                .await
        );
    }

    #[tokio::test]
    async fn test_answer_before_topic_gets_guidance() {
        let rt = TestRuntime::new().build();
        rt.send(4, answer("A"), None).await;

        assert!(rt.wait_for_deliveries(4, 1, WAIT).await);
        assert_eq!(
            rt.deliveries_to(4)[0].text(),
            "कृपया पहले /start कमांड से एक विषय चुनें."
        );
        // Give any stray effect a chance to show up
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(rt.deliveries_to(4).len(), 1);
        assert!(rt.quiz_source.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_cap_stops_generation() {
        let source = MockQuizSource::new();
        source.queue_quiz(sample_quiz("एक", OptionLabel::A));
        source.queue_quiz(sample_quiz("दो", OptionLabel::A));
        let rt = TestRuntime::new().quiz_source(source).max_quizzes(2).build();

        rt.send(5, choose(Topic::Art), None).await;
        assert!(rt.wait_for_session(5, |s| s.active_quiz().is_some(), WAIT).await);
        rt.send(5, answer("a"), None).await;
        assert!(
            rt.wait_for_session(5, |s| s.quiz_count == 2 && s.active_quiz().is_some(), WAIT)
                .await
        );
        rt.send(5, answer("a"), None).await;

        // The second advance hits the cap instead of generating
        assert!(
            rt.wait_for_deliveries(5, 6, WAIT).await,
            "deliveries: {:?}",
            rt.deliveries_to(5)
        );
        assert!(rt.deliveries_to(5)[5]
            .text()
            .starts_with("आप 2 क्विज़ पूरे कर चुके हैं."));
        assert_eq!(rt.quiz_source.recorded_requests().len(), 2);

        // An answer now has nothing to grade
        rt.send(5, answer("a"), None).await;
        assert!(rt.wait_for_deliveries(5, 7, WAIT).await);
        assert!(rt.deliveries_to(5)[6].text().starts_with("अभी कोई सवाल खुला नहीं है."));
        let session = rt.session(5).await.unwrap();
        assert_eq!(session.quiz_count, 2);
        assert_eq!(rt.quiz_source.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_default_cap_is_one_hundred() {
        let rt = TestRuntime::new().build();
        assert_eq!(rt.settings.max_quizzes, MAX_QUIZZES);
        assert_eq!(MAX_QUIZZES, 100);
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_advance() {
        let source = MockQuizSource::new();
        source.queue_quiz(sample_quiz("सवाल", OptionLabel::D));
        source.queue_quiz(sample_quiz("कभी नहीं", OptionLabel::D));
        let rt = TestRuntime::new().quiz_source(source).build();

        rt.send(8, choose(Topic::Sports), None).await;
        assert!(rt.wait_for_session(8, |s| s.active_quiz().is_some(), WAIT).await);
        rt.send(8, answer("d"), None).await;
        rt.send(8, Event::Stop, Some(MessageRef(99))).await;

        assert!(rt.wait_for_session(8, |s| s.state == SessionState::Idle, WAIT).await);
        tokio::time::sleep(rt.settings.advance_delay * 4).await;

        assert_eq!(rt.quiz_source.recorded_requests().len(), 1);
        let last = rt.deliveries_to(8).pop().unwrap();
        assert_eq!(
            last,
            Delivery::Edited {
                chat: ChatId(8),
                message: MessageRef(99),
                text: "क्विज़ बंद कर दिया गया है. नया क्विज़ शुरू करने के लिए /start कमांड का उपयोग करें."
                    .to_string(),
            }
        );
        let session = rt.session(8).await.unwrap();
        assert_eq!(session.quiz_count, 0);
    }

    #[tokio::test]
    async fn test_rechoose_discards_old_advance() {
        let source = MockQuizSource::new();
        source.queue_quiz(sample_quiz("विज्ञान सवाल", OptionLabel::A));
        source.queue_quiz(sample_quiz("इतिहास सवाल", OptionLabel::B));
        source.queue_quiz(sample_quiz("कभी नहीं", OptionLabel::C));
        let rt = TestRuntime::new().quiz_source(source).build();

        rt.send(9, choose(Topic::Science), None).await;
        assert!(rt.wait_for_session(9, |s| s.active_quiz().is_some(), WAIT).await);
        rt.send(9, answer("a"), None).await;
        rt.send(9, choose(Topic::History), None).await;

        let history_shown = |s: &Session| {
            s.current_topic() == Some(Topic::History) && s.active_quiz().is_some()
        };
        assert!(rt.wait_for_session(9, history_shown, WAIT).await);
        tokio::time::sleep(rt.settings.advance_delay * 4).await;

        let session = rt.session(9).await.unwrap();
        assert_eq!(session.quiz_count, 1);
        assert_eq!(
            session.active_quiz().map(Quiz::question),
            Some("इतिहास सवाल")
        );
        assert_eq!(
            rt.quiz_source.recorded_requests(),
            vec![Topic::Science, Topic::History]
        );
    }

    #[tokio::test]
    async fn test_users_do_not_block_each_other() {
        let source = MockQuizSource::new().with_delay(Duration::from_millis(500));
        source.queue_quiz(sample_quiz("धीमा", OptionLabel::A));
        let rt = TestRuntime::new().quiz_source(source).build();

        rt.send(1, choose(Topic::Geography), None).await;
        let started = tokio::time::Instant::now();
        rt.send(2, Event::Start, None).await;

        assert!(rt.wait_for_deliveries(2, 1, WAIT).await);
        assert!(started.elapsed() < Duration::from_millis(400));
        assert!(rt
            .session(1)
            .await
            .is_none_or(|s| s.active_quiz().is_none()));

        assert!(rt.wait_for_session(1, |s| s.active_quiz().is_some(), WAIT).await);
    }

    #[tokio::test]
    async fn test_events_for_one_user_are_ordered() {
        let source = MockQuizSource::new().with_delay(Duration::from_millis(100));
        source.queue_quiz(sample_quiz("सवाल", OptionLabel::A));
        let rt = TestRuntime::new().quiz_source(source).build();

        // The answer queues behind the generation and grades the new quiz
        rt.send(6, choose(Topic::Technology), None).await;
        rt.send(6, answer("a"), None).await;

        assert!(rt.wait_for_deliveries(6, 3, WAIT).await);
        let texts: Vec<String> = rt
            .deliveries_to(6)
            .iter()
            .map(|d| d.text().to_string())
            .collect();
        assert!(texts[1].contains("सवाल 1/100"), "{texts:?}");
        assert!(texts[2].starts_with("सही जवाब!"), "{texts:?}");
    }

    #[tokio::test]
    async fn test_failed_edit_falls_back_to_send() {
        let rt = TestRuntime::new().build();
        rt.outbox.fail_edits();

        rt.send(11, Event::Stop, Some(MessageRef(5))).await;
        assert!(rt.wait_for_deliveries(11, 1, WAIT).await);
        match &rt.deliveries_to(11)[0] {
            Delivery::Sent { message, .. } => {
                assert!(message.text.starts_with("क्विज़ बंद कर दिया गया है."));
            }
            other => panic!("expected a new message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stop_resets_stored_session() {
        let rt = TestRuntime::new().build();
        rt.send(12, choose(Topic::Art), None).await;
        assert!(rt.wait_for_deliveries(12, 2, WAIT).await);
        let before = rt.session(12).await.unwrap();
        assert_eq!(before.current_topic(), Some(Topic::Art));

        rt.send(12, Event::Stop, None).await;
        assert!(rt.wait_for_deliveries(12, 3, WAIT).await);
        let after = rt.session(12).await.unwrap();
        assert_eq!(after, before.reset());
        assert_eq!(after.state, SessionState::Idle);
        assert_ne!(after.cycle, before.cycle);
    }

    #[tokio::test]
    async fn test_replies_follow_the_chat_of_each_event() {
        let group = ChatId(-500);
        let source = MockQuizSource::new();
        source.queue_quiz(sample_quiz("पहला", OptionLabel::A));
        source.queue_quiz(sample_quiz("दूसरा", OptionLabel::B));
        let rt = TestRuntime::new().quiz_source(source).build();

        rt.send_from(1, group, Event::Start, None).await;
        assert!(rt.wait_for_deliveries_total(1, WAIT).await);
        rt.send(1, Event::Start, None).await;
        assert!(rt.wait_for_deliveries_total(2, WAIT).await);
        let chats: Vec<ChatId> = rt.outbox.deliveries().iter().map(Delivery::chat).collect();
        assert_eq!(chats, vec![group, ChatId(1)]);

        // Topic picked in the private chat, answered in the group: the
        // verdict and the auto-advanced question both go to the group
        rt.send(1, choose(Topic::Science), Some(MessageRef(10))).await;
        assert!(rt.wait_for_session(1, |s| s.active_quiz().is_some(), WAIT).await);
        rt.send_from(1, group, answer("a"), None).await;
        assert!(rt.wait_for_session(1, |s| s.quiz_count == 2, WAIT).await);
        assert!(rt.wait_for_deliveries_total(6, WAIT).await);

        let deliveries = rt.outbox.deliveries();
        let chats: Vec<ChatId> = deliveries.iter().map(Delivery::chat).collect();
        assert_eq!(chats, vec![group, ChatId(1), ChatId(1), ChatId(1), group, group]);
        assert!(deliveries[4].text().starts_with("सही जवाब!"));
        assert!(deliveries[5].text().contains("सवाल 2/100:</b> दूसरा"));
    }
}

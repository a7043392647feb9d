//! End-to-end tests for the ThinkFirst tutoring pipeline.
//!
//! These tests drive whole sessions through [`Tutor`] the way a client
//! does: every turn sends back the history and the context from the
//! previous reply.

use std::sync::{Arc, Mutex};

use thinkfirst_core::context::ConversationContext;
use thinkfirst_core::error::{ProviderError, RealtimeError};
use thinkfirst_core::message::{ChatTurn, Message, Role};
use thinkfirst_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use thinkfirst_core::realtime::{RealtimeHub, RealtimeKind, RealtimeSnippet, RealtimeSource};
use thinkfirst_tutor::{
    MemoryCheckRequest, ReplyMode, Rule, TimeTravelContext, Tutor, TurnRequest, TurnResponse,
};

// ── Mock Provider ────────────────────────────────────────────────────────

/// Returns scripted responses in sequence and keeps every request.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        Self {
            responses: Mutex::new(replies.iter().map(|r| text_response(r)).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn instruction(&self, call: usize) -> String {
        let requests = self.requests.lock().unwrap();
        let first = &requests[call].messages[0];
        assert_eq!(first.role, Role::System);
        first.content.clone()
    }

    fn request(&self, call: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[call].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();
        if call >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                call,
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[call].clone())
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Answers every weather lookup with the same conditions.
struct FixedWeather;

#[async_trait::async_trait]
impl RealtimeSource for FixedWeather {
    fn name(&self) -> &str {
        "fixed_weather"
    }

    fn kind(&self) -> RealtimeKind {
        RealtimeKind::Weather
    }

    async fn fetch(&self, _message: &str) -> Result<RealtimeSnippet, RealtimeError> {
        Ok(RealtimeSnippet {
            kind: RealtimeKind::Weather,
            source: "fixed_weather".into(),
            text: "Current weather in Paris: 18°C, light rain".into(),
            data: None,
        })
    }
}

/// Fails every lookup.
struct DownNews;

#[async_trait::async_trait]
impl RealtimeSource for DownNews {
    fn name(&self) -> &str {
        "down_news"
    }

    fn kind(&self) -> RealtimeKind {
        RealtimeKind::News
    }

    async fn fetch(&self, _message: &str) -> Result<RealtimeSnippet, RealtimeError> {
        Err(RealtimeError::Upstream {
            source_name: "down_news".into(),
            status_code: 503,
            message: "maintenance".into(),
        })
    }
}

fn tutor(provider: Arc<ScriptedProvider>) -> Tutor {
    let mut hub = RealtimeHub::new();
    hub.register(Box::new(FixedWeather));
    hub.register(Box::new(DownNews));
    Tutor::new(provider, "mock-model").with_realtime(hub)
}

/// Client-side session: history plus the last context.
#[derive(Default)]
struct Client {
    history: Vec<ChatTurn>,
    context: Option<ConversationContext>,
}

impl Client {
    async fn send(&mut self, tutor: &Tutor, message: &str) -> TurnResponse {
        let mut request = TurnRequest::new(message).with_history(self.history.clone());
        if let Some(ctx) = &self.context {
            request = request.with_context(ctx.clone());
        }
        let response = tutor.respond(request).await.unwrap();
        self.history.push(ChatTurn::user(message));
        self.history.push(ChatTurn::assistant(&response.reply.text));
        self.context = Some(response.context.clone());
        response
    }
}

// ── Sessions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_progressive_hints_through_a_session() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"text":"What happens if you split the list in two?","mode":"learning","isHint":true,"isSolution":false}"#,
        r#"```json
{"text":"Good start. Think about merging two sorted halves.","mode":"learning","isHint":true,"isSolution":false}
```"#,
        r#"{"text":"Merge sort runs in O(n log n).","mode":"learning","isHint":true,"isSolution":false}"#,
        r#"Here it is: {"text":"def merge_sort(xs): ...","mode":"learning","isHint":false,"isSolution":true}"#,
        r#"{"text":"It is 18°C and raining in Paris.","mode":"chat","isHint":false,"isSolution":false}"#,
    ]));
    let tutor = tutor(provider.clone());
    let mut client = Client::default();

    // 1. A new learning question
    let r = client.send(&tutor, "how do I implement merge sort").await;
    assert_eq!(r.rule, Rule::NewLearningQuestion);
    assert_eq!(r.context.topic(), Some("implement merge sort"));
    assert_eq!(r.context.attempt_count, 0);
    assert_eq!(r.reply.mode, ReplyMode::Learning);
    assert!(r.reply.is_hint);
    assert!(provider.instruction(0).contains("CURRENT MODE: LEARNING MODE"));
    assert!(provider.instruction(0).contains("Attempt: 0"));

    // 2. A genuine attempt moves up a tier
    let r = client.send(&tutor, "I tried recursion but got stuck").await;
    assert_eq!(r.rule, Rule::GenuineAttempt);
    assert_eq!(r.context.attempt_count, 1);
    assert_eq!(r.reply.text, "Good start. Think about merging two sorted halves.");
    assert!(provider.instruction(1).contains("Attempt: 1"));

    // 3. A follow-up leaves the attempt count alone
    let r = client.send(&tutor, "what about time complexity?").await;
    assert_eq!(r.rule, Rule::FollowUp);
    assert_eq!(r.context.attempt_count, 1);
    assert_eq!(r.context.topic(), Some("implement merge sort"));

    // 4. Asking for the answer jumps to the solution tier
    let r = client.send(&tutor, "just give me the answer").await;
    assert_eq!(r.rule, Rule::SolutionRequest);
    assert_eq!(r.context.attempt_count, 3);
    assert!(r.reply.is_solution);
    assert!(!r.reply.is_hint);
    assert!(provider.instruction(3).contains("COMPLETE solution"));

    // 5. A weather question drops learning mode and injects the lookup
    let r = client.send(&tutor, "what's the weather in Paris").await;
    assert_eq!(r.rule, Rule::RealtimeData);
    assert_eq!(r.context, ConversationContext::chat());
    assert_eq!(r.reply.mode, ReplyMode::Chat);
    let instruction = provider.instruction(4);
    assert!(instruction.contains("CURRENT MODE: GENERAL CHAT"));
    assert!(instruction.contains("Current weather in Paris: 18°C, light rain"));

    assert_eq!(provider.calls(), 5);
}

#[tokio::test]
async fn e2e_transcript_carries_history_and_reminder() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Sure, what would you like to learn?",
        "Recursion is a function calling itself.",
    ]));
    let tutor = tutor(provider.clone());
    let mut client = Client::default();

    let r = client.send(&tutor, "hello").await;
    assert_eq!(r.rule, Rule::GeneralChat);
    // Non-JSON replies fall back to plain text
    assert_eq!(r.reply.text, "Sure, what would you like to learn?");
    assert_eq!(r.reply.mode, ReplyMode::Chat);
    assert!(!r.reply.is_hint);

    client.send(&tutor, "explain recursion").await;

    let request = provider.request(1);
    assert_eq!(request.messages.len(), 4);
    assert_eq!(request.messages[1].role, Role::User);
    assert_eq!(request.messages[1].content, "hello");
    assert_eq!(request.messages[2].role, Role::Assistant);
    let last = &request.messages[3];
    assert!(last.content.starts_with("explain recursion"));
    assert!(last.content.ends_with("isHint, isSolution]"));
    assert_eq!(request.top_p, Some(0.9));
}

#[tokio::test]
async fn e2e_returning_to_an_earlier_topic() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"text":"hint","mode":"learning","isHint":true,"isSolution":false}"#,
        r#"{"text":"hint","mode":"learning","isHint":true,"isSolution":false}"#,
        r#"{"text":"hint","mode":"learning","isHint":true,"isSolution":false}"#,
    ]));
    let tutor = tutor(provider.clone());
    let mut client = Client::default();

    client.send(&tutor, "explain binary search trees").await;
    client.send(&tutor, "how to implement quicksort").await;

    let r = client.send(&tutor, "go back to binary search please").await;
    assert_eq!(r.rule, Rule::ReturningToTopic);
    assert_eq!(r.context.topic(), Some("binary search trees"));
    assert_eq!(r.context.attempt_count, 0);
}

#[tokio::test]
async fn e2e_failed_lookup_still_answers() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"text":"I could not fetch headlines right now.","mode":"chat","isHint":false,"isSolution":false}"#,
    ]));
    let tutor = tutor(provider.clone());
    let mut client = Client::default();

    let r = client.send(&tutor, "any latest news today?").await;
    assert_eq!(r.rule, Rule::RealtimeData);
    assert_eq!(r.reply.mode, ReplyMode::Chat);
    assert!(!provider.instruction(0).contains("REAL-TIME DATA"));
}

#[tokio::test]
async fn e2e_time_travel_unlocks_hints() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"text":"Here is the full solution.","mode":"learning","isHint":false,"isSolution":true}"#,
    ]));
    let tutor = tutor(provider.clone());

    let tt = TimeTravelContext {
        attempt_count: 1,
        thinking_time: 65,
        ..TimeTravelContext::started_at(0)
    };
    let request = TurnRequest::new("maybe use two pointers?")
        .with_context(ConversationContext::learning("two sum", 1))
        .with_time_travel(tt);

    let r = tutor.respond_at(request, 125_000).await.unwrap();
    assert_eq!(r.rule, Rule::GenuineAttempt);
    assert_eq!(r.context.attempt_count, 2);

    let tt = r.time_travel.unwrap();
    assert_eq!(tt.unlocked_hints, vec![1, 2, 4]);
    assert_eq!(tt.thinking_time, 65);
    assert!(provider.instruction(0).contains("Thinking time: 65s"));
}

#[tokio::test]
async fn e2e_memory_check_grades_reconstruction() {
    let provider = Arc::new(ScriptedProvider::new(&[
        r#"{"logicScore": 130, "keyConcepts": ["divide", "merge"], "missedConcepts": [], "feedback": "Solid."}"#,
    ]));
    let tutor = tutor(provider.clone());

    let request: MemoryCheckRequest = serde_json::from_value(serde_json::json!({
        "originalSolution": "split, sort halves, merge",
        "userReconstruction": "divide the list and merge back",
        "currentTopic": "merge sort"
    }))
    .unwrap();

    let check = tutor.check_memory(&request).await.unwrap();
    assert_eq!(check.logic_score, 100);
    assert_eq!(check.key_concepts, vec!["divide", "merge"]);
    assert_eq!(check.feedback, "Solid.");

    let sent = provider.request(0);
    assert!((sent.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(sent.max_tokens, Some(1500));
}

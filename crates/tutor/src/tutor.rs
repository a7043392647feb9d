//! The tutoring pipeline: classify, look up, instruct, generate, parse.

use crate::classifier::{Classification, Classifier, ClassifierConfig, Rule};
use crate::error::TutorError;
use crate::prompt::build_instruction;
use crate::recall::{self, MemoryCheck, MemoryCheckRequest};
use crate::reply::{TutorReply, parse_reply};
use crate::time_travel::TimeTravelContext;
use serde::Serialize;
use std::sync::Arc;
use thinkfirst_config::AppConfig;
use thinkfirst_core::context::ConversationContext;
use thinkfirst_core::message::{ChatTurn, Message};
use thinkfirst_core::provider::{Provider, ProviderRequest};
use thinkfirst_core::realtime::RealtimeHub;
use tracing::{debug, info};

/// Appended to the user's message so the model keeps to the reply format.
pub const JSON_REMINDER: &str =
    "\n\n[Please respond in JSON format with fields: text, mode, isHint, isSolution]";

const TOP_P: f32 = 0.9;

/// One incoming user turn with the state the client sent back.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub message: String,
    /// Oldest first.
    pub history: Vec<ChatTurn>,
    pub context: Option<ConversationContext>,
    pub time_travel: Option<TimeTravelContext>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_time_travel(mut self, time_travel: TimeTravelContext) -> Self {
        self.time_travel = Some(time_travel);
        self
    }
}

/// Result of a turn. `context` and `time_travel` go back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub reply: TutorReply,
    pub context: ConversationContext,
    pub time_travel: Option<TimeTravelContext>,
    pub rule: Rule,
}

/// Stateless tutor shared across sessions.
pub struct Tutor {
    provider: Arc<dyn Provider>,
    realtime: Arc<RealtimeHub>,
    classifier: Classifier,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    history_window: usize,
}

impl Tutor {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            realtime: Arc::new(RealtimeHub::new()),
            classifier: Classifier::default(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            history_window: 10,
        }
    }

    /// Apply generation and tutoring settings from the config.
    pub fn with_config(self, config: &AppConfig) -> Self {
        self.with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_classifier(ClassifierConfig::from(&config.tutor))
            .with_history_window(config.tutor.history_window)
    }

    pub fn with_realtime(mut self, hub: RealtimeHub) -> Self {
        self.realtime = Arc::new(hub);
        self
    }

    pub fn with_classifier(mut self, config: ClassifierConfig) -> Self {
        self.classifier = Classifier::new(config);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Number of history turns replayed to the model (at least 1).
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn realtime(&self) -> &RealtimeHub {
        &self.realtime
    }

    /// Whether the provider answers a health check.
    pub async fn provider_reachable(&self) -> Result<bool, TutorError> {
        Ok(self.provider.health_check().await?)
    }

    /// Classify without generating.
    pub fn classify(
        &self,
        message: &str,
        history: &[ChatTurn],
        previous: Option<&ConversationContext>,
    ) -> Classification {
        self.classifier.classify(message, history, previous)
    }

    /// Run one turn against the wall clock.
    pub async fn respond(&self, request: TurnRequest) -> Result<TurnResponse, TutorError> {
        self.respond_at(request, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// Run one turn with an explicit clock (epoch milliseconds).
    pub async fn respond_at(
        &self,
        request: TurnRequest,
        now_ms: i64,
    ) -> Result<TurnResponse, TutorError> {
        let Classification { context, rule } =
            self.classify(&request.message, &request.history, request.context.as_ref());

        let time_travel = request.time_travel.map(|tt| {
            if tt.is_active {
                let refreshed = tt.refreshed(now_ms);
                debug!(
                    elapsed_secs = refreshed.elapsed_secs(now_ms),
                    attempts = refreshed.attempt_count,
                    unlocked = ?refreshed.unlocked_hints,
                    "Time-travel hints refreshed"
                );
                refreshed
            } else {
                tt
            }
        });

        let snippet = if rule == Rule::RealtimeData {
            self.realtime.lookup(&request.message).await
        } else {
            None
        };

        let instruction = build_instruction(
            &context,
            snippet.as_ref().map(|s| s.text.as_str()),
            time_travel.as_ref(),
        );

        let messages = self.transcript(&instruction.text, &request.history, &request.message);
        let mut provider_request = ProviderRequest::new(&self.model, messages)
            .with_temperature(self.temperature)
            .with_top_p(TOP_P);
        if let Some(max) = self.max_tokens {
            provider_request = provider_request.with_max_tokens(max);
        }

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            messages = provider_request.messages.len(),
            "Calling provider"
        );
        let response = self.provider.complete(provider_request).await?;
        let reply = parse_reply(&response.message.content, &context);

        info!(
            rule = %rule,
            topic = ?context.current_topic,
            attempts = context.attempt_count,
            mode = %reply.mode,
            is_hint = reply.is_hint,
            is_solution = reply.is_solution,
            realtime = snippet.is_some(),
            "Turn complete"
        );

        Ok(TurnResponse {
            reply,
            context,
            time_travel,
            rule,
        })
    }

    /// Grade a from-memory reconstruction of a solution.
    pub async fn check_memory(
        &self,
        request: &MemoryCheckRequest,
    ) -> Result<MemoryCheck, TutorError> {
        recall::check_memory(self.provider.as_ref(), &self.model, request).await
    }

    /// System instruction, the most recent history, then the user message.
    fn transcript(&self, instruction: &str, history: &[ChatTurn], message: &str) -> Vec<Message> {
        let recent = &history[history.len().saturating_sub(self.history_window)..];
        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(Message::system(instruction));
        messages.extend(recent.iter().map(Message::from));
        messages.push(Message::user(format!("{message}{JSON_REMINDER}")));
        messages
    }
}

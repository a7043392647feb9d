//! Parsing of the model's structured reply.
//!
//! Models are asked for a bare JSON object but often wrap it in a fenced
//! block or add a sentence around it. Anything unparseable degrades to
//! the raw text with both flags off.

use serde::{Deserialize, Serialize};
use thinkfirst_core::context::ConversationContext;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    Learning,
    Chat,
}

impl ReplyMode {
    pub fn for_context(context: &ConversationContext) -> Self {
        if context.is_learning_mode {
            Self::Learning
        } else {
            Self::Chat
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learning" => Some(Self::Learning),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReplyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Learning => write!(f, "learning"),
            Self::Chat => write!(f, "chat"),
        }
    }
}

/// The reply shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorReply {
    pub text: String,
    pub mode: ReplyMode,
    pub is_hint: bool,
    pub is_solution: bool,
}

impl TutorReply {
    /// Plain text with mode taken from the context and both flags off.
    pub fn plain(text: impl Into<String>, context: &ConversationContext) -> Self {
        Self {
            text: text.into(),
            mode: ReplyMode::for_context(context),
            is_hint: false,
            is_solution: false,
        }
    }
}

/// Wire shape with every field optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReply {
    text: Option<String>,
    mode: Option<String>,
    is_hint: Option<bool>,
    is_solution: Option<bool>,
}

/// Locate the JSON payload in a model reply.
///
/// Prefers a ```` ```json ```` fenced block, then the span from the first
/// `{` to the last `}`.
pub fn extract_json(raw: &str) -> Option<&str> {
    const FENCE: &str = "```json";
    if let Some(start) = raw.find(FENCE) {
        let body = &raw[start + FENCE.len()..];
        let end = body.find("```").unwrap_or(body.len());
        return Some(body[..end].trim());
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse a model reply, falling back to plain text.
pub fn parse_reply(raw: &str, context: &ConversationContext) -> TutorReply {
    let Some(json) = extract_json(raw) else {
        return TutorReply::plain(raw, context);
    };

    match serde_json::from_str::<RawReply>(json) {
        Ok(parsed) => TutorReply {
            text: parsed.text.unwrap_or_else(|| raw.to_string()),
            mode: parsed
                .mode
                .as_deref()
                .and_then(ReplyMode::parse)
                .unwrap_or_else(|| ReplyMode::for_context(context)),
            is_hint: parsed.is_hint.unwrap_or(false),
            is_solution: parsed.is_solution.unwrap_or(false),
        },
        Err(e) => {
            warn!(error = %e, "Model reply is not valid JSON, using raw text");
            TutorReply::plain(raw, context)
        }
    }
}

//! The conversation context carried between turns.
//!
//! The service never stores it. The caller receives it with every reply
//! and sends it back as `conversationContext` on the next turn.

use serde::{Deserialize, Serialize};

/// Per-session tutoring state, recomputed every turn.
///
/// Invariant: `current_topic` is `None` whenever `is_learning_mode` is
/// false. Constructors uphold it; values arriving over the wire go through
/// [`ConversationContext::normalized`] before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationContext {
    /// Short token summary of the active subject
    pub current_topic: Option<String>,

    /// User attempts at the current topic since it was last reset
    pub attempt_count: u32,

    /// Whether the progressive hinting policy applies
    pub is_learning_mode: bool,
}

impl ConversationContext {
    /// The zero context: general chat, no topic.
    pub fn chat() -> Self {
        Self::default()
    }

    /// Learning mode on `topic` with `attempt_count` attempts so far.
    pub fn learning(topic: impl Into<String>, attempt_count: u32) -> Self {
        Self {
            current_topic: Some(topic.into()),
            attempt_count,
            is_learning_mode: true,
        }
    }

    /// Learning mode with the topic carried over as-is (possibly absent).
    pub fn carried(topic: Option<String>, attempt_count: u32) -> Self {
        Self {
            current_topic: topic,
            attempt_count,
            is_learning_mode: true,
        }
    }

    pub fn topic(&self) -> Option<&str> {
        self.current_topic.as_deref()
    }

    /// Learning mode with a topic to carry forward. An empty topic counts.
    pub fn has_active_topic(&self) -> bool {
        self.is_learning_mode && self.current_topic.is_some()
    }

    /// Drop topic and attempts when not in learning mode.
    pub fn normalized(&self) -> Self {
        if self.is_learning_mode {
            self.clone()
        } else {
            Self::chat()
        }
    }
}

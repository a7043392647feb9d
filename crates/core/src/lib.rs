//! # ThinkFirst Core
//!
//! Domain types, traits, and error definitions for the ThinkFirst tutoring
//! assistant. This crate has **no framework dependencies**: it defines the
//! model that every other crate builds on.
//!
//! ## Design Philosophy
//!
//! Each external collaborator (the text-generation service, the weather
//! and news sources) is a trait here. Implementations live in their own
//! crates, so the tutor pipeline can be tested against in-memory stubs.

pub mod context;
pub mod error;
pub mod message;
pub mod provider;
pub mod realtime;

// Re-export key types at crate root for ergonomics
pub use context::ConversationContext;
pub use error::{Error, ProviderError, RealtimeError, Result};
pub use message::{ChatTurn, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use realtime::{RealtimeHub, RealtimeKind, RealtimeSnippet, RealtimeSource};

//! Marker phrase tables.
//!
//! Every table is matched by substring against the lowercased, trimmed
//! message, except [`CHAT`], which matches whole messages or prefixes.
//! The weather and news tables live in `thinkfirst_core::realtime` so the
//! real-time hub routes on exactly the same phrases.

/// Greetings and acknowledgements.
pub const CHAT: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "thanks",
    "thank you",
    "okay",
    "ok",
    "got it",
    "cool",
];

/// Phrasings that open a new problem.
pub const LEARNING: &[&str] = &[
    "how do i",
    "how to",
    "how about",
    "explain",
    "solve",
    "algorithm for",
    "solution for",
    "implement",
];

/// Explicit references to an earlier topic.
pub const BACK_REFERENCE: &[&str] = &["back to", "return to", "again about", "still don't get"];

/// Questions about the current topic that do not count as attempts.
pub const FOLLOW_UP: &[&str] = &[
    "time complexity",
    "space complexity",
    "complexity",
    "why",
    "what about",
    "can you explain more",
    "what do you mean",
    "how does that",
    "give me a hint",
    "give hint",
    "another hint",
];

/// Requests to skip straight to the answer.
pub const SOLUTION: &[&str] = &[
    "give me the answer",
    "give the answer",
    "just give me",
    "give me solution",
    "give the solution",
    "show me the answer",
    "show the solution",
    "what is the solution",
    "what's the solution",
    "tell me the solution",
    "just show me",
    "just tell me",
];

/// Tentative answers and admissions of being stuck.
pub const ATTEMPT: &[&str] = &[
    "i tried",
    "i think",
    "maybe",
    "is it",
    "would it be",
    "should i",
    "idk",
    "i don't know",
    "not sure",
    "i'm stuck",
    "can't figure",
];

pub(crate) fn contains_any(lowered: &str, table: &[&str]) -> bool {
    table.iter().any(|m| lowered.contains(m))
}

/// Exact greeting, or a greeting followed by a space or `!`.
pub(crate) fn is_chat(lowered: &str) -> bool {
    CHAT.iter().any(|kw| {
        lowered == *kw
            || lowered
                .strip_prefix(kw)
                .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with('!'))
    })
}

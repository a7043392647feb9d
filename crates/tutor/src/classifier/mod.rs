//! Context classifier.
//!
//! Decides, for every user message, which topic is active, how many
//! attempts the user has made at it, and whether learning mode applies.
//! The decision is an ordered rule table; the first rule whose predicate
//! holds and whose transform yields a context wins.
//!
//! | # | Rule | Output |
//! |---|------|--------|
//! | 1 | `RealtimeData` | zero context |
//! | 2 | `GeneralChat` | zero context |
//! | 3 | `NewLearningQuestion` | new topic, 0 attempts |
//! | 4 | `ReturningToTopic` | earlier topic, 0 attempts |
//! | 5 | `FollowUp` | unchanged |
//! | 6 | `SolutionRequest` | attempts raised to at least 3 |
//! | 7 | `GenuineAttempt` | attempts + 1 |
//! | 8 | `SubstantiveResponse` | attempts + 1 |
//! | 9 | `Default` | previous context |

pub mod markers;
pub mod topic;

use serde::Serialize;
use thinkfirst_config::TutorConfig;
use thinkfirst_core::context::ConversationContext;
use thinkfirst_core::message::ChatTurn;
use thinkfirst_core::realtime::RealtimeKind;
use tracing::debug;

pub use topic::extract_topic;

/// Tunable thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Messages longer than this (in characters) count as an attempt
    /// while a topic is active.
    pub substantive_min_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            substantive_min_chars: 10,
        }
    }
}

impl From<&TutorConfig> for ClassifierConfig {
    fn from(config: &TutorConfig) -> Self {
        Self {
            substantive_min_chars: config.substantive_min_chars,
        }
    }
}

/// The rule that produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    RealtimeData,
    GeneralChat,
    NewLearningQuestion,
    ReturningToTopic,
    FollowUp,
    SolutionRequest,
    GenuineAttempt,
    SubstantiveResponse,
    Default,
}

impl Rule {
    /// All rules in evaluation order.
    pub const ORDER: [Rule; 9] = [
        Rule::RealtimeData,
        Rule::GeneralChat,
        Rule::NewLearningQuestion,
        Rule::ReturningToTopic,
        Rule::FollowUp,
        Rule::SolutionRequest,
        Rule::GenuineAttempt,
        Rule::SubstantiveResponse,
        Rule::Default,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RealtimeData => "realtime_data",
            Self::GeneralChat => "general_chat",
            Self::NewLearningQuestion => "new_learning_question",
            Self::ReturningToTopic => "returning_to_topic",
            Self::FollowUp => "follow_up",
            Self::SolutionRequest => "solution_request",
            Self::GenuineAttempt => "genuine_attempt",
            Self::SubstantiveResponse => "substantive_response",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub context: ConversationContext,
    pub rule: Rule,
}

/// Marker hits, computed once per message.
#[derive(Debug, Clone)]
struct Signals {
    lowered: String,
    char_count: usize,
    realtime: Option<RealtimeKind>,
    chat: bool,
    learning: bool,
    back_reference: bool,
    follow_up: bool,
    solution: bool,
    attempt: bool,
}

impl Signals {
    fn scan(message: &str) -> Self {
        let lowered = message.trim().to_lowercase();
        Self {
            char_count: message.chars().count(),
            realtime: RealtimeKind::detect(&lowered),
            chat: markers::is_chat(&lowered),
            learning: markers::contains_any(&lowered, markers::LEARNING),
            back_reference: markers::contains_any(&lowered, markers::BACK_REFERENCE),
            follow_up: markers::contains_any(&lowered, markers::FOLLOW_UP),
            solution: markers::contains_any(&lowered, markers::SOLUTION),
            attempt: markers::contains_any(&lowered, markers::ATTEMPT),
            lowered,
        }
    }
}

/// Everything a rule may look at.
struct Turn<'a> {
    message: &'a str,
    signals: Signals,
    history: &'a [ChatTurn],
    previous: Option<ConversationContext>,
    config: &'a ClassifierConfig,
}

impl Turn<'_> {
    fn previous_learning(&self) -> Option<&ConversationContext> {
        self.previous.as_ref().filter(|p| p.is_learning_mode)
    }

    fn previous_with_topic(&self) -> Option<&ConversationContext> {
        self.previous.as_ref().filter(|p| p.has_active_topic())
    }
}

struct RuleEntry {
    rule: Rule,
    predicate: fn(&Turn<'_>) -> bool,
    /// `None` means the rule declines and evaluation moves on.
    transform: fn(&Turn<'_>) -> Option<ConversationContext>,
}

const RULES: [RuleEntry; 9] = [
    RuleEntry {
        rule: Rule::RealtimeData,
        predicate: |t| t.signals.realtime.is_some(),
        transform: |_| Some(ConversationContext::chat()),
    },
    RuleEntry {
        rule: Rule::GeneralChat,
        predicate: |t| t.signals.chat && !t.signals.learning,
        transform: |_| Some(ConversationContext::chat()),
    },
    RuleEntry {
        rule: Rule::NewLearningQuestion,
        predicate: |t| t.signals.learning && !t.signals.back_reference,
        transform: |t| Some(ConversationContext::learning(extract_topic(t.message), 0)),
    },
    RuleEntry {
        rule: Rule::ReturningToTopic,
        predicate: |t| t.signals.back_reference && !t.history.is_empty(),
        transform: |t| {
            recall_topic(&t.signals.lowered, t.history)
                .map(|topic| ConversationContext::learning(topic, 0))
        },
    },
    RuleEntry {
        rule: Rule::FollowUp,
        predicate: |t| t.signals.follow_up && t.previous_with_topic().is_some(),
        transform: |t| {
            t.previous_with_topic()
                .map(|p| ConversationContext::carried(p.current_topic.clone(), p.attempt_count))
        },
    },
    RuleEntry {
        rule: Rule::SolutionRequest,
        predicate: |t| t.signals.solution && t.previous_learning().is_some(),
        transform: |t| {
            t.previous_learning().map(|p| {
                ConversationContext::carried(p.current_topic.clone(), p.attempt_count.max(3))
            })
        },
    },
    RuleEntry {
        rule: Rule::GenuineAttempt,
        predicate: |t| t.signals.attempt && t.previous_with_topic().is_some(),
        transform: |t| t.previous_with_topic().map(next_attempt),
    },
    RuleEntry {
        rule: Rule::SubstantiveResponse,
        predicate: |t| {
            t.previous_with_topic().is_some()
                && !t.signals.follow_up
                && !t.signals.solution
                && t.signals.char_count > t.config.substantive_min_chars
        },
        transform: |t| t.previous_with_topic().map(next_attempt),
    },
    RuleEntry {
        rule: Rule::Default,
        predicate: |_| true,
        transform: |t| Some(t.previous.clone().unwrap_or_default()),
    },
];

fn next_attempt(previous: &ConversationContext) -> ConversationContext {
    ConversationContext::carried(
        previous.current_topic.clone(),
        previous.attempt_count.saturating_add(1),
    )
}

/// Pick an earlier topic for a back-reference message.
///
/// Topics come from prior user turns, oldest first, empty ones skipped and
/// duplicates dropped. A topic whose first word appears in the message
/// wins; otherwise the second most recent one (or the only one).
fn recall_topic(lowered: &str, history: &[ChatTurn]) -> Option<String> {
    let mut topics: Vec<String> = Vec::new();
    for turn in history.iter().filter(|t| t.is_user()) {
        let topic = extract_topic(&turn.text);
        if !topic.is_empty() && !topics.contains(&topic) {
            topics.push(topic);
        }
    }

    let matched = topics.iter().position(|topic| {
        topic
            .split_whitespace()
            .next()
            .is_some_and(|first| lowered.contains(first))
    });

    let index = match matched {
        Some(i) => i,
        None if topics.len() > 1 => topics.len() - 2,
        None => topics.len().checked_sub(1)?,
    };
    topics.into_iter().nth(index)
}

/// Classify one message.
///
/// Pure and deterministic. `previous` is normalized first, so a caller
/// cannot smuggle a topic into chat mode.
pub fn classify(
    message: &str,
    history: &[ChatTurn],
    previous: Option<&ConversationContext>,
    config: &ClassifierConfig,
) -> Classification {
    let turn = Turn {
        message,
        signals: Signals::scan(message),
        history,
        previous: previous.map(ConversationContext::normalized),
        config,
    };

    for entry in &RULES {
        if !(entry.predicate)(&turn) {
            continue;
        }
        if let Some(context) = (entry.transform)(&turn) {
            debug!(
                rule = %entry.rule,
                topic = ?context.current_topic,
                attempts = context.attempt_count,
                learning = context.is_learning_mode,
                "Classified message"
            );
            return Classification {
                context,
                rule: entry.rule,
            };
        }
    }

    // The last entry always matches.
    Classification {
        context: turn.previous.unwrap_or_default(),
        rule: Rule::Default,
    }
}

/// [`classify`] with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(
        &self,
        message: &str,
        history: &[ChatTurn],
        previous: Option<&ConversationContext>,
    ) -> Classification {
        classify(message, history, previous, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(message: &str, previous: Option<&ConversationContext>) -> Classification {
        Classifier::default().classify(message, &[], previous)
    }

    fn merge_sort(attempts: u32) -> ConversationContext {
        ConversationContext::learning("merge sort", attempts)
    }

    #[test]
    fn rule_table_matches_documented_order() {
        let order: Vec<Rule> = RULES.iter().map(|e| e.rule).collect();
        assert_eq!(order, Rule::ORDER.to_vec());
    }

    // ── Scenarios ────────────────────────────────────────────────

    #[test]
    fn new_question_starts_topic() {
        let c = run("how do I implement merge sort", None);
        assert_eq!(c.rule, Rule::NewLearningQuestion);
        assert_eq!(c.context, ConversationContext::learning("implement merge sort", 0));
    }

    #[test]
    fn attempt_increments() {
        let c = run("I tried recursion but got stuck", Some(&merge_sort(0)));
        assert_eq!(c.rule, Rule::GenuineAttempt);
        assert_eq!(c.context, merge_sort(1));
    }

    #[test]
    fn follow_up_keeps_count() {
        let c = run("what about time complexity?", Some(&merge_sort(1)));
        assert_eq!(c.rule, Rule::FollowUp);
        assert_eq!(c.context, merge_sort(1));
    }

    #[test]
    fn solution_request_jumps_to_three() {
        let c = run("just give me the answer", Some(&merge_sort(1)));
        assert_eq!(c.rule, Rule::SolutionRequest);
        assert_eq!(c.context, merge_sort(3));

        let c = run("just give me the answer", Some(&merge_sort(0)));
        assert_eq!(c.context.attempt_count, 3);

        let c = run("just give me the answer", Some(&merge_sort(5)));
        assert_eq!(c.context.attempt_count, 5);
    }

    #[test]
    fn weather_resets_learning() {
        let c = run("what's the weather in Paris", Some(&merge_sort(2)));
        assert_eq!(c.rule, Rule::RealtimeData);
        assert_eq!(c.context, ConversationContext::chat());
    }

    // ── Properties ───────────────────────────────────────────────

    #[test]
    fn realtime_always_zero_context() {
        let priors = [None, Some(merge_sort(0)), Some(merge_sort(7))];
        let messages = [
            "weather",
            "how do I explain the forecast",
            "any latest news about rust",
            "give me the answer, what are the headlines",
            "i think the temperature is high",
        ];
        for message in messages {
            for prior in &priors {
                let c = run(message, prior.as_ref());
                assert_eq!(c.context, ConversationContext::chat(), "{message}");
                assert_eq!(c.rule, Rule::RealtimeData);
            }
        }
    }

    #[test]
    fn chat_mode_never_has_topic() {
        let broken = ConversationContext {
            current_topic: Some("stale".into()),
            attempt_count: 4,
            is_learning_mode: false,
        };
        let messages = [
            "hello",
            "ok",
            "random words",
            "why",
            "give me the answer",
            "i think so",
            "a long message without any markers at all",
        ];
        for message in messages {
            let c = run(message, Some(&broken));
            if !c.context.is_learning_mode {
                assert_eq!(c.context.current_topic, None, "{message}");
                assert_eq!(c.context.attempt_count, 0, "{message}");
            }
        }
    }

    #[test]
    fn follow_ups_never_change_attempts() {
        for message in [
            "why?",
            "what's the space complexity",
            "give me a hint",
            "another hint please",
            "what do you mean",
        ] {
            for n in [0, 1, 2, 3, 9] {
                let c = run(message, Some(&merge_sort(n)));
                assert_eq!(c.context.attempt_count, n, "{message}");
                assert_eq!(c.rule, Rule::FollowUp, "{message}");
            }
        }
    }

    #[test]
    fn new_question_resets_attempts() {
        for message in [
            "how to reverse a linked list",
            "explain dynamic programming",
            "solve the knapsack problem",
            "algorithm for shortest paths",
        ] {
            let c = run(message, Some(&merge_sort(2)));
            assert_eq!(c.rule, Rule::NewLearningQuestion);
            assert_eq!(c.context.attempt_count, 0);
            assert!(c.context.is_learning_mode);
        }
    }

    #[test]
    fn greeting_twice_is_idempotent() {
        for prior in [None, Some(merge_sort(2)), Some(ConversationContext::chat())] {
            let first = run("hello", prior.as_ref());
            let second = run("hello", Some(&first.context));
            assert_eq!(first.context, ConversationContext::chat());
            assert_eq!(second.context, ConversationContext::chat());
            assert_eq!(second.rule, Rule::GeneralChat);
        }
    }

    // ── Priority ─────────────────────────────────────────────────

    #[test]
    fn learning_marker_beats_greeting() {
        let c = run("hi, how do I solve two sum", None);
        assert_eq!(c.rule, Rule::NewLearningQuestion);

        let c = run("hey how to solve two sum", Some(&merge_sort(1)));
        assert_eq!(c.rule, Rule::NewLearningQuestion);
    }

    #[test]
    fn explain_more_hits_learning_first() {
        let c = run("can you explain more", Some(&merge_sort(1)));
        assert_eq!(c.rule, Rule::NewLearningQuestion);
        assert_eq!(c.context.attempt_count, 0);
    }

    #[test]
    fn solution_for_hits_learning_first() {
        let c = run("give me the solution for this", Some(&merge_sort(1)));
        assert_eq!(c.rule, Rule::NewLearningQuestion);
    }

    #[test]
    fn back_reference_without_history_falls_through() {
        let c = run("back to merge sort please", Some(&merge_sort(1)));
        assert_ne!(c.rule, Rule::ReturningToTopic);
        assert_eq!(c.rule, Rule::SubstantiveResponse);
        assert_eq!(c.context, merge_sort(2));
    }

    // ── Returning to a topic ─────────────────────────────────────

    fn history() -> Vec<ChatTurn> {
        vec![
            ChatTurn::user("how do I implement merge sort"),
            ChatTurn::assistant("Think about splitting the array."),
            ChatTurn::user("explain binary search trees"),
            ChatTurn::assistant("What property does each node keep?"),
            ChatTurn::user("how to solve knapsack problem"),
            ChatTurn::user("ok"),
        ]
    }

    #[test]
    fn returning_prefers_keyword_match() {
        let c = Classifier::default().classify(
            "can we go back to binary stuff",
            &history(),
            Some(&ConversationContext::learning("solve knapsack problem", 2)),
        );
        assert_eq!(c.rule, Rule::ReturningToTopic);
        assert_eq!(c.context, ConversationContext::learning("binary search trees", 0));
    }

    #[test]
    fn returning_falls_back_to_second_most_recent() {
        let c = Classifier::default().classify("back to the earlier one", &history(), None);
        assert_eq!(c.rule, Rule::ReturningToTopic);
        assert_eq!(c.context, ConversationContext::learning("binary search trees", 0));
    }

    #[test]
    fn returning_with_single_topic() {
        let history = vec![ChatTurn::user("implement quicksort"), ChatTurn::user("ok")];
        let c = Classifier::default().classify("i still don't get it", &history, None);
        assert_eq!(c.rule, Rule::ReturningToTopic);
        assert_eq!(c.context, ConversationContext::learning("implement quicksort", 0));
    }

    #[test]
    fn returning_ignores_assistant_turns_and_duplicates() {
        let history = vec![
            ChatTurn::user("implement quicksort"),
            ChatTurn::assistant("recursion partition pivot"),
            ChatTurn::user("implement quicksort"),
        ];
        let c = Classifier::default().classify("return to it", &history, None);
        assert_eq!(c.context, ConversationContext::learning("implement quicksort", 0));
    }

    #[test]
    fn returning_without_topics_falls_through() {
        let history = vec![ChatTurn::user("ok"), ChatTurn::user("hi")];
        let c = Classifier::default().classify("back to it", &history, None);
        assert_eq!(c.rule, Rule::Default);
        assert_eq!(c.context, ConversationContext::chat());
    }

    // ── Thresholds and defaults ──────────────────────────────────

    #[test]
    fn substantive_threshold_is_configurable() {
        let message = "use a heap"; // 10 chars
        let default = run(message, Some(&merge_sort(0)));
        assert_eq!(default.rule, Rule::Default);
        assert_eq!(default.context, merge_sort(0));

        let eager = Classifier::new(ClassifierConfig {
            substantive_min_chars: 5,
        });
        let c = eager.classify(message, &[], Some(&merge_sort(0)));
        assert_eq!(c.rule, Rule::SubstantiveResponse);
        assert_eq!(c.context, merge_sort(1));

        let c = run("use a min-heap", Some(&merge_sort(0)));
        assert_eq!(c.rule, Rule::SubstantiveResponse);
    }

    #[test]
    fn no_previous_context_defaults_to_chat() {
        let c = run("a fairly long statement with no markers", None);
        assert_eq!(c.rule, Rule::Default);
        assert_eq!(c.context, ConversationContext::chat());
    }

    #[test]
    fn solution_request_outside_learning_is_ignored() {
        let c = run("just tell me", Some(&ConversationContext::chat()));
        assert_eq!(c.rule, Rule::Default);
        assert_eq!(c.context, ConversationContext::chat());
    }

    #[test]
    fn solution_request_keeps_missing_topic() {
        let prior = ConversationContext::carried(None, 1);
        let c = run("show me the answer", Some(&prior));
        assert_eq!(c.rule, Rule::SolutionRequest);
        assert_eq!(c.context, ConversationContext::carried(None, 3));
    }

    #[test]
    fn empty_topic_is_still_an_active_topic() {
        let opened = run("how to do it", None);
        assert_eq!(opened.rule, Rule::NewLearningQuestion);
        assert_eq!(opened.context, ConversationContext::learning("", 0));

        let c = run("I tried recursion", Some(&opened.context));
        assert_eq!(c.rule, Rule::GenuineAttempt);
        assert_eq!(c.context, ConversationContext::learning("", 1));

        let c = run("why does that work", Some(&c.context));
        assert_eq!(c.rule, Rule::FollowUp);
        assert_eq!(c.context, ConversationContext::learning("", 1));

        let c = run("split it and merge the halves", Some(&c.context));
        assert_eq!(c.rule, Rule::SubstantiveResponse);
        assert_eq!(c.context.attempt_count, 2);
    }

    #[test]
    fn config_from_tutor_section() {
        let tutor = TutorConfig {
            substantive_min_chars: 42,
            history_window: 10,
        };
        assert_eq!(ClassifierConfig::from(&tutor).substantive_min_chars, 42);
    }
}

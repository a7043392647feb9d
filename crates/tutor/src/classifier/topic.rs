//! Topic extraction.

/// Words never kept in a topic.
const STOP_WORDS: &[&str] = &[
    "how", "to", "the", "a", "an", "what", "is", "explain", "can", "you", "i", "do", "about", "for",
];

/// Words this short are dropped as well.
const MIN_WORD_CHARS: usize = 4;

const MAX_TOPIC_WORDS: usize = 3;

/// Summarize a message as its first three meaningful words.
///
/// Lowercases, splits on whitespace, drops stop words and words of three
/// characters or fewer. Punctuation stays attached to its word. The result
/// may be empty.
pub fn extract_topic(message: &str) -> String {
    message
        .to_lowercase()
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w) && w.chars().count() >= MIN_WORD_CHARS)
        .take(MAX_TOPIC_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_three_meaningful_words() {
        assert_eq!(extract_topic("how do I implement merge sort"), "implement merge sort");
        assert_eq!(
            extract_topic("Explain binary search trees and their balancing"),
            "binary search trees"
        );
    }

    #[test]
    fn short_and_stop_words_dropped() {
        assert_eq!(extract_topic("how to do it"), "");
        assert_eq!(extract_topic("what is a DFS"), "");
    }

    #[test]
    fn punctuation_stays_attached() {
        assert_eq!(extract_topic("solve two-sum quickly?"), "solve two-sum quickly?");
    }
}

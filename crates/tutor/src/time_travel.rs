//! Time-travel hints: hint levels that unlock as time passes and the user
//! keeps trying.
//!
//! | Hint | Unlocks when |
//! |------|--------------|
//! | 1 conceptual | 30 s elapsed **or** 1 attempt |
//! | 2 approach | 60 s elapsed **and** 1 attempt |
//! | 3 pseudocode | 90 s elapsed **and** 2 attempts |
//! | 4 solution | 120 s elapsed **or** 3 attempts |

use serde::{Deserialize, Serialize};

/// Client-held time-travel state, echoed back on every turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeTravelContext {
    pub is_active: bool,

    /// When the current question was asked, in epoch milliseconds
    pub question_start_time: Option<i64>,

    pub attempt_count: u32,

    pub unlocked_hints: Vec<u8>,

    /// Seconds the user has spent thinking, as tracked by the client
    pub thinking_time: u64,
}

impl TimeTravelContext {
    /// A fresh session for a question asked at `now_ms`.
    pub fn started_at(now_ms: i64) -> Self {
        Self {
            is_active: true,
            question_start_time: Some(now_ms),
            ..Self::default()
        }
    }

    /// Whole seconds since the question was asked; 0 without a start time
    /// or when the clock runs behind it.
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        self.question_start_time
            .map(|start| u64::try_from(now_ms.saturating_sub(start) / 1000).unwrap_or(0))
            .unwrap_or(0)
    }

    /// A copy with `unlocked_hints` recomputed for `now_ms`.
    pub fn refreshed(&self, now_ms: i64) -> Self {
        Self {
            unlocked_hints: unlocked_hints(self.elapsed_secs(now_ms), self.attempt_count),
            ..self.clone()
        }
    }

    /// Highest unlocked hint level, 0 when none.
    pub fn highest_hint(&self) -> u8 {
        self.unlocked_hints.iter().copied().max().unwrap_or(0)
    }
}

/// Hint levels unlocked after `elapsed_secs` seconds and `attempts` tries.
pub fn unlocked_hints(elapsed_secs: u64, attempts: u32) -> Vec<u8> {
    let mut unlocked = Vec::with_capacity(4);
    if elapsed_secs >= 30 || attempts >= 1 {
        unlocked.push(1);
    }
    if elapsed_secs >= 60 && attempts >= 1 {
        unlocked.push(2);
    }
    if elapsed_secs >= 90 && attempts >= 2 {
        unlocked.push(3);
    }
    if elapsed_secs >= 120 || attempts >= 3 {
        unlocked.push(4);
    }
    unlocked
}

//! Prompt builder: renders a classification into the system instruction
//! sent with every generation call.

use crate::time_travel::TimeTravelContext;
use serde::Serialize;
use thinkfirst_core::context::ConversationContext;

const PERSONA: &str = "\
You are ThinkFirst AI, an educational assistant that helps people learn by thinking problems through.

CORE RULES:
1. Answer directly. Do not narrate your reasoning process.
2. No meta-commentary such as \"Here's how to proceed\".
3. Sound like a friendly tutor.
4. Always reply with valid JSON in the format given below.

GENERAL CHAT: answer naturally and conversationally. No hints are needed.
REAL-TIME QUESTIONS (weather, news): answer helpfully from the data provided.
LEARNING QUESTIONS: guide progressively according to the attempt count and be encouraging.";

const REPLY_FORMAT: &str = "\
REQUIRED JSON RESPONSE FORMAT:
{
  \"text\": \"your response here\",
  \"mode\": \"learning\" or \"chat\",
  \"isHint\": true or false,
  \"isSolution\": true or false
}";

const FOLLOW_UP_NOTE: &str = "IMPORTANT: if the user asks a follow-up about complexity or wants clarification, answer it directly. A follow-up is not a new attempt.";

/// How much of the answer the model may reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceTier {
    /// A conceptual nudge and guiding questions.
    Conceptual,
    /// Stronger hints naming techniques or approaches.
    Techniques,
    /// Pseudocode or a step-by-step roadmap.
    Roadmap,
    /// The complete worked solution.
    FullSolution,
}

impl GuidanceTier {
    pub fn for_attempts(attempts: u32) -> Self {
        match attempts {
            0 => Self::Conceptual,
            1 => Self::Techniques,
            2 => Self::Roadmap,
            _ => Self::FullSolution,
        }
    }

    /// `(is_hint, is_solution)` the model is told to report.
    pub fn flags(self) -> (bool, bool) {
        match self {
            Self::FullSolution => (false, true),
            _ => (true, false),
        }
    }

    fn directions(self) -> &'static str {
        match self {
            Self::Conceptual => "\
- This is the first exchange on this topic.
- Give a conceptual hint that makes the user think.
- Ask guiding questions to gauge their understanding.",
            Self::Techniques => "\
- The user has made one attempt.
- Give stronger hints that name useful techniques or approaches.
- Point toward the relevant concepts or algorithms.",
            Self::Roadmap => "\
- The user has made two attempts.
- Give pseudocode or a step-by-step roadmap.
- Be explicit about the approach.",
            Self::FullSolution => "\
- The user has made three or more attempts, or asked for the solution.
- Give the COMPLETE solution with a detailed explanation.
- Include code examples with correct syntax.
- Explain why each step works.",
        }
    }
}

impl std::fmt::Display for GuidanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Conceptual => "conceptual",
            Self::Techniques => "techniques",
            Self::Roadmap => "roadmap",
            Self::FullSolution => "full solution",
        };
        f.write_str(label)
    }
}

/// A rendered system instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub text: String,
    /// Set in learning mode only.
    pub tier: Option<GuidanceTier>,
}

impl Instruction {
    /// `(is_hint, is_solution)` a compliant reply carries.
    pub fn expected_flags(&self) -> (bool, bool) {
        self.tier.map(GuidanceTier::flags).unwrap_or((false, false))
    }
}

/// Build the system instruction for one turn.
///
/// `realtime` is injected verbatim. `time_travel` only contributes when
/// it is active.
pub fn build_instruction(
    context: &ConversationContext,
    realtime: Option<&str>,
    time_travel: Option<&TimeTravelContext>,
) -> Instruction {
    let mut text = String::from(PERSONA);

    let tier = if context.is_learning_mode {
        let tier = GuidanceTier::for_attempts(context.attempt_count);
        let (is_hint, is_solution) = tier.flags();
        text.push_str(&format!(
            "\n\nCURRENT MODE: LEARNING MODE\nTopic: \"{}\"\nAttempt: {}\n\nPROGRESSIVE GUIDANCE ({tier}):\n{}\n- Set isHint: {is_hint}, isSolution: {is_solution}, mode: \"learning\"\n\n{FOLLOW_UP_NOTE}",
            context.topic().unwrap_or_default(),
            context.attempt_count,
            tier.directions(),
        ));
        Some(tier)
    } else {
        text.push_str(
            "\n\nCURRENT MODE: GENERAL CHAT\n- Have a plain, friendly conversation.\n- Set isHint: false, isSolution: false, mode: \"chat\"",
        );
        None
    };

    if let Some(data) = realtime {
        text.push_str(&format!(
            "\n\nREAL-TIME DATA:\n{data}\n\nUse this real-time data in your answer. Never say that you lack access to real-time or current information."
        ));
    }

    if let Some(tt) = time_travel.filter(|tt| tt.is_active) {
        text.push_str(&time_travel_block(tt));
    }

    text.push_str("\n\n");
    text.push_str(REPLY_FORMAT);

    Instruction { text, tier }
}

fn time_travel_block(tt: &TimeTravelContext) -> String {
    let unlocked = tt
        .unlocked_hints
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let strategy = match tt.highest_hint() {
        0 => "NO HINTS UNLOCKED YET\n- Encourage the user to keep thinking; hints unlock with time and attempts.\n- Do not reveal problem-solving details.\n- Set isHint: false, isSolution: false, mode: \"learning\"",
        1 => "HINT 1 UNLOCKED (conceptual)\n- Give only high-level guidance: which data structure or family of algorithms, which property of the problem matters.\n- Set isHint: true, isSolution: false, mode: \"learning\"",
        2 => "HINT 2 UNLOCKED (approach)\n- Explain the approach as clear steps without writing code.\n- Set isHint: true, isSolution: false, mode: \"learning\"",
        3 => "HINT 3 UNLOCKED (pseudocode)\n- Give structured pseudocode covering every major operation.\n- Set isHint: true, isSolution: false, mode: \"learning\"",
        _ => "SOLUTION UNLOCKED\n- Give complete working code with a step-by-step explanation, complexity analysis and an example walkthrough.\n- Set isHint: false, isSolution: true, mode: \"learning\"",
    };

    format!(
        "\n\nTIME-TRAVEL MODE ACTIVE\nThinking time: {}s\nAttempts made: {}\nUnlocked hints: [{unlocked}]\n\nOnly give hint levels from the unlocked list, and give the HIGHEST one. Never jump ahead to a level that is still locked.\n\n{strategy}",
        tt.thinking_time, tt.attempt_count,
    )
}

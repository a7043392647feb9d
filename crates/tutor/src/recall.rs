//! Memory check ("amnesia mode").
//!
//! After seeing a solution the user rewrites it from memory. The model
//! grades the reconstruction on its logic, not on its surface.

use crate::error::TutorError;
use crate::reply::extract_json;
use serde::{Deserialize, Serialize};
use thinkfirst_core::message::Message;
use thinkfirst_core::provider::{Provider, ProviderRequest};
use tracing::{debug, info};

const GRADER_PERSONA: &str = "You are an expert programming educator evaluating student code. Always respond with valid JSON only.";

const GRADING_TEMPERATURE: f32 = 0.3;
const GRADING_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCheckRequest {
    pub original_solution: String,
    pub user_reconstruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_topic: Option<String>,
}

impl MemoryCheckRequest {
    /// Name of the first required field that is blank.
    pub fn blank_field(&self) -> Option<&'static str> {
        if self.original_solution.trim().is_empty() {
            Some("originalSolution")
        } else if self.user_reconstruction.trim().is_empty() {
            Some("userReconstruction")
        } else {
            None
        }
    }
}

/// Grading of a reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCheck {
    /// 0..=100
    pub logic_score: u8,
    pub key_concepts: Vec<String>,
    pub missed_concepts: Vec<String>,
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCheck {
    logic_score: f64,
    #[serde(default)]
    key_concepts: Vec<String>,
    #[serde(default)]
    missed_concepts: Vec<String>,
    #[serde(default)]
    feedback: String,
}

fn grading_prompt(request: &MemoryCheckRequest) -> String {
    let topic = request
        .current_topic
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| format!("Topic: {t}\n\n"))
        .unwrap_or_default();

    format!(
        "You are a learning assessment AI. Compare the two solutions below and judge whether the LOGIC and APPROACH match.

DO NOT penalize differences in:
- variable names
- exact syntax
- code style, formatting or comments
- programming language
- wording of explanations

DO grade:
- the core algorithm or approach
- the logic flow and reasoning
- the key concepts applied (for example \"hash map lookup\" or \"sliding window\")
- whether the approach is correct

{topic}Original solution:
{original}

Student's reconstruction:
{reconstruction}

Respond with a JSON object:
{{
  \"logicScore\": 85,
  \"keyConcepts\": [\"array traversal\", \"hash map lookup\"],
  \"missedConcepts\": [\"edge case handling\"],
  \"feedback\": \"Great job remembering the core logic...\"
}}

Be encouraging but honest. 90-100 is excellent, 70-89 good, 50-69 partial, below 50 needs review.",
        original = request.original_solution,
        reconstruction = request.user_reconstruction,
    )
}

/// Parse the grader's reply.
pub fn parse_check(raw: &str) -> Result<MemoryCheck, TutorError> {
    let json = extract_json(raw).ok_or_else(|| TutorError::MalformedReply {
        reason: "no JSON object in grading reply".into(),
    })?;
    let parsed: RawCheck =
        serde_json::from_str(json).map_err(|e| TutorError::MalformedReply {
            reason: e.to_string(),
        })?;

    Ok(MemoryCheck {
        logic_score: parsed.logic_score.round().clamp(0.0, 100.0) as u8,
        key_concepts: parsed.key_concepts,
        missed_concepts: parsed.missed_concepts,
        feedback: parsed.feedback,
    })
}

/// Ask `provider` to grade a reconstruction.
pub async fn check_memory(
    provider: &dyn Provider,
    model: &str,
    request: &MemoryCheckRequest,
) -> Result<MemoryCheck, TutorError> {
    let messages = vec![
        Message::system(GRADER_PERSONA),
        Message::user(grading_prompt(request)),
    ];
    let provider_request = ProviderRequest::new(model, messages)
        .with_temperature(GRADING_TEMPERATURE)
        .with_max_tokens(GRADING_MAX_TOKENS);

    debug!(provider = provider.name(), model, "Requesting memory check");
    let response = provider.complete(provider_request).await?;
    let check = parse_check(&response.message.content)?;

    info!(
        score = check.logic_score,
        topic = ?request.current_topic,
        "Memory check graded"
    );
    Ok(check)
}

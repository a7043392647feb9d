//! `thinkfirst classify` — Offline look at the classifier and prompt builder.
//!
//! No provider and no real-time lookups are involved, so this works
//! without an API key.

use thinkfirst_config::AppConfig;
use thinkfirst_core::context::ConversationContext;
use thinkfirst_core::message::ChatTurn;
use thinkfirst_tutor::{ClassifierConfig, build_instruction, classify};

pub fn run(
    message: &str,
    context: Option<&str>,
    history: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let output = render(message, context, history, &ClassifierConfig::from(&config.tutor))?;
    println!("{output}");
    Ok(())
}

fn render(
    message: &str,
    context: Option<&str>,
    history: Option<&str>,
    config: &ClassifierConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let previous: Option<ConversationContext> = context
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| format!("Invalid --context JSON: {e}"))?;
    let history: Vec<ChatTurn> = history
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| format!("Invalid --history JSON: {e}"))?
        .unwrap_or_default();

    let classification = classify(message, &history, previous.as_ref(), config);
    let instruction = build_instruction(&classification.context, None, None);
    let (is_hint, is_solution) = instruction.expected_flags();

    let mut out = String::new();
    out.push_str(&format!("Rule:     {}\n", classification.rule));
    out.push_str(&format!(
        "Context:  {}\n",
        serde_json::to_string(&classification.context)?
    ));
    if let Some(tier) = instruction.tier {
        out.push_str(&format!("Tier:     {tier}\n"));
    }
    out.push_str(&format!("Flags:    isHint={is_hint} isSolution={is_solution}\n"));
    out.push_str("\n--- Instruction ---\n");
    out.push_str(&instruction.text);
    Ok(out)
}

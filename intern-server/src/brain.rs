//! Intent classifier and conversational replies.

use serde::Deserialize;

use intern_core::llm::{LlmError, StructuredOutput};
use intern_core::LlmClient;

const DECIDE_SYSTEM_PROMPT: &str = "You are the intent classification layer for an internship \
assistant. All context is about the user's internship unless stated otherwise. Classify each \
message into one of: conversation, read_only, write_command. Then choose action: talk, act, or \
ask. Rules: Default to talk if unsure. Ask for clarification when intent is ambiguous. Only choose \
write_command when the user clearly requests a write action. Reflective, status, or summary \
questions must be read_only. The assistant is NOT allowed to create, update, or organize files \
unless the user explicitly asks for a write action. Do not invent tasks or files. If action is \
ask, provide a short clarifying question.";

const RESPOND_SYSTEM_PROMPT: &str = "You are a helpful internship companion. All context is about \
the user's internship unless stated otherwise. Answer the user's question or provide advice. Do \
not claim to have created files or performed actions.";

const READ_ONLY_SYSTEM_PROMPT: &str = "You are an internship companion. Answer reflective or \
status questions using only the provided data. Do not mention file operations or imply changes.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Conversation,
    ReadOnly,
    WriteCommand,
}

impl Intent {
    /// Lenient mapping of the model's label.
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("read") {
            Intent::ReadOnly
        } else if lower.contains("write") {
            Intent::WriteCommand
        } else {
            Intent::Conversation
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Conversation => "conversation",
            Intent::ReadOnly => "read_only",
            Intent::WriteCommand => "write_command",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    Talk,
    Act,
    Ask,
}

impl TurnAction {
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("ask") {
            TurnAction::Ask
        } else if lower.contains("act") {
            TurnAction::Act
        } else {
            TurnAction::Talk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TurnAction::Talk => "talk",
            TurnAction::Act => "act",
            TurnAction::Ask => "ask",
        }
    }
}

/// Raw model output; labels are free strings until normalized.
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    intent: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    question: Option<String>,
}

impl StructuredOutput for RawDecision {
    const NAME: &'static str = "BrainDecision";

    fn schema() -> &'static str {
        r#"{"intent": "conversation | read_only | write_command", "confidence": 0.0, "action": "talk | act | ask", "reason": "string", "question": "string or null"}"#
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrainDecision {
    pub intent: Intent,
    pub action: TurnAction,
    /// Clamped to `0.0..=1.0`.
    pub confidence: f32,
    pub reason: String,
    pub question: Option<String>,
}

impl From<RawDecision> for BrainDecision {
    fn from(raw: RawDecision) -> Self {
        let confidence = if raw.confidence.is_finite() {
            raw.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            intent: Intent::normalize(&raw.intent),
            action: TurnAction::normalize(&raw.action),
            confidence,
            reason: raw.reason,
            question: raw.question.filter(|q| !q.trim().is_empty()),
        }
    }
}

fn conversation_prompt(text: &str, history: &str) -> String {
    format!("Conversation history:\n{}\n\nUser message:\n{}", history, text)
}

pub async fn decide(llm: &LlmClient, text: &str, history: &str) -> Result<BrainDecision, LlmError> {
    let raw: RawDecision = llm
        .structured(Some(DECIDE_SYSTEM_PROMPT), &conversation_prompt(text, history))
        .await?;
    let decision = BrainDecision::from(raw);
    tracing::debug!(
        intent = decision.intent.as_str(),
        action = decision.action.as_str(),
        confidence = decision.confidence,
        "Brain decision"
    );
    Ok(decision)
}

pub async fn respond(llm: &LlmClient, text: &str, history: &str) -> Result<String, LlmError> {
    llm.complete(Some(RESPOND_SYSTEM_PROMPT), &conversation_prompt(text, history))
        .await
}

/// Answer a status question from the read-only vault digest.
pub async fn answer_from_context(llm: &LlmClient, text: &str, context: &str) -> Result<String, LlmError> {
    let prompt = format!("Question: {}\n\nExisting data:\n{}", text, context);
    llm.complete(Some(READ_ONLY_SYSTEM_PROMPT), &prompt).await
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Free-text routing request, shared by `/command` and `/chat/message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandRequest {
    pub text: String,
    pub date: Option<NaiveDate>,
    pub session_id: Option<String>,
    /// Per-request model override.
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CommandResponse {
    pub status: String,
    pub actions: Vec<String>,
    pub files: Vec<String>,
    pub message: String,
    pub intent: Option<String>,
    pub action: Option<String>,
    pub reason: Option<String>,
    pub notice: Option<String>,
}

impl CommandResponse {
    /// Successful reply that performed no writes.
    pub fn reply(
        message: impl Into<String>,
        intent: impl Into<String>,
        action: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: "success".to_string(),
            actions: Vec::new(),
            files: Vec::new(),
            message: message.into(),
            intent: Some(intent.into()),
            action: Some(action.into()),
            reason: Some(reason.into()),
            notice: None,
        }
    }

    /// A failure reported to the user as a chat message rather than an HTTP error.
    pub fn error(message: impl Into<String>, intent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            reason: Some("LLM unavailable".to_string()),
            ..Self::reply(message, intent, action, "")
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

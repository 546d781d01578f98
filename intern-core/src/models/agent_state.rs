use serde::{Deserialize, Serialize};

use crate::actions::ActionRequest;

/// Per-session routing state. A session is awaiting confirmation exactly when
/// `pending_action` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub last_intent: Option<String>,
    pub pending_action: Option<ActionRequest>,
    pub conversation_mode: Option<String>,
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatSession {
    #[serde(rename = "session_id")]
    pub id: String,
    pub profile_id: String,
    pub day: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub session_id: String,
    #[serde(skip_serializing)]
    pub profile_id: String,
    pub role: Role,
    pub timestamp: String,
    pub content: String,
}

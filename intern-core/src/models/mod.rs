pub mod agent_state;
pub mod chat;
pub mod profile;

pub use agent_state::AgentState;
pub use chat::{ChatMessage, ChatSession, Role};
pub use profile::Profile;

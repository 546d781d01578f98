pub mod actions;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod protocol;
pub mod store;
pub mod vault;

pub use actions::{ActionKind, ActionRequest, NoteCategory};
pub use config::AssistantConfig;
pub use credentials::CredentialStore;
pub use error::AssistantError;
pub use llm::{LlmBackend, LlmClient, LlmError, StructuredOutput};
pub use protocol::{CommandRequest, CommandResponse};
pub use store::Store;
pub use vault::Vault;

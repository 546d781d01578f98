//! Shared fixtures: a scripted in-process LLM backend and tempdir-backed state.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use intern_core::llm::{LlmError, ModelCall};
use intern_core::store::NewProfile;
use intern_core::{AssistantConfig, LlmBackend, LlmClient, Store};
use intern_server::http::HttpState;
use tempfile::TempDir;

/// Answers each call with the reply of the first rule whose needle appears in
/// the system prompt. Unmatched structured calls get `{}`, unmatched text calls
/// a fixed sentence.
#[derive(Default)]
pub struct ScriptedBackend {
    rules: Vec<(String, Result<String, String>)>,
    calls: Mutex<Vec<ModelCall>>,
}

pub const DEFAULT_TEXT_REPLY: &str = "Scripted reply.";

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, system_needle: &str, reply: impl Into<String>) -> Self {
        self.rules.push((system_needle.to_string(), Ok(reply.into())));
        self
    }

    /// Calls matching `system_needle` fail with an API error.
    pub fn failing(mut self, system_needle: &str) -> Self {
        self.rules
            .push((system_needle.to_string(), Err("backend unavailable".to_string())));
        self
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn generate(&self, call: ModelCall) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(call.clone());
        let system = call.system.clone().unwrap_or_default();
        let rule = self.rules.iter().find(|(needle, _)| system.contains(needle.as_str()));
        match rule {
            Some((_, Ok(reply))) => Ok(reply.clone()),
            Some((_, Err(message))) => Err(LlmError::Api {
                code: 503,
                message: message.clone(),
            }),
            None if call.json => Ok("{}".to_string()),
            None => Ok(DEFAULT_TEXT_REPLY.to_string()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Brain decision JSON.
pub fn decision(intent: &str, action: &str, confidence: f32) -> String {
    serde_json::json!({
        "intent": intent,
        "action": action,
        "confidence": confidence,
        "reason": "scripted",
        "question": null,
    })
    .to_string()
}

pub const BRAIN: &str = "intent classification";
pub const RESPOND: &str = "helpful internship companion";
pub const READ_ONLY: &str = "Answer reflective or status questions";
pub const NOTES: &str = "clean messy internship notes";
pub const TASKS: &str = "Extract actionable tasks";
pub const MEETING: &str = "Summarize internship meetings";

pub struct TestEnv {
    pub dir: TempDir,
    pub config: AssistantConfig,
    pub store: Store,
    pub llm: LlmClient,
    pub backend: Arc<ScriptedBackend>,
}

impl TestEnv {
    pub async fn new(backend: ScriptedBackend) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = AssistantConfig::rooted_at(dir.path());
        let store = Store::connect(&config.database).await.unwrap();
        let backend = Arc::new(backend);
        let llm = LlmClient::new(
            backend.clone(),
            &config.llm,
            "gemini-test".to_string(),
            Some("test-key".to_string()),
        );
        Self {
            dir,
            config,
            store,
            llm,
            backend,
        }
    }

    /// Same as [`TestEnv::new`] plus an active profile on the default vault.
    pub async fn with_profile(backend: ScriptedBackend) -> Self {
        let env = Self::new(backend).await;
        env.store
            .create_profile(NewProfile {
                name: "Ada".to_string(),
                internship_name: "Compilers".to_string(),
                start_date: "2026-06-01".to_string(),
                vault_root: env.config.vault.default_root.clone(),
            })
            .await
            .unwrap();
        env
    }

    pub fn vault_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("vault")
    }

    pub fn http_state(&self) -> Arc<HttpState> {
        Arc::new(HttpState {
            store: self.store.clone(),
            config: self.config.clone(),
            llm: self.llm.clone(),
        })
    }

    /// Every Markdown file under the vault, relative to it.
    pub fn markdown_files(&self) -> Vec<String> {
        let root = self.vault_dir();
        let mut files = Vec::new();
        collect_markdown(&root, &root, &mut files);
        files.sort();
        files
    }
}

fn collect_markdown(root: &std::path::Path, dir: &std::path::Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(root, &path, out);
        } else if path.extension().is_some_and(|e| e == "md") {
            let relative = path.strip_prefix(root).unwrap();
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
}

//! LLM client: Gemini `generateContent` behind a swappable backend
//!
//! - [`LlmBackend`] performs exactly one provider call; [`GeminiBackend`] is the
//!   REST implementation, tests plug in scripted fakes.
//! - [`LlmClient`] owns model/key resolution and the fallback chain:
//!   model-not-found retries once on the fallback model, and an auth failure on
//!   an interactive terminal prompts for a new key, persists it and retries once.
//! - [`LlmClient::structured`] asks for JSON and parses it into a
//!   [`StructuredOutput`] type.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::LlmConfig;
use crate::credentials::{CredentialStore, API_KEY_VAR, MODEL_VAR};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when the requested one does not exist.
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash-001";

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Model {model} not found: {message}")]
    ModelNotFound { model: String, message: String },

    #[error("Credential rejected: {0}")]
    Unauthorized(String),

    #[error("Missing API key")]
    MissingApiKey,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Could not parse {target} from model output: {message}")]
    Parse { target: &'static str, message: String },

    #[error("Key prompt failed: {0}")]
    Prompt(String),
}

/// The request URL carries the API key, so it is dropped before the error
/// can reach a log line or a response body.
impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Http(err.without_url())
    }
}

impl LlmError {
    pub fn is_model_not_found(&self) -> bool {
        matches!(self, LlmError::ModelNotFound { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, LlmError::Unauthorized(_) | LlmError::MissingApiKey)
    }

    /// Fixed user-facing text for a failed call.
    pub fn friendly_message(&self) -> &'static str {
        match self {
            LlmError::ModelNotFound { .. } => {
                "The selected model is unavailable. Please choose a different model."
            }
            LlmError::Unauthorized(_) | LlmError::MissingApiKey => {
                "The API key was rejected or is missing. Please update it in settings."
            }
            LlmError::Http(_) => "Network error while contacting the LLM. Please check your connection.",
            _ => "LLM request failed. Please try again or change the model.",
        }
    }
}

// ============================================================================
// Backend trait
// ============================================================================

/// One fully resolved provider call.
#[derive(Debug, Clone)]
pub struct ModelCall {
    pub model: String,
    pub api_key: String,
    pub system: Option<String>,
    pub prompt: String,
    /// Request `application/json` output.
    pub json: bool,
    pub temperature: f32,
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, call: ModelCall) -> Result<String, LlmError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: u16,
    message: String,
    #[serde(default)]
    status: String,
}

// ============================================================================
// GeminiBackend
// ============================================================================

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: Client,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(timeout: Duration) -> Result<Self, LlmError> {
        Self::with_base_url(GEMINI_BASE_URL.to_string(), timeout)
    }

    /// Create a backend with a custom base URL (for testing / proxies)
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, call: ModelCall) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, call.model, call.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: call.prompt }],
            }],
            system_instruction: call.system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: call.temperature,
                response_mime_type: call.json.then_some("application/json"),
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error);
            let (code, message, provider_status) = detail
                .map(|e| (e.code, e.message, e.status))
                .unwrap_or((status.as_u16(), body, String::new()));

            tracing::error!(code = code, model = %call.model, message = %message, "Gemini API error");

            if code == 404 || provider_status == "NOT_FOUND" {
                return Err(LlmError::ModelNotFound {
                    model: call.model,
                    message,
                });
            }
            if code == 401
                || code == 403
                || provider_status == "UNAUTHENTICATED"
                || message.contains("API key not valid")
            {
                return Err(LlmError::Unauthorized(message));
            }
            return Err(LlmError::Api { code, message });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// Key prompt
// ============================================================================

/// Source of a replacement API key after an auth failure.
#[async_trait]
pub trait KeyPrompt: Send + Sync {
    fn is_interactive(&self) -> bool;

    async fn request_key(&self, reason: &str) -> Result<String, LlmError>;
}

/// Reads a key from stdin when both stdin and stderr are terminals.
pub struct TerminalPrompt;

#[async_trait]
impl KeyPrompt for TerminalPrompt {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
    }

    async fn request_key(&self, reason: &str) -> Result<String, LlmError> {
        let reason = reason.to_string();
        let line = tokio::task::spawn_blocking(move || {
            eprintln!("LLM authentication failed: {}", reason);
            eprint!("Enter a new {}: ", API_KEY_VAR);
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|e| LlmError::Prompt(e.to_string()))?
        .map_err(|e| LlmError::Prompt(e.to_string()))?;

        let key = line.trim().to_string();
        if key.is_empty() {
            return Err(LlmError::Prompt("no key entered".to_string()));
        }
        Ok(key)
    }
}

/// Never prompts; auth failures propagate.
pub struct NoPrompt;

#[async_trait]
impl KeyPrompt for NoPrompt {
    fn is_interactive(&self) -> bool {
        false
    }

    async fn request_key(&self, _reason: &str) -> Result<String, LlmError> {
        Err(LlmError::Prompt("no interactive terminal".to_string()))
    }
}

// ============================================================================
// Structured output
// ============================================================================

/// A type the model is asked to produce as a JSON object.
pub trait StructuredOutput: DeserializeOwned {
    /// Name used in parse errors.
    const NAME: &'static str;

    /// JSON shape shown to the model.
    fn schema() -> &'static str;
}

pub fn format_instructions<T: StructuredOutput>() -> String {
    format!(
        "Respond with a single JSON object and nothing else. It must match this shape:\n{}",
        T::schema()
    )
}

/// Strip code fences and cut the text down to its outermost `{ … }`.
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    (end > start).then(|| &unfenced[start..=end])
}

pub fn parse_structured<T: StructuredOutput>(text: &str) -> Result<T, LlmError> {
    let json = extract_json(text).ok_or_else(|| LlmError::Parse {
        target: T::NAME,
        message: "no JSON object in output".to_string(),
    })?;
    serde_json::from_str(json).map_err(|e| LlmError::Parse {
        target: T::NAME,
        message: e.to_string(),
    })
}

// ============================================================================
// LlmClient
// ============================================================================

struct ClientState {
    model: String,
    api_key: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    backend: Arc<dyn LlmBackend>,
    prompt: Arc<dyn KeyPrompt>,
    credentials: CredentialStore,
    fallback_model: String,
    temperature: f32,
    model_override: Option<String>,
    state: Arc<RwLock<ClientState>>,
}

impl LlmClient {
    /// Gemini-backed client. Key: `GOOGLE_API_KEY`, then the credential store.
    /// Model: `GEMINI_MODEL`, then the stored selection, then config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let backend = GeminiBackend::with_base_url(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?;
        let credentials = CredentialStore::new(&config.credentials_path);

        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| credentials.api_key());
        let model = std::env::var(MODEL_VAR)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| credentials.selected_model())
            .unwrap_or_else(|| config.model.clone());

        tracing::info!(
            backend = backend.name(),
            model = %model,
            api_key_configured = api_key.is_some(),
            "LLM client ready"
        );

        Ok(Self::new(Arc::new(backend), config, model, api_key)
            .with_prompt(Arc::new(TerminalPrompt)))
    }

    /// Client over an arbitrary backend that never prompts.
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        config: &LlmConfig,
        model: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            backend,
            prompt: Arc::new(NoPrompt),
            credentials: CredentialStore::new(&config.credentials_path),
            fallback_model: config.fallback_model.clone(),
            temperature: config.temperature,
            model_override: None,
            state: Arc::new(RwLock::new(ClientState { model, api_key })),
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn KeyPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Handle that uses `model` for its calls while sharing key and fallback state.
    pub fn with_model(&self, model: Option<&str>) -> Self {
        let mut client = self.clone();
        client.model_override = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        client
    }

    pub async fn model(&self) -> String {
        match &self.model_override {
            Some(model) => model.clone(),
            None => self.state.read().await.model.clone(),
        }
    }

    pub fn fallback_model(&self) -> &str {
        &self.fallback_model
    }

    pub async fn api_key_configured(&self) -> bool {
        self.state.read().await.api_key.is_some()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Select a model for subsequent calls and persist the choice.
    pub async fn set_model(&self, model: &str) -> Result<(), crate::error::AssistantError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(crate::error::AssistantError::Validation("model is empty".to_string()));
        }
        self.credentials.save(&[(MODEL_VAR, model)])?;
        self.state.write().await.model = model.to_string();
        Ok(())
    }

    pub async fn set_api_key(&self, key: &str) -> Result<(), crate::error::AssistantError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(crate::error::AssistantError::Validation("api key is empty".to_string()));
        }
        self.credentials.save(&[(API_KEY_VAR, key)])?;
        self.state.write().await.api_key = Some(key.to_string());
        Ok(())
    }

    /// Free-text completion.
    pub async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, LlmError> {
        self.call(system, prompt, false).await
    }

    /// Completion parsed into `T`; unparseable output is an error.
    pub async fn structured<T: StructuredOutput>(
        &self,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<T, LlmError> {
        let prompt = format!("{}\n\n{}", prompt, format_instructions::<T>());
        let text = self.call(system, &prompt, true).await?;
        parse_structured(&text)
    }

    async fn call(&self, system: Option<&str>, prompt: &str, json: bool) -> Result<String, LlmError> {
        let model = self.model().await;
        let api_key = self.state.read().await.api_key.clone();

        match self.attempt(&model, api_key.clone(), system, prompt, json).await {
            Err(e) if e.is_model_not_found() && model != self.fallback_model => {
                tracing::warn!(
                    model = %model,
                    fallback = %self.fallback_model,
                    "Model not found, retrying on fallback model"
                );
                self.state.write().await.model = self.fallback_model.clone();
                self.attempt(&self.fallback_model, api_key, system, prompt, json).await
            }
            Err(e) if e.is_auth() && self.prompt.is_interactive() => {
                tracing::warn!(error = %e, "LLM credential rejected, prompting for a new key");
                let key = self.prompt.request_key(&e.to_string()).await?;
                if let Err(save_err) = self.credentials.save(&[(API_KEY_VAR, key.as_str())]) {
                    tracing::warn!(error = %save_err, "Failed to persist API key");
                }
                self.state.write().await.api_key = Some(key.clone());
                self.attempt(&model, Some(key), system, prompt, json).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        model: &str,
        api_key: Option<String>,
        system: Option<&str>,
        prompt: &str,
        json: bool,
    ) -> Result<String, LlmError> {
        let api_key = api_key.ok_or(LlmError::MissingApiKey)?;
        tracing::debug!(backend = self.backend.name(), model = %model, json, "LLM call");
        self.backend
            .generate(ModelCall {
                model: model.to_string(),
                api_key,
                system: system.map(str::to_string),
                prompt: prompt.to_string(),
                json,
                temperature: self.temperature,
            })
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
    }

    fn test_client(server: &MockServer, dir: &std::path::Path, model: &str, key: Option<&str>) -> LlmClient {
        let config = LlmConfig {
            credentials_path: dir.join(".env.local").to_string_lossy().into_owned(),
            ..LlmConfig::default()
        };
        let backend = GeminiBackend::with_base_url(server.uri(), Duration::from_secs(5))
            .expect("Failed to create backend");
        LlmClient::new(Arc::new(backend), &config, model.to_string(), key.map(str::to_string))
    }

    struct StaticPrompt(&'static str);

    #[async_trait]
    impl KeyPrompt for StaticPrompt {
        fn is_interactive(&self) -> bool {
            true
        }

        async fn request_key(&self, _reason: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Debug, Deserialize)]
    struct Title {
        title: String,
    }

    impl StructuredOutput for Title {
        const NAME: &'static str = "Title";

        fn schema() -> &'static str {
            r#"{"title": "string"}"#
        }
    }

    #[tokio::test]
    async fn test_complete_sends_generate_content_request() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), "gemini-2.5-flash", Some("k1"));

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "k1"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
                "systemInstruction": { "parts": [{ "text": "be brief" }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client.complete(Some("be brief"), "hello").await.unwrap();
        assert_eq!(reply, "hi there");
    }

    #[tokio::test]
    async fn test_model_not_found_retries_once_on_fallback() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), "gemini-nonexistent", Some("k1"));

        Mock::given(method("POST"))
            .and(path("/models/gemini-nonexistent:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "code": 404, "message": "models/gemini-nonexistent is not found", "status": "NOT_FOUND" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", DEFAULT_FALLBACK_MODEL)))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("from fallback")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client.complete(None, "hello").await.unwrap();
        assert_eq!(reply, "from fallback");
        assert_eq!(client.model().await, DEFAULT_FALLBACK_MODEL);
    }

    #[tokio::test]
    async fn test_fallback_model_failure_is_not_retried() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), DEFAULT_FALLBACK_MODEL, Some("k1"));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "code": 404, "message": "gone", "status": "NOT_FOUND" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client.complete(None, "hello").await.unwrap_err();
        assert!(err.is_model_not_found());
    }

    #[tokio::test]
    async fn test_auth_failure_without_terminal_propagates() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), "gemini-2.5-flash", Some("bad"));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client.complete(None, "hello").await.unwrap_err();
        assert!(err.is_auth(), "expected auth error, got {:?}", err);
        assert!(!dir.path().join(".env.local").exists());
    }

    #[tokio::test]
    async fn test_http_errors_do_not_expose_the_api_key() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), "gemini-2.5-flash", Some("very-secret-key"));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client.complete(None, "hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Http(_)), "got {:?}", err);
        assert!(!err.to_string().contains("very-secret-key"));
        assert!(!format!("{:?}", err).contains("very-secret-key"));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), "gemini-2.5-flash", None);

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("x")))
            .expect(0)
            .mount(&server)
            .await;

        assert!(matches!(client.complete(None, "hello").await, Err(LlmError::MissingApiKey)));
        assert!(!client.api_key_configured().await);
    }

    #[tokio::test]
    async fn test_auth_failure_with_prompt_persists_key_and_retries_once() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), "gemini-2.5-flash", Some("bad"))
            .with_prompt(Arc::new(StaticPrompt("fresh-key")));

        Mock::given(method("POST"))
            .and(query_param("key", "bad"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "code": 403, "message": "permission denied", "status": "PERMISSION_DENIED" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("key", "fresh-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("welcome back")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client.complete(None, "hello").await.unwrap();
        assert_eq!(reply, "welcome back");
        assert_eq!(client.credentials().api_key().as_deref(), Some("fresh-key"));
    }

    #[tokio::test]
    async fn test_structured_requests_json_and_strips_fences() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), "gemini-2.5-flash", Some("k1"));

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(text_response("```json\n{\"title\": \"Sprint notes\"}\n```")),
            )
            .mount(&server)
            .await;

        let parsed: Title = client.structured(None, "title this").await.unwrap();
        assert_eq!(parsed.title, "Sprint notes");
    }

    #[test]
    fn test_parse_structured_rejects_non_json() {
        let err = parse_structured::<Title>("I cannot do that").unwrap_err();
        assert!(matches!(err, LlmError::Parse { target: "Title", .. }));

        let err = parse_structured::<Title>("{\"name\": 1}").unwrap_err();
        assert!(matches!(err, LlmError::Parse { .. }));
    }

    #[test]
    fn test_extract_json_takes_outer_object() {
        assert_eq!(
            extract_json("Sure! {\"a\": {\"b\": 1}} hope that helps"),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(extract_json("no braces"), None);
    }

    #[tokio::test]
    async fn test_with_model_overrides_per_call() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&server, dir.path(), "gemini-2.5-flash", Some("k1"));

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("pro")))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client.with_model(Some("gemini-2.5-pro")).complete(None, "q").await.unwrap();
        assert_eq!(reply, "pro");
        assert_eq!(client.model().await, "gemini-2.5-flash");
    }
}

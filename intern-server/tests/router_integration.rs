//! Command router integration tests: a real SQLite store and vault in a
//! tempdir, with a scripted LLM backend.

mod common;

use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{decision, ScriptedBackend, TestEnv, BRAIN, READ_ONLY, RESPOND};
use intern_core::error::AssistantError;
use intern_core::store::NewProfile;
use intern_core::CommandRequest;
use intern_server::http::error_to_http;
use intern_server::router::{
    handle_message, AWAITING_CONFIRMATION_MESSAGE, DEFAULT_CLARIFY_QUESTION, NO_PROFILE_MESSAGE,
    PERMISSION_QUESTION, READ_ONLY_NOTICE, RESET_MESSAGE,
};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

fn request(text: &str) -> CommandRequest {
    CommandRequest {
        text: text.to_string(),
        date: Some(day()),
        ..CommandRequest::default()
    }
}

async fn send(env: &TestEnv, text: &str) -> intern_core::CommandResponse {
    handle_message(&env.store, &env.llm, &env.config, request(text))
        .await
        .unwrap()
}

async fn session_id(env: &TestEnv) -> (String, String) {
    let profile = env.store.active_profile().await.unwrap().unwrap();
    let session = env
        .store
        .get_or_create_daily_session(&profile.id, day())
        .await
        .unwrap();
    (session.id, profile.id)
}

#[tokio::test]
async fn test_no_active_profile_replies_without_writes() {
    let env = TestEnv::new(ScriptedBackend::new()).await;

    let resp = send(&env, "save my notes").await;
    assert_eq!(resp.message, NO_PROFILE_MESSAGE);
    assert_eq!(resp.reason.as_deref(), Some("No active profile"));
    assert!(resp.files.is_empty());
    assert!(env.backend.calls().is_empty());
    assert!(env.markdown_files().is_empty());
}

#[tokio::test]
async fn test_blank_message_is_validation_error() {
    let env = TestEnv::with_profile(ScriptedBackend::new()).await;
    let err = handle_message(&env.store, &env.llm, &env.config, request("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::Validation(_)));
}

#[tokio::test]
async fn test_talk_turn_is_recorded_in_history() {
    let backend = ScriptedBackend::new()
        .on(BRAIN, decision("conversation", "talk", 0.9))
        .on(RESPOND, "Rust ownership is about who frees memory.");
    let env = TestEnv::with_profile(backend).await;

    let resp = send(&env, "how does ownership work?").await;
    assert!(resp.is_success());
    assert_eq!(resp.action.as_deref(), Some("talk"));
    assert_eq!(resp.message, "Rust ownership is about who frees memory.");

    let (session, profile) = session_id(&env).await;
    let history = env.store.history(&session, &profile, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "how does ownership work?");
    assert_eq!(history[1].content, "Rust ownership is about who frees memory.");
    assert!(env.markdown_files().is_empty());
}

#[tokio::test]
async fn test_write_command_with_verb_dispatches_directly() {
    let backend = ScriptedBackend::new().on(BRAIN, decision("write_command", "act", 0.9));
    let env = TestEnv::with_profile(backend).await;

    let resp = send(&env, "save this idea about caching the parser").await;
    assert!(resp.is_success());
    assert_eq!(resp.actions, vec!["notes_organized"]);
    assert_eq!(resp.files, vec!["2026/03/Week-2/Notes/Ideas/untitled-note.md"]);
    assert_eq!(resp.message, "Note organized for Untitled Note.");
    assert!(env.vault_dir().join(&resp.files[0]).is_file());

    let (session, _) = session_id(&env).await;
    let state = env.store.get_state(&session).await.unwrap();
    assert!(state.pending_action.is_none());
    assert_eq!(state.last_intent.as_deref(), Some("write_command"));
}

#[tokio::test]
async fn test_confirmation_flow_only_accepts_fixed_phrases() {
    let backend = ScriptedBackend::new().on(BRAIN, decision("conversation", "act", 0.9));
    let env = TestEnv::with_profile(backend).await;

    let resp = send(&env, "I learned about lifetimes today").await;
    assert_eq!(resp.message, PERMISSION_QUESTION);
    assert_eq!(resp.action.as_deref(), Some("ask"));
    assert_eq!(resp.reason.as_deref(), Some("Explicit write permission required"));
    let brain_calls = env.backend.calls().len();

    for reply in ["maybe later", "yes please", "sure!"] {
        let resp = send(&env, reply).await;
        assert_eq!(resp.message, AWAITING_CONFIRMATION_MESSAGE, "{}", reply);
        assert_eq!(resp.reason.as_deref(), Some("Awaiting confirmation"));
        assert_eq!(resp.intent.as_deref(), Some("conversation"));
    }
    assert_eq!(env.backend.calls().len(), brain_calls, "waiting turns must not call the model");
    assert!(env.markdown_files().is_empty());

    let resp = send(&env, "  Go Ahead ").await;
    assert_eq!(resp.reason.as_deref(), Some("Confirmed permission"));
    assert_eq!(resp.intent.as_deref(), Some("write_command"));
    assert_eq!(resp.actions, vec!["notes_organized"]);
    assert!(resp.files[0].starts_with("2026/03/Week-2/Notes/Learning/"));
    assert!(env.vault_dir().join(&resp.files[0]).is_file());

    let (session, profile) = session_id(&env).await;
    let state = env.store.get_state(&session).await.unwrap();
    assert!(state.pending_action.is_none());
    // 1 question turn + 3 reminder turns + confirmed turn
    let history = env.store.history(&session, &profile, 50).await.unwrap();
    assert_eq!(history.len(), 10);
}

#[tokio::test]
async fn test_read_only_trigger_never_writes_files() {
    let backend = ScriptedBackend::new()
        .on(BRAIN, decision("write_command", "act", 0.99))
        .on(READ_ONLY, "You fixed the parser and reviewed two PRs.");
    let env = TestEnv::with_profile(backend).await;

    let resp = send(&env, "What did I work on today? save it").await;
    assert!(resp.is_success());
    assert_eq!(resp.intent.as_deref(), Some("read_only"));
    assert_eq!(resp.action.as_deref(), Some("talk"));
    assert_eq!(resp.notice.as_deref(), Some(READ_ONLY_NOTICE));
    assert_eq!(resp.message, "You fixed the parser and reviewed two PRs.");
    assert!(resp.files.is_empty());
    assert!(env.markdown_files().is_empty());

    let read_call = env
        .backend
        .calls()
        .into_iter()
        .find(|c| c.system.as_deref().is_some_and(|s| s.contains(READ_ONLY)))
        .unwrap();
    assert!(read_call.prompt.contains("Date: 2026-03-10"));
}

#[tokio::test]
async fn test_low_confidence_act_asks_for_clarification() {
    let backend = ScriptedBackend::new().on(BRAIN, decision("write_command", "act", 0.3));
    let env = TestEnv::with_profile(backend).await;

    let resp = send(&env, "save the thing").await;
    assert_eq!(resp.message, DEFAULT_CLARIFY_QUESTION);
    assert_eq!(resp.action.as_deref(), Some("ask"));

    let (session, _) = session_id(&env).await;
    assert!(env.store.get_state(&session).await.unwrap().pending_action.is_none());
    assert!(env.markdown_files().is_empty());
}

#[tokio::test]
async fn test_llm_failure_becomes_error_reply() {
    let backend = ScriptedBackend::new().failing(BRAIN);
    let env = TestEnv::with_profile(backend).await;

    let resp = send(&env, "hello there").await;
    assert_eq!(resp.status, "error");
    assert_eq!(resp.reason.as_deref(), Some("LLM unavailable"));
    assert_eq!(resp.message, "LLM request failed. Please try again or change the model.");
}

#[tokio::test]
async fn test_model_override_is_request_scoped() {
    let backend = ScriptedBackend::new().on(BRAIN, decision("conversation", "talk", 0.9));
    let env = TestEnv::with_profile(backend).await;

    let req = CommandRequest {
        model: Some("gemini-2.5-pro".to_string()),
        ..request("hi")
    };
    handle_message(&env.store, &env.llm, &env.config, req).await.unwrap();

    assert!(env.backend.calls().iter().all(|c| c.model == "gemini-2.5-pro"));
    assert_eq!(env.llm.model().await, "gemini-test");
}

#[tokio::test]
async fn test_reset_and_new_internship_phrases() {
    let backend = ScriptedBackend::new().on(BRAIN, decision("conversation", "talk", 0.9));
    let env = TestEnv::with_profile(backend).await;

    send(&env, "hello").await;
    let (session, profile) = session_id(&env).await;
    assert_eq!(env.store.history(&session, &profile, 10).await.unwrap().len(), 2);

    let resp = send(&env, "please reset this conversation").await;
    assert_eq!(resp.message, RESET_MESSAGE);
    assert!(env.store.history(&session, &profile, 10).await.unwrap().is_empty());

    let resp = send(&env, "I want to start a new internship").await;
    assert_eq!(resp.reason.as_deref(), Some("Profile reset"));
    let profiles = env.store.list_profiles().await.unwrap();
    assert_eq!(profiles.len(), 2);
    let active = env.store.active_profile().await.unwrap().unwrap();
    assert_eq!(active.internship_name, "New Internship");
    assert_eq!(active.vault_root, env.config.vault.default_root);
}

#[tokio::test]
async fn test_foreign_session_cannot_confirm_pending_action() {
    let backend = ScriptedBackend::new().on(BRAIN, decision("conversation", "act", 0.9));
    let env = TestEnv::with_profile(backend).await;

    let resp = send(&env, "I learned about lifetimes today").await;
    assert_eq!(resp.message, PERMISSION_QUESTION);
    let (first_session, _) = session_id(&env).await;

    let other_root = env.dir.path().join("vault-b");
    env.store
        .create_profile(NewProfile {
            name: "Grace".to_string(),
            internship_name: "Databases".to_string(),
            start_date: "2026-03-01".to_string(),
            vault_root: other_root.to_string_lossy().into_owned(),
        })
        .await
        .unwrap();

    let req = CommandRequest {
        session_id: Some(first_session.clone()),
        ..request("yes")
    };
    let err = handle_message(&env.store, &env.llm, &env.config, req)
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::NotFound(_)));
    assert_eq!(error_to_http(&err).0, StatusCode::NOT_FOUND);

    assert!(env.markdown_files().is_empty());
    assert!(!other_root.join("2026").exists());
    let state = env.store.get_state(&first_session).await.unwrap();
    assert!(state.pending_action.is_some());
}

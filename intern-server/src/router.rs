//! Command router: the per-message decision procedure.
//!
//! A session is either idle or awaiting confirmation of a stored
//! [`ActionRequest`]. Idle messages are classified by the brain and then
//! answered in chat, answered from vault data, turned into a clarifying
//! question, parked as a pending action, or dispatched to an agent.

use chrono::NaiveDate;

use intern_core::actions::ActionRequest;
use intern_core::error::{AssistantError, Result};
use intern_core::models::{ChatSession, Profile, Role};
use intern_core::store::NewProfile;
use intern_core::vault::resolve_date;
use intern_core::{AssistantConfig, CommandRequest, CommandResponse, LlmClient, Store, Vault};

use crate::agents::{ActionOutcome, Agents};
use crate::brain::{self, BrainDecision, Intent, TurnAction};
use crate::reader;

pub const READ_ONLY_TRIGGERS: &[&str] = &[
    "what did i achieve",
    "what did i work on",
    "summarize my progress",
    "what have i done",
    "progress today",
    "today's progress",
    "status update",
];

pub const WRITE_VERBS: &[&str] = &[
    "save", "log", "write", "organize", "create", "update", "extract", "summarize", "generate",
];

pub const CONFIRMATION_PHRASES: &[&str] = &[
    "yes", "y", "sure", "do it", "do it.", "save it", "save", "ok", "okay", "please do", "go ahead",
    "confirm",
];

const NEW_INTERNSHIP_PHRASES: &[&str] = &["start a new internship", "new internship"];
const RESET_PHRASES: &[&str] = &["reset this conversation", "reset conversation"];

pub const NO_PROFILE_MESSAGE: &str = "No active profile. Please create or select a profile to continue.";
pub const AWAITING_CONFIRMATION_MESSAGE: &str =
    "I'm waiting for your confirmation. Should I proceed and write to your vault?";
pub const PERMISSION_QUESTION: &str =
    "Do you want me to save or update anything in your vault, or just answer in chat?";
pub const DEFAULT_CLARIFY_QUESTION: &str = "Do you want me to take an action, or just discuss?";
pub const READ_ONLY_NOTICE: &str = "Answered from existing internship data";
pub const NEW_INTERNSHIP_MESSAGE: &str =
    "Started a new internship profile. You can tell me the internship name and start date.";
pub const RESET_MESSAGE: &str = "Conversation memory cleared for the active profile.";

pub fn is_confirmation(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();
    CONFIRMATION_PHRASES.contains(&normalized.as_str())
}

pub fn has_write_verb(text: &str) -> bool {
    let lower = text.to_lowercase();
    WRITE_VERBS.iter().any(|verb| lower.contains(verb))
}

pub fn is_read_only_question(text: &str) -> bool {
    let lower = text.to_lowercase();
    READ_ONLY_TRIGGERS.iter().any(|t| lower.contains(t))
}

fn contains_any(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lower.contains(p))
}

/// Everything a single turn needs, resolved fresh for every request.
pub struct RequestContext {
    pub profile: Profile,
    pub session: ChatSession,
    pub vault: Vault,
    pub llm: LlmClient,
    pub date: Option<NaiveDate>,
}

impl RequestContext {
    /// `None` when no profile is active.
    pub async fn resolve(store: &Store, llm: LlmClient, request: &CommandRequest) -> Result<Option<Self>> {
        let Some(profile) = store.active_profile().await? else {
            return Ok(None);
        };
        let vault = Vault::open(profile.vault_path())?;
        let day = resolve_date(request.date);
        let session = match request.session_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => store.ensure_session(id, &profile.id, day).await?,
            None => store.get_or_create_daily_session(&profile.id, day).await?,
        };
        Ok(Some(Self {
            profile,
            session,
            vault,
            llm,
            date: request.date,
        }))
    }

    pub fn agents<'a>(&'a self, store: &'a Store) -> Agents<'a> {
        Agents::new(&self.llm, &self.vault, store)
    }

    async fn record(&self, store: &Store, role: Role, content: &str) -> Result<()> {
        store
            .add_message(&self.session.id, &self.profile.id, role, content)
            .await
    }

    async fn record_turn(&self, store: &Store, user: &str, assistant: &str) -> Result<()> {
        self.record(store, Role::User, user).await?;
        self.record(store, Role::Assistant, assistant).await
    }
}

fn outcome_response(outcome: ActionOutcome, intent: &str, action: &str, reason: &str) -> CommandResponse {
    CommandResponse {
        actions: outcome.actions,
        files: outcome.files,
        ..CommandResponse::reply(outcome.message, intent, action, reason)
    }
}

/// Route one user message. LLM failures while classifying or replying become
/// `status: "error"` responses; agent failures during dispatch are returned as
/// errors.
pub async fn handle_message(
    store: &Store,
    llm: &LlmClient,
    config: &AssistantConfig,
    request: CommandRequest,
) -> Result<CommandResponse> {
    let text = request.text.trim().to_string();
    if text.is_empty() {
        return Err(AssistantError::Validation("text is required".to_string()));
    }
    let lower = text.to_lowercase();

    let llm = llm.with_model(request.model.as_deref());
    let Some(ctx) = RequestContext::resolve(store, llm, &request).await? else {
        return Ok(CommandResponse::reply(
            NO_PROFILE_MESSAGE,
            "conversation",
            "talk",
            "No active profile",
        ));
    };

    let history = store
        .context(&ctx.session.id, &ctx.profile.id, config.router.history_limit)
        .await?;
    let mut state = store.get_state(&ctx.session.id).await?;

    if let Some(pending) = state.pending_action.clone() {
        return handle_pending(store, &ctx, &text, pending, state.last_intent.as_deref()).await;
    }

    if contains_any(&lower, NEW_INTERNSHIP_PHRASES) {
        let profile = store
            .create_profile(NewProfile {
                name: String::new(),
                internship_name: "New Internship".to_string(),
                start_date: String::new(),
                vault_root: ctx.profile.vault_root.clone(),
            })
            .await?;
        let session = store
            .get_or_create_daily_session(&profile.id, resolve_date(request.date))
            .await?;
        store.clear_history(&session.id, &profile.id).await?;
        return Ok(CommandResponse::reply(
            NEW_INTERNSHIP_MESSAGE,
            "conversation",
            "talk",
            "Profile reset",
        ));
    }

    if contains_any(&lower, RESET_PHRASES) {
        store.clear_history(&ctx.session.id, &ctx.profile.id).await?;
        return Ok(CommandResponse::reply(RESET_MESSAGE, "conversation", "talk", "Memory reset"));
    }

    let mut decision: BrainDecision = match brain::decide(&ctx.llm, &text, &history).await {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(error = %e, "Intent classification failed");
            return Ok(CommandResponse::error(e.friendly_message(), "conversation", "talk"));
        }
    };
    if is_read_only_question(&text) {
        decision.intent = Intent::ReadOnly;
        decision.action = TurnAction::Talk;
    }
    let intent = decision.intent.as_str();

    tracing::debug!(
        session_id = %ctx.session.id,
        intent = intent,
        action = decision.action.as_str(),
        confidence = decision.confidence,
        "Routing message"
    );

    state.last_intent = Some(intent.to_string());
    state.conversation_mode = Some(decision.action.as_str().to_string());
    store
        .update_state(&ctx.session.id, &ctx.profile.id, &state)
        .await?;

    if decision.intent == Intent::ReadOnly {
        let context = reader::build_read_context(&ctx.vault, resolve_date(ctx.date))?;
        let reply = match brain::answer_from_context(&ctx.llm, &text, &context).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Read-only answer failed");
                return Ok(CommandResponse::error(e.friendly_message(), intent, "talk"));
            }
        };
        ctx.record_turn(store, &text, &reply).await?;
        return Ok(CommandResponse::reply(reply, intent, "talk", decision.reason).with_notice(READ_ONLY_NOTICE));
    }

    if decision.action == TurnAction::Talk {
        let reply = match brain::respond(&ctx.llm, &text, &history).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Conversational reply failed");
                return Ok(CommandResponse::error(e.friendly_message(), intent, "talk"));
            }
        };
        ctx.record_turn(store, &text, &reply).await?;
        return Ok(CommandResponse::reply(reply, intent, "talk", decision.reason));
    }

    let unsure = decision.action == TurnAction::Act && decision.confidence < config.router.confidence_threshold;
    if decision.action == TurnAction::Ask || unsure {
        let question = decision
            .question
            .clone()
            .unwrap_or_else(|| DEFAULT_CLARIFY_QUESTION.to_string());
        ctx.record_turn(store, &text, &question).await?;
        return Ok(CommandResponse::reply(question, intent, "ask", decision.reason));
    }

    if decision.intent != Intent::WriteCommand || !has_write_verb(&text) {
        let pending = ActionRequest::from_message(&text, request.date);
        tracing::info!(session_id = %ctx.session.id, action = ?pending.kind(), "Awaiting write permission");
        state.pending_action = Some(pending);
        state.conversation_mode = Some(TurnAction::Ask.as_str().to_string());
        store
            .update_state(&ctx.session.id, &ctx.profile.id, &state)
            .await?;
        ctx.record_turn(store, &text, PERMISSION_QUESTION).await?;
        return Ok(CommandResponse::reply(
            PERMISSION_QUESTION,
            intent,
            "ask",
            "Explicit write permission required",
        ));
    }

    ctx.record(store, Role::User, &text).await?;
    let action = ActionRequest::from_message(&text, request.date);
    let outcome = ctx.agents(store).execute(&action).await?;
    ctx.record(store, Role::Assistant, &outcome.message).await?;
    Ok(outcome_response(outcome, intent, decision.action.as_str(), &decision.reason))
}

async fn handle_pending(
    store: &Store,
    ctx: &RequestContext,
    text: &str,
    pending: ActionRequest,
    last_intent: Option<&str>,
) -> Result<CommandResponse> {
    ctx.record(store, Role::User, text).await?;

    if !is_confirmation(text) {
        ctx.record(store, Role::Assistant, AWAITING_CONFIRMATION_MESSAGE).await?;
        return Ok(CommandResponse::reply(
            AWAITING_CONFIRMATION_MESSAGE,
            last_intent.unwrap_or("conversation"),
            "ask",
            "Awaiting confirmation",
        ));
    }

    tracing::info!(session_id = %ctx.session.id, action = ?pending.kind(), "Executing confirmed action");
    let outcome = ctx.agents(store).execute(&pending).await?;
    ctx.record(store, Role::Assistant, &outcome.message).await?;
    store.clear_state(&ctx.session.id).await?;
    Ok(outcome_response(outcome, "write_command", "act", "Confirmed permission"))
}

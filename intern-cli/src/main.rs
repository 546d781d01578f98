//! intern-cli: terminal frontend for the Intern Assistant server
//!
//! Talks to `intern-server` over its HTTP API.
//!
//! # Subcommands
//! - `say <text> [--date] [--session] [--model] [--json]` : send a chat message
//! - `history [--session] [--json]`                        : show a session's messages
//! - `sessions`                                            : list chat sessions
//! - `profiles`                                            : list internship profiles
//! - `status`                                              : show server health

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";

/// Longest message preview printed by `sessions`/`history` in text mode.
const PREVIEW_CHARS: usize = 200;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "intern-cli", version, about = "Intern Assistant: chat with your internship vault")]
struct Cli {
    /// Server URL (overrides INTERN_HTTP_URL env var)
    #[arg(long, env = "INTERN_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a message to the assistant
    Say {
        /// Message text
        text: String,

        /// Date the message refers to (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Chat session id (defaults to today's session)
        #[arg(long)]
        session: Option<String>,

        /// Model to use for this message only
        #[arg(long)]
        model: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show the messages of a chat session
    History {
        /// Chat session id (defaults to today's session)
        #[arg(long)]
        session: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// List chat sessions of the active profile
    Sessions,

    /// List internship profiles
    Profiles,

    /// Show server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CommandReply {
    pub status: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    pub message: String,
    pub intent: Option<String>,
    pub action: Option<String>,
    pub reason: Option<String>,
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub timestamp: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub day: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionsResponse {
    pub active_session_id: Option<String>,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileSummary {
    pub profile_id: String,
    pub name: String,
    pub internship_name: String,
    pub start_date: String,
    pub vault_root: String,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProfilesResponse {
    pub active_profile_id: Option<String>,
    pub profiles: Vec<ProfileSummary>,
}

// ============================================================================
// Formatting
// ============================================================================

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push('…');
    }
    out
}

/// Assistant reply followed by written files and any notice.
pub fn format_reply(reply: &CommandReply) -> String {
    let mut lines = Vec::new();
    if reply.status != "success" {
        lines.push(format!("[{}] {}", reply.status, reply.message));
    } else {
        lines.push(reply.message.clone());
    }
    if !reply.files.is_empty() {
        lines.push(String::new());
        lines.push(format!("Files ({}):", reply.actions.join(", ")));
        lines.extend(reply.files.iter().map(|f| format!("  {}", f)));
    }
    if let Some(notice) = &reply.notice {
        lines.push(String::new());
        lines.push(format!("({})", notice));
    }
    if let (Some(intent), Some(action)) = (&reply.intent, &reply.action) {
        let reason = reply.reason.as_deref().unwrap_or("");
        lines.push(format!("-- {} / {} {}", intent, action, reason).trim_end().to_string());
    }
    lines.join("\n")
}

pub fn format_history(history: &HistoryResponse) -> String {
    if history.messages.is_empty() {
        return format!("Session {} has no messages.", history.session_id);
    }
    let mut lines = vec![format!("Session {}", history.session_id), String::new()];
    for m in &history.messages {
        lines.push(format!("[{}] {}:", m.timestamp, m.role));
        lines.push(preview(&m.content));
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}

pub fn format_sessions(resp: &SessionsResponse) -> String {
    if resp.sessions.is_empty() {
        return "No chat sessions yet.".to_string();
    }
    resp.sessions
        .iter()
        .map(|s| {
            let marker = if resp.active_session_id.as_deref() == Some(s.session_id.as_str()) {
                "*"
            } else {
                " "
            };
            format!("{} {}  {}  (updated {})", marker, s.session_id, s.day, s.updated_at)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_profiles(resp: &ProfilesResponse) -> String {
    if resp.profiles.is_empty() {
        return "No profiles yet. Create one with POST /profiles.".to_string();
    }
    resp.profiles
        .iter()
        .map(|p| {
            let marker = if p.active { "*" } else { " " };
            let who = if p.name.is_empty() { "-" } else { p.name.as_str() };
            let since = if p.start_date.is_empty() {
                String::new()
            } else {
                format!(" since {}", p.start_date)
            };
            format!(
                "{} {}  {} ({}){}  vault: {}",
                marker, p.profile_id, p.internship_name, who, since, p.vault_root
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send a request and return the body, exiting with a message on failure.
fn fetch(request: reqwest::blocking::RequestBuilder, url: &str) -> String {
    let resp = match request.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("intern-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if !status.is_success() {
        eprintln!("intern-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }
    body
}

fn parse<T: serde::de::DeserializeOwned>(body: &str, what: &str) -> T {
    match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("intern-cli: failed to parse {} response: {}", what, e);
            std::process::exit(1);
        }
    }
}

fn do_say(
    server: &str,
    text: &str,
    date: Option<String>,
    session: Option<String>,
    model: Option<String>,
    json_output: bool,
) -> anyhow::Result<()> {
    // LLM-backed turns can take a while
    let client = client(120)?;
    let url = format!("{}/chat/message", server);
    let body = serde_json::json!({
        "text": text,
        "date": date,
        "session_id": session,
        "model": model,
    });

    let raw = fetch(client.post(&url).json(&body), &url);
    if json_output {
        println!("{}", raw);
        return Ok(());
    }
    let reply: CommandReply = parse(&raw, "chat");
    println!("{}", format_reply(&reply));
    if reply.status != "success" {
        std::process::exit(2);
    }
    Ok(())
}

fn do_history(server: &str, session: Option<String>, json_output: bool) -> anyhow::Result<()> {
    let client = client(30)?;
    let url = format!("{}/chat/history", server);
    let mut request = client.get(&url);
    if let Some(id) = &session {
        request = request.query(&[("session_id", id)]);
    }

    let raw = fetch(request, &url);
    if json_output {
        println!("{}", raw);
        return Ok(());
    }
    let history: HistoryResponse = parse(&raw, "history");
    println!("{}", format_history(&history));
    Ok(())
}

fn do_sessions(server: &str) -> anyhow::Result<()> {
    let client = client(30)?;
    let url = format!("{}/chat/sessions", server);
    let resp: SessionsResponse = parse(&fetch(client.get(&url), &url), "sessions");
    println!("{}", format_sessions(&resp));
    Ok(())
}

fn do_profiles(server: &str) -> anyhow::Result<()> {
    let client = client(30)?;
    let url = format!("{}/profiles", server);
    let resp: ProfilesResponse = parse(&fetch(client.get(&url), &url), "profiles");
    println!("{}", format_profiles(&resp));
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = client(10)?;
    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Intern server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:       {}", body["version"].as_str().unwrap_or("?"));
            println!("Database:      {}", body["database"].as_str().unwrap_or("?"));
            println!("Vault:         {}", body["vault_root"].as_str().unwrap_or("?"));
            println!("Daily logs:    {}", body["daily_logs"].as_i64().unwrap_or(0));
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("intern-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("intern-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Say {
            text,
            date,
            session,
            model,
            json,
        } => do_say(&server, &text, date, session, model, json),
        Commands::History { session, json } => do_history(&server, session, json),
        Commands::Sessions => do_sessions(&server),
        Commands::Profiles => do_profiles(&server),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("intern-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

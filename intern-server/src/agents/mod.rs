//! Content agents: each turns free text into a structured LLM result and
//! renders it into the vault.
//!
//! [`Agents::execute`] is the single dispatch table shared by direct write
//! commands and confirmed pending actions.

pub mod meeting;
pub mod notes;
pub mod progress;
pub mod report;
pub mod tasks;

use intern_core::actions::{ActionRequest, ProgressInputs};
use intern_core::error::Result;
use intern_core::vault::{display_path, resolve_date};
use intern_core::{LlmClient, Store, Vault};

/// Reply after a daily log; nudges for blockers when none were given.
pub fn progress_message(inputs: &ProgressInputs) -> String {
    let mut message = "Progress files created. You can review the daily log and weekly summary.".to_string();
    if inputs.blockers.is_empty() {
        message.push_str(" Share any blockers to keep the tasks follow-up accurate.");
    }
    message
}

#[derive(Clone, Copy)]
pub struct Agents<'a> {
    pub llm: &'a LlmClient,
    pub vault: &'a Vault,
    pub store: &'a Store,
}

/// What a dispatched action did, ready to become a `CommandResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub actions: Vec<String>,
    pub files: Vec<String>,
    pub message: String,
}

impl<'a> Agents<'a> {
    pub fn new(llm: &'a LlmClient, vault: &'a Vault, store: &'a Store) -> Self {
        Self { llm, vault, store }
    }

    pub async fn execute(&self, request: &ActionRequest) -> Result<ActionOutcome> {
        tracing::info!(action = ?request.kind(), vault = %self.vault.root().display(), "Dispatching action");

        match request {
            ActionRequest::ListPendingTasks { date } => {
                let pending = tasks::list_pending_tasks(self.vault, resolve_date(*date))?;
                let message = if pending.is_empty() {
                    "No pending tasks found for the selected day.".to_string()
                } else {
                    let items: Vec<String> = pending.iter().map(|t| format!("- {}", t)).collect();
                    format!("Pending tasks:\n{}", items.join("\n"))
                };
                Ok(ActionOutcome {
                    actions: vec!["tasks_listed".to_string()],
                    files: Vec::new(),
                    message,
                })
            }
            ActionRequest::SummarizeMeeting { text, date } => {
                let summary = meeting::summarize(self, text, resolve_date(*date)).await?;
                let mut actions = vec!["meeting_summarized".to_string()];
                if summary.tasks_created > 0 {
                    actions.push("tasks_created".to_string());
                }
                Ok(ActionOutcome {
                    actions,
                    files: vec![
                        display_path(&summary.meeting_path),
                        display_path(&summary.tasks_path),
                    ],
                    message: "Meeting summarized and tasks updated for the selected week.".to_string(),
                })
            }
            ActionRequest::WeeklyReport { date } => {
                let report = report::generate_weekly(self, resolve_date(*date)).await?;
                Ok(ActionOutcome {
                    actions: vec!["weekly_report_generated".to_string()],
                    files: vec![display_path(&report.path)],
                    message: format!(
                        "Weekly report generated for week ending {}.",
                        report.week_ending.format("%Y-%m-%d")
                    ),
                })
            }
            ActionRequest::DailyProgress {
                done,
                blockers,
                next_steps,
                date,
            } => {
                let inputs = ProgressInputs {
                    done: done.clone(),
                    blockers: blockers.clone(),
                    next_steps: next_steps.clone(),
                };
                let paths = progress::log_daily(self, &inputs, resolve_date(*date)).await?;
                let message = progress_message(&inputs);
                Ok(ActionOutcome {
                    actions: vec![
                        "progress_logged".to_string(),
                        "weekly_progress_generated".to_string(),
                    ],
                    files: vec![display_path(&paths.daily), display_path(&paths.weekly)],
                    message,
                })
            }
            ActionRequest::ExtractTasks { text, date } => {
                let extracted = tasks::extract_tasks(self.llm, text).await?;
                let path = tasks::write_tasks(self.vault, &extracted, resolve_date(*date), &[])?;
                Ok(ActionOutcome {
                    actions: vec!["tasks_created".to_string()],
                    files: vec![display_path(&path)],
                    message: "Tasks extracted and saved for the selected week.".to_string(),
                })
            }
            ActionRequest::OrganizeNote { text, category, date } => {
                let note = notes::organize(self, text, *category, resolve_date(*date)).await?;
                Ok(ActionOutcome {
                    actions: vec!["notes_organized".to_string()],
                    files: vec![display_path(&note.path)],
                    message: format!("Note organized for {}.", note.title),
                })
            }
        }
    }
}

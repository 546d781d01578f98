//! Write actions the assistant can perform on the vault.
//!
//! `ActionKind` is the routing result of a free-text message; `ActionRequest`
//! is the concrete, serializable request that is either dispatched right away
//! or stored as the session's pending action until the user confirms it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ListPendingTasks,
    SummarizeMeeting,
    WeeklyReport,
    DailyProgress,
    ExtractTasks,
    OrganizeIdeas,
    OrganizeLearning,
}

/// Keyword table, in priority order. The first row with a matching keyword wins;
/// a message matching nothing is organized as a learning note.
pub const ACTION_KEYWORDS: &[(ActionKind, &[&str])] = &[
    (
        ActionKind::ListPendingTasks,
        &["pending tasks", "not done", "unfinished tasks", "open tasks"],
    ),
    (ActionKind::SummarizeMeeting, &["meeting", "advisor", "sync"]),
    (ActionKind::WeeklyReport, &["report"]),
    (ActionKind::DailyProgress, &["progress", "daily"]),
    (ActionKind::ExtractTasks, &["task", "todo"]),
    (ActionKind::OrganizeIdeas, &["idea", "brainstorm"]),
];

pub fn route_action(text: &str) -> ActionKind {
    let lower = text.to_lowercase();
    ACTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ActionKind::OrganizeLearning)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteCategory {
    Meetings,
    Learning,
    Ideas,
}

impl NoteCategory {
    /// Case-insensitive match on the three known folders; anything else is Learning.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "meetings" => NoteCategory::Meetings,
            "ideas" => NoteCategory::Ideas,
            _ => NoteCategory::Learning,
        }
    }

    pub fn folder(&self) -> &'static str {
        match self {
            NoteCategory::Meetings => "Meetings",
            NoteCategory::Learning => "Learning",
            NoteCategory::Ideas => "Ideas",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    ListPendingTasks {
        date: Option<NaiveDate>,
    },
    SummarizeMeeting {
        text: String,
        date: Option<NaiveDate>,
    },
    WeeklyReport {
        date: Option<NaiveDate>,
    },
    DailyProgress {
        #[serde(default)]
        done: Vec<String>,
        #[serde(default)]
        blockers: Vec<String>,
        #[serde(default)]
        next_steps: Vec<String>,
        date: Option<NaiveDate>,
    },
    ExtractTasks {
        text: String,
        date: Option<NaiveDate>,
    },
    OrganizeNote {
        text: String,
        category: NoteCategory,
        date: Option<NaiveDate>,
    },
}

impl ActionRequest {
    /// Route a free-text message to the request it would execute.
    pub fn from_message(text: &str, date: Option<NaiveDate>) -> Self {
        Self::for_kind(route_action(text), text, date)
    }

    pub fn for_kind(kind: ActionKind, text: &str, date: Option<NaiveDate>) -> Self {
        let text = text.to_string();
        match kind {
            ActionKind::ListPendingTasks => ActionRequest::ListPendingTasks { date },
            ActionKind::SummarizeMeeting => ActionRequest::SummarizeMeeting { text, date },
            ActionKind::WeeklyReport => ActionRequest::WeeklyReport { date },
            ActionKind::DailyProgress => {
                let parsed = parse_progress_text(&text);
                ActionRequest::DailyProgress {
                    done: parsed.done,
                    blockers: parsed.blockers,
                    next_steps: parsed.next_steps,
                    date,
                }
            }
            ActionKind::ExtractTasks => ActionRequest::ExtractTasks { text, date },
            ActionKind::OrganizeIdeas => ActionRequest::OrganizeNote {
                text,
                category: NoteCategory::Ideas,
                date,
            },
            ActionKind::OrganizeLearning => ActionRequest::OrganizeNote {
                text,
                category: NoteCategory::Learning,
                date,
            },
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::ListPendingTasks { .. } => ActionKind::ListPendingTasks,
            ActionRequest::SummarizeMeeting { .. } => ActionKind::SummarizeMeeting,
            ActionRequest::WeeklyReport { .. } => ActionKind::WeeklyReport,
            ActionRequest::DailyProgress { .. } => ActionKind::DailyProgress,
            ActionRequest::ExtractTasks { .. } => ActionKind::ExtractTasks,
            ActionRequest::OrganizeNote {
                category: NoteCategory::Ideas,
                ..
            } => ActionKind::OrganizeIdeas,
            ActionRequest::OrganizeNote { .. } => ActionKind::OrganizeLearning,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProgressInputs {
    pub done: Vec<String>,
    pub blockers: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Clone, Copy)]
enum ProgressSection {
    Done,
    Blockers,
    Next,
}

/// Split a free-text status update into done / blockers / next-steps items.
///
/// `done:`, `blockers:`, `next:` and `next steps:` headers switch the current
/// section (text after the colon becomes an item); lines before any header
/// count as done.
pub fn parse_progress_text(text: &str) -> ProgressInputs {
    let mut inputs = ProgressInputs::default();
    let mut current: Option<ProgressSection> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();

        let header = if lower.starts_with("done:") {
            Some(ProgressSection::Done)
        } else if lower.starts_with("blockers:") {
            Some(ProgressSection::Blockers)
        } else if lower.starts_with("next:") || lower.starts_with("next steps:") {
            Some(ProgressSection::Next)
        } else {
            None
        };

        let (section, item) = match header {
            Some(section) => {
                current = Some(section);
                let item = line.split_once(':').map(|(_, rest)| rest.trim()).unwrap_or("");
                (section, item)
            }
            None => (current.unwrap_or(ProgressSection::Done), line),
        };

        if item.is_empty() {
            continue;
        }
        let target = match section {
            ProgressSection::Done => &mut inputs.done,
            ProgressSection::Blockers => &mut inputs.blockers,
            ProgressSection::Next => &mut inputs.next_steps,
        };
        target.push(item.to_string());
    }

    inputs
}

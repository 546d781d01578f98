use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use intern_core::error::Result;
use intern_core::llm::StructuredOutput;
use intern_core::vault::{bullets, build_frontmatter, finish, slugify, VaultSection};

use super::tasks::{self, TaskItem};
use super::Agents;

const SYSTEM_PROMPT: &str = "Summarize internship meetings. Provide clear decisions and action \
items. Do not invent participants.";

#[derive(Debug, Deserialize)]
pub struct MeetingSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

impl StructuredOutput for MeetingSummary {
    const NAME: &'static str = "MeetingSummary";

    fn schema() -> &'static str {
        r#"{"title": "string", "summary": "string", "decisions": ["string"], "action_items": ["string"], "participants": ["string"]}"#
    }
}

#[derive(Debug, Clone)]
pub struct MeetingOutcome {
    pub meeting_path: PathBuf,
    pub tasks_path: PathBuf,
    pub tasks_created: usize,
}

/// Write a meeting note and push its action items into the day's task file.
pub async fn summarize(agents: &Agents<'_>, raw_text: &str, date: NaiveDate) -> Result<MeetingOutcome> {
    let prompt = format!("Meeting notes:\n{}", raw_text);
    let summary: MeetingSummary = agents.llm.structured(Some(SYSTEM_PROMPT), &prompt).await?;

    let title = match summary.title.trim() {
        "" => format!("Meeting {}", date.format("%Y-%m-%d")),
        t => t.to_string(),
    };

    let mut lines = vec![
        build_frontmatter(&title, &["meeting"], Some(&summary.summary), date),
        String::new(),
        format!("# {}", title),
        String::new(),
        "## Summary".to_string(),
        match summary.summary.trim() {
            "" => "None recorded.".to_string(),
            s => s.to_string(),
        },
        String::new(),
        "## Decisions".to_string(),
    ];
    lines.extend(bullets(&summary.decisions, "None recorded."));
    lines.push(String::new());
    lines.push("## Action Items".to_string());
    lines.extend(bullets(&summary.action_items, "None recorded."));
    if !summary.participants.is_empty() {
        lines.push(String::new());
        lines.push("## Participants".to_string());
        lines.extend(bullets(&summary.participants, ""));
    }

    let meeting_path = agents
        .vault
        .week_subpath(date, VaultSection::Meetings)?
        .join(format!("{}.md", slugify(&title)));
    agents.vault.write_markdown(&meeting_path, &finish(&lines))?;
    tracing::info!(path = %meeting_path.display(), "Wrote meeting note");

    let action_items: Vec<TaskItem> = summary
        .action_items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(TaskItem::todo)
        .collect();
    let tasks_path = tasks::write_tasks(agents.vault, &action_items, date, &[])?;

    Ok(MeetingOutcome {
        meeting_path,
        tasks_path,
        tasks_created: action_items.len(),
    })
}

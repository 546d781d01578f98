use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use intern_core::error::Result;
use intern_core::llm::StructuredOutput;
use intern_core::vault::{bullets, build_frontmatter, finish, week_base_path, VaultSection};
use intern_core::{LlmClient, Vault};

const SYSTEM_PROMPT: &str = "Extract actionable tasks from the text. Prefer short, concrete task \
descriptions. Use status 'todo' unless clearly completed.";

pub const NO_TASKS_PLACEHOLDER: &str = "No tasks extracted.";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskItem {
    pub description: String,
    /// `YYYY-MM-DD` or absent.
    #[serde(default)]
    pub due_date: Option<String>,
    /// `todo` or `done`.
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "todo".to_string()
}

impl TaskItem {
    pub fn todo(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            due_date: None,
            status: default_status(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("done")
    }

    fn checkbox_line(&self) -> String {
        let checkbox = if self.is_done() { "[x]" } else { "[ ]" };
        let due = match self.due_date.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => format!(" (due: {})", d),
            _ => String::new(),
        };
        format!("- {} {}{}", checkbox, self.description.trim(), due)
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
}

impl StructuredOutput for TaskList {
    const NAME: &'static str = "TaskList";

    fn schema() -> &'static str {
        r#"{"tasks": [{"description": "string", "due_date": "YYYY-MM-DD or null", "status": "todo | done"}]}"#
    }
}

/// Empty input yields no tasks without calling the model.
pub async fn extract_tasks(llm: &LlmClient, source_text: &str) -> Result<Vec<TaskItem>> {
    if source_text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let prompt = format!("Text:\n{}", source_text);
    let list: TaskList = llm.structured(Some(SYSTEM_PROMPT), &prompt).await?;
    Ok(list.tasks)
}

pub fn task_file_name(date: NaiveDate) -> String {
    format!("{}-tasks.md", date.format("%Y-%m-%d"))
}

/// Write `tasks` to the day's task file, appending a block when it already exists.
pub fn write_tasks(vault: &Vault, tasks: &[TaskItem], date: NaiveDate, blockers: &[String]) -> Result<PathBuf> {
    let date_str = date.format("%Y-%m-%d").to_string();
    let path = vault
        .week_subpath(date, VaultSection::Tasks)?
        .join(task_file_name(date));
    let exists = vault.exists(&path);

    let mut lines = if exists {
        vec![format!("## Extracted Tasks ({})", date_str), String::new()]
    } else {
        let title = format!("Tasks {}", date_str);
        vec![
            build_frontmatter(&title, &["tasks"], None, date),
            String::new(),
            format!("# {}", title),
            String::new(),
        ]
    };

    if tasks.is_empty() {
        lines.push(format!("- [ ] {}", NO_TASKS_PLACEHOLDER));
    } else {
        lines.extend(tasks.iter().map(TaskItem::checkbox_line));
    }

    if exists {
        vault.append_markdown(&path, &finish(&lines))?;
    } else {
        lines.push(String::new());
        lines.push("## Blockers".to_string());
        lines.extend(bullets(blockers, "None noted."));
        vault.write_markdown(&path, &finish(&lines))?;
    }

    tracing::info!(path = %path.display(), tasks = tasks.len(), appended = exists, "Wrote task file");
    Ok(path)
}

/// Unchecked items of the day's task file; a missing file has none.
pub fn list_pending_tasks(vault: &Vault, date: NaiveDate) -> Result<Vec<String>> {
    let path = week_base_path(date)
        .join(VaultSection::Tasks.folder())
        .join(task_file_name(date));
    let Some(content) = vault.read_optional(&path)? else {
        return Ok(Vec::new());
    };
    Ok(content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("- [ ]"))
        .map(str::trim)
        .filter(|item| !item.is_empty() && *item != NO_TASKS_PLACEHOLDER)
        .map(str::to_string)
        .collect())
}

/// Count `(done, pending)` checkbox lines in Markdown.
pub fn count_checkboxes(markdown: &str) -> (usize, usize) {
    markdown.lines().map(str::trim).fold((0, 0), |(done, pending), line| {
        if line.starts_with("- [x]") || line.starts_with("- [X]") {
            (done + 1, pending)
        } else if line.starts_with("- [ ]") {
            (done, pending + 1)
        } else {
            (done, pending)
        }
    })
}

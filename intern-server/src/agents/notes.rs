use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use intern_core::actions::NoteCategory;
use intern_core::error::Result;
use intern_core::llm::StructuredOutput;
use intern_core::vault::{build_frontmatter, slugify, VaultSection};

use super::Agents;

const SYSTEM_PROMPT: &str = "You clean messy internship notes. Return concise Markdown that is \
human-readable, structured with headings and bullet points. Do not invent facts.";

#[derive(Debug, Deserialize)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub cleaned_markdown: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StructuredOutput for NoteDraft {
    const NAME: &'static str = "NoteDraft";

    fn schema() -> &'static str {
        r#"{"title": "string", "summary": "string", "cleaned_markdown": "string", "tags": ["string"]}"#
    }
}

#[derive(Debug, Clone)]
pub struct OrganizedNote {
    pub path: PathBuf,
    pub title: String,
}

/// Clean up raw notes and file them under `Notes/<category>/<slug>.md`.
pub async fn organize(
    agents: &Agents<'_>,
    raw_text: &str,
    category: NoteCategory,
    date: NaiveDate,
) -> Result<OrganizedNote> {
    let prompt = format!("Raw notes:\n{}", raw_text);
    let draft: NoteDraft = agents.llm.structured(Some(SYSTEM_PROMPT), &prompt).await?;

    let title = match draft.title.trim() {
        "" => "Untitled Note".to_string(),
        t => t.to_string(),
    };
    let tags: Vec<&str> = draft
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    let body = match draft.cleaned_markdown.trim() {
        "" => raw_text.trim(),
        cleaned => cleaned,
    };
    let content = format!(
        "{}\n\n# {}\n\n{}\n",
        build_frontmatter(&title, &tags, Some(&draft.summary), date),
        title,
        body
    );

    let path = agents
        .vault
        .week_subpath(date, VaultSection::Notes)?
        .join(category.folder())
        .join(format!("{}.md", slugify(&title)));
    agents.vault.write_markdown(&path, &content)?;

    tracing::info!(path = %path.display(), category = category.folder(), "Organized note");
    Ok(OrganizedNote { path, title })
}
